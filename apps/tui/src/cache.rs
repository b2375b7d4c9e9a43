use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::domain::{CacheKey, FilterTuple, Record};
use crate::error::Result;
use crate::extract::record_from_row;
use crate::source::DataSource;

/// Shared, immutable list of records for one filter tuple.
pub type Records = Rc<Vec<Record>>;

/// Session cache of merged rows keyed by normalized filter tuple.
///
/// Entries are only ever dropped all at once through [`CompareCache::clear`].
#[derive(Debug, Default)]
pub struct CompareCache {
    entries: RefCell<HashMap<CacheKey, Records>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl CompareCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fetch_merged<S>(&self, source: &S, tuple: &FilterTuple) -> Result<Records>
    where
        S: DataSource + ?Sized,
    {
        let key = tuple.cache_key();
        if let Some(records) = self.entries.borrow().get(&key) {
            self.hits.set(self.hits.get() + 1);
            debug!("compare cache hit {:?}", key);
            return Ok(Rc::clone(records));
        }

        self.misses.set(self.misses.get() + 1);
        debug!("compare cache miss {:?}", key);

        let rows = source.merged_rows(tuple).await?;
        let year = tuple.year.as_str();
        let records: Records = Rc::new(
            rows.iter()
                .map(|row| record_from_row(row, &tuple.province, year, &tuple.level))
                .collect(),
        );

        self.entries
            .borrow_mut()
            .insert(key, Rc::clone(&records));
        Ok(records)
    }

    pub fn clear(&self) {
        let dropped = self.entries.borrow().len();
        self.entries.borrow_mut().clear();
        if dropped > 0 {
            debug!("compare cache cleared ({} entries)", dropped);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits.get()
    }

    pub fn misses(&self) -> u64 {
        self.misses.get()
    }
}
