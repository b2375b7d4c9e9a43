use std::collections::HashSet;

use futures::future::try_join_all;
use serde::Serialize;
use tracing::debug;

use crate::cache::{CompareCache, Records};
use crate::domain::{FilterTuple, Record, YearFilter};
use crate::error::{DashboardError, Result};
use crate::normalize::{collate, normalize_text};
use crate::source::DataSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryEntry {
    pub key: String,
    pub label: String,
}

/// Sorted, deduplicated categories available under the current filters,
/// together with the user's current pick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCatalog {
    entries: Vec<CategoryEntry>,
    selected: Option<String>,
}

impl CategoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the entry list from records, keeping the first label seen per key.
    pub fn entries_from<'a, I>(records: I) -> Vec<CategoryEntry>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut entries = Vec::new();
        for record in records {
            if record.category_key.is_empty() || !seen.insert(record.category_key.as_str()) {
                continue;
            }
            entries.push(CategoryEntry {
                key: record.category_key.clone(),
                label: record.category_raw.clone(),
            });
        }
        entries.sort_by(|a, b| collate(&a.label, &b.label));
        entries
    }

    /// Swaps in a rebuilt list, keeping the selection only if it is still offered.
    pub fn replace_entries(&mut self, entries: Vec<CategoryEntry>) -> Result<()> {
        self.entries = entries;
        let Some(selected) = self.selected.take() else {
            return Ok(());
        };

        let key = normalize_text(&selected);
        match self.entries.iter().find(|entry| entry.key == key) {
            Some(entry) => {
                self.selected = Some(entry.label.clone());
                Ok(())
            }
            None => Err(DashboardError::CategoryNotFound(selected)),
        }
    }

    /// Rebuilds from the merged rows of a single year.
    pub fn rebuild_snapshot(&mut self, records: &[Record]) {
        self.apply_rebuild(Self::entries_from(records));
    }

    /// Installs a rebuilt list; a selection that vanished is reset silently.
    pub fn apply_rebuild(&mut self, entries: Vec<CategoryEntry>) {
        if let Err(err) = self.replace_entries(entries) {
            debug!("category selection reset: {}", err);
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.label.clone()).collect()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Selects a category by label; anything not offered clears the selection.
    pub fn select(&mut self, label: Option<&str>) -> Result<()> {
        self.selected = None;
        match label {
            None => Ok(()),
            Some(label) if label.trim().is_empty() => Ok(()),
            Some(label) => {
                let key = normalize_text(label);
                let entry = self
                    .entries
                    .iter()
                    .find(|entry| entry.key == key)
                    .ok_or_else(|| DashboardError::CategoryNotFound(label.to_string()))?;
                self.selected = Some(entry.label.clone());
                Ok(())
            }
        }
    }

    /// Sets the selection without checking it against the entries.
    ///
    /// Used before the first build, when the entries are not known yet.
    pub fn preselect(&mut self, label: Option<String>) {
        self.selected = label.filter(|label| !label.trim().is_empty());
    }

    /// Label of the entry after (or before) the current selection, wrapping
    /// through "none chosen".
    pub fn cycle(&self, forward: bool) -> Option<String> {
        let position = self
            .selected
            .as_deref()
            .and_then(|label| self.entries.iter().position(|entry| entry.label == label));
        let len = self.entries.len();
        if len == 0 {
            return None;
        }
        let next = match (position, forward) {
            (None, true) => Some(0),
            (None, false) => Some(len - 1),
            (Some(index), true) => (index + 1 < len).then_some(index + 1),
            (Some(index), false) => index.checked_sub(1),
        };
        next.map(|index| self.entries[index].label.clone())
    }
}

/// Category entries across every known year under the current province and level.
///
/// All years are fetched concurrently; a single failure fails the whole build.
/// Returns `None` when there are no years to look at.
pub async fn historical_entries<S>(
    cache: &CompareCache,
    source: &S,
    years_ascending: &[String],
    province: &str,
    level: &str,
) -> Result<Option<Vec<CategoryEntry>>>
where
    S: DataSource + ?Sized,
{
    if years_ascending.is_empty() {
        debug!("historical catalog skipped: no known years");
        return Ok(None);
    }

    let merged = fetch_years(cache, source, years_ascending, province, level).await?;
    let entries = CategoryCatalog::entries_from(merged.iter().flat_map(|records| records.iter()));
    debug!("historical catalog rebuilt with {} categories", entries.len());
    Ok(Some(entries))
}

/// Fetches every year through the cache concurrently (all-or-nothing).
pub async fn fetch_years<S>(
    cache: &CompareCache,
    source: &S,
    years_ascending: &[String],
    province: &str,
    level: &str,
) -> Result<Vec<Records>>
where
    S: DataSource + ?Sized,
{
    let tuples: Vec<FilterTuple> = years_ascending
        .iter()
        .map(|year| FilterTuple::new(province, YearFilter::Year(year.clone()), level))
        .collect();
    try_join_all(tuples.iter().map(|tuple| cache.fetch_merged(source, tuple))).await
}
