//! Filter state, refresh orchestration and publishing.

use std::cell::{Cell, Ref, RefCell};
use std::time::Instant;

use futures::future::{try_join, try_join3};
use tracing::{debug, error, info, warn};

use crate::aggregate::{historical_series, snapshot_ranking, year_summary};
use crate::cache::CompareCache;
use crate::catalog::{fetch_years, historical_entries, CategoryCatalog};
use crate::domain::{
    Badges, FilterState, FilterTuple, Snapshot, TimeSeries, TopN, ViewState, YearFilter,
    DEFAULT_VIEW_MODE,
};
use crate::error::{DashboardError, Result};
use crate::export::export_url;
use crate::normalize::normalize_text;
use crate::source::{years_ascending, years_descending, DataSource};
use crate::view::Renderer;

pub const REFRESH_FAILED_NOTICE: &str = "Error loading data.";
pub const INIT_FAILED_NOTICE: &str = "Error initializing filters.";
pub const COMPARISON_FAILED_NOTICE: &str = "Error loading comparison.";

/// What happened to a user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The action ran to completion and its result was published.
    Completed,
    /// Another operation was in flight; nothing was done.
    Busy,
    /// The panel is collapsed, so there was nothing to refresh.
    Collapsed,
    /// A fetch failed; a notice was shown and the display left as it was.
    Failed,
}

/// Branch result of one refresh, computed before anything is published.
enum BranchView {
    /// Historical mode without a chosen category.
    Unselected,
    Historical(TimeSeries),
    Year {
        snapshot: Snapshot,
        catalog: CategoryCatalog,
    },
}

struct LoadedView {
    offering: f64,
    programs: f64,
    branch: BranchView,
}

/// Clears the loading flag on every exit path.
struct LoadingGuard<'a, R: Renderer> {
    flag: &'a Cell<bool>,
    renderer: &'a R,
}

impl<R: Renderer> Drop for LoadingGuard<'_, R> {
    fn drop(&mut self) {
        self.flag.set(false);
        self.renderer.set_loading(false);
    }
}

/// Drives the dashboard: owns the filters, the session cache, both category
/// catalogs and the chart slot, and publishes results to the renderer.
///
/// All operations share one loading flag. While it is set, refreshes,
/// filter changes and the comparison are dropped.
pub struct ViewController<S, R> {
    source: S,
    renderer: R,
    base_url: String,
    defaults: FilterState,
    filters: RefCell<FilterState>,
    state: Cell<ViewState>,
    loading: Cell<bool>,
    chart_live: Cell<bool>,
    cache: CompareCache,
    historical: RefCell<CategoryCatalog>,
    snapshot: RefCell<CategoryCatalog>,
    provinces: RefCell<Vec<String>>,
    years_desc: RefCell<Vec<String>>,
    levels: RefCell<Vec<String>>,
}

impl<S, R> ViewController<S, R>
where
    S: DataSource,
    R: Renderer,
{
    pub fn new(source: S, renderer: R, base_url: &str) -> Self {
        renderer.set_view_state(ViewState::Collapsed);
        renderer.update_badges(&Badges::default());
        Self {
            source,
            renderer,
            base_url: base_url.to_string(),
            defaults: FilterState::default(),
            filters: RefCell::new(FilterState::default()),
            state: Cell::new(ViewState::Collapsed),
            loading: Cell::new(false),
            chart_live: Cell::new(false),
            cache: CompareCache::new(),
            historical: RefCell::new(CategoryCatalog::new()),
            snapshot: RefCell::new(CategoryCatalog::new()),
            provinces: RefCell::new(Vec::new()),
            years_desc: RefCell::new(Vec::new()),
            levels: RefCell::new(Vec::new()),
        }
    }

    /// Chart cap the filters start from (and return to on init).
    #[must_use]
    pub fn with_top_n(mut self, top_n: TopN) -> Self {
        self.defaults.top_n = top_n;
        self.filters.get_mut().top_n = top_n;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn cache(&self) -> &CompareCache {
        &self.cache
    }

    pub fn state(&self) -> ViewState {
        self.state.get()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn filters(&self) -> FilterState {
        self.filters.borrow().clone()
    }

    pub fn provinces(&self) -> Vec<String> {
        self.provinces.borrow().clone()
    }

    /// Known years, newest first.
    pub fn years(&self) -> Vec<String> {
        self.years_desc.borrow().clone()
    }

    pub fn levels(&self) -> Vec<String> {
        self.levels.borrow().clone()
    }

    pub fn historical_catalog(&self) -> Ref<'_, CategoryCatalog> {
        self.historical.borrow()
    }

    pub fn snapshot_catalog(&self) -> Ref<'_, CategoryCatalog> {
        self.snapshot.borrow()
    }

    pub fn export_link(&self) -> String {
        export_url(&self.base_url, &self.filters.borrow())
    }

    fn begin(&self) -> Option<LoadingGuard<'_, R>> {
        if self.loading.replace(true) {
            return None;
        }
        self.renderer.set_loading(true);
        Some(LoadingGuard {
            flag: &self.loading,
            renderer: &self.renderer,
        })
    }

    /// Loads the option lists, resets the filters and builds the historical
    /// category list.
    pub async fn init_filters(&self) -> Outcome {
        let Some(_guard) = self.begin() else {
            return Outcome::Busy;
        };

        match self.load_options().await {
            Ok(()) => Outcome::Completed,
            Err(err) => {
                error!("filter initialization failed: {}", err);
                self.renderer.notify_failure(INIT_FAILED_NOTICE);
                Outcome::Failed
            }
        }
    }

    async fn load_options(&self) -> Result<()> {
        let (provinces, years, levels) = try_join3(
            self.source.provinces(),
            self.source.years(),
            self.source.levels(),
        )
        .await?;

        info!(
            "loaded {} provinces, {} years, {} levels",
            provinces.len(),
            years.len(),
            levels.len()
        );
        *self.provinces.borrow_mut() = provinces;
        *self.years_desc.borrow_mut() = years_descending(years);
        *self.levels.borrow_mut() = levels;

        *self.filters.borrow_mut() = self.defaults.clone();
        *self.historical.borrow_mut() = CategoryCatalog::new();
        *self.snapshot.borrow_mut() = CategoryCatalog::new();
        self.cache.clear();

        self.rebuild_historical().await
    }

    /// Picks a province by name, matching the known list case- and
    /// accent-insensitively and adopting its spelling.
    pub async fn select_province(&self, name: &str) -> Outcome {
        let province = self.resolve_province(name);
        self.change_filters(|filters| filters.province = province).await
    }

    fn resolve_province(&self, name: &str) -> String {
        let wanted = normalize_text(name);
        if wanted.is_empty() {
            return String::new();
        }
        self.provinces
            .borrow()
            .iter()
            .find(|known| normalize_text(known) == wanted)
            .cloned()
            .unwrap_or_else(|| name.trim().to_string())
    }

    pub async fn set_year(&self, year: YearFilter) -> Outcome {
        self.change_filters(|filters| {
            filters.year = year;
            filters.year_category = None;
        })
        .await
    }

    pub async fn set_level(&self, level: &str) -> Outcome {
        let level = level.trim().to_string();
        self.change_filters(|filters| filters.level = level).await
    }

    pub async fn set_view_mode(&self, view_mode: &str) -> Outcome {
        let view_mode = match view_mode.trim() {
            "" => DEFAULT_VIEW_MODE.to_string(),
            mode => mode.to_string(),
        };
        self.change_filters(|filters| filters.view_mode = view_mode).await
    }

    /// Clears the province and returns to the all-years view.
    pub async fn show_national(&self) -> Outcome {
        self.change_filters(|filters| {
            filters.province.clear();
            filters.year = YearFilter::All;
            filters.year_category = None;
        })
        .await
    }

    /// Replaces every filter at once, as a single filter change.
    pub async fn apply_filters(&self, mut next: FilterState) -> Outcome {
        next.province = self.resolve_province(&next.province);
        self.change_filters(|filters| *filters = next).await
    }

    async fn change_filters<F>(&self, mutate: F) -> Outcome
    where
        F: FnOnce(&mut FilterState),
    {
        let Some(_guard) = self.begin() else {
            debug!("filter change ignored while loading");
            return Outcome::Busy;
        };

        let year_all = {
            let mut filters = self.filters.borrow_mut();
            mutate(&mut filters);
            self.historical.borrow_mut().preselect(filters.category.clone());
            self.snapshot.borrow_mut().preselect(filters.year_category.clone());
            filters.year.is_all()
        };
        self.cache.clear();
        self.expand();

        if year_all {
            if let Err(err) = self.rebuild_historical().await {
                error!("category list rebuild failed: {}", err);
                self.renderer.notify_failure(REFRESH_FAILED_NOTICE);
                return Outcome::Failed;
            }
        }

        self.refresh_locked().await
    }

    async fn rebuild_historical(&self) -> Result<()> {
        let years = years_ascending(&self.years_desc.borrow());
        let (province, level) = {
            let filters = self.filters.borrow();
            (filters.province.clone(), filters.level.clone())
        };

        if let Some(entries) =
            historical_entries(&self.cache, &self.source, &years, &province, &level).await?
        {
            let mut catalog = self.historical.borrow_mut();
            catalog.apply_rebuild(entries);
            self.filters.borrow_mut().category = catalog.selected().map(str::to_string);
        }
        Ok(())
    }

    /// Chooses the category for the historical series. Unknown labels clear
    /// the choice.
    pub async fn set_category(&self, label: Option<&str>) -> Outcome {
        let Some(_guard) = self.begin() else {
            return Outcome::Busy;
        };
        {
            let mut catalog = self.historical.borrow_mut();
            if let Err(err) = catalog.select(label) {
                warn!("{}", err);
            }
            self.filters.borrow_mut().category = catalog.selected().map(str::to_string);
        }
        self.refresh_locked().await
    }

    /// Restricts the single-year ranking to one category.
    pub async fn set_year_category(&self, label: Option<&str>) -> Outcome {
        let Some(_guard) = self.begin() else {
            return Outcome::Busy;
        };
        {
            let mut catalog = self.snapshot.borrow_mut();
            if let Err(err) = catalog.select(label) {
                warn!("{}", err);
            }
            self.filters.borrow_mut().year_category = catalog.selected().map(str::to_string);
        }
        self.refresh_locked().await
    }

    pub async fn set_top_n(&self, top_n: TopN) -> Outcome {
        let Some(_guard) = self.begin() else {
            return Outcome::Busy;
        };
        self.filters.borrow_mut().top_n = top_n;
        self.refresh_locked().await
    }

    /// Collapses the panel and clears everything it showed.
    ///
    /// Returns `false` when an operation is in flight.
    pub fn reset(&self) -> bool {
        if self.loading.get() {
            return false;
        }
        self.state.set(ViewState::Collapsed);
        self.renderer.set_view_state(ViewState::Collapsed);
        self.release_chart();
        self.renderer.update_table(&[]);
        self.renderer.update_badges(&Badges::default());
        debug!("dashboard collapsed");
        true
    }

    fn expand(&self) {
        if self.state.replace(ViewState::Expanded) == ViewState::Collapsed {
            self.renderer.set_view_state(ViewState::Expanded);
            debug!("dashboard expanded");
        }
    }

    fn release_chart(&self) {
        if self.chart_live.replace(false) {
            self.renderer.destroy_chart();
        }
    }

    fn draw_chart<F>(&self, draw: F)
    where
        F: FnOnce(&R),
    {
        self.release_chart();
        draw(&self.renderer);
        self.chart_live.set(true);
    }

    /// Re-fetches and republishes the current view. Dropped when another
    /// operation is in flight.
    pub async fn refresh(&self) -> Outcome {
        let Some(_guard) = self.begin() else {
            debug!("refresh dropped: already loading");
            return Outcome::Busy;
        };
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Outcome {
        if self.state.get() == ViewState::Collapsed {
            return Outcome::Collapsed;
        }

        let started = Instant::now();
        match self.load_view().await {
            Ok(view) => {
                self.publish(view);
                info!("refresh completed in {:?}", started.elapsed());
                Outcome::Completed
            }
            Err(err) if err.is_fetch_failure() => {
                error!("refresh failed: {}", err);
                self.renderer.notify_failure(REFRESH_FAILED_NOTICE);
                Outcome::Failed
            }
            Err(err) => {
                warn!("refresh aborted: {}", err);
                self.renderer.notify_failure(REFRESH_FAILED_NOTICE);
                Outcome::Failed
            }
        }
    }

    async fn load_view(&self) -> Result<LoadedView> {
        let filters = self.filters.borrow().clone();
        let province = Some(filters.province.as_str()).filter(|name| !name.is_empty());

        let totals = try_join(
            self.source.total_offering(province),
            self.source.total_programs(province),
        );
        let ((offering, programs), branch) = try_join(totals, self.load_branch(&filters)).await?;

        Ok(LoadedView {
            offering,
            programs,
            branch,
        })
    }

    async fn load_branch(&self, filters: &FilterState) -> Result<BranchView> {
        match &filters.year {
            YearFilter::All => {
                let years = years_ascending(&self.years_desc.borrow());
                if years.is_empty() {
                    return Err(DashboardError::EmptyYearSet);
                }
                let Some(category) = filters.category.as_deref() else {
                    return Ok(BranchView::Unselected);
                };

                let merged = fetch_years(
                    &self.cache,
                    &self.source,
                    &years,
                    &filters.province,
                    &filters.level,
                )
                .await?;
                Ok(BranchView::Historical(historical_series(
                    category, &years, &merged,
                )))
            }
            YearFilter::Year(year) => {
                let tuple = filters.tuple();
                let records = self.cache.fetch_merged(&self.source, &tuple).await?;

                let mut catalog = self.snapshot.borrow().clone();
                catalog.rebuild_snapshot(&records);
                let snapshot = snapshot_ranking(year, &records, catalog.selected(), filters.top_n);
                Ok(BranchView::Year { snapshot, catalog })
            }
        }
    }

    fn publish(&self, view: LoadedView) {
        let (enrolled, graduated) = match view.branch {
            BranchView::Unselected => {
                self.renderer.update_table(&[]);
                self.release_chart();
                (0.0, 0.0)
            }
            BranchView::Historical(series) => {
                self.renderer.update_table(&[series.summary_row()]);
                self.draw_chart(|renderer| renderer.render_series(&series));
                (series.total_enrolled, series.total_graduated)
            }
            BranchView::Year { snapshot, catalog } => {
                self.filters.borrow_mut().year_category = catalog.selected().map(str::to_string);
                *self.snapshot.borrow_mut() = catalog;

                self.renderer.update_table(snapshot.table_rows());
                if snapshot.rows.is_empty() {
                    self.release_chart();
                } else {
                    self.draw_chart(|renderer| renderer.render_ranking(&snapshot));
                }
                (snapshot.total_enrolled(), snapshot.total_graduated())
            }
        };

        self.renderer.update_badges(&Badges {
            offering: view.offering,
            programs: view.programs,
            enrolled,
            graduated,
        });
        self.renderer.set_export_link(&self.export_link());
    }

    /// Totals for the selected year (or the latest known year when showing
    /// all years) under the current province and level.
    pub async fn open_comparison(&self) -> Outcome {
        let Some(_guard) = self.begin() else {
            return Outcome::Busy;
        };

        let (tuple, province_label) = {
            let filters = self.filters.borrow();
            let year = match &filters.year {
                YearFilter::All => self
                    .years_desc
                    .borrow()
                    .first()
                    .map_or(YearFilter::All, |latest| YearFilter::Year(latest.clone())),
                year => year.clone(),
            };
            (
                FilterTuple::new(&filters.province, year, &filters.level),
                filters.province_label().to_string(),
            )
        };

        match self.cache.fetch_merged(&self.source, &tuple).await {
            Ok(records) => {
                let year_label = match &tuple.year {
                    YearFilter::All => "-",
                    YearFilter::Year(year) => year.as_str(),
                };
                let summary = year_summary(&province_label, year_label, &records);
                self.renderer.show_comparison(&summary);
                Outcome::Completed
            }
            Err(err) => {
                error!("comparison failed: {}", err);
                self.renderer.notify_failure(COMPARISON_FAILED_NOTICE);
                Outcome::Failed
            }
        }
    }
}
