mod common;

use common::{controller, Published, ScriptedSource, TestController};
use enrollment_dash::controller::{
    COMPARISON_FAILED_NOTICE, INIT_FAILED_NOTICE, REFRESH_FAILED_NOTICE,
};
use enrollment_dash::domain::Badges;
use enrollment_dash::{Outcome, TopN, ViewState, YearFilter};

fn year(value: &str) -> YearFilter {
    YearFilter::Year(value.to_string())
}

/// Initialized, expanded on Azuay, historical series for INGENIERIA shown.
async fn historical_ready() -> TestController {
    let c = controller(ScriptedSource::sample());
    assert_eq!(c.init_filters().await, Outcome::Completed);
    assert_eq!(c.select_province("azuay").await, Outcome::Completed);
    assert_eq!(c.set_category(Some("ingenieria")).await, Outcome::Completed);
    c
}

#[tokio::test]
async fn starts_collapsed_and_ignores_refresh() {
    let c = controller(ScriptedSource::sample());

    assert_eq!(c.state(), ViewState::Collapsed);
    assert_eq!(c.renderer().last_badges(), Some(Badges::default()));
    assert_eq!(c.refresh().await, Outcome::Collapsed);
    assert_eq!(c.source().total_calls.get(), 0);
    assert_eq!(c.source().merged_calls.get(), 0);
    assert!(!c.is_loading());
}

#[tokio::test]
async fn init_loads_options_and_historical_categories() {
    let c = controller(ScriptedSource::sample());
    assert_eq!(c.init_filters().await, Outcome::Completed);

    assert_eq!(c.years(), ["2023", "2022", "2021"]);
    assert_eq!(c.provinces().len(), 3);
    assert_eq!(
        c.historical_catalog().labels(),
        ["Artes", "Biología", "INGENIERIA", "Salud"]
    );
    // one request per year
    assert_eq!(c.source().merged_calls.get(), 3);
    assert_eq!(c.state(), ViewState::Collapsed);
}

#[tokio::test]
async fn init_failure_shows_notice() {
    let source = ScriptedSource::sample();
    source.fail_options.set(true);
    let c = controller(source);

    assert_eq!(c.init_filters().await, Outcome::Failed);
    assert_eq!(c.renderer().failures(), [INIT_FAILED_NOTICE]);
    assert!(!c.is_loading());
}

#[tokio::test]
async fn province_selection_adopts_known_spelling() {
    let c = controller(ScriptedSource::sample());
    c.init_filters().await;

    c.select_province("CANAR").await;
    assert_eq!(c.filters().province, "Cañar");
    assert_eq!(c.state(), ViewState::Expanded);

    c.select_province("Galápagos").await;
    assert_eq!(c.filters().province, "Galápagos");
}

#[tokio::test]
async fn historical_series_sums_each_year() {
    let c = historical_ready().await;

    let series = c.renderer().last_series().unwrap();
    assert_eq!(series.years, ["2021", "2022", "2023"]);
    assert_eq!(series.enrolled, [100.0, 120.0, 90.0]);
    assert_eq!(series.offering, [10.0, 12.0, 11.0]);

    let badges = c.renderer().last_badges().unwrap();
    assert_eq!(badges.enrolled, 310.0);
    assert_eq!(badges.graduated, 18.0);
    assert_eq!(badges.offering, 420.0);
    assert_eq!(badges.programs, 37.0);

    let table = c.renderer().last_table().unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table[0].offering, 33.0);
    assert_eq!(
        c.renderer().last_export_link().as_deref(),
        Some("http://stats.test/api/export_compare_csv?provincia=Azuay")
    );
}

#[tokio::test]
async fn historical_without_category_publishes_totals_only() {
    let c = controller(ScriptedSource::sample());
    c.init_filters().await;
    assert_eq!(c.show_national().await, Outcome::Completed);

    assert_eq!(c.renderer().last_table(), Some(Vec::new()));
    assert!(c.renderer().last_series().is_none());
    let badges = c.renderer().last_badges().unwrap();
    assert_eq!((badges.offering, badges.enrolled), (420.0, 0.0));
}

#[tokio::test]
async fn historical_category_resets_when_province_lacks_it() {
    let c = historical_ready().await;
    let mark = c.renderer().len();

    assert_eq!(c.select_province("loja").await, Outcome::Completed);
    assert_eq!(c.filters().category, None);
    assert_eq!(c.historical_catalog().labels(), ["Artes", "Salud"]);
    assert_eq!(c.historical_catalog().selected(), None);
    assert_eq!(c.renderer().last_table(), Some(Vec::new()));

    let published = c.renderer().since(mark);
    assert!(published.contains(&Published::DestroyChart));
    assert!(!published
        .iter()
        .any(|event| matches!(event, Published::Series(_) | Published::Ranking(_))));
}

#[tokio::test]
async fn historical_category_survives_filter_changes_that_keep_it() {
    let c = historical_ready().await;
    c.select_province("Loja").await;

    assert_eq!(c.set_category(Some("salud")).await, Outcome::Completed);
    assert_eq!(c.filters().category.as_deref(), Some("Salud"));
    assert_eq!(c.renderer().last_series().unwrap().enrolled, [20.0, 0.0, 12.0]);

    assert_eq!(c.set_level("Tercer nivel").await, Outcome::Completed);
    assert_eq!(c.filters().category.as_deref(), Some("Salud"));

    assert_eq!(c.select_province("Azuay").await, Outcome::Completed);
    assert_eq!(c.filters().category.as_deref(), Some("Salud"));
    let series = c.renderer().last_series().unwrap();
    assert_eq!(series.category_label, "Salud");
    assert_eq!(series.enrolled, [9.0, 0.0, 0.0]);
}

#[tokio::test]
async fn snapshot_ranks_by_offering_then_enrolled() {
    let c = historical_ready().await;
    assert_eq!(c.set_year(year("2022")).await, Outcome::Completed);

    let snapshot = c.renderer().last_ranking().unwrap();
    let labels: Vec<_> = snapshot
        .rows
        .iter()
        .map(|row| row.category_label.as_str())
        .collect();
    assert_eq!(labels, ["Ingeniería", "Artes", "Biología"]);
    assert_eq!(snapshot.chart_cap, 3);
    assert_eq!(c.renderer().last_badges().unwrap().enrolled, 200.0);
    assert_eq!(
        c.snapshot_catalog().labels(),
        ["Artes", "Biología", "Ingeniería"]
    );
    assert_eq!(
        c.renderer().last_export_link().as_deref(),
        Some("http://stats.test/api/export_compare_csv?provincia=Azuay&anio=2022")
    );
}

#[tokio::test]
async fn year_category_filters_and_resets_on_year_change() {
    let c = historical_ready().await;
    c.set_year(year("2022")).await;

    assert_eq!(c.set_year_category(Some("artes")).await, Outcome::Completed);
    let snapshot = c.renderer().last_ranking().unwrap();
    assert_eq!(snapshot.rows.len(), 1);
    assert_eq!(snapshot.chart_cap, 1);
    assert_eq!(c.filters().year_category.as_deref(), Some("Artes"));

    c.set_year(year("2021")).await;
    assert_eq!(c.filters().year_category, None);
    assert_eq!(c.renderer().last_ranking().unwrap().rows.len(), 2);

    c.set_year_category(Some("Física")).await;
    assert_eq!(c.filters().year_category, None);
    assert_eq!(c.renderer().last_ranking().unwrap().rows.len(), 2);
}

#[tokio::test]
async fn identical_refresh_is_served_from_cache() {
    let c = historical_ready().await;
    c.set_year(year("2022")).await;
    let calls = c.source().merged_calls.get();

    c.refresh().await;
    c.set_top_n(TopN::Ten).await;
    assert_eq!(c.source().merged_calls.get(), calls);
    assert_eq!(c.filters().top_n, TopN::Ten);
}

#[tokio::test]
async fn filter_change_invalidates_the_whole_cache() {
    let c = historical_ready().await;
    c.set_year(year("2022")).await;
    let calls = c.source().merged_calls.get();

    c.set_level("Tercer nivel").await;
    assert_eq!(c.source().merged_calls.get(), calls + 1);

    // the level-less tuple was cached before, but the cache was cleared
    c.set_level("").await;
    assert_eq!(c.source().merged_calls.get(), calls + 2);
    assert!(c.cache().len() <= 1);
}

#[tokio::test]
async fn second_refresh_while_first_pends_is_dropped() {
    let c = historical_ready().await;
    let gate = c.source().arm_gate();
    let before = c.source().total_calls.get();

    let (first, second) = tokio::join!(c.refresh(), async {
        tokio::task::yield_now().await;
        assert!(c.is_loading());
        let outcome = c.refresh().await;
        gate.notify_one();
        outcome
    });

    assert_eq!(first, Outcome::Completed);
    assert_eq!(second, Outcome::Busy);
    assert_eq!(c.source().total_calls.get(), before + 1);
    assert!(!c.is_loading());
}

#[tokio::test]
async fn filter_changes_are_ignored_while_loading() {
    let c = historical_ready().await;
    let gate = c.source().arm_gate();

    let (_, change) = tokio::join!(c.refresh(), async {
        tokio::task::yield_now().await;
        let outcome = c.set_year(year("2022")).await;
        gate.notify_one();
        outcome
    });

    assert_eq!(change, Outcome::Busy);
    assert_eq!(c.filters().year, YearFilter::All);
}

#[tokio::test]
async fn failed_refresh_leaves_display_untouched() {
    let c = historical_ready().await;
    c.source().fail_totals.set(true);
    let mark = c.renderer().len();

    assert_eq!(c.refresh().await, Outcome::Failed);
    assert_eq!(
        c.renderer().since(mark),
        [
            Published::Loading(true),
            Published::Failure(REFRESH_FAILED_NOTICE.to_string()),
            Published::Loading(false),
        ]
    );
    assert!(!c.is_loading());
}

#[tokio::test]
async fn failed_category_rebuild_aborts_the_filter_change() {
    let c = historical_ready().await;
    c.source().fail_merged.set(true);
    let mark = c.renderer().len();

    assert_eq!(c.select_province("Loja").await, Outcome::Failed);
    assert!(c
        .renderer()
        .since(mark)
        .iter()
        .all(|event| matches!(event, Published::Loading(_) | Published::Failure(_))));
    assert!(!c.is_loading());
}

#[tokio::test]
async fn empty_year_set_fails_historical_refresh() {
    let mut source = ScriptedSource::sample();
    source.years.clear();
    let c = controller(source);

    assert_eq!(c.init_filters().await, Outcome::Completed);
    assert_eq!(c.show_national().await, Outcome::Failed);
    assert_eq!(c.renderer().failures(), [REFRESH_FAILED_NOTICE]);
}

#[tokio::test]
async fn chart_is_released_before_each_render() {
    let c = historical_ready().await;
    let mark = c.renderer().len();

    c.refresh().await;
    c.set_year(year("2022")).await;

    let charts: Vec<_> = c
        .renderer()
        .since(mark)
        .into_iter()
        .filter(|event| {
            matches!(
                event,
                Published::DestroyChart | Published::Series(_) | Published::Ranking(_)
            )
        })
        .collect();
    assert_eq!(charts.len(), 4);
    assert_eq!(charts[0], Published::DestroyChart);
    assert!(matches!(charts[1], Published::Series(_)));
    assert_eq!(charts[2], Published::DestroyChart);
    assert!(matches!(charts[3], Published::Ranking(_)));
}

#[tokio::test]
async fn reset_collapses_and_clears() {
    let c = historical_ready().await;
    let mark = c.renderer().len();

    assert!(c.reset());
    assert_eq!(c.state(), ViewState::Collapsed);
    assert_eq!(
        c.renderer().since(mark),
        [
            Published::ViewState(ViewState::Collapsed),
            Published::DestroyChart,
            Published::Table(Vec::new()),
            Published::Badges(Badges::default()),
        ]
    );

    let calls = c.source().total_calls.get();
    assert_eq!(c.refresh().await, Outcome::Collapsed);
    assert_eq!(c.source().total_calls.get(), calls);
}

#[tokio::test]
async fn comparison_uses_latest_year_when_showing_all() {
    let c = historical_ready().await;

    assert_eq!(c.open_comparison().await, Outcome::Completed);
    let summary = c
        .renderer()
        .events
        .borrow()
        .iter()
        .rev()
        .find_map(|event| match event {
            Published::Comparison(summary) => Some(summary.clone()),
            _ => None,
        })
        .unwrap();

    assert_eq!(summary.province, "Azuay");
    assert_eq!(summary.year, "2023");
    assert_eq!((summary.offering, summary.enrolled, summary.graduated), (11.0, 90.0, 7.0));
    assert_eq!(summary.enrolled_per_offering, Some(90.0 / 11.0));
}

#[tokio::test]
async fn comparison_failure_shows_notice() {
    let mut source = ScriptedSource::sample();
    source.years.clear();
    let c = controller(source);
    c.init_filters().await;
    c.source().fail_merged.set(true);

    assert_eq!(c.open_comparison().await, Outcome::Failed);
    assert_eq!(c.renderer().failures(), [COMPARISON_FAILED_NOTICE]);
    assert!(!c.is_loading());
}
