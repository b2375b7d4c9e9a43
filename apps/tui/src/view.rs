//! Publishing surface of the controller.

use std::cell::{Ref, RefCell};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::warn;

use crate::domain::{AggregateRow, Badges, ComparisonSummary, Snapshot, TimeSeries, ViewState};

/// Everything the controller hands to the chart, table and badge widgets.
///
/// Chart rendering is paired: the controller calls [`Renderer::destroy_chart`]
/// before every `render_*` call once a chart is on screen.
pub trait Renderer {
    fn set_loading(&self, loading: bool);

    fn set_view_state(&self, state: ViewState);

    fn render_series(&self, series: &TimeSeries);

    fn render_ranking(&self, snapshot: &Snapshot);

    fn destroy_chart(&self);

    fn update_table(&self, rows: &[AggregateRow]);

    fn update_badges(&self, badges: &Badges);

    fn set_export_link(&self, url: &str);

    fn show_comparison(&self, summary: &ComparisonSummary);

    fn notify_failure(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartView {
    Series(TimeSeries),
    Ranking(Snapshot),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub loading: bool,
    pub state: ViewState,
    pub chart: Option<ChartView>,
    pub table: Vec<AggregateRow>,
    pub badges: Badges,
    pub export_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip)]
    pub updated_at: Option<DateTime<Local>>,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self {
            loading: false,
            state: ViewState::Collapsed,
            chart: None,
            table: Vec::new(),
            badges: Badges::default(),
            export_link: String::new(),
            comparison: None,
            notice: None,
            updated_at: None,
        }
    }
}

/// [`Renderer`] that keeps the published state for the terminal UI to draw.
#[derive(Debug, Default)]
pub struct DashboardView {
    model: RefCell<ViewModel>,
}

impl DashboardView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> Ref<'_, ViewModel> {
        self.model.borrow()
    }

    pub fn dismiss_notice(&self) {
        self.model.borrow_mut().notice = None;
    }

    pub fn close_comparison(&self) {
        self.model.borrow_mut().comparison = None;
    }

    fn place_chart(&self, chart: ChartView) {
        let mut model = self.model.borrow_mut();
        if model.chart.is_some() {
            warn!("chart rendered without releasing the previous one");
        }
        model.chart = Some(chart);
        model.updated_at = Some(Local::now());
    }
}

impl Renderer for DashboardView {
    fn set_loading(&self, loading: bool) {
        self.model.borrow_mut().loading = loading;
    }

    fn set_view_state(&self, state: ViewState) {
        self.model.borrow_mut().state = state;
    }

    fn render_series(&self, series: &TimeSeries) {
        self.place_chart(ChartView::Series(series.clone()));
    }

    fn render_ranking(&self, snapshot: &Snapshot) {
        self.place_chart(ChartView::Ranking(snapshot.clone()));
    }

    fn destroy_chart(&self) {
        self.model.borrow_mut().chart = None;
    }

    fn update_table(&self, rows: &[AggregateRow]) {
        self.model.borrow_mut().table = rows.to_vec();
    }

    fn update_badges(&self, badges: &Badges) {
        let mut model = self.model.borrow_mut();
        model.badges = *badges;
        model.updated_at = Some(Local::now());
    }

    fn set_export_link(&self, url: &str) {
        self.model.borrow_mut().export_link = url.to_string();
    }

    fn show_comparison(&self, summary: &ComparisonSummary) {
        self.model.borrow_mut().comparison = Some(summary.clone());
    }

    fn notify_failure(&self, message: &str) {
        self.model.borrow_mut().notice = Some(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> TimeSeries {
        TimeSeries {
            category_label: "Salud".into(),
            years: vec!["2022".into()],
            offering: vec![1.0],
            enrolled: vec![2.0],
            graduated: vec![0.0],
            total_offering: 1.0,
            total_enrolled: 2.0,
            total_graduated: 0.0,
        }
    }

    #[test]
    fn view_model_tracks_published_state() {
        let view = DashboardView::new();
        view.set_view_state(ViewState::Expanded);
        view.render_series(&series());
        view.update_badges(&Badges {
            offering: 10.0,
            programs: 3.0,
            enrolled: 2.0,
            graduated: 0.0,
        });

        let model = view.model();
        assert_eq!(model.state, ViewState::Expanded);
        assert!(matches!(model.chart, Some(ChartView::Series(_))));
        assert_eq!(model.badges.programs, 3.0);
        assert!(model.updated_at.is_some());
    }

    #[test]
    fn destroy_and_notice_handling() {
        let view = DashboardView::new();
        view.render_series(&series());
        view.destroy_chart();
        view.notify_failure("Error loading data.");
        assert!(view.model().chart.is_none());
        assert_eq!(view.model().notice.as_deref(), Some("Error loading data."));
        view.dismiss_notice();
        assert!(view.model().notice.is_none());
    }

    #[test]
    fn serializes_chart_with_kind_tag() {
        let view = DashboardView::new();
        view.render_series(&series());
        let json = serde_json::to_value(&*view.model()).unwrap();
        assert_eq!(json["chart"]["kind"], "series");
        assert_eq!(json["state"], "collapsed");
    }
}
