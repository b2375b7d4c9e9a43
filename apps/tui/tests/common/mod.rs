#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use enrollment_dash::domain::{
    AggregateRow, Badges, ComparisonSummary, FilterTuple, Snapshot, TimeSeries, ViewState,
};
use enrollment_dash::extract::Row;
use enrollment_dash::source::as_row;
use enrollment_dash::{DashboardError, DataSource, Renderer, Result, ViewController};

pub fn row(category: &str, offering: f64, enrolled: f64, graduated: f64) -> Row {
    as_row(json!({
        "campo": category,
        "oferta": offering,
        "matriculados": enrolled,
        "titulados": graduated,
    }))
}

/// In-memory backend with call counters, failure switches and a gate that
/// holds the scalar-total request until released.
#[derive(Default)]
pub struct ScriptedSource {
    pub provinces: Vec<String>,
    pub years: Vec<String>,
    pub levels: Vec<String>,
    pub offering: f64,
    pub programs: f64,
    /// Rows per year; `ALL` rows are the concatenation of every year.
    pub rows: HashMap<String, Vec<Row>>,
    /// Rows per year for provinces that differ from `rows`, keyed by the
    /// province's exact spelling.
    pub province_rows: HashMap<String, HashMap<String, Vec<Row>>>,
    pub merged_calls: Cell<usize>,
    pub total_calls: Cell<usize>,
    pub requested: RefCell<Vec<FilterTuple>>,
    pub fail_merged: Cell<bool>,
    pub fail_totals: Cell<bool>,
    pub fail_options: Cell<bool>,
    gate: RefCell<Option<Rc<Notify>>>,
}

impl ScriptedSource {
    /// Three years of data, returned out of order like the backend. Loja has
    /// its own rows without INGENIERIA; every other filter sees the same data.
    pub fn sample() -> Self {
        let mut rows = HashMap::new();
        rows.insert(
            "2021".to_string(),
            vec![row("INGENIERIA", 10.0, 100.0, 5.0), row("Salud", 3.0, 9.0, 1.0)],
        );
        rows.insert(
            "2022".to_string(),
            vec![
                row("Ingeniería", 12.0, 120.0, 6.0),
                row("Biología", 5.0, 30.0, 0.0),
                row("Artes", 5.0, 50.0, 0.0),
            ],
        );
        rows.insert("2023".to_string(), vec![row("ingenieria", 11.0, 90.0, 7.0)]);

        let mut loja = HashMap::new();
        loja.insert("2021".to_string(), vec![row("Salud", 2.0, 20.0, 1.0)]);
        loja.insert("2022".to_string(), vec![row("Artes", 1.0, 10.0, 0.0)]);
        loja.insert("2023".to_string(), vec![row("SALUD", 1.0, 12.0, 0.0)]);
        let mut province_rows = HashMap::new();
        province_rows.insert("Loja".to_string(), loja);

        Self {
            province_rows,
            provinces: vec!["Azuay".into(), "Cañar".into(), "Loja".into()],
            years: vec!["2022".into(), "2021".into(), "2023".into()],
            levels: vec!["Tercer nivel".into(), "Cuarto nivel".into()],
            offering: 420.0,
            programs: 37.0,
            rows,
            ..Self::default()
        }
    }

    /// Blocks the next offering-total request until the returned handle is
    /// notified.
    pub fn arm_gate(&self) -> Rc<Notify> {
        let gate = Rc::new(Notify::new());
        *self.gate.borrow_mut() = Some(Rc::clone(&gate));
        gate
    }

    fn failure(path: &str) -> DashboardError {
        DashboardError::Fetch {
            url: path.to_string(),
            status: Some(500),
            body: "internal error".to_string(),
        }
    }
}

#[async_trait(?Send)]
impl DataSource for ScriptedSource {
    async fn provinces(&self) -> Result<Vec<String>> {
        if self.fail_options.get() {
            return Err(Self::failure("/api/provincias_list"));
        }
        Ok(self.provinces.clone())
    }

    async fn years(&self) -> Result<Vec<String>> {
        Ok(self.years.clone())
    }

    async fn levels(&self) -> Result<Vec<String>> {
        Ok(self.levels.clone())
    }

    async fn total_offering(&self, _province: Option<&str>) -> Result<f64> {
        self.total_calls.set(self.total_calls.get() + 1);
        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_totals.get() {
            return Err(Self::failure("/api/total_oferta_provincia"));
        }
        Ok(self.offering)
    }

    async fn total_programs(&self, _province: Option<&str>) -> Result<f64> {
        if self.fail_totals.get() {
            return Err(Self::failure("/api/total_carreras_provincia"));
        }
        Ok(self.programs)
    }

    async fn merged_rows(&self, tuple: &FilterTuple) -> Result<Vec<Row>> {
        self.merged_calls.set(self.merged_calls.get() + 1);
        self.requested.borrow_mut().push(tuple.clone());
        if self.fail_merged.get() {
            return Err(Self::failure("/api/compare"));
        }

        let rows = self.province_rows.get(&tuple.province).unwrap_or(&self.rows);
        if tuple.year.is_all() {
            let mut years: Vec<&String> = rows.keys().collect();
            years.sort();
            return Ok(years
                .into_iter()
                .flat_map(|year| rows[year].iter().cloned())
                .collect());
        }
        Ok(rows.get(tuple.year.as_str()).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Published {
    Loading(bool),
    ViewState(ViewState),
    Series(TimeSeries),
    Ranking(Snapshot),
    DestroyChart,
    Table(Vec<AggregateRow>),
    Badges(Badges),
    ExportLink(String),
    Comparison(ComparisonSummary),
    Failure(String),
}

/// [`Renderer`] that records every call in order.
#[derive(Default)]
pub struct RecordingRenderer {
    pub events: RefCell<Vec<Published>>,
}

impl RecordingRenderer {
    fn push(&self, event: Published) {
        self.events.borrow_mut().push(event);
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn since(&self, mark: usize) -> Vec<Published> {
        self.events.borrow()[mark..].to_vec()
    }

    pub fn last_badges(&self) -> Option<Badges> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            Published::Badges(badges) => Some(*badges),
            _ => None,
        })
    }

    pub fn last_table(&self) -> Option<Vec<AggregateRow>> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            Published::Table(rows) => Some(rows.clone()),
            _ => None,
        })
    }

    pub fn last_series(&self) -> Option<TimeSeries> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            Published::Series(series) => Some(series.clone()),
            _ => None,
        })
    }

    pub fn last_ranking(&self) -> Option<Snapshot> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            Published::Ranking(snapshot) => Some(snapshot.clone()),
            _ => None,
        })
    }

    pub fn last_export_link(&self) -> Option<String> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            Published::ExportLink(link) => Some(link.clone()),
            _ => None,
        })
    }

    pub fn failures(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Published::Failure(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn set_loading(&self, loading: bool) {
        self.push(Published::Loading(loading));
    }

    fn set_view_state(&self, state: ViewState) {
        self.push(Published::ViewState(state));
    }

    fn render_series(&self, series: &TimeSeries) {
        self.push(Published::Series(series.clone()));
    }

    fn render_ranking(&self, snapshot: &Snapshot) {
        self.push(Published::Ranking(snapshot.clone()));
    }

    fn destroy_chart(&self) {
        self.push(Published::DestroyChart);
    }

    fn update_table(&self, rows: &[AggregateRow]) {
        self.push(Published::Table(rows.to_vec()));
    }

    fn update_badges(&self, badges: &Badges) {
        self.push(Published::Badges(*badges));
    }

    fn set_export_link(&self, url: &str) {
        self.push(Published::ExportLink(url.to_string()));
    }

    fn show_comparison(&self, summary: &ComparisonSummary) {
        self.push(Published::Comparison(summary.clone()));
    }

    fn notify_failure(&self, message: &str) {
        self.push(Published::Failure(message.to_string()));
    }
}

pub type TestController = ViewController<ScriptedSource, RecordingRenderer>;

pub fn controller(source: ScriptedSource) -> TestController {
    ViewController::new(source, RecordingRenderer::default(), "http://stats.test")
}
