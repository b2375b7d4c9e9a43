use serde::{Serialize, Serializer};

use crate::normalize::normalize_text;

/// Year filter value used when no specific year is selected.
pub const ALL_YEARS: &str = "ALL";

/// View mode the dashboard starts in.
pub const DEFAULT_VIEW_MODE: &str = "nacional";

/// Province label shown when no province is selected.
pub const NATIONAL_LABEL: &str = "NACIONAL";

/// Maximum number of rows handed to the table collaborator.
pub const TABLE_ROW_CAP: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum YearFilter {
    #[default]
    All,
    Year(String),
}

impl YearFilter {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_YEARS) {
            Self::All
        } else {
            Self::Year(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_YEARS,
            Self::Year(year) => year,
        }
    }

    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl Serialize for YearFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Number of bars drawn in the snapshot chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TopN {
    Ten,
    #[default]
    Twenty,
    Thirty,
    Fifty,
}

impl TopN {
    pub const fn value(self) -> usize {
        match self {
            Self::Ten => 10,
            Self::Twenty => 20,
            Self::Thirty => 30,
            Self::Fifty => 50,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "10" => Some(Self::Ten),
            "20" => Some(Self::Twenty),
            "30" => Some(Self::Thirty),
            "50" => Some(Self::Fifty),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Ten => "Top 10",
            Self::Twenty => "Top 20",
            Self::Thirty => "Top 30",
            Self::Fifty => "Top 50",
        }
    }

    pub const fn next(self) -> Self {
        match self {
            Self::Ten => Self::Twenty,
            Self::Twenty => Self::Thirty,
            Self::Thirty => Self::Fifty,
            Self::Fifty => Self::Ten,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    Collapsed,
    Expanded,
}

/// The three filter dimensions that select a merged-row request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterTuple {
    pub province: String,
    pub year: YearFilter,
    pub level: String,
}

impl FilterTuple {
    pub fn new(province: &str, year: YearFilter, level: &str) -> Self {
        Self {
            province: province.to_string(),
            year,
            level: level.to_string(),
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        let province = if self.province.trim().is_empty() {
            NATIONAL_LABEL.to_string()
        } else {
            normalize_text(&self.province)
        };
        let level = if self.level.trim().is_empty() {
            "ALL".to_string()
        } else {
            normalize_text(&self.level)
        };

        CacheKey {
            province,
            year: self.year.as_str().to_string(),
            level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub province: String,
    pub year: String,
    pub level: String,
}

/// Everything the user can change from the filter bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub province: String,
    pub year: YearFilter,
    pub level: String,
    pub view_mode: String,
    /// Category label picked for the historical series.
    pub category: Option<String>,
    /// Category label restricting the single-year ranking.
    pub year_category: Option<String>,
    pub top_n: TopN,
}

impl FilterState {
    pub fn tuple(&self) -> FilterTuple {
        FilterTuple::new(&self.province, self.year.clone(), &self.level)
    }

    pub fn province_label(&self) -> &str {
        if self.province.is_empty() {
            NATIONAL_LABEL
        } else {
            &self.province
        }
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            province: String::new(),
            year: YearFilter::All,
            level: String::new(),
            view_mode: DEFAULT_VIEW_MODE.to_string(),
            category: None,
            year_category: None,
            top_n: TopN::default(),
        }
    }
}

/// One backend row after field extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub province: String,
    pub year: String,
    pub level: String,
    pub category_raw: String,
    pub category_key: String,
    pub offering: f64,
    pub enrolled: f64,
    pub graduated: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub category_label: String,
    #[serde(skip)]
    pub category_key: String,
    pub offering: f64,
    pub enrolled: f64,
    pub graduated: f64,
}

impl AggregateRow {
    pub fn new(category_key: &str, category_label: &str) -> Self {
        Self {
            category_label: category_label.to_string(),
            category_key: category_key.to_string(),
            offering: 0.0,
            enrolled: 0.0,
            graduated: 0.0,
        }
    }

    pub fn add(&mut self, record: &Record) {
        self.offering += record.offering;
        self.enrolled += record.enrolled;
        self.graduated += record.graduated;
    }

    pub fn enrolled_per_offering(&self) -> Option<f64> {
        ratio(self.enrolled, self.offering)
    }

    pub fn graduated_per_offering(&self) -> Option<f64> {
        ratio(self.graduated, self.offering)
    }
}

pub fn ratio(numerator: f64, offering: f64) -> Option<f64> {
    (offering > 0.0).then(|| numerator / offering)
}

/// Multi-year trend for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub category_label: String,
    pub years: Vec<String>,
    pub offering: Vec<f64>,
    pub enrolled: Vec<f64>,
    pub graduated: Vec<f64>,
    pub total_offering: f64,
    pub total_enrolled: f64,
    pub total_graduated: f64,
}

impl TimeSeries {
    pub fn summary_row(&self) -> AggregateRow {
        AggregateRow {
            category_label: self.category_label.clone(),
            category_key: normalize_text(&self.category_label),
            offering: self.total_offering,
            enrolled: self.total_enrolled,
            graduated: self.total_graduated,
        }
    }
}

/// Single-year ranking across categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub year: String,
    pub rows: Vec<AggregateRow>,
    pub category_filter: Option<String>,
    pub chart_cap: usize,
}

impl Snapshot {
    pub fn chart_rows(&self) -> &[AggregateRow] {
        &self.rows[..self.chart_cap.min(self.rows.len())]
    }

    pub fn table_rows(&self) -> &[AggregateRow] {
        &self.rows[..TABLE_ROW_CAP.min(self.rows.len())]
    }

    pub fn total_enrolled(&self) -> f64 {
        self.rows.iter().map(|row| row.enrolled).sum()
    }

    pub fn total_graduated(&self) -> f64 {
        self.rows.iter().map(|row| row.graduated).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Badges {
    pub offering: f64,
    pub programs: f64,
    pub enrolled: f64,
    pub graduated: f64,
}

/// Totals for one province/year pair, shown in the comparison popup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub province: String,
    pub year: String,
    pub offering: f64,
    pub enrolled: f64,
    pub graduated: f64,
    pub enrolled_per_offering: Option<f64>,
    pub graduated_per_offering: Option<f64>,
}
