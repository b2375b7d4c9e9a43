//! Schema-tolerant field lookup for backend rows.
//!
//! The backend has shipped the same metrics under several column names over
//! time. Each metric is described by an ordered list of candidate keys paired
//! with a parser; the first candidate that is present and parses wins.

use serde_json::{Map, Value};

use crate::domain::Record;
use crate::normalize::normalize_text;

pub type Row = Map<String, Value>;

pub type Parser<T> = fn(&Value) -> Option<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Offering,
    Enrolled,
    Graduated,
}

impl Metric {
    const fn candidates(self) -> &'static [(&'static str, Parser<f64>)] {
        match self {
            Self::Offering => OFFERING_FIELDS,
            Self::Enrolled => ENROLLED_FIELDS,
            Self::Graduated => GRADUATED_FIELDS,
        }
    }
}

const OFFERING_FIELDS: &[(&str, Parser<f64>)] = &[
    ("oferta", parse_count),
    ("OFERTA", parse_count),
    ("oferta_actual", parse_count),
    ("OFERTA_ACTUAL", parse_count),
    ("oferta_vigente", parse_count),
    ("OFERTA_VIGENTE", parse_count),
    ("programas", parse_count),
    ("PROGRAMAS", parse_count),
    ("total_oferta", parse_count),
    ("TOTAL_OFERTA", parse_count),
];

const ENROLLED_FIELDS: &[(&str, Parser<f64>)] = &[
    ("matriculados", parse_count),
    ("MATRICULADOS", parse_count),
    ("total_matriculados", parse_count),
    ("TOTAL_MATRICULADOS", parse_count),
];

const GRADUATED_FIELDS: &[(&str, Parser<f64>)] = &[
    ("titulados", parse_count),
    ("TITULADOS", parse_count),
    ("titulados_totales", parse_count),
    ("TITULADOS_TOTALES", parse_count),
    ("total_titulados", parse_count),
    ("TOTAL_TITULADOS", parse_count),
];

const CATEGORY_FIELDS: &[(&str, Parser<String>)] = &[
    ("campo", parse_text),
    ("CAMPO_BASE", parse_text),
    ("CAMPO_DETALLADO_P", parse_text),
    ("campo_detallado_p", parse_text),
];

/// Keys of the scalar program-count summary, in priority order.
pub const PROGRAM_COUNT_FIELDS: &[(&str, Parser<f64>)] = &[
    ("total_carreras", parse_count),
    ("total_programas", parse_count),
    ("total_carreras_provincia", parse_count),
    ("carreras", parse_count),
    ("programas", parse_count),
];

pub const OFFERING_TOTAL_FIELDS: &[(&str, Parser<f64>)] = &[("total_oferta", parse_count)];

fn first_match<T>(row: &Row, candidates: &[(&str, Parser<T>)]) -> Option<T> {
    candidates
        .iter()
        .find_map(|(key, parse)| row.get(*key).and_then(parse))
}

/// Non-negative finite number from a JSON number or numeric string.
pub fn parse_count(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (number.is_finite() && number >= 0.0).then_some(number)
}

fn parse_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub fn extract_metric(row: &Row, metric: Metric) -> f64 {
    first_match(row, metric.candidates()).unwrap_or(0.0)
}

pub fn extract_category(row: &Row) -> String {
    first_match(row, CATEGORY_FIELDS).unwrap_or_default()
}

pub fn extract_scalar(row: &Row, candidates: &[(&str, Parser<f64>)]) -> f64 {
    first_match(row, candidates).unwrap_or(0.0)
}

/// Builds a [`Record`] for a row fetched under the given filter values.
pub fn record_from_row(row: &Row, province: &str, year: &str, level: &str) -> Record {
    let category_raw = extract_category(row);
    Record {
        province: province.to_string(),
        year: year.to_string(),
        level: level.to_string(),
        category_key: normalize_text(&category_raw),
        category_raw,
        offering: extract_metric(row, Metric::Offering),
        enrolled: extract_metric(row, Metric::Enrolled),
        graduated: extract_metric(row, Metric::Graduated),
    }
}
