use crate::domain::{FilterState, DEFAULT_VIEW_MODE};
use crate::source::http::ENDPOINT_EXPORT;

/// Query string carrying only the filters that differ from their defaults.
///
/// Returns an empty string when every filter is at its default, otherwise a
/// string starting with `?`.
pub fn export_query(filters: &FilterState) -> String {
    let mut params: Vec<(&str, &str)> = Vec::new();
    if !filters.province.is_empty() {
        params.push(("provincia", filters.province.as_str()));
    }
    if !filters.year.is_all() {
        params.push(("anio", filters.year.as_str()));
    }
    if !filters.level.is_empty() {
        params.push(("nivel", filters.level.as_str()));
    }
    if !filters.view_mode.is_empty() && filters.view_mode != DEFAULT_VIEW_MODE {
        params.push(("view", filters.view_mode.as_str()));
    }

    if params.is_empty() {
        return String::new();
    }

    let joined = params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("?{joined}")
}

/// CSV export link for the current filters.
pub fn export_url(base_url: &str, filters: &FilterState) -> String {
    format!(
        "{}{ENDPOINT_EXPORT}{}",
        base_url.trim_end_matches('/'),
        export_query(filters)
    )
}
