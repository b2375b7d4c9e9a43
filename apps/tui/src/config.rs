use std::env;
use std::path::PathBuf;

use dotenv::dotenv;

use crate::domain::TopN;
use crate::error::{DashboardError, Result};

pub const API_URL_VAR: &str = "DASHBOARD_API_URL";
pub const LOG_FILTER_VAR: &str = "DASHBOARD_LOG";
pub const LOG_FILE_VAR: &str = "DASHBOARD_LOG_FILE";
pub const TOP_N_VAR: &str = "DASHBOARD_TOP_N";

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_LOG_FILE: &str = "enrollment-dash.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub api_url: String,
    /// `tracing` filter directive; `None` falls back to the binary's default.
    pub log_filter: Option<String>,
    pub log_file: PathBuf,
    pub top_n: TopN,
}

impl DashboardConfig {
    /// Loads `.env` (if present) and reads the `DASHBOARD_*` variables.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url = non_empty(API_URL_VAR).map_or_else(
            || DEFAULT_API_URL.to_string(),
            |url| url.trim().trim_end_matches('/').to_string(),
        );
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(DashboardError::Config(format!(
                "{API_URL_VAR} must be an http(s) URL, got {api_url}"
            )));
        }

        let top_n = match non_empty(TOP_N_VAR) {
            Some(value) => TopN::parse(&value).ok_or_else(|| {
                DashboardError::Config(format!("{TOP_N_VAR} must be 10, 20, 30 or 50, got {value}"))
            })?,
            None => TopN::default(),
        };

        Ok(Self {
            api_url,
            log_filter: non_empty(LOG_FILTER_VAR),
            log_file: non_empty(LOG_FILE_VAR)
                .map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from),
            top_n,
        })
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            log_filter: None,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            top_n: TopN::default(),
        }
    }
}
