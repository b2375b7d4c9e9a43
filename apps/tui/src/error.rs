use thiserror::Error;

/// Error type for data-source access and refresh preconditions.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("request to {url} failed{}: {body}", status_suffix(.status))]
    Fetch {
        url: String,
        status: Option<u16>,
        body: String,
    },
    #[error("no years available for the historical view")]
    EmptyYearSet,
    #[error("category '{0}' is not available under the current filters")]
    CategoryNotFound(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl DashboardError {
    pub fn transport(url: &str, error: &reqwest::Error) -> Self {
        Self::Fetch {
            url: url.to_string(),
            status: error.status().map(|status| status.as_u16()),
            body: error.to_string(),
        }
    }

    /// True for failures that come from talking to the backend.
    pub const fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

#[allow(clippy::ref_option)]
fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" with HTTP {code}")).unwrap_or_default()
}

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;
