use clap::Parser;

use enrollment_dash::config::{API_URL_VAR, LOG_FILE_VAR, LOG_FILTER_VAR, TOP_N_VAR};

#[derive(Debug, Parser)]
#[command(
    name = "enrollment-dash",
    version,
    about = "Enrollment, offering and graduation dashboard"
)]
pub struct CliArgs {
    /// Refresh once, print the dashboard and exit
    #[arg(long)]
    pub headless: bool,

    /// Print headless output as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Override the backend base URL
    #[arg(long, value_name = "URL")]
    pub api: Option<String>,

    /// Override the TUI log file
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<String>,

    /// Province to start from (national when omitted)
    #[arg(long)]
    pub province: Option<String>,

    /// Year to show, or ALL for the historical view
    #[arg(long)]
    pub year: Option<String>,

    /// Academic level filter
    #[arg(long)]
    pub level: Option<String>,

    /// View mode
    #[arg(long)]
    pub view: Option<String>,

    /// Category for the historical series or the single-year ranking
    #[arg(long)]
    pub category: Option<String>,

    /// Number of bars in the single-year chart (10, 20, 30 or 50)
    #[arg(long, value_name = "N")]
    pub top: Option<String>,
}

impl CliArgs {
    pub fn apply_env_overrides(&self) {
        if let Some(api) = &self.api {
            std::env::set_var(API_URL_VAR, api);
        }
        if let Some(path) = &self.log_file {
            std::env::set_var(LOG_FILE_VAR, path);
        }
        if let Some(top) = &self.top {
            std::env::set_var(TOP_N_VAR, top);
        }
        if self.debug {
            std::env::set_var(LOG_FILTER_VAR, "debug");
        }
    }

    /// Whether any filter flag was passed.
    pub const fn has_filters(&self) -> bool {
        self.province.is_some()
            || self.year.is_some()
            || self.level.is_some()
            || self.view.is_some()
            || self.category.is_some()
    }
}
