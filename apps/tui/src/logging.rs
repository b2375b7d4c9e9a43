use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Arc;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn";

fn filter(directive: Option<&str>) -> EnvFilter {
    directive.map_or_else(|| EnvFilter::new(DEFAULT_FILTER), EnvFilter::new)
}

/// Headless runs log to stderr so stdout stays clean for the report.
pub fn init_stderr(directive: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(directive))
        .with_writer(io::stderr)
        .try_init();
}

/// The TUI owns the terminal, so logs go to a file instead.
pub fn init_file(directive: Option<&str>, path: &Path) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| eyre!("Cannot open log file {}: {e}", path.display()))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(directive))
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .try_init();
    Ok(())
}
