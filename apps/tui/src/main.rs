mod app;
mod cli;
mod event;
mod logging;
mod terminal;
mod ui;

use app::{App, Controller};
use clap::Parser;
use cli::CliArgs;
use color_eyre::Result;
use enrollment_dash::config::DashboardConfig;
use enrollment_dash::{DashboardView, HttpSource, Outcome, ViewController};
use std::rc::Rc;
use tokio::task::LocalSet;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Setup error handling
    color_eyre::install()?;

    let args = CliArgs::parse();
    args.apply_env_overrides();
    let config = DashboardConfig::from_env()?;

    let headless = args.headless || !is_terminal();
    if headless {
        logging::init_stderr(config.log_filter.as_deref());
    } else {
        logging::init_file(config.log_filter.as_deref(), &config.log_file)?;
    }
    info!("backend at {}", config.api_url);

    let controller = build_controller(&config);

    if headless {
        return event::run_headless(&controller, &args).await;
    }

    let preset = if args.has_filters() {
        Some(event::filters_from_args(controller.filters(), &args)?)
    } else {
        None
    };

    // Controller actions run as local tasks alongside the event loop
    let local = LocalSet::new();
    local
        .run_until(async move {
            let mut app = App::new(controller);
            let startup = Rc::clone(&app.controller);
            tokio::task::spawn_local(async move {
                if startup.init_filters().await == Outcome::Completed {
                    if let Some(filters) = preset {
                        startup.apply_filters(filters).await;
                    }
                }
            });

            let mut terminal = terminal::setup()?;
            let result = event::run(&mut terminal, &mut app).await;
            terminal::cleanup(true, true);
            result
        })
        .await
}

fn build_controller(config: &DashboardConfig) -> Controller {
    let source = HttpSource::new(&config.api_url);
    ViewController::new(source, DashboardView::new(), &config.api_url).with_top_n(config.top_n)
}

// Check if we're running in a terminal
fn is_terminal() -> bool {
    atty::is(atty::Stream::Stdout)
}
