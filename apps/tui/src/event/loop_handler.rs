use std::io::Stdout;
use std::time::Duration;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use serde::Serialize;

use enrollment_dash::domain::{AggregateRow, Badges, FilterState, TopN, YearFilter};
use enrollment_dash::normalize::{format_number, format_ratio};
use enrollment_dash::view::{ChartView, ViewModel};
use enrollment_dash::Outcome;

use crate::app::{handle_input, App, Controller};
use crate::cli::CliArgs;
use crate::ui;

/// Run one refresh with the CLI filters and print the published view.
pub async fn run_headless(controller: &Controller, args: &CliArgs) -> Result<()> {
    if controller.init_filters().await != Outcome::Completed {
        return Err(eyre!("could not load the filter options from the backend"));
    }

    let filters = filters_from_args(controller.filters(), args)?;
    match controller.apply_filters(filters).await {
        Outcome::Completed => {}
        Outcome::Failed => return Err(eyre!("could not load the dashboard data")),
        other => return Err(eyre!("refresh did not run: {other:?}")),
    }

    let filters = controller.filters();
    let model = controller.renderer().model();
    let report = HeadlessReport::new(&filters, &model);
    if args.json {
        let json = serde_json::to_string_pretty(&report)?;
        println!("{json}");
    } else {
        print_report(&report);
    }
    Ok(())
}

pub fn filters_from_args(mut filters: FilterState, args: &CliArgs) -> Result<FilterState> {
    if let Some(province) = &args.province {
        filters.province = province.trim().to_string();
    }
    if let Some(year) = &args.year {
        filters.year = YearFilter::parse(year);
    }
    if let Some(level) = &args.level {
        filters.level = level.trim().to_string();
    }
    if let Some(view) = &args.view {
        filters.view_mode = view.trim().to_string();
    }
    if let Some(top) = &args.top {
        filters.top_n =
            TopN::parse(top).ok_or_else(|| eyre!("--top must be 10, 20, 30 or 50, got {top}"))?;
    }
    if let Some(category) = &args.category {
        if filters.year.is_all() {
            filters.category = Some(category.clone());
        } else {
            filters.year_category = Some(category.clone());
        }
    }
    Ok(filters)
}

#[derive(Serialize)]
struct HeadlessReport<'a> {
    filters: &'a FilterState,
    badges: Badges,
    chart: Option<&'a ChartView>,
    table: &'a [AggregateRow],
    export_link: &'a str,
}

impl<'a> HeadlessReport<'a> {
    fn new(filters: &'a FilterState, model: &'a ViewModel) -> Self {
        Self {
            filters,
            badges: model.badges,
            chart: model.chart.as_ref(),
            table: &model.table,
            export_link: &model.export_link,
        }
    }
}

fn print_report(report: &HeadlessReport<'_>) {
    let filters = report.filters;
    println!("\nEnrollment Dashboard");
    println!("====================");
    println!(
        "Province: {} | Year: {} | Level: {} | View: {}",
        filters.province_label(),
        filters.year.as_str(),
        if filters.level.is_empty() { "ALL" } else { &filters.level },
        filters.view_mode
    );

    println!("\nOffering: {}", format_number(report.badges.offering));
    println!("Programs: {}", format_number(report.badges.programs));
    println!("Enrolled: {}", format_number(report.badges.enrolled));
    println!("Graduated: {}", format_number(report.badges.graduated));

    match report.chart {
        Some(ChartView::Series(series)) => {
            println!("\nHistorical series: {}", series.category_label);
            for (index, year) in series.years.iter().enumerate() {
                println!(
                    "- {year}: offering {} | enrolled {} | graduated {}",
                    format_number(series.offering[index]),
                    format_number(series.enrolled[index]),
                    format_number(series.graduated[index]),
                );
            }
        }
        Some(ChartView::Ranking(snapshot)) => {
            println!("\nRanking {} ({} shown):", snapshot.year, snapshot.chart_rows().len());
            for row in snapshot.chart_rows() {
                println!(
                    "- {} | offering {} | enrolled {}",
                    row.category_label,
                    format_number(row.offering),
                    format_number(row.enrolled)
                );
            }
        }
        None => println!("\nNo chart (pick a category with --category)"),
    }

    println!("\nTable:");
    for row in report.table {
        println!(
            "- {} | {} | {} | {} | {} | {}",
            row.category_label,
            format_number(row.offering),
            format_number(row.enrolled),
            format_number(row.graduated),
            format_ratio(row.enrolled_per_offering()),
            format_ratio(row.graduated_per_offering()),
        );
    }

    println!("\nExport: {}", report.export_link);
}

/// Run the main application event loop.
///
/// Must be driven inside a `LocalSet`: controller actions are spawned onto it
/// and make progress while this loop sleeps between polls.
pub async fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    // Configure event poll timeout (ms)
    const EVENT_POLL_TIMEOUT: u64 = 50;

    loop {
        app.update();

        if let Err(e) = terminal.draw(|f| ui::ui(app, f)) {
            return Err(eyre!("Terminal draw error: {e}"));
        }

        // Non-blocking poll; the sleep below yields to the spawned actions.
        while matches!(event::poll(Duration::ZERO), Ok(true)) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    handle_input(app, key.code);
                    if !app.running {
                        return Ok(());
                    }
                }
                Ok(Event::Resize(_, _)) => {
                    // Force a redraw after resize
                    if terminal.draw(|f| ui::ui(app, f)).is_err() {
                        // Non-fatal redraw error
                    }
                }
                Ok(_) | Err(_) => {
                    // Ignore non-key events
                }
            }
        }

        tokio::time::sleep(Duration::from_millis(EVENT_POLL_TIMEOUT)).await;
    }
}
