use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};
use ratatui::Frame;
use throbber_widgets_tui::Throbber;

use enrollment_dash::domain::{ComparisonSummary, FilterState, ViewState};
use enrollment_dash::normalize::{format_number, format_ratio, truncate_label};
use enrollment_dash::view::ViewModel;

use crate::app::{App, Popup};
use crate::ui::widgets::badges::render_badges;
use crate::ui::widgets::charts::render_chart;
use crate::ui::widgets::popup::{centered_rect, ClearWidget};
use crate::ui::widgets::tables::render_rows_table;

pub fn render_dashboard(app: &App, f: &mut Frame<'_>) {
    let model = app.controller.renderer().model();
    let filters = app.controller.filters();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Badges
            Constraint::Length(3), // Filters
            Constraint::Min(8),    // Chart and table
            Constraint::Length(3), // Status
            Constraint::Length(1), // Shortcuts hint
        ])
        .split(f.area().inner(Margin::new(2, 1)));

    render_badges(&model.badges, f, layout[0]);
    render_filter_bar(&filters, f, layout[1]);
    render_body(app, &model, f, layout[2]);
    render_status_section(app, &model, f, layout[3]);
    render_shortcuts(f, layout[4]);

    let area = f.area();
    match app.popup {
        Popup::Help => render_help_popup(f, area),
        Popup::Comparison => {
            render_comparison_popup(model.comparison.as_ref(), model.loading, f, area);
        }
        Popup::None => {}
    }
}

fn render_filter_bar(filters: &FilterState, f: &mut Frame<'_>, area: Rect) {
    let block = Block::default()
        .title(" Filters ")
        .title_style(Style::default().fg(Color::Green))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let level = if filters.level.is_empty() { "ALL" } else { &filters.level };
    let category = if filters.year.is_all() {
        filters.category.as_deref()
    } else {
        filters.year_category.as_deref()
    };

    let mut spans = vec![
        label_span("Province"),
        value_span(filters.province_label()),
        label_span("Year"),
        value_span(filters.year.as_str()),
        label_span("Level"),
        value_span(level),
        label_span("View"),
        value_span(&filters.view_mode),
        label_span("Category"),
        value_span(&truncate_label(category.unwrap_or("-"), 32)),
    ];
    if !filters.year.is_all() {
        spans.push(label_span("Chart"));
        spans.push(value_span(filters.top_n.label()));
    }

    let paragraph = Paragraph::new(TextLine::from(spans)).block(block);
    f.render_widget(paragraph, area);
}

fn label_span(label: &str) -> Span<'static> {
    Span::styled(format!(" {label}: "), Style::default().fg(Color::Gray))
}

fn value_span(value: &str) -> Span<'static> {
    Span::styled(
        value.to_string(),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )
}

fn render_body(app: &App, model: &ViewModel, f: &mut Frame<'_>, area: Rect) {
    if model.state == ViewState::Collapsed {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let paragraph = Paragraph::new(Text::from(vec![
            TextLine::from(""),
            TextLine::from("Press p to pick a province or n for the national view"),
        ]))
        .block(block)
        .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
        return;
    }

    let split = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_chart(model.chart.as_ref(), f, split[0]);
    render_rows_table(&model.table, app.table_scroll, f, split[1]);
}

fn render_status_section(app: &App, model: &ViewModel, f: &mut Frame<'_>, area: Rect) {
    let status_block = Block::default()
        .title(" Status ")
        .title_style(Style::default().fg(Color::Yellow))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let line = if model.loading {
        Throbber::default()
            .label("Loading…")
            .style(Style::default().fg(Color::Cyan))
            .to_line(&app.throbber_state)
    } else if let Some(notice) = &model.notice {
        TextLine::from(Span::styled(
            format!("{notice} (Esc to dismiss)"),
            Style::default().fg(Color::Red),
        ))
    } else if !app.status_message.is_empty() {
        TextLine::from(Span::styled(
            app.status_message.clone(),
            Style::default().fg(Color::Green),
        ))
    } else {
        let updated = model.updated_at.map_or_else(
            || "never".to_string(),
            |at| at.format("%H:%M:%S").to_string(),
        );
        let mut spans = vec![Span::styled(
            format!("Updated {updated}"),
            Style::default().fg(Color::Gray),
        )];
        if !model.export_link.is_empty() {
            spans.push(Span::styled("  CSV: ", Style::default().fg(Color::Gray)));
            spans.push(Span::styled(
                model.export_link.clone(),
                Style::default().fg(Color::Blue),
            ));
        }
        TextLine::from(spans)
    };

    let paragraph = Paragraph::new(line).block(status_block);
    f.render_widget(paragraph, area);
}

fn render_shortcuts(f: &mut Frame<'_>, area: Rect) {
    let shortcuts = TextLine::from(Span::styled(
        "p/y/l filters · c category · t top · n national · r refresh · m compare · x reset · F1 help · q quit",
        Style::default().fg(Color::Gray),
    ));
    let shortcuts_paragraph = Paragraph::new(shortcuts).alignment(Alignment::Center);
    f.render_widget(shortcuts_paragraph, area);
}

fn render_help_popup(f: &mut Frame<'_>, area: Rect) {
    let popup_area = centered_rect(70, 70, area);
    f.render_widget(ClearWidget, popup_area);

    let help_block = Block::default()
        .title("== Help & Keyboard Shortcuts ==")
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let help_paragraph = Paragraph::new(Text::from(build_help_lines()))
        .block(help_block)
        .wrap(Wrap { trim: true });

    f.render_widget(help_paragraph, popup_area);
}

fn build_help_lines() -> Vec<TextLine<'static>> {
    let keys = [
        ("p / P", "next / previous province"),
        ("y / Y", "next / previous year (ALL shows the historical series)"),
        ("l / L", "next / previous academic level"),
        ("v", "toggle view mode"),
        ("c / C", "next / previous category"),
        ("t", "cycle the number of bars in the single-year chart"),
        ("n", "national view (no province, all years)"),
        ("r", "refresh"),
        ("m", "comparison for the selected or latest year"),
        ("x", "collapse the panel"),
        ("Up / Down", "scroll the table"),
        ("Esc", "dismiss notices and popups"),
        ("q", "quit"),
    ];

    let mut lines = vec![
        TextLine::from(Span::styled(
            "Enrollment Dashboard",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        TextLine::from(""),
    ];
    lines.extend(keys.into_iter().map(|(key, action)| {
        TextLine::from(vec![
            Span::styled(format!("{key:<10}"), Style::default().fg(Color::Yellow)),
            Span::raw(action),
        ])
    }));
    lines
}

fn render_comparison_popup(
    summary: Option<&ComparisonSummary>,
    loading: bool,
    f: &mut Frame<'_>,
    area: Rect,
) {
    let popup_area = centered_rect(80, 30, area);
    f.render_widget(ClearWidget, popup_area);

    let block = Block::default()
        .title("== Comparison ==")
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let Some(summary) = summary else {
        let message = if loading { "Loading comparison…" } else { "No comparison available" };
        let paragraph = Paragraph::new(message)
            .block(block)
            .alignment(Alignment::Center);
        f.render_widget(paragraph, popup_area);
        return;
    };

    let header = Row::new(["Province", "Year", "Offering", "Enrolled", "Graduated", "E/O", "G/O"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let row = Row::new([
        Cell::from(summary.province.clone()),
        Cell::from(summary.year.clone()),
        Cell::from(format_number(summary.offering)),
        Cell::from(format_number(summary.enrolled)),
        Cell::from(format_number(summary.graduated)),
        Cell::from(format_ratio(summary.enrolled_per_offering)),
        Cell::from(format_ratio(summary.graduated_per_offering)),
    ]);
    let widths = [
        Constraint::Min(14),
        Constraint::Length(6),
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Length(11),
        Constraint::Length(8),
        Constraint::Length(8),
    ];

    let table = Table::new([row], widths).header(header).block(block);
    f.render_widget(table, popup_area);
}
