use ratatui::layout::{Alignment, Direction, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph,
};
use ratatui::Frame;

use enrollment_dash::domain::{Snapshot, TimeSeries};
use enrollment_dash::normalize::{format_number, truncate_label};
use enrollment_dash::view::ChartView;

const OFFERING_COLOR: Color = Color::Yellow;
const ENROLLED_COLOR: Color = Color::Cyan;
const GRADUATED_COLOR: Color = Color::Green;
const BAR_LABEL_WIDTH: usize = 28;

pub fn render_chart(chart: Option<&ChartView>, f: &mut Frame<'_>, area: Rect) {
    match chart {
        Some(ChartView::Series(series)) => render_series_chart(series, f, area),
        Some(ChartView::Ranking(snapshot)) => render_ranking_chart(snapshot, f, area),
        None => render_empty_chart(f, area),
    }
}

fn chart_block(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
}

fn render_empty_chart(f: &mut Frame<'_>, area: Rect) {
    let paragraph = Paragraph::new("No chart available")
        .block(chart_block("Chart".to_string()))
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

fn points(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| (index as f64, *value))
        .collect()
}

pub fn render_series_chart(series: &TimeSeries, f: &mut Frame<'_>, area: Rect) {
    let offering = points(&series.offering);
    let enrolled = points(&series.enrolled);
    let graduated = points(&series.graduated);

    let datasets = vec![
        Dataset::default()
            .name("Enrolled")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(ENROLLED_COLOR))
            .data(&enrolled),
        Dataset::default()
            .name("Offering")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(OFFERING_COLOR))
            .data(&offering),
        Dataset::default()
            .name("Graduated")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(GRADUATED_COLOR))
            .data(&graduated),
    ];

    let x_max = series.years.len().saturating_sub(1).max(1) as f64;
    let x_labels: Vec<Span<'_>> = match series.years.as_slice() {
        [] => Vec::new(),
        [only] => vec![Span::raw(only.as_str())],
        [first, .., last] => vec![Span::raw(first.as_str()), Span::raw(last.as_str())],
    };

    let y_max = series
        .enrolled
        .iter()
        .chain(&series.offering)
        .chain(&series.graduated)
        .copied()
        .fold(0.0_f64, f64::max)
        .max(1.0)
        * 1.1;
    let y_labels = vec![
        Span::raw("0"),
        Span::raw(format_number((y_max / 2.0).round())),
        Span::raw(format_number(y_max.round())),
    ];

    let chart = Chart::new(datasets)
        .block(chart_block(format!(
            "Historical: {}",
            truncate_label(&series.category_label, 48)
        )))
        .x_axis(
            Axis::default()
                .title("Year")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, y_max])
                .labels(y_labels),
        );

    f.render_widget(chart, area);
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bar_value(value: f64) -> u64 {
    value.max(0.0).round() as u64
}

pub fn render_ranking_chart(snapshot: &Snapshot, f: &mut Frame<'_>, area: Rect) {
    let rows = snapshot.chart_rows();
    if rows.is_empty() {
        render_empty_chart(f, area);
        return;
    }

    let bars: Vec<Bar<'_>> = rows
        .iter()
        .map(|row| {
            Bar::default()
                .value(bar_value(row.enrolled))
                .text_value(format_number(row.enrolled))
                .label(TextLine::from(truncate_label(&row.category_label, BAR_LABEL_WIDTH)))
                .style(Style::default().fg(ENROLLED_COLOR))
                .value_style(
                    Style::default()
                        .fg(Color::Black)
                        .bg(ENROLLED_COLOR)
                        .add_modifier(Modifier::BOLD),
                )
        })
        .collect();

    let max_value = bars_max(rows.iter().map(|row| bar_value(row.enrolled)));
    let title = snapshot.category_filter.as_ref().map_or_else(
        || format!("{}: top {} by offering (enrolled)", snapshot.year, rows.len()),
        |category| format!("{}: {}", snapshot.year, truncate_label(category, 40)),
    );

    let chart = BarChart::default()
        .block(chart_block(title))
        .direction(Direction::Horizontal)
        .data(BarGroup::default().bars(&bars))
        .max(max_value)
        .bar_gap(0)
        .bar_width(1);

    f.render_widget(chart, area);
}

fn bars_max(values: impl Iterator<Item = u64>) -> u64 {
    values.max().unwrap_or(0).max(1)
}
