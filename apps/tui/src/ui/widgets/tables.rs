use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use enrollment_dash::domain::AggregateRow;
use enrollment_dash::normalize::{format_number, format_ratio, truncate_label};

const CATEGORY_WIDTH: usize = 40;

pub const fn scroll_offset(
    total_rows: usize,
    max_visible_rows: usize,
    selected_index: usize,
) -> usize {
    if total_rows <= max_visible_rows {
        return 0;
    }

    if selected_index >= max_visible_rows {
        return selected_index.saturating_sub(max_visible_rows) + 1;
    }

    0
}

fn table_cells(row: &AggregateRow) -> [String; 6] {
    [
        truncate_label(&row.category_label, CATEGORY_WIDTH),
        format_number(row.offering),
        format_number(row.enrolled),
        format_number(row.graduated),
        format_ratio(row.enrolled_per_offering()),
        format_ratio(row.graduated_per_offering()),
    ]
}

pub fn render_rows_table(rows: &[AggregateRow], scroll: usize, f: &mut Frame<'_>, area: Rect) {
    let block = Block::default()
        .title(format!("Categories ({})", rows.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if rows.is_empty() {
        let paragraph = Paragraph::new("No rows available")
            .block(block)
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
        return;
    }

    // borders and header
    let visible = usize::from(area.height.saturating_sub(3));
    let offset = scroll_offset(rows.len(), visible, scroll);

    let header = Row::new(["Category", "Offering", "Enrolled", "Graduated", "E/O", "G/O"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let body: Vec<Row<'_>> = rows
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(index, row)| {
            let style = if index == scroll {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default()
            };
            Row::new(table_cells(row).map(Cell::from)).style(style)
        })
        .collect();

    let widths = [
        Constraint::Min(20),
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Length(11),
        Constraint::Length(7),
        Constraint::Length(7),
    ];

    let table = Table::new(body, widths).header(header).block(block);
    f.render_widget(table, area);
}
