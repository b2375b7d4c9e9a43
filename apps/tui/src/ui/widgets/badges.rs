use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use enrollment_dash::domain::Badges;
use enrollment_dash::normalize::format_number;

pub fn render_badges(badges: &Badges, f: &mut Frame<'_>, area: Rect) {
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4])
        .split(area);

    let entries = [
        ("Offering", badges.offering, Color::Yellow),
        ("Programs", badges.programs, Color::Magenta),
        ("Enrolled", badges.enrolled, Color::Cyan),
        ("Graduated", badges.graduated, Color::Green),
    ];

    for (index, (title, value, color)) in entries.into_iter().enumerate() {
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color));
        let text = Text::from(TextLine::from(Span::styled(
            format_number(value),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center);
        f.render_widget(paragraph, cells[index]);
    }
}
