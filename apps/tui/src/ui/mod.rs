// UI module for enrollment-dash
// Draws the published view model around the filter bar and status line

pub mod render;
pub mod widgets;

use crate::app::App;
use ratatui::Frame;

pub fn ui(app: &App, f: &mut Frame<'_>) {
    render::render_dashboard(app, f);
}
