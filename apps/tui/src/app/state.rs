use std::rc::Rc;
use std::time::{Duration, Instant};

use throbber_widgets_tui::ThrobberState;

use enrollment_dash::{DashboardView, HttpSource, ViewController};

pub type Controller = ViewController<HttpSource, DashboardView>;

const THROBBER_STEP: Duration = Duration::from_millis(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
    Comparison,
}

pub struct App {
    pub controller: Rc<Controller>,
    pub running: bool,
    pub popup: Popup,
    pub table_scroll: usize,
    pub status_message: String,
    pub throbber_state: ThrobberState,
    last_step: Instant,
}

impl App {
    pub fn new(controller: Controller) -> Self {
        Self {
            controller: Rc::new(controller),
            running: true,
            popup: Popup::None,
            table_scroll: 0,
            status_message: String::new(),
            throbber_state: ThrobberState::default(),
            last_step: Instant::now(),
        }
    }

    /// Advances the loading indicator while an operation is in flight.
    pub fn update(&mut self) {
        if !self.controller.is_loading() {
            return;
        }
        let now = Instant::now();
        if now.duration_since(self.last_step) >= THROBBER_STEP {
            self.throbber_state.calc_next();
            self.last_step = now;
        }
    }

    pub fn scroll_table(&mut self, down: bool) {
        let rows = self.controller.renderer().model().table.len();
        if down {
            if self.table_scroll + 1 < rows {
                self.table_scroll += 1;
            }
        } else {
            self.table_scroll = self.table_scroll.saturating_sub(1);
        }
    }
}
