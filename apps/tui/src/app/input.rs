use std::future::Future;
use std::rc::Rc;

use crossterm::event::KeyCode;
use tracing::debug;

use enrollment_dash::domain::{YearFilter, DEFAULT_VIEW_MODE};
use enrollment_dash::Outcome;

use crate::app::state::{App, Controller, Popup};

/// View modes the `v` key toggles between.
const VIEW_MODES: [&str; 2] = [DEFAULT_VIEW_MODE, "provincial"];

pub fn handle_input(app: &mut App, key: KeyCode) {
    if handle_popup_keys(app, key) {
        return;
    }

    match key {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('p') => cycle_province(app, true),
        KeyCode::Char('P') => cycle_province(app, false),
        KeyCode::Char('y') => cycle_year(app, true),
        KeyCode::Char('Y') => cycle_year(app, false),
        KeyCode::Char('l') => cycle_level(app, true),
        KeyCode::Char('L') => cycle_level(app, false),
        KeyCode::Char('v') => toggle_view_mode(app),
        KeyCode::Char('c') => cycle_category(app, true),
        KeyCode::Char('C') => cycle_category(app, false),
        KeyCode::Char('t') => {
            let top_n = app.controller.filters().top_n.next();
            spawn(app, move |controller| async move { controller.set_top_n(top_n).await });
        }
        KeyCode::Char('n') => spawn(app, |controller| async move { controller.show_national().await }),
        KeyCode::Char('r') => spawn(app, |controller| async move { controller.refresh().await }),
        KeyCode::Char('m') => {
            if !app.controller.is_loading() {
                app.popup = Popup::Comparison;
                spawn(app, |controller| async move { controller.open_comparison().await });
            }
        }
        KeyCode::Char('x') => {
            if app.controller.reset() {
                app.table_scroll = 0;
                app.status_message = "Panel collapsed".to_string();
            }
        }
        KeyCode::Up => app.scroll_table(false),
        KeyCode::Down => app.scroll_table(true),
        KeyCode::Esc => app.controller.renderer().dismiss_notice(),
        _ => {}
    }
}

fn handle_popup_keys(app: &mut App, key: KeyCode) -> bool {
    if key == KeyCode::F(1) {
        app.popup = if app.popup == Popup::Help {
            Popup::None
        } else {
            Popup::Help
        };
        return true;
    }

    if app.popup == Popup::None {
        return false;
    }

    match key {
        KeyCode::Esc | KeyCode::Enter => {
            if app.popup == Popup::Comparison {
                app.controller.renderer().close_comparison();
            }
            app.popup = Popup::None;
        }
        KeyCode::Char('q') => app.running = false,
        _ => {}
    }
    true
}

/// Runs a controller action on the local task set so drawing continues
/// while it waits on the backend.
fn spawn<F, Fut>(app: &mut App, action: F)
where
    F: FnOnce(Rc<Controller>) -> Fut + 'static,
    Fut: Future<Output = Outcome> + 'static,
{
    if app.controller.is_loading() {
        app.status_message = "Still loading…".to_string();
        return;
    }
    app.status_message.clear();
    app.table_scroll = 0;

    let controller = Rc::clone(&app.controller);
    tokio::task::spawn_local(async move {
        let outcome = action(controller).await;
        debug!("action finished: {:?}", outcome);
    });
}

/// Next (or previous) element after `current`, wrapping around.
fn step<T: PartialEq + Clone>(options: &[T], current: &T, forward: bool) -> Option<T> {
    if options.is_empty() {
        return None;
    }
    let len = options.len();
    let index = options.iter().position(|option| option == current);
    let next = match (index, forward) {
        (None, _) => 0,
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => (i + len - 1) % len,
    };
    Some(options[next].clone())
}

fn with_none(values: Vec<String>) -> Vec<String> {
    std::iter::once(String::new()).chain(values).collect()
}

fn cycle_province(app: &mut App, forward: bool) {
    let options = with_none(app.controller.provinces());
    let current = app.controller.filters().province;
    if let Some(province) = step(&options, &current, forward) {
        spawn(app, move |controller| async move {
            controller.select_province(&province).await
        });
    }
}

fn cycle_year(app: &mut App, forward: bool) {
    let options: Vec<YearFilter> = std::iter::once(YearFilter::All)
        .chain(app.controller.years().into_iter().map(YearFilter::Year))
        .collect();
    let current = app.controller.filters().year;
    if let Some(year) = step(&options, &current, forward) {
        spawn(app, move |controller| async move { controller.set_year(year).await });
    }
}

fn cycle_level(app: &mut App, forward: bool) {
    let options = with_none(app.controller.levels());
    let current = app.controller.filters().level;
    if let Some(level) = step(&options, &current, forward) {
        spawn(app, move |controller| async move { controller.set_level(&level).await });
    }
}

fn toggle_view_mode(app: &mut App) {
    let options: Vec<String> = VIEW_MODES.iter().map(ToString::to_string).collect();
    let current = app.controller.filters().view_mode;
    if let Some(mode) = step(&options, &current, true) {
        spawn(app, move |controller| async move { controller.set_view_mode(&mode).await });
    }
}

fn cycle_category(app: &mut App, forward: bool) {
    if app.controller.filters().year.is_all() {
        let next = app.controller.historical_catalog().cycle(forward);
        spawn(app, move |controller| async move {
            controller.set_category(next.as_deref()).await
        });
    } else {
        let next = app.controller.snapshot_catalog().cycle(forward);
        spawn(app, move |controller| async move {
            controller.set_year_category(next.as_deref()).await
        });
    }
}
