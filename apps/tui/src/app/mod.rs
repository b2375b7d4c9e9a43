// App module for enrollment-dash
// Holds the terminal-side state around the shared controller

pub mod input;
pub mod state;

pub use input::handle_input;
pub use state::{App, Controller, Popup};
