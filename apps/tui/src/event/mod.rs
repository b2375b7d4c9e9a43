mod loop_handler;

pub use loop_handler::{filters_from_args, run, run_headless};
