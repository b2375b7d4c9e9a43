// Export our modules for use in binaries and tests
pub mod aggregate;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod export;
pub mod extract;
pub mod normalize;
pub mod source;
pub mod view;

pub use controller::{Outcome, ViewController};
pub use domain::{FilterState, TopN, ViewState, YearFilter};
pub use error::{DashboardError, Result};
pub use source::{DataSource, HttpSource};
pub use view::{DashboardView, Renderer};
