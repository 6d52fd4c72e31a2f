pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use app::{run, RunReport};
pub use config::MonitorConfig;
pub use crate::core::monitor::Monitor;
pub use utils::error::{MonitorError, ParseError, Result};
