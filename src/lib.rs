// boxwatch library - public API

// Re-export error types
pub mod error;
pub use error::{MonitorError, Result};

// Module declarations
pub mod commands;
pub mod core;
pub mod ui;
pub mod web;

// Re-export commonly used types
pub use core::config::AppConfig;
pub use core::rule::{MonitorType, Rule};
pub use core::status::{SharedStatus, Status};

// Initialize logging
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
