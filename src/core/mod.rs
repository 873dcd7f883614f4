// Core business logic module

pub mod config;
pub mod migration;
pub mod monitor;
pub mod push;
pub mod rate_limit;
pub mod rule;
pub mod size;
pub mod status;
pub mod threshold;
pub mod time_seq;

// Re-export commonly used items
pub use config::AppConfig;
pub use monitor::Monitor;
pub use push::{Dispatcher, Push, PushPair};
pub use rule::Rule;
pub use size::Size;
pub use threshold::Threshold;
