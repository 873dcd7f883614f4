// Terminal output

pub mod formatters;
pub mod messages;

pub use formatters::{print_config_report, print_rule_verdicts, print_status, verdict_text};
pub use messages::{error, info, success, warn};
