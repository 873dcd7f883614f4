// Command handlers module
pub mod conf;
pub mod serve;
pub mod status;
pub mod version;

use anyhow::Result;
use std::path::PathBuf;

use crate::core::config::AppConfig;

// Re-exports for cleaner imports
pub use serve::execute as serve;
pub use status::execute as status;
pub use version::execute as version;

/// `--config` if given, the per-user default otherwise.
pub fn config_path(matches: &clap::ArgMatches) -> Result<PathBuf> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => Ok(path.clone()),
        None => AppConfig::default_path(),
    }
}

/// Directory holding the config, the sampling script and its last output.
pub fn data_dir(config_path: &std::path::Path) -> PathBuf {
    config_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Multi-threaded runtime for the async commands.
pub(crate) fn build_runtime() -> Result<tokio::runtime::Runtime> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("boxwatch-worker")
        .build()?;
    Ok(runtime)
}
