use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::error::{MonitorError, Result};

pub const SCRIPT_FILE_NAME: &str = "monitor.sh";
pub const OUTPUT_LOG_FILE_NAME: &str = "shell_output.log";

const SCRIPT: &str = include_str!("../../../res/monitor.sh");

/// Produces one raw sampling pass in the `SrvBox`-separated format.
pub trait Sampler {
    fn sample(&self) -> impl Future<Output = Result<String>> + Send;
}

/// Runs the bundled shell script with `sh`.
#[derive(Debug, Clone)]
pub struct ShellSampler {
    script_path: PathBuf,
    log_path: PathBuf,
}

impl ShellSampler {
    /// Write the script into `dir`, replacing any older copy.
    pub fn install(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let script_path = dir.join(SCRIPT_FILE_NAME);
        fs::write(&script_path, SCRIPT).map_err(|e| {
            MonitorError::sampler(format!("failed to write {:?}: {}", script_path, e))
        })?;

        Ok(Self {
            script_path,
            log_path: dir.join(OUTPUT_LOG_FILE_NAME),
        })
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }
}

impl Sampler for ShellSampler {
    async fn sample(&self) -> Result<String> {
        let output = Command::new("sh")
            .arg(&self.script_path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MonitorError::sampler(format!("failed to run sh: {}", e)))?;

        // Hosts without thermal zones make the last `cat` fail; the output is still usable
        if !output.status.success() {
            log::debug!("Sampling script exited with {}", output.status);
        }
        if output.stdout.is_empty() {
            return Err(MonitorError::sampler(format!(
                "script produced no output: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let raw = String::from_utf8_lossy(&output.stdout).into_owned();
        if let Err(e) = tokio::fs::write(&self.log_path, &raw).await {
            log::warn!("Failed to write {:?}: {}", self.log_path, e);
        }
        Ok(raw)
    }
}
