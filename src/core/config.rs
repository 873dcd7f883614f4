use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::migration;
use super::push::{Push, PushType};
use super::rate_limit::RateLimiter;
use super::rule::{MonitorType, Rule};

pub const CONFIG_VERSION: u64 = 3;
pub const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(7);
pub const MAX_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_INTERVAL_STR: &str = "7s";
pub const DEFAULT_RATE: &str = "1/1m";
pub const DEFAULT_NAME: &str = "Server 1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub version: u64,
    /// Such as `"7s"`. Between 1 and 10 seconds.
    #[serde(default = "default_interval")]
    pub interval: String,
    /// `"<times>/<duration>"`, e.g. `"1/1m"`: at most one push per minute per channel.
    #[serde(default = "default_rate")]
    pub rate: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub pushes: Vec<Push>,
}

fn default_interval() -> String {
    DEFAULT_INTERVAL_STR.to_string()
}

fn default_rate() -> String {
    DEFAULT_RATE.to_string()
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        let webhook = json!({
            "url": "http://localhost:5700",
            "headers": {
                "Content-Type": "application/json",
                "Authorization": "Bearer YOUR_SECRET"
            },
            "method": "POST",
            "body": {
                "action": "send_group_msg",
                "params": {
                    "group_id": 123456789,
                    "message": "{{name}}\n{{msg}}"
                }
            },
            "code": 200,
            "body_regex": ".*"
        });

        Self {
            version: CONFIG_VERSION,
            interval: default_interval(),
            rate: default_rate(),
            name: default_name(),
            rules: vec![Rule::new(MonitorType::Cpu, ">=77%", "cpu")],
            pushes: vec![Push::new(PushType::Webhook, "QQ Group", webhook)],
        }
    }
}

/// A rule or push that cannot be used as configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigProblem {
    pub subject: String,
    pub message: String,
}

impl fmt::Display for ConfigProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

impl AppConfig {
    /// `<config_dir>/boxwatch/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("boxwatch").join(CONFIG_FILE_NAME))
    }

    /// Load, migrating older files in place. A missing file is created with defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config at {:?}, writing the default one", path);
            let config = AppConfig::default();
            config.save(path)?;
            return Ok(config);
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let raw: Value = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        let version = migration::version_of(&raw);
        let raw = if version == CONFIG_VERSION {
            raw
        } else {
            let migrated = migration::migrate(raw)
                .with_context(|| format!("Failed to migrate config file: {:?}", path))?;

            let backup = backup_path(path);
            fs::write(&backup, &data)
                .with_context(|| format!("Failed to back up config file to {:?}", backup))?;
            let pretty = serde_json::to_string_pretty(&migrated)
                .with_context(|| "Failed to serialize migrated config")?;
            fs::write(path, pretty)
                .with_context(|| format!("Failed to write config file: {:?}", path))?;
            log::info!(
                "Config migrated from version {} to {}, old file kept at {:?}",
                version,
                CONFIG_VERSION,
                backup
            );
            migrated
        };

        serde_json::from_value(raw).with_context(|| format!("Invalid config file: {:?}", path))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(path, data)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Polling interval, falling back to the default when out of range.
    pub fn interval(&self) -> Duration {
        match parse_duration(&self.interval) {
            Some(d) if d >= Duration::from_secs(1) && d <= MAX_INTERVAL => d,
            _ => {
                log::warn!(
                    "Invalid interval {:?}, using {}",
                    self.interval,
                    DEFAULT_INTERVAL_STR
                );
                DEFAULT_INTERVAL
            }
        }
    }

    /// Limiter built from `rate`, falling back to one push per ten seconds.
    pub fn rate_limiter(&self) -> RateLimiter {
        match parse_rate(&self.rate) {
            Some((times, window)) => RateLimiter::new(times, window),
            None => {
                log::warn!("Invalid rate {:?}, using 1/10s", self.rate);
                RateLimiter::default()
            }
        }
    }

    /// Every rule and push that would be skipped at runtime.
    pub fn validate(&self) -> Vec<ConfigProblem> {
        let mut problems = Vec::new();

        for rule in &self.rules {
            if let Err(e) = rule.validate() {
                problems.push(ConfigProblem {
                    subject: format!("rule {}", rule.id()),
                    message: e.to_string(),
                });
            }
        }

        for push in &self.pushes {
            if let Err(e) = push.channel() {
                problems.push(ConfigProblem {
                    subject: format!("push {}", push.name),
                    message: e.to_string(),
                });
            }
        }

        problems
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

/// `"<n><unit>"` with unit `s`, `m` or `h`.
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let unit = s.chars().last()?;
    let number: u64 = s[..s.len() - unit.len_utf8()].parse().ok()?;
    let secs = match unit {
        's' => number,
        'm' => number.checked_mul(60)?,
        'h' => number.checked_mul(3600)?,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}

/// `"<times>/<duration>"`
fn parse_rate(s: &str) -> Option<(usize, Duration)> {
    let (times, window) = s.split_once('/')?;
    let times = times.trim().parse().ok()?;
    let window = parse_duration(window)?;
    if window.is_zero() {
        return None;
    }
    Some((times, window))
}
