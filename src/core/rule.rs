//! Monitoring rules: which metric to watch and when to notify.
//!
//! A rule is `{ "type": "cpu", "threshold": ">=77%", "matcher": "cpu" }`. On every tick the
//! monitor resolves the matcher against the latest [`Status`], turns the matched value into a
//! [`Reading`] and compares it with the parsed threshold.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::push::PushPair;
use super::size::Size;
use super::status::{NetworkStatus, NetworkTotals, Status};
use super::threshold::{Reading, Threshold, ThresholdKind};
use crate::error::{NotReady, RuleError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorType {
    Cpu,
    Mem,
    Swap,
    Disk,
    Net,
    Temp,
}

impl MonitorType {
    pub const ALL: [MonitorType; 6] = [
        MonitorType::Cpu,
        MonitorType::Mem,
        MonitorType::Swap,
        MonitorType::Disk,
        MonitorType::Net,
        MonitorType::Temp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MonitorType::Cpu => "cpu",
            MonitorType::Mem => "mem",
            MonitorType::Swap => "swap",
            MonitorType::Disk => "disk",
            MonitorType::Net => "net",
            MonitorType::Temp => "temp",
        }
    }

    /// Threshold kinds that make sense for this monitor.
    pub fn supports(self, kind: ThresholdKind) -> bool {
        match self {
            MonitorType::Cpu => kind == ThresholdKind::Percent,
            MonitorType::Mem | MonitorType::Swap | MonitorType::Disk => {
                matches!(kind, ThresholdKind::Percent | ThresholdKind::Size)
            }
            MonitorType::Net => matches!(kind, ThresholdKind::Speed | ThresholdKind::Size),
            MonitorType::Temp => kind == ThresholdKind::Temperature,
        }
    }
}

impl fmt::Display for MonitorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "type")]
    pub monitor_type: MonitorType,
    pub threshold: String,
    pub matcher: String,
}

impl Rule {
    pub fn new(monitor_type: MonitorType, threshold: &str, matcher: &str) -> Self {
        Self {
            monitor_type,
            threshold: threshold.to_string(),
            matcher: matcher.to_string(),
        }
    }

    /// Stable key used in logs, e.g. `cpu->=77%-cpu`.
    pub fn id(&self) -> String {
        format!("{}-{}-{}", self.monitor_type, self.threshold, self.matcher)
    }

    /// Check the threshold parses and suits the monitor type, without a status.
    pub fn validate(&self) -> Result<Threshold, RuleError> {
        let threshold = Threshold::parse(&self.threshold)?;
        if !self.monitor_type.supports(threshold.kind) {
            return Err(RuleError::InvalidThresholdKind {
                monitor: self.monitor_type,
                kind: threshold.kind,
            });
        }
        Ok(threshold)
    }

    /// Evaluate against the latest status.
    ///
    /// `Ok(Some(pair))` when the rule fires, `Ok(None)` when it was evaluated and did not,
    /// `Err(RuleError::NotReady)` while counters warm up.
    pub fn evaluate(&self, status: &Status) -> Result<Option<PushPair>, RuleError> {
        let threshold = self.validate()?;

        let (key, reading) = match self.monitor_type {
            MonitorType::Cpu => self.cpu(status)?,
            MonitorType::Mem => self.memory(status, threshold.kind)?,
            MonitorType::Swap => self.swap(status, threshold.kind)?,
            MonitorType::Disk => self.disk(status, threshold.kind)?,
            MonitorType::Net => self.network(status, threshold.kind)?,
            MonitorType::Temp => self.temperature(status)?,
        };

        if threshold.evaluate(&reading)? {
            Ok(Some(PushPair::new(key, reading.to_string())))
        } else {
            Ok(None)
        }
    }

    fn invalid_matcher<S: Into<String>>(&self, reason: S) -> RuleError {
        RuleError::invalid_matcher(self.monitor_type, &self.matcher, reason)
    }

    fn cpu(&self, status: &Status) -> Result<(String, Reading), RuleError> {
        let (key, slot) = match self.matcher.as_str() {
            "" | "cpu" => ("cpu".to_string(), 0),
            m => {
                let index: usize = m
                    .strip_prefix("cpu")
                    .and_then(|n| n.parse().ok())
                    .ok_or_else(|| self.invalid_matcher("expected `cpu` or `cpu<N>`"))?;
                let slot = index
                    .checked_add(1)
                    .ok_or_else(|| self.invalid_matcher("core index out of range"))?;
                (m.to_string(), slot)
            }
        };

        if status.cpu.is_empty() {
            return Err(RuleError::NotReady);
        }
        let core = status.cpu.get(slot).ok_or_else(|| {
            self.invalid_matcher(format!(
                "only {} cores available",
                status.cpu.len().saturating_sub(1)
            ))
        })?;

        Ok((key, Reading::Percent(core.used_percent()?)))
    }

    fn memory(&self, status: &Status, kind: ThresholdKind) -> Result<(String, Reading), RuleError> {
        let mem = status.mem.ok_or(RuleError::NotReady)?;
        let value = match self.matcher.as_str() {
            "used" => mem.used,
            "free" => mem.free,
            "available" => mem.available,
            "cached" => mem.cached,
            _ => {
                return Err(
                    self.invalid_matcher("expected one of used, free, available, cached")
                )
            }
        };
        let reading = size_or_share(value, mem.total, kind)?;
        Ok((format!("{} of Memory", self.matcher), reading))
    }

    fn swap(&self, status: &Status, kind: ThresholdKind) -> Result<(String, Reading), RuleError> {
        let swap = status.swap.ok_or(RuleError::NotReady)?;
        let value = match self.matcher.as_str() {
            "used" => swap.used,
            "free" => swap.free,
            "cached" => swap.cached,
            _ => return Err(self.invalid_matcher("expected one of used, free, cached")),
        };
        let reading = size_or_share(value, swap.total, kind)?;
        Ok((format!("{} of Swap", self.matcher), reading))
    }

    fn disk(&self, status: &Status, kind: ThresholdKind) -> Result<(String, Reading), RuleError> {
        if status.disks.is_empty() {
            return Err(RuleError::NotReady);
        }
        let disk = status
            .disks
            .iter()
            .find(|d| d.mount_path == self.matcher || d.filesystem == self.matcher)
            .ok_or_else(|| self.invalid_matcher("no such mount path or filesystem"))?;

        let reading = match kind {
            ThresholdKind::Size => Reading::Size(disk.used),
            _ => Reading::Percent(disk.used_percent),
        };
        Ok((self.matcher.clone(), reading))
    }

    fn network(&self, status: &Status, kind: ThresholdKind) -> Result<(String, Reading), RuleError> {
        let (stem, direction) = Direction::split(&self.matcher);
        if stem.is_empty() {
            return Err(self.invalid_matcher("missing interface name"));
        }
        if status.network.is_empty() {
            return Err(RuleError::NotReady);
        }

        let interfaces: &[NetworkStatus] = if stem == "all" {
            &status.network
        } else {
            // An exact name beats the first partial match
            let position = status
                .network
                .iter()
                .position(|n| n.interface == stem)
                .or_else(|| status.network.iter().position(|n| n.interface.contains(stem)))
                .ok_or_else(|| self.invalid_matcher("no interface contains this name"))?;
            &status.network[position..=position]
        };
        let totals = NetworkTotals(interfaces);

        let reading = match kind {
            ThresholdKind::Speed => {
                let elapsed = status.elapsed;
                let speed = match direction {
                    Direction::In => totals.receive_speed(elapsed)?,
                    Direction::Out => totals.transmit_speed(elapsed)?,
                    Direction::Both => {
                        totals.receive_speed(elapsed)? + totals.transmit_speed(elapsed)?
                    }
                };
                Reading::Speed(speed)
            }
            _ => Reading::Size(match direction {
                Direction::In => totals.receive(),
                Direction::Out => totals.transmit(),
                Direction::Both => totals.receive() + totals.transmit(),
            }),
        };
        Ok((self.matcher.clone(), reading))
    }

    fn temperature(&self, status: &Status) -> Result<(String, Reading), RuleError> {
        // No thermal zones on this host
        if status.temperatures.is_empty() {
            return Err(RuleError::NotReady);
        }
        let sensor = status
            .temperatures
            .iter()
            .find(|t| t.name.contains(self.matcher.as_str()))
            .ok_or_else(|| self.invalid_matcher("no sensor contains this name"))?;
        Ok((self.matcher.clone(), Reading::Temperature(sensor.value)))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.monitor_type, self.matcher, self.threshold)
    }
}

/// Absolute bytes for a size threshold, share of `total` for a percent one.
fn size_or_share(value: Size, total: Size, kind: ThresholdKind) -> Result<Reading, NotReady> {
    match kind {
        ThresholdKind::Size => Ok(Reading::Size(value)),
        _ if total.bytes() == 0 => Err(NotReady),
        _ => Ok(Reading::Percent(value.as_f64() / total.as_f64() * 100.0)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    In,
    Out,
    Both,
}

impl Direction {
    /// `-in`, `-out`, or both suffixes (`-out-in`, `-in-out`) after the interface stem.
    fn split(matcher: &str) -> (&str, Direction) {
        if let Some(stem) = matcher
            .strip_suffix("-out-in")
            .or_else(|| matcher.strip_suffix("-in-out"))
        {
            (stem, Direction::Both)
        } else if let Some(stem) = matcher.strip_suffix("-in") {
            (stem, Direction::In)
        } else if let Some(stem) = matcher.strip_suffix("-out") {
            (stem, Direction::Out)
        } else {
            (matcher, Direction::Both)
        }
    }
}
