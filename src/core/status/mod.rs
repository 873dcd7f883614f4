//! Latest machine readings, rewritten in place on every polling tick.
//!
//! The poller is the only writer; the rule engine and the HTTP handler read
//! through [`SharedStatus`], so a reader never observes a half-applied tick.

mod parser;
mod summary;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;

use super::size::Size;
use super::time_seq::{counter_delta, Sample, TimeSequence};
use crate::error::NotReady;

pub use parser::SEGMENT_MARKER;
pub use summary::StatusSummary;

/// Status guarded by a single-writer / many-reader lock.
pub type SharedStatus = Arc<RwLock<Status>>;

pub fn shared(status: Status) -> SharedStatus {
    Arc::new(RwLock::new(status))
}

#[derive(Debug, Clone, Default)]
pub struct Status {
    /// Slot 0 is the aggregate of all cores, slot `n + 1` is core `n`.
    pub cpu: Vec<CpuStatus>,
    pub mem: Option<MemStatus>,
    pub swap: Option<SwapStatus>,
    pub disks: Vec<DiskStatus>,
    pub network: Vec<NetworkStatus>,
    pub temperatures: Vec<TemperatureStatus>,
    /// Wall-clock time spanned by the latest network counter deltas.
    pub elapsed: Duration,
    /// Time of samples whose network section failed to parse.
    pub(crate) unapplied_network: Duration,
}

impl Status {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate CPU usage over all cores.
    pub fn cpu_usage(&self) -> Result<f64, NotReady> {
        self.cpu.first().ok_or(NotReady)?.used_percent()
    }

    pub fn network_totals(&self) -> NetworkTotals<'_> {
        NetworkTotals(&self.network)
    }
}

/// Cumulative jiffies from one `/proc/stat` cpu line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub used: u64,
    pub total: u64,
}

impl Sample for CpuTimes {
    fn delta(&self, older: &Self) -> Self {
        CpuTimes {
            used: counter_delta("cpu.used", self.used, older.used),
            total: counter_delta("cpu.total", self.total, older.total),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CpuStatus {
    /// `cpu` for the aggregate line, `cpuN` for core N.
    pub name: String,
    pub times: TimeSequence<CpuTimes>,
}

impl CpuStatus {
    pub fn used_percent(&self) -> Result<f64, NotReady> {
        let delta = self.times.delta()?;
        if delta.total == 0 {
            return Err(NotReady);
        }
        Ok(delta.used as f64 / delta.total as f64 * 100.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemStatus {
    pub total: Size,
    pub available: Size,
    pub free: Size,
    pub used: Size,
    pub cached: Size,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SwapStatus {
    pub total: Size,
    pub free: Size,
    pub used: Size,
    pub cached: Size,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiskStatus {
    pub mount_path: String,
    pub filesystem: String,
    pub total: Size,
    pub used: Size,
    pub avail: Size,
    /// 0-100
    pub used_percent: f64,
}

/// Cumulative byte counters of one interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetTraffic {
    pub transmit: Size,
    pub receive: Size,
}

impl Sample for NetTraffic {
    fn delta(&self, older: &Self) -> Self {
        NetTraffic {
            transmit: Size(counter_delta(
                "net.transmit",
                self.transmit.bytes(),
                older.transmit.bytes(),
            )),
            receive: Size(counter_delta(
                "net.receive",
                self.receive.bytes(),
                older.receive.bytes(),
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NetworkStatus {
    pub interface: String,
    pub traffic: TimeSequence<NetTraffic>,
}

impl NetworkStatus {
    pub fn transmit_speed(&self, elapsed: Duration) -> Result<Size, NotReady> {
        Ok(Size::per_second(self.traffic.delta()?.transmit, elapsed))
    }

    pub fn receive_speed(&self, elapsed: Duration) -> Result<Size, NotReady> {
        Ok(Size::per_second(self.traffic.delta()?.receive, elapsed))
    }

    pub fn transmit(&self) -> Size {
        self.traffic.latest().map(|t| t.transmit).unwrap_or_default()
    }

    pub fn receive(&self) -> Size {
        self.traffic.latest().map(|t| t.receive).unwrap_or_default()
    }
}

/// Sum over every interface.
#[derive(Debug, Clone, Copy)]
pub struct NetworkTotals<'a>(pub &'a [NetworkStatus]);

impl NetworkTotals<'_> {
    pub fn transmit_speed(&self, elapsed: Duration) -> Result<Size, NotReady> {
        self.0.iter().map(|n| n.transmit_speed(elapsed)).sum()
    }

    pub fn receive_speed(&self, elapsed: Duration) -> Result<Size, NotReady> {
        self.0.iter().map(|n| n.receive_speed(elapsed)).sum()
    }

    pub fn transmit(&self) -> Size {
        self.0.iter().map(NetworkStatus::transmit).sum()
    }

    pub fn receive(&self) -> Size {
        self.0.iter().map(NetworkStatus::receive).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemperatureStatus {
    pub name: String,
    /// Degrees celsius.
    pub value: f64,
}
