//! Turns the sampling script's raw text into status updates.
//!
//! The script prints seven sections separated by [`SEGMENT_MARKER`]:
//! a preamble, `/proc/net/dev`, the cpu lines of `/proc/stat`, `df -h`,
//! a subset of `/proc/meminfo`, thermal zone types and thermal zone temps.

use std::time::Duration;

use super::{
    CpuStatus, CpuTimes, DiskStatus, NetTraffic, NetworkStatus, Status, TemperatureStatus,
};
use crate::core::size::Size;
use crate::error::StatusError;

pub const SEGMENT_MARKER: &str = "SrvBox";
const SEGMENT_COUNT: usize = 7;

/// Printed by `cat` when the platform has no thermal zones.
const NO_THERMAL_SENTINEL: &str = "/sys/class/thermal/thermal_zone*/type";

/// `/proc/meminfo` reports kB.
const MEMINFO_UNIT: u64 = 1024;

impl Status {
    /// Apply one sampling pass. Sections parse independently: a malformed
    /// section is logged and keeps its previous value.
    pub fn apply_output(&mut self, output: &str, elapsed: Duration) -> Result<(), StatusError> {
        let segments: Vec<&str> = output.split(SEGMENT_MARKER).map(str::trim).collect();
        if segments.len() != SEGMENT_COUNT {
            return Err(StatusError::InvalidOutput(format!(
                "expected {} segments, got {}",
                SEGMENT_COUNT,
                segments.len()
            )));
        }

        // A skipped network section widens the next delta, so its time carries over
        match self.apply_network(segments[1]) {
            Ok(()) => {
                self.elapsed = self.unapplied_network + elapsed;
                self.unapplied_network = Duration::ZERO;
            }
            Err(e) => {
                self.unapplied_network += elapsed;
                log::warn!("Failed to parse network status: {}", e);
            }
        }
        if let Err(e) = self.apply_cpu(segments[2]) {
            log::warn!("Failed to parse cpu status: {}", e);
        }
        self.apply_disks(segments[3]);
        if let Err(e) = self.apply_memory(segments[4]) {
            log::warn!("Failed to parse memory status: {}", e);
        }
        if let Err(e) = self.apply_temperatures(segments[5], segments[6]) {
            log::warn!("Failed to parse temperature status: {}", e);
        }

        Ok(())
    }

    pub fn apply_cpu(&mut self, section: &str) -> Result<(), StatusError> {
        let samples = section
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("cpu"))
            .map(parse_cpu_line)
            .collect::<Result<Vec<_>, _>>()?;

        let mut previous = std::mem::take(&mut self.cpu);
        self.cpu = samples
            .into_iter()
            .map(|(name, times)| {
                let mut entry = take_by_name(&mut previous, |c: &CpuStatus| c.name == name)
                    .unwrap_or_else(|| CpuStatus {
                        name,
                        ..Default::default()
                    });
                entry.times.update(times);
                entry
            })
            .collect();
        Ok(())
    }

    pub fn apply_network(&mut self, section: &str) -> Result<(), StatusError> {
        let samples = section
            .lines()
            .skip(2)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(parse_network_line)
            .collect::<Result<Vec<_>, _>>()?;

        let mut previous = std::mem::take(&mut self.network);
        self.network = samples
            .into_iter()
            .map(|(interface, traffic)| {
                let mut entry =
                    take_by_name(&mut previous, |n: &NetworkStatus| n.interface == interface)
                        .unwrap_or_else(|| NetworkStatus {
                            interface,
                            ..Default::default()
                        });
                entry.traffic.update(traffic);
                entry
            })
            .collect();
        Ok(())
    }

    /// Rebuilt on every call; lines that fail to parse are dropped.
    pub fn apply_disks(&mut self, section: &str) {
        self.disks = section
            .lines()
            .skip(1)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| {
                let disk = parse_disk_line(line);
                if disk.is_none() {
                    log::debug!("Skipping unparsable disk line: {:?}", line);
                }
                disk
            })
            .collect();
    }

    pub fn apply_memory(&mut self, section: &str) -> Result<(), StatusError> {
        let mut mem = self.mem.unwrap_or_default();
        let mut swap = self.swap.unwrap_or_default();
        let mut has_available = false;

        for line in section.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let mut fields = line.split_whitespace();
            let (Some(key), Some(value)) = (fields.next(), fields.next()) else {
                return Err(StatusError::InvalidLine {
                    section: "memory",
                    line: line.to_string(),
                });
            };
            let kb: u64 = value.parse().map_err(|_| StatusError::Number {
                section: "memory",
                value: value.to_string(),
            })?;
            let size = Size(kb.saturating_mul(MEMINFO_UNIT));

            match key {
                "MemTotal:" => mem.total = size,
                "MemFree:" => mem.free = size,
                "MemAvailable:" => {
                    mem.available = size;
                    has_available = true;
                }
                "Cached:" => mem.cached = size,
                "SwapTotal:" => swap.total = size,
                "SwapFree:" => swap.free = size,
                "SwapCached:" => swap.cached = size,
                _ => {}
            }
        }

        if !has_available {
            // Kernels before 3.14 have no MemAvailable
            mem.available = mem.free + mem.cached;
        }
        mem.used = mem.total.saturating_sub(mem.available);
        swap.used = swap.total.saturating_sub(swap.free);

        self.mem = Some(mem);
        self.swap = Some(swap);
        Ok(())
    }

    pub fn apply_temperatures(&mut self, types: &str, values: &str) -> Result<(), StatusError> {
        if types.contains(NO_THERMAL_SENTINEL) || types.is_empty() {
            self.temperatures.clear();
            return Ok(());
        }

        let names: Vec<&str> = types.lines().map(str::trim).collect();
        let readings: Vec<&str> = values.lines().map(str::trim).collect();
        if names.len() != readings.len() {
            return Err(StatusError::InvalidOutput(format!(
                "{} thermal zone types but {} temperatures",
                names.len(),
                readings.len()
            )));
        }

        self.temperatures = names
            .into_iter()
            .zip(readings)
            .map(|(name, raw)| {
                let millis: f64 = raw.parse().map_err(|_| StatusError::Number {
                    section: "temperature",
                    value: raw.to_string(),
                })?;
                Ok(TemperatureStatus {
                    name: name.to_string(),
                    value: millis / 1000.0,
                })
            })
            .collect::<Result<_, StatusError>>()?;
        Ok(())
    }
}

fn take_by_name<T>(entries: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> Option<T> {
    let idx = entries.iter().position(matches)?;
    Some(entries.remove(idx))
}

fn parse_counter(section: &'static str, value: &str) -> Result<u64, StatusError> {
    value.parse().map_err(|_| StatusError::Number {
        section,
        value: value.to_string(),
    })
}

/// `cpu0 user nice system idle iowait irq softirq [steal guest guest_nice]`
fn parse_cpu_line(line: &str) -> Result<(String, CpuTimes), StatusError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 8 {
        return Err(StatusError::InvalidLine {
            section: "cpu",
            line: line.to_string(),
        });
    }

    let mut total = 0u64;
    for field in &fields[1..8] {
        total += parse_counter("cpu", field)?;
    }
    let idle = parse_counter("cpu", fields[4])?;

    Ok((
        fields[0].to_string(),
        CpuTimes {
            used: total.saturating_sub(idle),
            total,
        },
    ))
}

/// `eth0: rx_bytes rx_packets ... (8 receive fields) tx_bytes ...`
fn parse_network_line(line: &str) -> Result<(String, NetTraffic), StatusError> {
    let invalid = || StatusError::InvalidLine {
        section: "network",
        line: line.to_string(),
    };

    // Large counters can run into the colon: "eth0:123456 ..."
    let (name, counters) = line.split_once(':').ok_or_else(invalid)?;
    let fields: Vec<&str> = counters.split_whitespace().collect();
    if fields.len() != 16 {
        return Err(invalid());
    }

    Ok((
        name.trim().to_string(),
        NetTraffic {
            receive: Size(parse_counter("network", fields[0])?),
            transmit: Size(parse_counter("network", fields[8])?),
        },
    ))
}

/// `Filesystem Size Used Avail Use% Mounted-on`
fn parse_disk_line(line: &str) -> Option<DiskStatus> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 6 {
        return None;
    }

    let total = Size::parse(fields[1]).ok()?;
    let used = Size::parse(fields[2]).ok()?;
    let avail = Size::parse(fields[3]).ok()?;
    let used_percent = if total.bytes() > 0 {
        used.as_f64() / total.as_f64() * 100.0
    } else {
        0.0
    };

    Some(DiskStatus {
        mount_path: fields[5].to_string(),
        filesystem: fields[0].to_string(),
        total,
        used,
        avail,
        used_percent,
    })
}
