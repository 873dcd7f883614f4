use serde::{Deserialize, Serialize};

use super::Status;
use crate::core::size::Size;

/// One-line-per-category view served by `GET /status` and `boxwatch status`.
///
/// Categories without data yet are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub name: String,
    pub cpu: String,
    pub mem: String,
    pub net: String,
    pub disk: String,
}

impl Status {
    pub fn summary(&self, name: &str) -> StatusSummary {
        let cpu = self
            .cpu_usage()
            .map(|usage| format!("{:.1}%", usage))
            .unwrap_or_default();

        let mem = self
            .mem
            .map(|m| format!("{} / {}", m.used, m.total))
            .unwrap_or_default();

        let net = if self.network.is_empty() {
            String::new()
        } else {
            let totals = self.network_totals();
            format!("{} / {}", totals.receive(), totals.transmit())
        };

        // Only block devices, each counted once even when mounted twice
        let mut seen: Vec<&str> = Vec::new();
        let (mut disk_used, mut disk_total) = (Size::ZERO, Size::ZERO);
        for d in &self.disks {
            if !d.filesystem.starts_with("/dev") || seen.contains(&d.filesystem.as_str()) {
                continue;
            }
            seen.push(&d.filesystem);
            disk_used = disk_used + d.used;
            disk_total = disk_total + d.total;
        }
        let disk = if disk_total.bytes() > 0 {
            format!("{} / {}", disk_used, disk_total)
        } else {
            String::new()
        };

        StatusSummary {
            name: name.to_string(),
            cpu,
            mem,
            net,
            disk,
        }
    }
}
