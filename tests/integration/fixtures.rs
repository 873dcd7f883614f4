//! Raw sampler output shared by the integration tests.

use boxwatch::core::status::SEGMENT_MARKER;

const NET_DEV: &str = "Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:  {lo_rx}      10    0    0    0     0          0         0  {lo_tx}      10    0    0    0     0       0          0
  eth0:  {eth_rx}   3000    0    0    0     0          0         0  {eth_tx}    1500    0    0    0     0       0          0";

const DF: &str = "Filesystem      Size  Used Avail Use% Mounted on
/dev/sda1        20G   19G  1.0G  95% /
tmpfs           1.9G     0  1.9G   0% /dev/shm";

const MEMINFO: &str = "MemTotal:        1000 kB
MemFree:          100 kB
MemAvailable:     200 kB
Cached:           300 kB
SwapCached:         0 kB
SwapTotal:          0 kB
SwapFree:           0 kB";

/// One sampling pass where the aggregate cpu line is `used/total` jiffies.
pub fn sample(cpu_used: u64, cpu_total: u64, eth_rx: u64, eth_tx: u64) -> String {
    let idle = cpu_total - cpu_used;
    let stat = format!(
        "cpu  {used} 0 0 {idle} 0 0 0 0 0 0\ncpu0 {used} 0 0 {idle} 0 0 0 0 0 0",
        used = cpu_used,
        idle = idle
    );
    let net = NET_DEV
        .replace("{lo_rx}", "100")
        .replace("{lo_tx}", "100")
        .replace("{eth_rx}", &eth_rx.to_string())
        .replace("{eth_tx}", &eth_tx.to_string());

    [
        "",
        net.as_str(),
        stat.as_str(),
        DF,
        MEMINFO,
        "x86_pkg_temp",
        "82000",
    ]
    .join(format!("\n{}\n", SEGMENT_MARKER).as_str())
}
