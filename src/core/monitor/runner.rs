use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};

use super::{Monitor, Sampler};

/// Poll until `shutdown` fires.
///
/// Sampling and pushing happen outside the status lock; elapsed time is measured
/// between samples that were applied successfully.
pub async fn run<S: Sampler>(
    monitor: &Monitor,
    sampler: &S,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    log::info!(
        "Monitoring {} rule(s) every {:?}",
        monitor.rules().len(),
        period
    );

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_applied: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let raw = match sampler.sample().await {
                    Ok(raw) => raw,
                    Err(e) => {
                        log::warn!("Sampling failed: {}", e);
                        continue;
                    }
                };

                let now = Instant::now();
                let elapsed = last_applied.map_or(period, |t| now.duration_since(t));
                let pairs = match monitor.process_output(&raw, elapsed) {
                    Ok(pairs) => pairs,
                    Err(e) => {
                        log::warn!("Failed to update status: {}", e);
                        continue;
                    }
                };
                last_applied = Some(now);

                monitor.dispatcher().dispatch(&pairs).await;
            }
            _ = shutdown.recv() => {
                log::info!("Monitor loop shutting down");
                break;
            }
        }
    }
}
