use std::time::Duration;

use super::{Push, PushChannel, PushPair};
use crate::core::rate_limit::RateLimiter;
use crate::error::Result;

const PUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends fired pairs to every configured push, subject to the rate limiter.
pub struct Dispatcher {
    server_name: String,
    channels: Vec<(String, PushChannel)>,
    limiter: RateLimiter,
    client: reqwest::Client,
}

impl Dispatcher {
    /// Pushes whose settings fail to decode are logged and left out.
    pub fn new(server_name: &str, pushes: &[Push], limiter: RateLimiter) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(PUSH_TIMEOUT).build()?;

        let mut channels = Vec::with_capacity(pushes.len());
        for push in pushes {
            match push.channel() {
                Ok(channel) => channels.push((push.name.clone(), channel)),
                Err(e) => log::error!("Skipping push {}: {}", push.name, e),
            }
        }

        Ok(Self {
            server_name: server_name.to_string(),
            channels,
            limiter,
            client,
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Deliver `pairs` through every channel. Returns the number of successful sends.
    ///
    /// A failing channel is logged and does not stop the others; only successful
    /// sends count against the rate limit.
    pub async fn dispatch(&self, pairs: &[PushPair]) -> usize {
        if pairs.is_empty() {
            return 0;
        }
        log::info!("{} pair(s) to push", pairs.len());

        let mut delivered = 0;
        for (name, channel) in &self.channels {
            if !self.limiter.check(name) {
                log::warn!("Push {} rate limit reached", name);
                continue;
            }

            match channel.send(&self.client, &self.server_name, pairs).await {
                Ok(()) => {
                    self.limiter.acquire(name);
                    delivered += 1;
                    log::info!("Push {} succeeded", name);
                }
                Err(e) => log::warn!("Push {} failed: {}", name, e),
            }
        }
        delivered
    }
}
