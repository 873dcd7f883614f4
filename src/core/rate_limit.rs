use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Sliding-window limiter keyed by push name.
///
/// Only successful sends are recorded, so a failing channel keeps retrying
/// every tick until it delivers.
#[derive(Debug)]
pub struct RateLimiter {
    times: usize,
    window: Duration,
    history: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(times: usize, window: Duration) -> Self {
        Self {
            times,
            window,
            history: Mutex::new(HashMap::new()),
        }
    }

    pub fn times(&self) -> usize {
        self.times
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether `key` may send now.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    /// Record one send for `key`.
    pub fn acquire(&self, key: &str) {
        self.acquire_at(key, Instant::now());
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut history = self.history.lock();
        match history.get_mut(key) {
            Some(queue) => {
                Self::expire(queue, now, self.window);
                queue.len() < self.times
            }
            None => self.times > 0,
        }
    }

    fn acquire_at(&self, key: &str, now: Instant) {
        let mut history = self.history.lock();
        let queue = history
            .entry(key.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.times));
        Self::expire(queue, now, self.window);
        queue.push_back(now);
    }

    fn expire(queue: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(&front) = queue.front() {
            if now.duration_since(front) < window {
                break;
            }
            queue.pop_front();
        }
    }
}

impl Default for RateLimiter {
    /// One push per ten seconds.
    fn default() -> Self {
        Self::new(1, Duration::from_secs(10))
    }
}
