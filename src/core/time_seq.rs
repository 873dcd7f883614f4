//! Two-slot holder for consecutive samples of cumulative OS counters.

use crate::error::NotReady;

/// A sample whose fields are cumulative counters.
pub trait Sample: Clone {
    /// Field-wise `self - older`.
    ///
    /// Counters only grow within a session; a field that went backwards
    /// (interface reset, counter wrap) is clamped to zero.
    fn delta(&self, older: &Self) -> Self;
}

/// The previous and the latest sample of one counter-producing entity.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSequence<T> {
    old: Option<T>,
    new: Option<T>,
}

impl<T> Default for TimeSequence<T> {
    fn default() -> Self {
        Self {
            old: None,
            new: None,
        }
    }
}

impl<T: Sample> TimeSequence<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, sample: T) {
        self.old = self.new.take();
        self.new = Some(sample);
    }

    pub fn latest(&self) -> Option<&T> {
        self.new.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.old.is_some() && self.new.is_some()
    }

    /// `new - old`, available once two samples have been recorded.
    pub fn delta(&self) -> Result<T, NotReady> {
        match (&self.old, &self.new) {
            (Some(old), Some(new)) => Ok(new.delta(old)),
            _ => Err(NotReady),
        }
    }
}

/// Subtract two counters, logging and clamping a reset to zero.
pub(crate) fn counter_delta(field: &str, new: u64, old: u64) -> u64 {
    if new < old {
        log::warn!(
            "Counter {} went backwards ({} -> {}), treating delta as 0",
            field,
            old,
            new
        );
        return 0;
    }
    new - old
}
