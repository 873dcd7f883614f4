use std::io;
use thiserror::Error;

use crate::core::rule::MonitorType;
use crate::core::threshold::ThresholdKind;

/// Custom error type for boxwatch
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Push error: {0}")]
    Push(String),

    #[error("Sampler error: {0}")]
    Sampler(String),
}

/// Result type alias for boxwatch
pub type Result<T> = std::result::Result<T, MonitorError>;

impl MonitorError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        MonitorError::Config(msg.into())
    }

    /// Create a push error
    pub fn push<S: Into<String>>(msg: S) -> Self {
        MonitorError::Push(msg.into())
    }

    pub fn sampler<S: Into<String>>(msg: S) -> Self {
        MonitorError::Sampler(msg.into())
    }
}

/// Failure to parse a size (`"10m"`) or a threshold expression (`">=80%"`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,

    #[error("expression {0:?} is too short")]
    TooShort(String),

    #[error("missing or unknown comparator in {0:?}")]
    Comparator(String),

    #[error("unknown unit in {0:?}")]
    Unit(String),

    #[error("invalid number {0:?}")]
    Number(String),
}

/// A time sequence holds fewer than two samples.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("not ready")]
pub struct NotReady;

/// Outcome of a rule evaluation that did not produce a verdict.
///
/// Everything except [`RuleError::NotReady`] is a configuration problem with
/// the rule itself: the caller logs it and skips the rule for this tick.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("not ready")]
    NotReady,

    #[error("invalid matcher {matcher:?} for {monitor}: {reason}")]
    InvalidMatcher {
        monitor: MonitorType,
        matcher: String,
        reason: String,
    },

    #[error("{kind} threshold is not supported by {monitor}")]
    InvalidThresholdKind {
        monitor: MonitorType,
        kind: ThresholdKind,
    },

    #[error("cannot compare a {found} value against a {expected} threshold")]
    TypeMismatch {
        expected: ThresholdKind,
        found: ThresholdKind,
    },

    #[error("invalid threshold: {0}")]
    Parse(#[from] ParseError),
}

impl RuleError {
    pub fn is_not_ready(&self) -> bool {
        matches!(self, RuleError::NotReady)
    }

    pub(crate) fn invalid_matcher<S: Into<String>>(
        monitor: MonitorType,
        matcher: &str,
        reason: S,
    ) -> Self {
        RuleError::InvalidMatcher {
            monitor,
            matcher: matcher.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<NotReady> for RuleError {
    fn from(_: NotReady) -> Self {
        RuleError::NotReady
    }
}

/// Raw sampler output could not be turned into a status update.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    #[error("invalid shell output: {0}")]
    InvalidOutput(String),

    #[error("invalid {section} line: {line:?}")]
    InvalidLine { section: &'static str, line: String },

    #[error("invalid number {value:?} in {section} section")]
    Number { section: &'static str, value: String },
}
