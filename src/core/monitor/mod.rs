//! The polling pipeline: sample, update status, evaluate rules, push.

mod runner;
mod sampler;

use std::time::Duration;

use super::config::AppConfig;
use super::push::{Dispatcher, PushPair};
use super::rule::Rule;
use super::status::{SharedStatus, Status};
use crate::error::{Result, StatusError};

pub use runner::run;
pub use sampler::{Sampler, ShellSampler, OUTPUT_LOG_FILE_NAME, SCRIPT_FILE_NAME};

/// Owns the rules and the push dispatcher; shares the status with readers.
pub struct Monitor {
    status: SharedStatus,
    rules: Vec<Rule>,
    dispatcher: Dispatcher,
}

impl Monitor {
    pub fn new(status: SharedStatus, rules: Vec<Rule>, dispatcher: Dispatcher) -> Self {
        Self {
            status,
            rules,
            dispatcher,
        }
    }

    pub fn from_config(config: &AppConfig, status: SharedStatus) -> Result<Self> {
        let dispatcher = Dispatcher::new(&config.name, &config.pushes, config.rate_limiter())?;
        Ok(Self::new(status, config.rules.clone(), dispatcher))
    }

    pub fn status(&self) -> &SharedStatus {
        &self.status
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Apply one raw sample and return the pairs of every rule that fired.
    pub fn process_output(
        &self,
        raw: &str,
        elapsed: Duration,
    ) -> std::result::Result<Vec<PushPair>, StatusError> {
        self.status.write().apply_output(raw, elapsed)?;
        Ok(self.evaluate_rules())
    }

    pub fn evaluate_rules(&self) -> Vec<PushPair> {
        let status = self.status.read();
        evaluate_rules(&self.rules, &status)
    }
}

/// Evaluate every rule; broken rules are logged and skipped, warm-up is silent.
pub fn evaluate_rules(rules: &[Rule], status: &Status) -> Vec<PushPair> {
    let mut pairs = Vec::new();
    for rule in rules {
        match rule.evaluate(status) {
            Ok(Some(pair)) => {
                log::debug!("Rule {} fired: {} = {}", rule.id(), pair.key, pair.value);
                pairs.push(pair);
            }
            Ok(None) => {}
            Err(e) if e.is_not_ready() => {}
            Err(e) => log::warn!("Rule {} skipped: {}", rule.id(), e),
        }
    }
    pairs
}
