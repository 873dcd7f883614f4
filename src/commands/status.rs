use anyhow::{Context, Result};
use serde::Serialize;
use std::time::{Duration, Instant};

use super::{build_runtime, config_path, data_dir};
use crate::core::config::AppConfig;
use crate::core::monitor::{Sampler, ShellSampler};
use crate::core::push::PushPair;
use crate::core::rule::Rule;
use crate::core::status::{Status, StatusSummary};
use crate::ui;

#[derive(Debug, Serialize)]
struct StatusReport {
    status: StatusSummary,
    rules: Vec<RuleReport>,
}

#[derive(Debug, Serialize)]
struct RuleReport {
    id: String,
    ready: bool,
    pair: Option<PushPair>,
    error: Option<String>,
}

impl RuleReport {
    fn new(rule: &Rule, status: &Status) -> Self {
        let (ready, pair, error) = match rule.evaluate(status) {
            Ok(pair) => (true, pair, None),
            Err(e) if e.is_not_ready() => (false, None, None),
            Err(e) => (true, None, Some(e.to_string())),
        };
        Self {
            id: rule.id(),
            ready,
            pair,
            error,
        }
    }
}

/// Sample twice, one interval apart, and show the result.
pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    let path = config_path(matches)?;
    let config = AppConfig::load(&path)?;
    let sampler = ShellSampler::install(&data_dir(&path))
        .with_context(|| "Failed to install the sampling script")?;
    let interval = config.interval();

    if !matches.get_flag("json") {
        ui::info(&format!("Sampling twice, {:?} apart...", interval));
    }

    let runtime = build_runtime()?;
    let status = runtime.block_on(collect(&sampler, interval))?;
    let summary = status.summary(&config.name);

    if matches.get_flag("json") {
        let report = StatusReport {
            status: summary,
            rules: config
                .rules
                .iter()
                .map(|rule| RuleReport::new(rule, &status))
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        ui::print_status(&summary, &status);
        ui::print_rule_verdicts(&config.rules, &status);
    }

    Ok(())
}

async fn collect<S: Sampler>(sampler: &S, interval: Duration) -> Result<Status> {
    let mut status = Status::new();

    let first = sampler.sample().await?;
    let sampled_at = Instant::now();
    status.apply_output(&first, interval)?;

    tokio::time::sleep(interval).await;

    let second = sampler.sample().await?;
    status.apply_output(&second, sampled_at.elapsed())?;
    Ok(status)
}
