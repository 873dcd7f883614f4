use colored::{ColoredString, Colorize};
use std::path::Path;

use crate::core::config::{AppConfig, ConfigProblem};
use crate::core::push::PushPair;
use crate::core::rule::Rule;
use crate::core::status::{Status, StatusSummary};
use crate::error::RuleError;

const BAR_WIDTH: usize = 20;

pub fn print_section_header(title: &str) {
    println!("\n{}", title.bold().green());
    println!("{}", "-".repeat(title.chars().count()));
}

/// `[██████░░░░]`, colored by load.
pub fn usage_bar(usage_percent: f64, width: usize) -> String {
    let filled = ((usage_percent.clamp(0.0, 100.0) / 100.0) * width as f64) as usize;
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(width - filled));

    let colored_bar = if usage_percent >= 85.0 {
        bar.red()
    } else if usage_percent >= 70.0 {
        bar.yellow()
    } else {
        bar.green()
    };
    format!("[{}]", colored_bar)
}

fn or_pending(value: &str) -> ColoredString {
    if value.is_empty() {
        "n/a".dimmed()
    } else {
        value.normal()
    }
}

pub fn print_status(summary: &StatusSummary, status: &Status) {
    print_section_header(&format!("Server: {}", summary.name));

    match status.cpu_usage() {
        Ok(usage) => println!("  CPU:     {} {}", usage_bar(usage, BAR_WIDTH), summary.cpu),
        Err(_) => println!("  CPU:     {}", or_pending(&summary.cpu)),
    }
    println!("  Memory:  {}", or_pending(&summary.mem));
    println!("  Network: {} {}", or_pending(&summary.net), "(rx / tx)".dimmed());
    println!("  Disk:    {}", or_pending(&summary.disk));

    if status.cpu.len() > 1 {
        print_section_header("Cores");
        for core in &status.cpu[1..] {
            match core.used_percent() {
                Ok(usage) => println!(
                    "  {:<6} {} {:.1}%",
                    core.name,
                    usage_bar(usage, BAR_WIDTH),
                    usage
                ),
                Err(_) => println!("  {:<6} {}", core.name, "n/a".dimmed()),
            }
        }
    }

    if !status.disks.is_empty() {
        print_section_header("Disks");
        for disk in &status.disks {
            println!(
                "  {:<20} {:<12} {} / {} ({:.1}%)",
                disk.mount_path, disk.filesystem, disk.used, disk.total, disk.used_percent
            );
        }
    }

    if !status.temperatures.is_empty() {
        print_section_header("Temperatures");
        for sensor in &status.temperatures {
            println!("  {:<20} {:.1}°C", sensor.name, sensor.value);
        }
    }
}

/// Plain-text outcome of one rule evaluation.
pub fn verdict_text(verdict: &Result<Option<PushPair>, RuleError>) -> String {
    match verdict {
        Ok(Some(pair)) => format!("FIRED {}: {}", pair.key, pair.value),
        Ok(None) => "ok".to_string(),
        Err(RuleError::NotReady) => "warming up".to_string(),
        Err(e) => format!("error: {}", e),
    }
}

fn colored_verdict(verdict: &Result<Option<PushPair>, RuleError>) -> ColoredString {
    let text = verdict_text(verdict);
    match verdict {
        Ok(Some(_)) => text.red().bold(),
        Ok(None) => text.green(),
        Err(RuleError::NotReady) => text.dimmed(),
        Err(_) => text.yellow(),
    }
}

pub fn print_rule_verdicts(rules: &[Rule], status: &Status) {
    print_section_header("Rules");
    if rules.is_empty() {
        println!("  {}", "No rules configured".dimmed());
        return;
    }
    for rule in rules {
        let verdict = rule.evaluate(status);
        println!("  {:<32} {}", rule.to_string(), colored_verdict(&verdict));
    }
}

pub fn print_config_report(path: &Path, config: &AppConfig, problems: &[ConfigProblem]) {
    print_section_header("Config");
    println!("  File:     {}", path.display().to_string().cyan());
    println!("  Version:  {}", config.version);
    println!("  Name:     {}", config.name);
    println!("  Interval: {:?}", config.interval());
    let limiter = config.rate_limiter();
    println!(
        "  Rate:     {} push(es) per {:?}",
        limiter.times(),
        limiter.window()
    );

    print_section_header("Rules");
    for rule in &config.rules {
        match rule.validate() {
            Ok(threshold) => println!("  {} {} ({})", "✓".green(), rule, threshold.kind),
            Err(e) => println!("  {} {}: {}", "✗".red(), rule, e),
        }
    }

    print_section_header("Pushes");
    for push in &config.pushes {
        match push.channel() {
            Ok(channel) => println!(
                "  {} {} [{}] {}",
                "✓".green(),
                push.name,
                push.push_type,
                channel.describe().dimmed()
            ),
            Err(e) => println!("  {} {} [{}]: {}", "✗".red(), push.name, push.push_type, e),
        }
    }

    println!();
    if problems.is_empty() {
        super::messages::success("✓ Config is valid");
    } else {
        println!(
            "{}",
            format!("✗ {} problem(s) found", problems.len()).red().bold()
        );
    }
}
