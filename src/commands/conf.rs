use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;

use super::config_path;
use crate::core::config::AppConfig;
use crate::ui;

pub fn handle(matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("init", sub_matches)) => {
            init(&config_path(sub_matches)?, sub_matches.get_flag("force"))
        }
        Some(("check", sub_matches)) => check(&config_path(sub_matches)?),
        _ => {
            println!("Use 'boxwatch conf --help' for more information.");
            Ok(())
        }
    }
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        ui::warn(&format!("Config already exists at {}", path.display()));
        println!("{}", "Use --force to overwrite it.".dimmed());
        return Ok(());
    }

    AppConfig::default().save(path)?;
    println!(
        "{} {}",
        "✓ Default config written to:".green(),
        path.display().to_string().cyan().bold()
    );
    Ok(())
}

fn check(path: &Path) -> Result<()> {
    let config = AppConfig::load(path)?;
    let problems = config.validate();
    ui::print_config_report(path, &config, &problems);

    if !problems.is_empty() {
        for problem in &problems {
            ui::error(&format!("  {}", problem));
        }
        bail!("{} problem(s) in {}", problems.len(), path.display());
    }
    Ok(())
}
