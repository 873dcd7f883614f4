use anyhow::{Context, Result};
use std::future::Future;
use std::io;
use std::path::PathBuf;
use tokio::sync::broadcast;

use super::{build_runtime, config_path, data_dir};
use crate::core::config::AppConfig;
use crate::core::monitor::{self, Monitor, ShellSampler};
use crate::core::status::{self, Status};
use crate::web;

/// Run the poller and the status endpoint until ctrl-c.
pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    let path = config_path(matches)?;
    let addr = matches
        .get_one::<String>("addr")
        .map(String::as_str)
        .unwrap_or(web::DEFAULT_ADDR)
        .to_string();
    let tls = match (
        matches.get_one::<PathBuf>("crt"),
        matches.get_one::<PathBuf>("key"),
    ) {
        (Some(cert), Some(key)) => Some(web::TlsFiles {
            cert: cert.clone(),
            key: key.clone(),
        }),
        _ => None,
    };

    let config = AppConfig::load(&path)?;
    for problem in config.validate() {
        log::warn!("Config problem, {}", problem);
    }

    let sampler = ShellSampler::install(&data_dir(&path))
        .with_context(|| "Failed to install the sampling script")?;
    let shared = status::shared(Status::new());
    let monitor = Monitor::from_config(&config, shared.clone())?;
    let interval = config.interval();

    let runtime = build_runtime()?;
    runtime.block_on(async move {
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        let router = web::build_router(shared, &config.name);
        let web_shutdown = shutdown_tx.subscribe();
        let mut web_task =
            tokio::spawn(async move { web::serve(&addr, tls, router, web_shutdown).await });

        tokio::spawn(forward_ctrl_c(tokio::signal::ctrl_c(), shutdown_tx.clone()));

        let monitor_shutdown = shutdown_tx.subscribe();
        tokio::select! {
            _ = monitor::run(&monitor, &sampler, interval, monitor_shutdown) => {}
            result = &mut web_task => {
                // The endpoint stopped on its own, e.g. the address is taken
                let _ = shutdown_tx.send(());
                return result.context("HTTP server task panicked").and_then(|r| r);
            }
        }

        web_task
            .await
            .context("HTTP server task panicked")
            .and_then(|r| r)
    })
}

/// Broadcast shutdown once `signal` fires. A handler that cannot be installed
/// leaves the server running.
async fn forward_ctrl_c<F>(signal: F, shutdown: broadcast::Sender<()>)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            log::info!("Received ctrl-c, stopping");
            let _ = shutdown.send(());
        }
        Err(e) => log::error!("Failed to listen for ctrl-c, stop the process another way: {}", e),
    }
}
