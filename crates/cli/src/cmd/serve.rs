//! Run the HTTP front end

use anyhow::{Context, Result};
use cli_lib::config::VaultConfig;
use cli_lib::dispatch::Dispatcher;
use cli_lib::server;
use journal::{Connector, MemoryConnector, SledConnector};
use owo_colors::OwoColorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn run(config: &VaultConfig, listen: Option<String>, memory: bool) -> Result<()> {
    // 1. Build the retention policy
    let policy = Arc::new(config.backup_policy()?);
    let addr = listen.unwrap_or_else(|| config.server.listen.clone());

    if config.accounts.is_empty() {
        warn!("No accounts configured, any credentials are accepted");
    }

    // 2. Bind before opening the backend so address errors surface first
    let http = server::bind(&addr)?;

    // 3. Open backend and serve
    if memory {
        info!("Using in-memory backend, snapshots are lost on exit");
        let dispatcher = Dispatcher::new(
            MemoryConnector::new(config.accounts()),
            policy,
            config.backend.address.clone(),
            config.server.realm.clone(),
        );
        serve(http, dispatcher, &addr, "memory").await
    } else {
        let connector = SledConnector::open(&config.backend.data_dir, config.accounts())
            .with_context(|| format!("Failed to open backend in {}", config.backend.data_dir.display()))?;
        info!(
            host = %config.backend.host,
            data_dir = %config.backend.data_dir.display(),
            "Opened backend"
        );
        let dispatcher = Dispatcher::new(
            connector,
            policy,
            config.backend.address.clone(),
            config.server.realm.clone(),
        );
        serve(http, dispatcher, &addr, &config.backend.host).await
    }
}

async fn serve<C>(http: tiny_http::Server, dispatcher: Dispatcher<C>, addr: &str, backend: &str) -> Result<()>
where
    C: Connector + 'static,
{
    let shutdown = Arc::new(AtomicBool::new(false));

    let task = {
        let shutdown = Arc::clone(&shutdown);
        tokio::task::spawn_blocking(move || server::run(&http, &dispatcher, &shutdown))
    };

    println!("{} Listening on {} ({})", "✓".green(), addr.cyan(), backend.dimmed());
    println!("  {}", "Press Ctrl-C to stop".dimmed());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    println!("Shutting down...");
    shutdown.store(true, Ordering::SeqCst);
    task.await.context("Server task failed")??;

    println!("{} Server stopped", "✓".green());
    Ok(())
}
