//! List snapshots, newest first

use crate::util;
use anyhow::Result;
use chrono::Utc;
use cli_lib::config::VaultConfig;
use journal::Credentials;
use owo_colors::OwoColorize;
use vault_core::{newest_first, SnapshotStore};

pub async fn run(config: &VaultConfig, folder: &str, credentials: Credentials) -> Result<()> {
    let service = util::open_service(config, folder, &credentials)?;
    let mut snapshots = service.store().list()?;

    if snapshots.is_empty() {
        println!("{}", "No snapshots".dimmed());
        return Ok(());
    }

    snapshots.sort_by(newest_first);
    let now = Utc::now();

    println!("{} ({} snapshots)", folder.bold(), snapshots.len());
    for snapshot in &snapshots {
        let id = snapshot.id().map(|id| id.to_string()).unwrap_or_default();
        println!(
            "  {:>6}  {}  {}",
            id.dimmed(),
            snapshot.label().yellow(),
            util::format_relative_time(snapshot.timestamp(), now).dimmed()
        );
    }
    Ok(())
}
