//! Show when the newest snapshot was taken

use crate::util;
use anyhow::{bail, Result};
use chrono::Utc;
use cli_lib::config::VaultConfig;
use journal::Credentials;
use owo_colors::OwoColorize;
use vault_core::timestamp::{format_label, http_date};

pub async fn run(config: &VaultConfig, folder: &str, credentials: Credentials) -> Result<()> {
    let service = util::open_service(config, folder, &credentials)?;

    let Some(timestamp) = service.probe()? else {
        bail!("No snapshots in {folder}");
    };

    println!("{}", format_label(timestamp).yellow());
    println!(
        "  {} ({})",
        http_date(timestamp).dimmed(),
        util::format_relative_time(timestamp, Utc::now())
    );
    Ok(())
}
