//! Shared utilities for CLI commands

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use cli_lib::config::VaultConfig;
use journal::{BackupService, Connector, Credentials, MailboxStore, SledConnector, SledMailbox};
use std::sync::Arc;
use vault_core::FolderPath;

/// Service type used by the local commands
pub type LocalService = BackupService<MailboxStore<SledMailbox>>;

/// Credentials for local commands
///
/// Uses `--user`/`--password` when given, otherwise the first configured
/// account. Without any account configured the backend accepts anyone.
pub fn resolve_credentials(
    config: &VaultConfig,
    user: Option<String>,
    password: Option<String>,
) -> Result<Credentials> {
    match (user, password) {
        (Some(user), password) => Ok(Credentials::new(user, password.unwrap_or_default())),
        (None, Some(_)) => bail!("--password requires --user"),
        (None, None) => Ok(match config.accounts.first() {
            Some(account) => Credentials::new(account.username.clone(), account.password.clone()),
            None => Credentials::new("mailvault", ""),
        }),
    }
}

/// Open the backup service for `folder` on the configured sled backend
pub fn open_service(config: &VaultConfig, folder: &str, credentials: &Credentials) -> Result<LocalService> {
    let folder = FolderPath::parse(folder)?;
    let policy = config.backup_policy()?;

    let connector = SledConnector::open(&config.backend.data_dir, config.accounts())
        .with_context(|| format!("Failed to open backend in {}", config.backend.data_dir.display()))?;
    let mailbox = connector
        .connect(&folder, credentials)
        .with_context(|| format!("Failed to open folder {folder}"))?;

    Ok(BackupService::with_system_clock(
        MailboxStore::new(mailbox, config.backend.address.clone()),
        Arc::new(policy),
    ))
}

/// Format timestamp as relative time ("2 hours ago")
pub fn format_relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - ts).num_seconds();
    if seconds < 0 {
        return "in the future".to_string();
    }

    if seconds < 60 {
        format!("{} seconds ago", seconds)
    } else if seconds < 3600 {
        format!("{} minutes ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{} hours ago", seconds / 3600)
    } else if seconds < 604800 {
        format!("{} days ago", seconds / 86400)
    } else {
        format!("{} weeks ago", seconds / 604800)
    }
}

/// Format byte size as human-readable string
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
