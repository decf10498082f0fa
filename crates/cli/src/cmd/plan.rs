//! Show what the retention policy would keep right now

use crate::util;
use anyhow::Result;
use cli_lib::config::VaultConfig;
use journal::Credentials;
use owo_colors::OwoColorize;
use vault_core::{newest_first, SnapshotStore};

pub async fn run(config: &VaultConfig, folder: &str, credentials: Credentials) -> Result<()> {
    // 1. List snapshots
    let service = util::open_service(config, folder, &credentials)?;
    let snapshots = service.store().list()?;
    let now = service.now();

    // 2. Evaluate the policy without deleting anything
    let plan = service.policy().plan(&snapshots, now);

    println!("{}", "Retention rules".bold());
    for (index, rule) in service.policy().rules().iter().enumerate() {
        println!("  {}. max_age {} keep {}", index + 1, rule.max_age.cyan(), rule.keep.cyan());
    }
    println!();

    let mut keep = plan.keep.clone();
    keep.sort_by(|a, b| newest_first(a, b));
    let mut remove = plan.remove.clone();
    remove.sort_by(|a, b| newest_first(a, b));

    println!("{} ({})", "Keep".green().bold(), keep.len());
    for snapshot in keep {
        println!("  {} {}", "✓".green(), snapshot.label());
    }

    println!("{} ({})", "Remove".red().bold(), remove.len());
    for snapshot in remove {
        println!("  {} {}", "✗".red(), snapshot.label().dimmed());
    }

    Ok(())
}
