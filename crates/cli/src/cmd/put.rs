//! Store a file as a new snapshot

use crate::util;
use anyhow::{Context, Result};
use cli_lib::config::VaultConfig;
use journal::Credentials;
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(config: &VaultConfig, folder: &str, credentials: Credentials, file: &Path) -> Result<()> {
    // 1. Read content
    let content = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let size = content.len() as u64;

    // 2. Store and prune
    let service = util::open_service(config, folder, &credentials)?;
    let report = service.write(content)?;

    // 3. Report
    println!(
        "{} Stored {} ({}) in {}",
        "✓".green(),
        report.snapshot.label().yellow(),
        util::format_size(size),
        folder.cyan()
    );
    if report.pruned {
        println!(
            "  Retention: {} kept, {} removed",
            report.kept,
            report.removed
        );
    } else {
        println!("  {}", "Retention skipped, see log".yellow());
    }
    if report.failed_deletes > 0 {
        println!(
            "  {} {} snapshot(s) could not be removed",
            "!".yellow(),
            report.failed_deletes
        );
    }

    Ok(())
}
