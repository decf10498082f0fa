//! Fetch the newest snapshot

use crate::util;
use anyhow::{bail, Context, Result};
use cli_lib::config::VaultConfig;
use journal::Credentials;
use owo_colors::OwoColorize;
use std::io::Write;
use std::path::Path;

pub async fn run(
    config: &VaultConfig,
    folder: &str,
    credentials: Credentials,
    output: Option<&Path>,
) -> Result<()> {
    // 1. Open folder
    let service = util::open_service(config, folder, &credentials)?;

    // 2. Read newest snapshot
    let Some(snapshot) = service.read()? else {
        bail!("No snapshots in {folder}");
    };
    let content = snapshot.content().cloned().unwrap_or_default();

    // 3. Write it out
    match output {
        Some(path) => {
            std::fs::write(path, &content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Restored {} ({}) to {}",
                "✓".green(),
                snapshot.label().yellow(),
                util::format_size(content.len() as u64),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&content).context("Failed to write to stdout")?;
            stdout.flush()?;
        }
    }

    Ok(())
}
