//! Configuration commands
//!
//! `path` prints where configuration is read from, `example` prints an
//! annotated file and `check` validates the active one.

use anyhow::{Context, Result};
use cli_lib::config::{self, EXAMPLE_CONFIG};
use owo_colors::OwoColorize;
use std::path::Path;

/// Print the configuration file location
pub async fn run_path(explicit: Option<&Path>) -> Result<()> {
    let path = config::resolve_path(explicit).context("Could not determine config file path")?;
    let state = if path.exists() { "exists" } else { "not found, defaults apply" };
    println!("{} {}", path.display(), format!("({state})").dimmed());
    Ok(())
}

/// Print an annotated example configuration
pub async fn run_example() -> Result<()> {
    print!("{EXAMPLE_CONFIG}");
    Ok(())
}

/// Validate the configuration and summarize it
pub async fn run_check(explicit: Option<&Path>) -> Result<()> {
    let config = config::load(explicit)?;
    let policy = config.backup_policy()?;

    println!("{} Configuration is valid", "✓".green());
    println!("  {}: {}", "listen".cyan(), config.server.listen);
    println!("  {}: {}", "backend".cyan(), config.backend.host);
    println!("  {}: {}", "data_dir".cyan(), config.backend.data_dir.display());
    println!("  {}: {}", "accounts".cyan(), config.accounts.len());
    println!("  {}: {} rule(s)", "policy".cyan(), policy.rules().len());
    for rule in policy.rules() {
        let parsed = rule.keep.parse::<journal::KeepSpec>();
        let note = match parsed {
            Ok(_) => String::new(),
            Err(e) => format!(" ({e}; everything in the window is kept)"),
        };
        println!("    {} {}{}", rule.max_age, rule.keep, note.yellow());
    }
    Ok(())
}
