//! Mailvault CLI - mailvault command

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod util;

/// Mailvault - versioned backups kept in mailbox folders
#[derive(Parser)]
#[command(name = "mailvault")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: <config dir>/mailvault/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Credentials for commands that open a folder
#[derive(Args)]
struct AuthArgs {
    /// Account name (default: first configured account)
    #[arg(long)]
    user: Option<String>,
    /// Account password
    #[arg(long)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Listen address (overrides server.listen)
        #[arg(long)]
        listen: Option<String>,
        /// Keep snapshots in memory instead of the configured backend
        #[arg(long)]
        memory: bool,
    },
    /// Show the timestamp of the newest snapshot
    Head {
        /// Folder, e.g. /laptop/home
        folder: String,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Fetch the newest snapshot
    Get {
        /// Folder, e.g. /laptop/home
        folder: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Store a file as a new snapshot and apply retention
    Put {
        /// Folder, e.g. /laptop/home
        folder: String,
        /// File to store
        file: PathBuf,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// List snapshots, newest first
    List {
        /// Folder, e.g. /laptop/home
        folder: String,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Show which snapshots the retention policy keeps (dry run)
    Plan {
        /// Folder, e.g. /laptop/home
        folder: String,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the configuration file location
    Path,
    /// Print an annotated example configuration
    Example,
    /// Validate the configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    // Configuration commands must work even when the file is broken
    if let Commands::Config(config_cmd) = &cli.command {
        return match config_cmd {
            ConfigCommands::Path => cmd::config::run_path(config_path).await,
            ConfigCommands::Example => cmd::config::run_example().await,
            ConfigCommands::Check => cmd::config::run_check(config_path).await,
        };
    }

    let config = cli_lib::config::load(config_path)?;
    let _log_guard = cli_lib::logging::init(&config.logging)?;

    match cli.command {
        Commands::Serve { listen, memory } => cmd::serve::run(&config, listen, memory).await,
        Commands::Head { folder, auth } => {
            let credentials = util::resolve_credentials(&config, auth.user, auth.password)?;
            cmd::head::run(&config, &folder, credentials).await
        }
        Commands::Get { folder, output, auth } => {
            let credentials = util::resolve_credentials(&config, auth.user, auth.password)?;
            cmd::get::run(&config, &folder, credentials, output.as_deref()).await
        }
        Commands::Put { folder, file, auth } => {
            let credentials = util::resolve_credentials(&config, auth.user, auth.password)?;
            cmd::put::run(&config, &folder, credentials, &file).await
        }
        Commands::List { folder, auth } => {
            let credentials = util::resolve_credentials(&config, auth.user, auth.password)?;
            cmd::list::run(&config, &folder, credentials).await
        }
        Commands::Plan { folder, auth } => {
            let credentials = util::resolve_credentials(&config, auth.user, auth.password)?;
            cmd::plan::run(&config, &folder, credentials).await
        }
        Commands::Config(_) => Ok(()),
    }
}
