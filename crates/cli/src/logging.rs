//! Tracing setup for the binary

use crate::config::LoggingConfig;
use anyhow::{anyhow, Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Keeps the file writer alive; logs are flushed when dropped
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over the configured level. With a log directory, events
/// also go to a daily rolling `mailvault.log` there.
pub fn init(config: &LoggingConfig) -> Result<LogGuard> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
    };

    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter());

    match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)
                .with_context(|| format!("Failed to create log directory {}", directory.display()))?;
            let appender = tracing_appender::rolling::daily(directory, "mailvault.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter());

            tracing_subscriber::registry()
                .with(stderr)
                .with(file)
                .try_init()
                .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;
            Ok(LogGuard { _file: Some(guard) })
        }
        None => {
            tracing_subscriber::registry()
                .with(stderr)
                .try_init()
                .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;
            Ok(LogGuard { _file: None })
        }
    }
}
