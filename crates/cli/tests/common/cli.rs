//! CLI command execution helpers with automatic timing
//!
//! This module provides a wrapper around the `mailvault` binary that
//! automatically measures execution time and provides convenient
//! assertion methods.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

/// CLI command builder with timing
pub struct MvCommand {
    binary_path: PathBuf,
    working_dir: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl MvCommand {
    /// Create a new command in the given working directory
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_mailvault")),
            working_dir: working_dir.as_ref().to_path_buf(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }

    /// Add command arguments
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Set environment variable
    pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Execute command and return result with timing
    pub fn execute(&self) -> Result<CommandResult> {
        let start = Instant::now();

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .envs(&self.env)
            .env_remove("RUST_LOG")
            .output()
            .context("Failed to execute command")?;

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stdout_bytes: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration: start.elapsed(),
        })
    }

    /// Execute and assert success
    pub fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if !result.success() {
            anyhow::bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStdout: {}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stdout,
                result.stderr
            );
        }

        Ok(result)
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }

        Ok(result)
    }
}

/// Command execution result with timing
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stdout_bytes: Vec<u8>,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandResult {
    /// Check if command succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Check if stdout contains text
    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    /// Check if stderr contains text
    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }

    /// Snapshot labels (`YYYY-MM-DDTHH:MM:SS.mmmZ`) in stdout order
    pub fn labels(&self) -> Vec<String> {
        self.stdout.lines().filter_map(extract_label).collect()
    }
}

/// Extract a snapshot label from a line of text
pub fn extract_label(line: &str) -> Option<String> {
    // 2024-01-03T14:30:00.123Z is 24 characters
    line.as_bytes()
        .windows(24)
        .position(|w| {
            w[4] == b'-' && w[7] == b'-' && w[10] == b'T' && w[19] == b'.' && w[23] == b'Z'
                && w[..4].iter().all(u8::is_ascii_digit)
        })
        .map(|i| line[i..i + 24].to_string())
}

/// Macro for convenient command construction
///
/// Usage:
/// ```ignore
/// mv!(dir, "--config", cfg, "list", "/laptop").assert_success()?;
/// ```
#[macro_export]
macro_rules! mv {
    ($dir:expr, $($arg:expr),*) => {{
        let mut cmd = $crate::common::cli::MvCommand::new($dir);
        cmd.args(&[$($arg),*]);
        cmd
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_extraction() {
        let line = "  12  2024-01-03T14:30:00.123Z  2 hours ago";
        assert_eq!(extract_label(line), Some("2024-01-03T14:30:00.123Z".to_string()));
        assert_eq!(extract_label("no label here"), None);
    }

    #[test]
    fn test_labels_in_order() {
        let result = CommandResult {
            stdout: "2024-01-03T14:30:00.123Z\nother\n2023-12-01T00:00:00.000Z\n".to_string(),
            stdout_bytes: Vec::new(),
            stderr: String::new(),
            exit_code: 0,
            duration: Duration::from_millis(10),
        };
        assert_eq!(result.labels(), vec!["2024-01-03T14:30:00.123Z", "2023-12-01T00:00:00.000Z"]);
    }
}
