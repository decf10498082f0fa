//! Common utilities for integration tests

pub mod cli;

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory with a configuration file pointing into it
pub struct TestVault {
    pub dir: TempDir,
    pub config: PathBuf,
}

impl TestVault {
    /// Vault with one account (`alice` / `secret`) and the given policy rules
    pub fn new(policy: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let data_dir = dir.path().join("data");
        let mut text = format!(
            "[backend]\ndata_dir = {:?}\naddress = \"backup@example.org\"\n\n[[accounts]]\nusername = \"alice\"\npassword = \"secret\"\n\n[logging]\nlevel = \"warn\"\n",
            data_dir.display().to_string()
        );
        for (max_age, keep) in policy {
            text.push_str(&format!("\n[[policy]]\nmax_age = \"{max_age}\"\nkeep = \"{keep}\"\n"));
        }

        let config = dir.path().join("config.toml");
        std::fs::write(&config, text).expect("write config");
        Self { dir, config }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file inside the vault directory and return its path
    pub fn file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("write file");
        path
    }
}
