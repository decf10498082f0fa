//! Configuration file handling
//!
//! Configuration lives in a TOML file, by default
//! `<config_dir>/mailvault/config.toml`. A missing default file means
//! built-in defaults; a missing file named with `--config` is an error.

use anyhow::{bail, Context, Result};
use journal::{Accounts, BackupPolicy, BackupRule, Span};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use vault_core::consts::DEFAULT_REALM;

/// Annotated configuration printed by `mailvault config example`
pub const EXAMPLE_CONFIG: &str = r#"# Mailvault configuration

[server]
# Address the HTTP front end listens on
listen = "127.0.0.1:8640"
# Realm announced when credentials are missing
realm = "Mailbox Backup System"

[backend]
# Name of the mail host, used in log output
host = "mail.example.org:993"
# Directory holding the mailbox database
data_dir = "/var/lib/mailvault"
# Sender and recipient of stored backup messages
address = "backup@example.org"

# Credentials accepted by the backend. Without any account every
# username/password pair is accepted.
[[accounts]]
username = "alice"
password = "change-me"

# Retention rules, applied in order. max_age combines Y, M, W and D
# (e.g. 1Y6M); keep is "*" or "<count>/<period>".

# Keep everything from the last two weeks
[[policy]]
max_age = "2W"
keep = "*"

# Keep a single snapshot per week for two months
[[policy]]
max_age = "2M"
keep = "1/1W"

# Keep two snapshots per month for a year
[[policy]]
max_age = "1Y"
keep = "2/1M"

[logging]
# Used when RUST_LOG is not set
level = "info"
# Optional directory for daily rolling log files
# directory = "/var/log/mailvault"
"#;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub accounts: Vec<AccountConfig>,
    pub policy: Vec<RuleConfig>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    pub realm: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub host: String,
    pub data_dir: PathBuf,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub username: String,
    pub password: String,
}

/// Retention rule as written in the file; checked by [`VaultConfig::validate`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(alias = "maxAge")]
    pub max_age: String,
    pub keep: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<PathBuf>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            backend: BackendConfig::default(),
            accounts: Vec::new(),
            policy: BackupPolicy::default()
                .rules()
                .iter()
                .map(|rule| RuleConfig {
                    max_age: rule.max_age.to_string(),
                    keep: rule.keep.clone(),
                })
                .collect(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8640".to_string(),
            realm: DEFAULT_REALM.to_string(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|dir| dir.join("mailvault"))
            .unwrap_or_else(|| PathBuf::from("mailvault-data"));
        Self {
            host: "localhost".to_string(),
            data_dir,
            address: "backup@localhost".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl VaultConfig {
    /// Parse configuration text and validate it
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: VaultConfig = toml::from_str(text).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the server unusable
    ///
    /// Unknown `keep` values are accepted; they fall back to keeping
    /// everything when the policy runs.
    pub fn validate(&self) -> Result<()> {
        if self.server.listen.trim().is_empty() {
            bail!("server.listen must not be empty");
        }
        if self.backend.address.trim().is_empty() {
            bail!("backend.address must not be empty");
        }

        let mut seen = HashSet::new();
        for account in &self.accounts {
            if account.username.is_empty() {
                bail!("accounts: username must not be empty");
            }
            if !seen.insert(account.username.as_str()) {
                bail!("accounts: duplicate username {:?}", account.username);
            }
        }

        self.backup_policy()?;
        Ok(())
    }

    /// Retention policy built from the `[[policy]]` rules
    pub fn backup_policy(&self) -> Result<BackupPolicy> {
        let rules = self
            .policy
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                let max_age: Span = rule
                    .max_age
                    .parse()
                    .with_context(|| format!("policy rule {}: bad max_age", index + 1))?;
                Ok(BackupRule::new(max_age, rule.keep.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(BackupPolicy::new(rules))
    }

    /// Accounts the backend accepts; anyone when none are configured
    pub fn accounts(&self) -> Accounts {
        if self.accounts.is_empty() {
            Accounts::allow_any()
        } else {
            Accounts::from_pairs(
                self.accounts
                    .iter()
                    .map(|a| (a.username.clone(), a.password.clone())),
            )
        }
    }
}

/// Default configuration file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mailvault").join("config.toml"))
}

/// Resolve which file to read: the explicit one, else the default
pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(default_config_path)
}

/// Load configuration
///
/// An explicit path must exist. The default path may be missing, in which
/// case built-in defaults are used.
pub fn load(explicit: Option<&Path>) -> Result<VaultConfig> {
    let Some(path) = resolve_path(explicit) else {
        tracing::debug!("No configuration directory, using defaults");
        return Ok(VaultConfig::default());
    };

    if !path.exists() {
        if explicit.is_some() {
            bail!("Configuration file not found: {}", path.display());
        }
        tracing::debug!(path = %path.display(), "No configuration file, using defaults");
        return Ok(VaultConfig::default());
    }

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    VaultConfig::from_toml(&text).with_context(|| format!("Invalid configuration in {}", path.display()))
}
