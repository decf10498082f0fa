//! Message-oriented backend contract
//!
//! A [`Mailbox`] is one folder of numbered messages. A [`Connector`] opens the
//! mailbox for a folder after checking credentials.

use crate::message::Message;
use std::collections::HashMap;
use std::fmt;
use vault_core::{FolderPath, Result, VaultError};

/// Message number and subject, as listed without fetching bodies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSummary {
    pub number: u64,
    pub subject: String,
}

/// One folder of numbered messages
pub trait Mailbox: Send + Sync {
    /// Backend name of this mailbox (e.g. `INBOX.laptop`)
    fn name(&self) -> &str;

    /// Number and subject of every message
    fn summaries(&self) -> Result<Vec<MessageSummary>>;

    /// Full message, `None` if the number is unknown
    fn fetch(&self, number: u64) -> Result<Option<Message>>;

    /// Store a message, returning its number
    fn append(&self, message: Message) -> Result<u64>;

    /// Remove a message; `false` if it was already gone
    fn delete(&self, number: u64) -> Result<bool>;
}

/// Opens the mailbox behind a folder
pub trait Connector: Send + Sync {
    type Mailbox: Mailbox;

    fn connect(&self, folder: &FolderPath, credentials: &Credentials) -> Result<Self::Mailbox>;
}

/// Username and password presented by a request
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Accounts allowed to open mailboxes
#[derive(Debug, Clone, Default)]
pub struct Accounts {
    passwords: HashMap<String, String>,
    allow_any: bool,
}

impl Accounts {
    /// Accept every username/password pair
    pub fn allow_any() -> Self {
        Self {
            passwords: HashMap::new(),
            allow_any: true,
        }
    }

    pub fn from_pairs<I, U, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            passwords: pairs
                .into_iter()
                .map(|(u, p)| (u.into(), p.into()))
                .collect(),
            allow_any: false,
        }
    }

    /// Fails with `BackendUnavailable`, like a rejected mailbox login
    pub fn verify(&self, credentials: &Credentials) -> Result<()> {
        if self.allow_any {
            return Ok(());
        }
        match self.passwords.get(&credentials.username) {
            Some(password) if *password == credentials.password => Ok(()),
            _ => Err(VaultError::backend(format!(
                "cannot open mailbox with the provided credentials for user {:?}",
                credentials.username
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accounts_check_password() {
        let accounts = Accounts::from_pairs([("alice", "secret")]);
        assert!(accounts.verify(&Credentials::new("alice", "secret")).is_ok());

        let err = accounts.verify(&Credentials::new("alice", "wrong")).unwrap_err();
        assert_eq!(err.kind(), "backend_unavailable");
        assert!(accounts.verify(&Credentials::new("bob", "secret")).is_err());
    }

    #[test]
    fn allow_any_accepts_everything() {
        assert!(Accounts::allow_any().verify(&Credentials::new("x", "y")).is_ok());
    }

    #[test]
    fn debug_hides_password() {
        let rendered = format!("{:?}", Credentials::new("alice", "secret"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("secret"));
    }
}
