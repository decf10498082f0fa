//! Persistent mailbox backend using sled
//!
//! Each mailbox is a pair of sled trees: `<name>/headers` maps the message
//! number to its subject (so listing never touches content) and
//! `<name>/messages` maps the number to the bincode-encoded message. Numbers
//! come from `Db::generate_id`, so they keep increasing across restarts and
//! across connections to the same database.

use crate::mailbox::{Accounts, Connector, Credentials, Mailbox, MessageSummary};
use crate::message::Message;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use std::path::Path;
use vault_core::{FolderPath, Result, VaultError};

/// Mailbox stored in a sled database
pub struct SledMailbox {
    name: String,
    db: Db,
    headers: Tree,
    messages: Tree,
}

impl SledMailbox {
    /// Open (or create) the mailbox `name` inside `db`
    pub fn open(db: &Db, name: &str) -> Result<Self> {
        let headers = db
            .open_tree(format!("{name}/headers"))
            .map_err(|e| VaultError::backend_with(format!("cannot open mailbox {name}"), e))?;
        let messages = db
            .open_tree(format!("{name}/messages"))
            .map_err(|e| VaultError::backend_with(format!("cannot open mailbox {name}"), e))?;

        Ok(Self {
            name: name.to_string(),
            db: db.clone(),
            headers,
            messages,
        })
    }

    /// Get the total number of messages
    pub fn count(&self) -> usize {
        self.headers.len()
    }
}

// Big-endian keys keep sled's iteration order equal to numeric order
fn key(number: u64) -> [u8; 8] {
    number.to_be_bytes()
}

fn number_from_key(bytes: &[u8]) -> Result<u64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| VaultError::backend(format!("corrupt message key of {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(raw))
}

impl Mailbox for SledMailbox {
    fn name(&self) -> &str {
        &self.name
    }

    fn summaries(&self) -> Result<Vec<MessageSummary>> {
        let mut summaries = Vec::with_capacity(self.headers.len());
        for item in self.headers.iter() {
            let (k, v) = item.map_err(|e| {
                VaultError::backend_with(format!("cannot read mailbox headers for {}", self.name), e)
            })?;
            summaries.push(MessageSummary {
                number: number_from_key(&k)?,
                subject: String::from_utf8_lossy(&v).into_owned(),
            });
        }
        Ok(summaries)
    }

    fn fetch(&self, number: u64) -> Result<Option<Message>> {
        let value = self
            .messages
            .get(key(number))
            .map_err(|e| VaultError::backend_with(format!("cannot fetch message {number}"), e))?;

        match value {
            Some(bytes) => {
                let message = bincode::deserialize(&bytes).map_err(|e| {
                    VaultError::backend_with(format!("cannot decode message {number}"), e)
                })?;
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }

    fn append(&self, message: Message) -> Result<u64> {
        let number = self
            .db
            .generate_id()
            .map_err(|e| VaultError::backend_with("cannot allocate message number", e))?;
        let encoded = bincode::serialize(&message)
            .map_err(|e| VaultError::backend_with("cannot encode message", e))?;
        let k = key(number);

        (&self.headers, &self.messages)
            .transaction(|(headers, messages)| {
                headers.insert(&k[..], message.subject.as_bytes())?;
                messages.insert(&k[..], encoded.as_slice())?;
                Ok::<_, ConflictableTransactionError<()>>(())
            })
            .map_err(|e: TransactionError<()>| {
                VaultError::backend(format!("cannot add message to {}: {e:?}", self.name))
            })?;

        // Flush to ensure durability
        self.db
            .flush()
            .map_err(|e| VaultError::backend_with(format!("cannot flush {}", self.name), e))?;

        Ok(number)
    }

    fn delete(&self, number: u64) -> Result<bool> {
        let k = key(number);
        let removed = (&self.headers, &self.messages)
            .transaction(|(headers, messages)| {
                let header = headers.remove(&k[..])?;
                let body = messages.remove(&k[..])?;
                Ok::<_, ConflictableTransactionError<()>>(header.is_some() || body.is_some())
            })
            .map_err(|e: TransactionError<()>| {
                VaultError::backend(format!("cannot delete message {number} from {}: {e:?}", self.name))
            })?;
        Ok(removed)
    }
}

/// Connector over one sled database shared by all folders
#[derive(Clone)]
pub struct SledConnector {
    db: Db,
    accounts: Accounts,
}

impl SledConnector {
    /// Open or create the database at the given path
    pub fn open(path: &Path, accounts: Accounts) -> Result<Self> {
        let db = sled::open(path.join("mailboxes.db")).map_err(|e| {
            VaultError::backend_with(format!("cannot open database at {}", path.display()), e)
        })?;
        Ok(Self { db, accounts })
    }
}

impl Connector for SledConnector {
    type Mailbox = SledMailbox;

    fn connect(&self, folder: &FolderPath, credentials: &Credentials) -> Result<SledMailbox> {
        self.accounts.verify(credentials)?;
        SledMailbox::open(&self.db, &folder.mailbox_name())
    }
}
