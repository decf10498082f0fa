//! In-process mailbox backend

use crate::mailbox::{Accounts, Connector, Credentials, Mailbox, MessageSummary};
use crate::message::Message;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use vault_core::{FolderPath, Result, VaultError};

#[derive(Debug, Default)]
struct Inner {
    messages: RwLock<BTreeMap<u64, Message>>,
    next_number: AtomicU64,
    fail_summaries: AtomicBool,
    fail_appends: AtomicBool,
    fail_deletes: AtomicBool,
}

/// Mailbox kept in memory
///
/// Clones share the same messages, so a connector can hand out one handle
/// per request.
#[derive(Debug, Clone)]
pub struct MemoryMailbox {
    name: String,
    inner: Arc<Inner>,
}

impl MemoryMailbox {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(Inner {
                next_number: AtomicU64::new(1),
                ..Inner::default()
            }),
        }
    }

    /// Number of stored messages
    pub fn len(&self) -> usize {
        self.inner.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make `summaries` fail as if the server were unreachable
    pub fn fail_summaries(&self, fail: bool) {
        self.inner.fail_summaries.store(fail, Ordering::SeqCst);
    }

    /// Make `append` fail as if the server rejected the message
    pub fn fail_appends(&self, fail: bool) {
        self.inner.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Make `delete` fail as if the server dropped the connection
    pub fn fail_deletes(&self, fail: bool) {
        self.inner.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

impl Mailbox for MemoryMailbox {
    fn name(&self) -> &str {
        &self.name
    }

    fn summaries(&self) -> Result<Vec<MessageSummary>> {
        if self.inner.fail_summaries.load(Ordering::SeqCst) {
            return Err(VaultError::backend(format!(
                "cannot read mailbox headers for {}",
                self.name
            )));
        }
        Ok(self
            .inner
            .messages
            .read()
            .iter()
            .map(|(&number, message)| MessageSummary {
                number,
                subject: message.subject.clone(),
            })
            .collect())
    }

    fn fetch(&self, number: u64) -> Result<Option<Message>> {
        Ok(self.inner.messages.read().get(&number).cloned())
    }

    fn append(&self, message: Message) -> Result<u64> {
        if self.inner.fail_appends.load(Ordering::SeqCst) {
            return Err(VaultError::backend(format!(
                "cannot add message to {}",
                self.name
            )));
        }
        let number = self.inner.next_number.fetch_add(1, Ordering::SeqCst);
        self.inner.messages.write().insert(number, message);
        Ok(number)
    }

    fn delete(&self, number: u64) -> Result<bool> {
        if self.inner.fail_deletes.load(Ordering::SeqCst) {
            return Err(VaultError::backend(format!(
                "cannot delete message {number} from {}",
                self.name
            )));
        }
        Ok(self.inner.messages.write().remove(&number).is_some())
    }
}

/// Connector handing out [`MemoryMailbox`]es, one per folder
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    folders: Arc<RwLock<HashMap<String, MemoryMailbox>>>,
    accounts: Accounts,
}

impl MemoryConnector {
    pub fn new(accounts: Accounts) -> Self {
        Self {
            folders: Arc::new(RwLock::new(HashMap::new())),
            accounts,
        }
    }

    /// Mailbox behind `folder`, created on first use
    pub fn mailbox(&self, folder: &FolderPath) -> MemoryMailbox {
        let name = folder.mailbox_name();
        if let Some(existing) = self.folders.read().get(&name) {
            return existing.clone();
        }
        self.folders
            .write()
            .entry(name.clone())
            .or_insert_with(|| MemoryMailbox::new(name))
            .clone()
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new(Accounts::allow_any())
    }
}

impl Connector for MemoryConnector {
    type Mailbox = MemoryMailbox;

    fn connect(&self, folder: &FolderPath, credentials: &Credentials) -> Result<MemoryMailbox> {
        self.accounts.verify(credentials)?;
        Ok(self.mailbox(folder))
    }
}
