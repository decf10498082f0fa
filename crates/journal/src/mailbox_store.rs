//! Snapshot store over a mailbox
//!
//! Snapshots are messages whose subject carries a label; every other message
//! in the folder is ignored.

use crate::mailbox::Mailbox;
use crate::message::Message;
use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, warn};
use vault_core::timestamp::find_label;
use vault_core::{Result, Snapshot, SnapshotId, SnapshotStore, VaultError};

/// [`SnapshotStore`] backed by a [`Mailbox`]
pub struct MailboxStore<M> {
    mailbox: M,
    address: String,
}

impl<M: Mailbox> MailboxStore<M> {
    /// `address` is used as sender and recipient of stored messages
    pub fn new(mailbox: M, address: impl Into<String>) -> Self {
        Self {
            mailbox,
            address: address.into(),
        }
    }

    pub fn mailbox(&self) -> &M {
        &self.mailbox
    }
}

fn message_number(snapshot: &Snapshot, action: &str) -> Result<u64> {
    let id = snapshot.id().ok_or_else(|| {
        VaultError::InvalidArgument(format!("only existing snapshots can be {action}"))
    })?;
    id.as_str()
        .parse()
        .map_err(|_| VaultError::InvalidArgument(format!("snapshot id {id} is not a message number")))
}

impl<M: Mailbox> SnapshotStore for MailboxStore<M> {
    fn list(&self) -> Result<Vec<Snapshot>> {
        let summaries = self.mailbox.summaries()?;
        let mut snapshots = Vec::with_capacity(summaries.len());

        for summary in summaries {
            match find_label(&summary.subject) {
                Some(label) => {
                    snapshots.push(Snapshot::from_label(SnapshotId::from(summary.number), label))
                }
                None => debug!(
                    mailbox = self.mailbox.name(),
                    number = summary.number,
                    subject = %summary.subject,
                    "Skipping message without snapshot label"
                ),
            }
        }

        Ok(snapshots)
    }

    fn read(&self, snapshot: &Snapshot) -> Result<Bytes> {
        let number = message_number(snapshot, "read from the mailbox")?;

        let message = self.mailbox.fetch(number)?.ok_or_else(|| {
            VaultError::NotFound(format!("message {number} in {}", self.mailbox.name()))
        })?;

        let content = message.attachment()?.ok_or_else(|| {
            VaultError::NotFound(format!(
                "attachment of message {number} in {}",
                self.mailbox.name()
            ))
        })?;

        Ok(Bytes::from(content))
    }

    fn append(&self, snapshot: &Snapshot) -> Result<Snapshot> {
        if !snapshot.is_new() {
            return Err(VaultError::InvalidArgument(
                "only new snapshots can be added to the mailbox".into(),
            ));
        }

        let message = Message::for_snapshot(&self.address, snapshot, Utc::now())?;
        let number = self.mailbox.append(message)?;
        debug!(mailbox = self.mailbox.name(), number, label = %snapshot.label(), "Appended snapshot");

        Ok(Snapshot::existing(SnapshotId::from(number), snapshot.timestamp()))
    }

    fn delete(&self, snapshot: &Snapshot) -> Result<()> {
        let number = message_number(snapshot, "removed from the mailbox")?;

        if !self.mailbox.delete(number)? {
            warn!(
                mailbox = self.mailbox.name(),
                number,
                "Snapshot already absent, nothing to delete"
            );
        }
        Ok(())
    }
}
