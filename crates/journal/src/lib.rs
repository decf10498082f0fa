//! Snapshot journal over message folders
//!
//! This crate provides:
//! - Message model and attachment encoding
//! - `Mailbox` abstraction with in-memory and sled backends
//! - Snapshot store over a mailbox
//! - Retention policies
//! - Backup orchestration (read newest, write and prune)

pub mod backup;
pub mod journal;
pub mod mailbox;
pub mod mailbox_store;
pub mod memory;
pub mod message;
pub mod retention;

// Re-exports
pub use backup::{BackupService, WriteReport};
pub use journal::{SledConnector, SledMailbox};
pub use mailbox::{Accounts, Connector, Credentials, Mailbox, MessageSummary};
pub use mailbox_store::MailboxStore;
pub use memory::{MemoryConnector, MemoryMailbox};
pub use message::Message;
pub use retention::{BackupPolicy, BackupRule, KeepSpec, PolicyError, RetentionPlan, Span};
