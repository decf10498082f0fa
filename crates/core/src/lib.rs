//! Core types for mailvault
//!
//! This crate provides:
//! - Snapshot data structures and identity
//! - The snapshot store contract
//! - Label/date formats and process-wide constants
//! - Message part trees with depth-first search
//! - Folder path validation
//! - The error kinds shared by every layer

pub mod clock;
pub mod consts;
pub mod error;
pub mod folder;
pub mod part;
pub mod snapshot;
pub mod store;
pub mod timestamp;

// Re-exports
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Result, VaultError};
pub use folder::FolderPath;
pub use part::{Parameter, Part, Section, TransferEncoding};
pub use snapshot::{newest, newest_first, Snapshot, SnapshotId};
pub use store::SnapshotStore;
