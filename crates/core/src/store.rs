//! Snapshot store contract
//!
//! The store is a thin ordered collection over a backend. It knows nothing
//! about retention; see the `journal` crate for the policy and orchestrator.

use crate::error::Result;
use crate::snapshot::Snapshot;
use bytes::Bytes;

/// List, read, append and delete snapshots of one folder
pub trait SnapshotStore {
    /// All snapshots with id and timestamp; content is not loaded.
    /// Order is unspecified.
    fn list(&self) -> Result<Vec<Snapshot>>;

    /// Content of an existing snapshot
    ///
    /// Fails with `InvalidArgument` for a new snapshot and `NotFound` when
    /// the backend no longer has it.
    fn read(&self, snapshot: &Snapshot) -> Result<Bytes>;

    /// Persist a new snapshot, returning it as an existing one
    ///
    /// Fails with `InvalidArgument` if `snapshot` already has an id.
    fn append(&self, snapshot: &Snapshot) -> Result<Snapshot>;

    /// Remove an existing snapshot
    ///
    /// Removing an id the backend no longer has is not an error.
    fn delete(&self, snapshot: &Snapshot) -> Result<()>;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for Box<S> {
    fn list(&self) -> Result<Vec<Snapshot>> {
        (**self).list()
    }

    fn read(&self, snapshot: &Snapshot) -> Result<Bytes> {
        (**self).read(snapshot)
    }

    fn append(&self, snapshot: &Snapshot) -> Result<Snapshot> {
        (**self).append(snapshot)
    }

    fn delete(&self, snapshot: &Snapshot) -> Result<()> {
        (**self).delete(snapshot)
    }
}
