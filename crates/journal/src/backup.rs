//! Backup orchestration
//!
//! [`BackupService`] combines a [`SnapshotStore`] with a [`BackupPolicy`]:
//! reads return the newest snapshot, writes append a new one and then prune
//! whatever the policy no longer retains.

use crate::retention::BackupPolicy;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use vault_core::{newest, Clock, Result, Snapshot, SnapshotStore, SystemClock};

/// Outcome of a successful write
#[derive(Debug, Clone)]
pub struct WriteReport {
    /// The snapshot as stored, with its backend id
    pub snapshot: Snapshot,
    /// Whether the retention pass ran
    pub pruned: bool,
    /// Snapshots retained by the policy
    pub kept: usize,
    /// Snapshots deleted
    pub removed: usize,
    /// Deletes that failed and were skipped
    pub failed_deletes: usize,
}

/// Read, probe and write a single backup folder
pub struct BackupService<S, C = SystemClock> {
    store: S,
    policy: Arc<BackupPolicy>,
    clock: C,
}

impl<S: SnapshotStore> BackupService<S, SystemClock> {
    /// Service using the wall clock
    pub fn with_system_clock(store: S, policy: Arc<BackupPolicy>) -> Self {
        Self::new(store, policy, SystemClock)
    }
}

impl<S: SnapshotStore, C: Clock> BackupService<S, C> {
    pub fn new(store: S, policy: Arc<BackupPolicy>, clock: C) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &BackupPolicy {
        &self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Newest snapshot with its content, `None` when the folder holds none
    pub fn read(&self) -> Result<Option<Snapshot>> {
        let snapshots = self.store.list()?;
        let Some(latest) = newest(&snapshots) else {
            debug!("No snapshots to read");
            return Ok(None);
        };

        let content = self.store.read(latest)?;
        debug!(
            id = ?latest.id(),
            timestamp = %latest.label(),
            size = content.len(),
            "Read newest snapshot"
        );
        Ok(Some(latest.clone().with_content(content)))
    }

    /// Timestamp of the newest snapshot without loading it
    pub fn probe(&self) -> Result<Option<DateTime<Utc>>> {
        let snapshots = self.store.list()?;
        Ok(newest(&snapshots).map(Snapshot::timestamp))
    }

    /// Store `content` as a new snapshot and apply the retention policy
    ///
    /// Only a failing append fails the write. Listing or delete failures
    /// during pruning are logged and reported in the [`WriteReport`].
    pub fn write(&self, content: impl Into<Bytes>) -> Result<WriteReport> {
        let snapshot = Snapshot::new(content, self.clock.now());
        let written = self.store.append(&snapshot)?;
        info!(
            id = ?written.id(),
            timestamp = %written.label(),
            "Stored snapshot"
        );

        let mut report = WriteReport {
            snapshot: written,
            pruned: false,
            kept: 0,
            removed: 0,
            failed_deletes: 0,
        };

        let snapshots = match self.store.list() {
            Ok(snapshots) => snapshots,
            Err(e) => {
                warn!(error = %e, "Cannot list snapshots after write, skipping retention");
                return Ok(report);
            }
        };

        let plan = self.policy.plan(&snapshots, self.clock.now());
        report.pruned = true;
        report.kept = plan.keep.len();

        for stale in plan.remove {
            if stale.same_entity(&report.snapshot) {
                debug!(id = ?stale.id(), "Retaining snapshot that was just written");
                report.kept += 1;
                continue;
            }
            match self.store.delete(stale) {
                Ok(()) => {
                    report.removed += 1;
                    debug!(id = ?stale.id(), timestamp = %stale.label(), "Removed snapshot");
                }
                Err(e) => {
                    report.failed_deletes += 1;
                    error!(
                        id = ?stale.id(),
                        timestamp = %stale.label(),
                        error = %e,
                        "Failed to remove snapshot"
                    );
                }
            }
        }

        info!(
            kept = report.kept,
            removed = report.removed,
            failed = report.failed_deletes,
            "Applied retention"
        );
        Ok(report)
    }
}
