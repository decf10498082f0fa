//! Snapshot data structures

use crate::consts::fallback_timestamp;
use crate::timestamp::{format_label, parse_label};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Backend-opaque snapshot identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotId(String);

impl SnapshotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for SnapshotId {
    fn from(number: u64) -> Self {
        Self(number.to_string())
    }
}

/// One immutable, timestamped version of the stored blob
///
/// A snapshot is either *new* (built from content, no id yet) or *existing*
/// (listed from the backend, id present, content loaded on demand).
#[derive(Debug, Clone)]
pub struct Snapshot {
    id: Option<SnapshotId>,
    timestamp: DateTime<Utc>,
    content: Option<Bytes>,
}

impl Snapshot {
    /// A snapshot about to be appended
    pub fn new(content: impl Into<Bytes>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: None,
            timestamp,
            content: Some(content.into()),
        }
    }

    /// A snapshot already present in the backend
    pub fn existing(id: SnapshotId, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Some(id),
            timestamp,
            content: None,
        }
    }

    /// An existing snapshot whose timestamp is read from its stored label
    ///
    /// Unparseable labels get the fallback timestamp so the snapshot still
    /// takes part in retention.
    pub fn from_label(id: SnapshotId, label: &str) -> Self {
        let timestamp = match parse_label(label) {
            Some(ts) => ts,
            None => {
                let fallback = fallback_timestamp();
                tracing::warn!(
                    %id,
                    label,
                    fallback = %format_label(fallback),
                    "Cannot parse snapshot label, using fallback timestamp"
                );
                fallback
            }
        };
        Self::existing(id, timestamp)
    }

    pub fn id(&self) -> Option<&SnapshotId> {
        self.id.as_ref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Label stored alongside the content
    pub fn label(&self) -> String {
        format_label(self.timestamp)
    }

    pub fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Attach loaded content
    pub fn with_content(mut self, content: impl Into<Bytes>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Identity is the backend id; new snapshots are never the same entity
    pub fn same_entity(&self, other: &Snapshot) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// Ordering that sorts the most recent snapshot first
pub fn newest_first(a: &Snapshot, b: &Snapshot) -> Ordering {
    b.timestamp.cmp(&a.timestamp)
}

/// Most recent snapshot; on equal timestamps the first one listed wins
pub fn newest(snapshots: &[Snapshot]) -> Option<&Snapshot> {
    snapshots.iter().fold(None, |best: Option<&Snapshot>, s| match best {
        Some(b) if s.timestamp <= b.timestamp => Some(b),
        _ => Some(s),
    })
}
