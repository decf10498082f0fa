//! End-to-end backups against the sled backend

use bytes::Bytes;
use chrono::{Duration, TimeZone, Utc};
use journal::{
    Accounts, BackupPolicy, BackupRule, BackupService, Connector, Credentials, MailboxStore,
    SledConnector, Span,
};
use std::sync::Arc;
use tempfile::TempDir;
use vault_core::timestamp::truncate_to_millis;
use vault_core::{FixedClock, FolderPath, SnapshotStore, VaultError};

fn accounts() -> Accounts {
    Accounts::from_pairs([("alice", "secret")])
}

fn alice() -> Credentials {
    Credentials::new("alice", "secret")
}

#[test]
fn write_then_read_within_bracket() {
    let temp_dir = TempDir::new().unwrap();
    let connector = SledConnector::open(temp_dir.path(), accounts()).unwrap();
    let folder = FolderPath::parse("/laptop/home").unwrap();
    let mailbox = connector.connect(&folder, &alice()).unwrap();
    let service = BackupService::with_system_clock(
        MailboxStore::new(mailbox, "alice@example.org"),
        Arc::new(BackupPolicy::default()),
    );

    // Labels carry milliseconds, so the bracket is taken at that precision
    let before = truncate_to_millis(Utc::now());
    service.write(Bytes::from_static(b"payload \x00\x01\x02")).unwrap();
    let after = Utc::now();

    let latest = service.read().unwrap().unwrap();
    assert_eq!(latest.content().unwrap().as_ref(), b"payload \x00\x01\x02");
    assert_eq!(latest.timestamp(), truncate_to_millis(latest.timestamp()));
    assert!(latest.timestamp() >= before && latest.timestamp() <= after);
}

#[test]
fn snapshots_survive_reopen_and_prune_later() {
    let temp_dir = TempDir::new().unwrap();
    let folder = FolderPath::parse("/server").unwrap();
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
    let policy = Arc::new(BackupPolicy::new(vec![BackupRule::new(Span::weeks(1), "*")]));

    {
        let connector = SledConnector::open(temp_dir.path(), accounts()).unwrap();
        let mailbox = connector.connect(&folder, &alice()).unwrap();
        let service = BackupService::new(
            MailboxStore::new(mailbox, "alice@example.org"),
            Arc::clone(&policy),
            Arc::clone(&clock),
        );
        service.write(Bytes::from_static(b"january")).unwrap();
    }

    clock.advance(Duration::days(10));

    let connector = SledConnector::open(temp_dir.path(), accounts()).unwrap();
    let mailbox = connector.connect(&folder, &alice()).unwrap();
    let service = BackupService::new(
        MailboxStore::new(mailbox, "alice@example.org"),
        policy,
        Arc::clone(&clock),
    );
    assert_eq!(service.store().list().unwrap().len(), 1);

    let report = service.write(Bytes::from_static(b"later")).unwrap();
    assert_eq!(report.removed, 1);

    let snapshots = service.store().list().unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(
        service.read().unwrap().unwrap().content().unwrap().as_ref(),
        b"later"
    );
}

#[test]
fn folders_are_independent() {
    let temp_dir = TempDir::new().unwrap();
    let connector = SledConnector::open(temp_dir.path(), accounts()).unwrap();
    let policy = Arc::new(BackupPolicy::default());

    let first = BackupService::with_system_clock(
        MailboxStore::new(
            connector.connect(&FolderPath::parse("/a").unwrap(), &alice()).unwrap(),
            "alice@example.org",
        ),
        Arc::clone(&policy),
    );
    let second = BackupService::with_system_clock(
        MailboxStore::new(
            connector.connect(&FolderPath::parse("/b").unwrap(), &alice()).unwrap(),
            "alice@example.org",
        ),
        policy,
    );

    first.write(Bytes::from_static(b"only in a")).unwrap();
    assert!(second.read().unwrap().is_none());
    assert!(first.probe().unwrap().is_some());
}

#[test]
fn wrong_password_is_backend_failure() {
    let temp_dir = TempDir::new().unwrap();
    let connector = SledConnector::open(temp_dir.path(), accounts()).unwrap();
    let result = connector.connect(
        &FolderPath::parse("/a").unwrap(),
        &Credentials::new("alice", "nope"),
    );
    assert!(matches!(result, Err(VaultError::BackendUnavailable { .. })));
}
