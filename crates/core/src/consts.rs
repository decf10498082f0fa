//! Process-wide constants: label formats, HTTP status codes and message layout

use chrono::{DateTime, TimeZone, Utc};

/// Snapshot label format (`2024-01-03T14:30:00.123Z`)
pub const LABEL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Pattern locating a label inside a longer subject line
pub const LABEL_PATTERN: &str = r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z";

/// RFC 7231 `Last-Modified` format
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Timestamp assigned to snapshots whose label cannot be parsed
pub fn fallback_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Name given to the attachment carrying snapshot content
pub const ATTACHMENT_NAME: &str = "backup.bin";

/// Boundary used when a snapshot is rendered as a multipart message
pub const ATTACHMENT_BOUNDARY: &str = "AttachmentBoundary";

/// Mailbox every folder lives under
pub const MAILBOX_ROOT: &str = "INBOX";

/// Default realm announced in `WWW-Authenticate`
pub const DEFAULT_REALM: &str = "Mailbox Backup System";

pub mod status {
    //! Response codes produced by the dispatcher

    pub const SUCCESS: u16 = 200;
    pub const RESOURCE_CREATED: u16 = 201;
    pub const BAD_REQUEST: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
    pub const RESOURCE_NOT_FOUND: u16 = 404;
    pub const INTERNAL_ERROR: u16 = 500;
}
