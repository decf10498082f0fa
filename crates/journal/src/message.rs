//! Snapshots rendered as mailbox messages
//!
//! A snapshot is stored as a `multipart/mixed` message whose subject is the
//! snapshot label and whose single attachment (`backup.bin`, base64) holds the
//! content.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vault_core::consts::{ATTACHMENT_BOUNDARY, ATTACHMENT_NAME};
use vault_core::{Part, Result, Snapshot, TransferEncoding, VaultError};

/// Line length used when wrapping base64 bodies
const BASE64_LINE: usize = 76;

/// A stored message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub date: DateTime<Utc>,
    pub subject: String,
    pub body: Part,
}

impl Message {
    /// Message carrying a new snapshot, addressed from and to `address`
    pub fn for_snapshot(address: &str, snapshot: &Snapshot, sent: DateTime<Utc>) -> Result<Self> {
        let content = snapshot.content().ok_or_else(|| {
            VaultError::InvalidArgument("snapshot has no content to store".into())
        })?;

        let attachment = Part::leaf(
            "application/octet-stream",
            TransferEncoding::Base64,
            encode_base64_lines(content),
        )
        .with_parameter("name", ATTACHMENT_NAME)
        .with_disposition("filename", ATTACHMENT_NAME);

        let body = Part::composite("multipart/mixed", vec![attachment])
            .with_parameter("boundary", ATTACHMENT_BOUNDARY);

        Ok(Self {
            from: address.to_string(),
            to: address.to_string(),
            date: sent,
            subject: snapshot.label(),
            body,
        })
    }

    /// Decoded content of the first attachment, depth-first
    pub fn attachment(&self) -> Result<Option<Vec<u8>>> {
        let Some((section, part)) = self.body.find_first(Part::is_attachment) else {
            return Ok(None);
        };
        tracing::trace!(%section, content_type = %part.content_type, "Found attachment");

        match part.encoding {
            TransferEncoding::Base64 => decode_base64_lines(&part.body).map(Some),
            _ => Ok(Some(part.body.clone())),
        }
    }
}

/// Base64 with CRLF every 76 characters
fn encode_base64_lines(data: &[u8]) -> Vec<u8> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    let mut out = Vec::with_capacity(encoded.len() + encoded.len() / BASE64_LINE * 2 + 2);
    for line in encoded.as_bytes().chunks(BASE64_LINE) {
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }
    out
}

fn decode_base64_lines(data: &[u8]) -> Result<Vec<u8>> {
    let compact: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| VaultError::backend_with("attachment is not valid base64", e))
}
