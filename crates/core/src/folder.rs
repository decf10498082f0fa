//! Folder paths addressed by requests

use crate::consts::MAILBOX_ROOT;
use crate::error::{Result, VaultError};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref FOLDER_PATTERN: Regex =
        Regex::new(r"^/[a-zA-Z0-9_\-/]+$").expect("folder pattern is a valid regex");
}

/// Validated folder path such as `/laptop/documents`
///
/// Every (sub)folder starts with `/`; allowed characters are ASCII letters,
/// digits, `-` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderPath(String);

impl FolderPath {
    pub fn parse(path: &str) -> Result<Self> {
        if FOLDER_PATTERN.is_match(path) {
            Ok(Self(path.to_string()))
        } else {
            Err(VaultError::ValidationFailed(format!(
                "invalid folder name {path:?}: allowed characters [a-zA-Z0-9-_], every (sub)folder starts with \"/\""
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backend mailbox holding this folder (`/a/b` → `INBOX.a.b`)
    pub fn mailbox_name(&self) -> String {
        format!("{}{}", MAILBOX_ROOT, self.0.replace('/', "."))
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
