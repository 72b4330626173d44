use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum number of characters a note body may hold.
pub const MAX_BODY_CHARS: usize = 4000;

/// Filename used when a note name sanitizes down to nothing.
pub const FALLBACK_FILE_NAME: &str = "default_filename";

const MAX_FILE_NAME_LEN: usize = 255;
const TRIM_CHARS: &[char] = &['.', '_', '-'];

static UNSAFE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid filename regex"));

/// The unit of persistence: one note, one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
    #[serde(rename = "Body", alias = "body", default)]
    pub body: String,
}

impl NoteRecord {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }

    /// The filename this record is stored under.
    pub fn file_name(&self) -> String {
        sanitize_file_name(&self.name)
    }
}

/// Derive a filesystem-safe filename from a free-form note name.
///
/// Runs of characters outside `[A-Za-z0-9._-]` collapse to a single `_`,
/// leading and trailing `.`, `_` and `-` are stripped, and the result is
/// capped at 255 bytes. An empty result becomes [`FALLBACK_FILE_NAME`].
pub fn sanitize_file_name(name: &str) -> String {
    let replaced = UNSAFE_RUN_RE.replace_all(name, "_");
    let mut sanitized = replaced.trim_matches(TRIM_CHARS);

    // Only ASCII survives the replacement, so byte slicing is char-safe.
    if sanitized.len() > MAX_FILE_NAME_LEN {
        sanitized = sanitized[..MAX_FILE_NAME_LEN].trim_end_matches(TRIM_CHARS);
    }

    if sanitized.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        sanitized.to_string()
    }
}
