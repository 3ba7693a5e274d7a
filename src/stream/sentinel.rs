//! `ERROR|` sentinel detection for the validated menu endpoint.
//!
//! The model may decide mid-stream that the photo is not a menu and write
//! `ERROR| <reason>`, possibly without a trailing newline and possibly split
//! across chunks. The scanner remembers how far it has looked so each chunk
//! only costs its own length plus a short overlap.

use regex::Regex;
use std::sync::LazyLock;

pub const ERROR_PREFIX: &str = "ERROR|";

/// Used when the sentinel carries no reason.
pub const REJECTION_FALLBACK: &str = "This image does not look like a menu.";

static ERROR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ERROR\|([^\n]*)").expect("Invalid error sentinel pattern"));

#[derive(Debug, Default)]
pub struct SentinelScanner {
    scanned: usize,
}

impl SentinelScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the newly appended part of `accumulated`. Returns the rejection
    /// message once the sentinel is present.
    pub fn scan(&mut self, accumulated: &str) -> Option<String> {
        let mut start = self.scanned.saturating_sub(ERROR_PREFIX.len() - 1);
        if start > accumulated.len() {
            start = 0;
        }
        while !accumulated.is_char_boundary(start) {
            start -= 1;
        }
        self.scanned = accumulated.len();

        let offset = accumulated[start..].find(ERROR_PREFIX)?;
        let message = extract_message(&accumulated[start + offset..]);
        log::info!("[DECODE] Error sentinel at byte {}: {}", start + offset, message);
        Some(message)
    }
}

/// Text after `ERROR|` up to the next newline, trimmed, or the fallback.
pub fn extract_message(text: &str) -> String {
    ERROR_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| REJECTION_FALLBACK.to_string())
}
