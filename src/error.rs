//! Error types for the scan pipeline.
//!
//! `ScanError` is internal: the flows in `session`, `order` and `ask` catch it
//! at their boundary and turn it into one user-facing string.

use thiserror::Error;

/// Shown when the menu request fails before or during streaming.
pub const ANALYSIS_FAILURE: &str = "Analysis failed, please try again later.";

#[derive(Debug, Error)]
pub enum ScanError {
    /// Connect, TLS or body read failure from reqwest.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status before streaming started.
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The producer declared the input invalid (`ERROR|` line or `{"error"}` frame).
    #[error("rejected by backend: {0}")]
    Rejected(String),

    /// The upload failed local validation.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The chunk source broke off mid-stream.
    #[error("stream interrupted: {0}")]
    Stream(String),
}

impl ScanError {
    /// Message for the user. Rejections and image problems carry their own
    /// text; everything transport-related collapses to `generic`.
    pub fn user_message(&self, generic: &str) -> String {
        match self {
            ScanError::Rejected(message) | ScanError::InvalidImage(message) => message.clone(),
            _ => generic.to_string(),
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, ScanError::Rejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_keeps_producer_message() {
        let err = ScanError::Rejected("not a menu".to_string());
        assert_eq!(err.user_message(ANALYSIS_FAILURE), "not a menu");
        assert!(err.is_rejection());
    }

    #[test]
    fn transport_failures_use_generic_message() {
        let status = ScanError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(status.user_message(ANALYSIS_FAILURE), ANALYSIS_FAILURE);

        let stream = ScanError::Stream("connection reset".to_string());
        assert_eq!(stream.user_message("custom"), "custom");
        assert!(!stream.is_rejection());
    }

    #[test]
    fn display_includes_status() {
        let err = ScanError::Status {
            status: 400,
            message: "missing file".to_string(),
        };
        assert_eq!(err.to_string(), "backend returned 400: missing file");
    }
}
