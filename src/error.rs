//! Error types for the intellidocs library.
//!
//! Two distinct failure channels reflect two distinct failure modes:
//!
//! * [`IntellidocsError`] — **Fatal**: the operation cannot proceed at all
//!   (file is not a PDF, service unreachable, output not writable). Returned
//!   as `Err(IntellidocsError)` from service calls and session operations.
//!
//! * [`crate::model::Envelope`] with `success = false` — **Soft**: the
//!   document-understanding service ran but declined the request. The
//!   session surfaces this as a user notice and keeps its current step;
//!   it never escapes as a panic or an `Err` past the call site.
//!
//! The separation lets callers decide their own tolerance: abort the whole
//! run on a transport error, or show a notice and let the user retry the
//! same step with a different instruction.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the intellidocs library.
///
/// Service-side refusals travel inside [`crate::model::Envelope`] rather
/// than here.
#[derive(Debug, Error)]
pub enum IntellidocsError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The selected file exceeds the configured upload limit.
    #[error("File is too large: {size} bytes (limit {limit} bytes)\nRaise max_upload_bytes if the service accepts larger documents.")]
    FileTooLarge { size: u64, limit: u64 },

    // ── Service errors ────────────────────────────────────────────────────
    /// The service endpoint could not be reached.
    #[error("Failed to reach service at '{url}': {reason}\nCheck the endpoint URL and your network connection.")]
    ServiceUnreachable { url: String, reason: String },

    /// The service call exceeded the configured timeout.
    #[error("Service call timed out after {secs}s for '{url}'\nIncrease --timeout or check the service health.")]
    ApiTimeout { url: String, secs: u64 },

    /// The service returned an authentication error (401/403).
    #[error("Authentication error from '{url}': HTTP {status}")]
    AuthError { url: String, status: u16 },

    /// The service returned a non-success status other than auth failures.
    #[error("Service at '{url}' returned HTTP {status}: {detail}")]
    ServiceFailure {
        url: String,
        status: u16,
        detail: String,
    },

    /// The service responded, but the body was not a valid envelope or
    /// a row was missing its required fields.
    #[error("Malformed response from '{url}': {detail}")]
    InvalidResponse { url: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the exported workbook file.
    #[error("Failed to write export file '{path}': {source}")]
    ExportWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_a_pdf_display() {
        let e = IntellidocsError::NotAPdf {
            path: PathBuf::from("notes.txt"),
            magic: *b"Lore",
        };
        let msg = e.to_string();
        assert!(msg.contains("notes.txt"), "got: {msg}");
        assert!(msg.contains("not a valid PDF"));
    }

    #[test]
    fn api_timeout_display() {
        let e = IntellidocsError::ApiTimeout {
            url: "https://docs.example/process".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
        assert!(e.to_string().contains("docs.example"));
    }

    #[test]
    fn auth_error_display() {
        let e = IntellidocsError::AuthError {
            url: "https://docs.example/process".into(),
            status: 401,
        };
        assert!(e.to_string().contains("401"));
    }

    #[test]
    fn file_too_large_display() {
        let e = IntellidocsError::FileTooLarge {
            size: 200,
            limit: 100,
        };
        let msg = e.to_string();
        assert!(msg.contains("200"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn export_write_failed_carries_source() {
        use std::error::Error as _;
        let e = IntellidocsError::ExportWriteFailed {
            path: PathBuf::from("/out/intellidocs-export.xlsx"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.source().is_some());
    }
}
