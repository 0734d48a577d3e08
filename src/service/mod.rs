//! Service interfaces the workflow consumes.
//!
//! Two external collaborators sit behind traits so the session never knows
//! whether it is talking to a deployed backend or the built-in stubs:
//!
//! 1. [`DocumentProcessor`] — PDF bytes + instruction in, row envelope out
//! 2. [`SpreadsheetExporter`] — rows in, workbook bytes out
//!
//! [`mock`] provides fixed-delay stand-ins with canned data; [`http`]
//! provides real request/response handling with timeout and error mapping.
//! Both traits are object-safe (`Arc<dyn DocumentProcessor>`) so hosts can
//! swap implementations at runtime, inject middleware, or record calls in
//! tests.

use crate::error::IntellidocsError;
use crate::model::{Envelope, Record};
use async_trait::async_trait;

pub mod http;
pub mod mock;

/// MIME type of the exported workbook.
pub const XLSX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// MIME type the upload guard accepts.
pub const PDF_MIME: &str = "application/pdf";

/// A generated spreadsheet file: raw bytes plus their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl ExportedFile {
    /// Wrap workbook bytes with the fixed xlsx MIME type.
    pub fn xlsx(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime: XLSX_MIME.to_string(),
        }
    }
}

/// The document-understanding service.
///
/// Implementations must signal service-side refusal via
/// [`Envelope::failure`] and reserve `Err` for transport-level problems
/// (unreachable endpoint, timeout, malformed body). Nothing may panic
/// through the caller.
#[async_trait]
pub trait DocumentProcessor: Send + Sync {
    /// Process a PDF with a free-text instruction into tabular rows.
    async fn process(
        &self,
        pdf_bytes: &[u8],
        instruction: &str,
    ) -> Result<Envelope, IntellidocsError>;
}

/// The spreadsheet-export service.
#[async_trait]
pub trait SpreadsheetExporter: Send + Sync {
    /// Serialise the (possibly user-edited) rows into a workbook file.
    async fn export(&self, rows: &[Record]) -> Result<ExportedFile, IntellidocsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exported_file_xlsx_carries_spreadsheet_mime() {
        let file = ExportedFile::xlsx(vec![1, 2, 3]);
        assert_eq!(file.mime, XLSX_MIME);
        assert_eq!(file.bytes, vec![1, 2, 3]);
    }
}
