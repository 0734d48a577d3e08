//! Fixed-delay service stubs with canned results.
//!
//! These preserve the behaviour the workflow was originally developed
//! against: the processor always returns the same five-row data set and the
//! exporter returns placeholder workbook bytes, each after an artificial
//! settle delay, regardless of input content. They let the whole flow run
//! end to end without a deployed backend and give tests deterministic
//! service behaviour, including failure injection.

use crate::error::IntellidocsError;
use crate::model::{Envelope, Record};
use crate::service::{DocumentProcessor, ExportedFile, SpreadsheetExporter};
use async_trait::async_trait;
use tokio::time::{sleep, Duration};
use tracing::debug;

/// The canned five-row data set the mock processor returns.
pub fn sample_rows() -> Vec<Record> {
    vec![
        Record::new(
            "Executive Summary",
            "High-level overview of system capabilities and business objectives",
        ),
        Record::new(
            "Technical Architecture",
            "Cloud-native infrastructure with microservices architecture",
        ),
        Record::new(
            "Security Requirements",
            "OAuth2 authentication, role-based access control, data encryption at rest",
        ),
        Record::new(
            "User Interface",
            "Responsive design, accessibility compliance, dark mode support",
        ),
        Record::new(
            "Integration Points",
            "REST APIs, event-driven messaging, third-party service connectors",
        ),
    ]
}

/// Stub document processor: settles after `latency_ms` with the canned rows.
#[derive(Debug, Clone, Default)]
pub struct MockProcessor {
    /// Artificial settle delay in milliseconds.
    pub latency_ms: u64,
    /// When set, respond with a soft failure instead of rows.
    pub fail_with: Option<String>,
}

impl MockProcessor {
    pub fn new(latency_ms: u64) -> Self {
        Self {
            latency_ms,
            fail_with: None,
        }
    }

    /// A processor that always returns `success = false` with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            latency_ms: 0,
            fail_with: Some(message.into()),
        }
    }
}

#[async_trait]
impl DocumentProcessor for MockProcessor {
    async fn process(
        &self,
        pdf_bytes: &[u8],
        instruction: &str,
    ) -> Result<Envelope, IntellidocsError> {
        debug!(
            bytes = pdf_bytes.len(),
            instruction_len = instruction.len(),
            "mock processor invoked"
        );
        sleep(Duration::from_millis(self.latency_ms)).await;
        match &self.fail_with {
            Some(message) => Ok(Envelope::failure(message.clone())),
            None => Ok(Envelope::ok(sample_rows())),
        }
    }
}

/// Stub spreadsheet exporter: settles after `latency_ms` with placeholder
/// bytes under the xlsx MIME type.
#[derive(Debug, Clone, Default)]
pub struct MockExporter {
    /// Artificial settle delay in milliseconds.
    pub latency_ms: u64,
    /// When set, reject with a transport-style error instead of bytes.
    pub fail: bool,
}

impl MockExporter {
    pub fn new(latency_ms: u64) -> Self {
        Self {
            latency_ms,
            fail: false,
        }
    }

    /// An exporter that always rejects.
    pub fn failing() -> Self {
        Self {
            latency_ms: 0,
            fail: true,
        }
    }
}

#[async_trait]
impl SpreadsheetExporter for MockExporter {
    async fn export(&self, rows: &[Record]) -> Result<ExportedFile, IntellidocsError> {
        debug!(rows = rows.len(), "mock exporter invoked");
        sleep(Duration::from_millis(self.latency_ms)).await;
        if self.fail {
            return Err(IntellidocsError::ServiceFailure {
                url: "mock://export".into(),
                status: 500,
                detail: "injected export failure".into(),
            });
        }
        Ok(ExportedFile::xlsx(b"Mock Excel data".to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::XLSX_MIME;

    #[tokio::test]
    async fn mock_processor_returns_five_rows_regardless_of_input() {
        let processor = MockProcessor::default();
        let envelope = processor.process(b"not even a pdf", "anything").await.unwrap();
        assert!(envelope.success);
        let rows = envelope.data.unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].section, "Executive Summary");
        assert!(rows[0].requirements.starts_with("High-level overview"));
    }

    #[tokio::test]
    async fn failing_processor_signals_soft_failure() {
        let processor = MockProcessor::failing("document unreadable");
        let envelope = processor.process(b"%PDF", "extract").await.unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.error.as_deref(), Some("document unreadable"));
        assert!(envelope.data.is_none());
    }

    #[tokio::test]
    async fn mock_exporter_returns_xlsx_mime() {
        let exporter = MockExporter::default();
        let file = exporter.export(&sample_rows()).await.unwrap();
        assert_eq!(file.mime, XLSX_MIME);
        assert!(!file.bytes.is_empty());
    }

    #[tokio::test]
    async fn failing_exporter_rejects() {
        let exporter = MockExporter::failing();
        let err = exporter.export(&sample_rows()).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
