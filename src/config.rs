//! Configuration types for the intellidocs client.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share configs across tasks, serialise them for logging, and diff two
//! runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A many-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::IntellidocsError;
use serde::{Deserialize, Serialize};

/// Fixed filename under which the exported workbook is saved.
pub const EXPORT_FILENAME: &str = "intellidocs-export.xlsx";

/// Configuration for the intellidocs client.
///
/// Built via [`ClientConfig::builder()`] or using
/// [`ClientConfig::default()`].
///
/// # Example
/// ```rust
/// use intellidocs::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .process_endpoint("https://docs.example/process")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// URL of the document-understanding service. `None` selects the
    /// built-in mock processor.
    ///
    /// The mock is the default so the workflow can be exercised end to end
    /// without any deployed backend; see [`crate::service::mock`].
    pub process_endpoint: Option<String>,

    /// URL of the spreadsheet-export service. `None` selects the built-in
    /// mock exporter.
    pub export_endpoint: Option<String>,

    /// Per-service-call timeout in seconds. Default: 60.
    ///
    /// Document understanding is slow — a large PDF plus a broad instruction
    /// can legitimately take tens of seconds. 60 s covers that while still
    /// bounding a hung connection. There is no retry on timeout: every error
    /// is terminal for the action that triggered it.
    pub api_timeout_secs: u64,

    /// Maximum accepted upload size in bytes. Default: 50 MiB.
    ///
    /// Checked before any bytes leave the machine so an oversized file fails
    /// instantly with a clear message instead of a mid-upload connection
    /// reset from the service.
    pub max_upload_bytes: u64,

    /// Artificial settle delay for the mock services, in milliseconds.
    /// Default: 0 (the browser original used 2000/1000 to simulate latency;
    /// tests and the CLI want instant settlement).
    pub mock_latency_ms: u64,

    /// Filename for the exported workbook. Default: [`EXPORT_FILENAME`].
    pub export_filename: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            process_endpoint: None,
            export_endpoint: None,
            api_timeout_secs: 60,
            max_upload_bytes: 50 * 1024 * 1024,
            mock_latency_ms: 0,
            export_filename: EXPORT_FILENAME.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn process_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.process_endpoint = Some(url.into());
        self
    }

    pub fn export_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.export_endpoint = Some(url.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.config.max_upload_bytes = bytes.max(1);
        self
    }

    pub fn mock_latency_ms(mut self, ms: u64) -> Self {
        self.config.mock_latency_ms = ms;
        self
    }

    pub fn export_filename(mut self, name: impl Into<String>) -> Self {
        self.config.export_filename = name.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, IntellidocsError> {
        let c = &self.config;
        for url in [&c.process_endpoint, &c.export_endpoint].into_iter().flatten() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(IntellidocsError::InvalidConfig(format!(
                    "Endpoint must be an HTTP/HTTPS URL, got '{url}'"
                )));
            }
        }
        if c.export_filename.trim().is_empty() {
            return Err(IntellidocsError::InvalidConfig(
                "Export filename must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
