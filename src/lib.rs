//! # intellidocs
//!
//! Turn PDF documents into editable, exportable tables via a
//! document-understanding service.
//!
//! ## What this crate is
//!
//! The headless core of a three-step workflow: a user supplies a PDF and a
//! free-text instruction, a document-understanding service returns tabular
//! rows, the user edits cells in place, and the result is exported as an
//! xlsx workbook. All state, guards, and notifications live in
//! [`Session`]; front ends only render what the session reports.
//!
//! ## Workflow Overview
//!
//! ```text
//! PDF + instruction
//!  │
//!  ├─ 1. Select   MIME + size guard, wizard moves Upload → Process
//!  ├─ 2. Process  DocumentProcessor call (HTTP or mock), rows validated
//!  ├─ 3. Edit     in-place cell edits on the result table
//!  └─ 4. Export   SpreadsheetExporter call, atomic write of
//!                 intellidocs-export.xlsx
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use intellidocs::{ClientConfig, MockExporter, MockProcessor, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::new(ClientConfig::default());
//!     let bytes = std::fs::read("spec.pdf")?;
//!     session.select_file("spec.pdf", "application/pdf", bytes);
//!     session.set_instruction("Extract all requirements");
//!
//!     if session.process(&MockProcessor::default()).await {
//!         session.edit(0, "requirements", "Reviewed overview");
//!         session
//!             .export(&MockExporter::default(), std::path::Path::new("."))
//!             .await;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Services
//!
//! Both collaborators sit behind traits ([`DocumentProcessor`],
//! [`SpreadsheetExporter`]). The built-in mocks settle after a configurable
//! delay with canned data; [`service::http`] provides real clients with
//! per-call timeouts and an explicit error-mapping policy. No service error
//! is retried: every failure is terminal for the action that triggered it
//! and surfaces as a user notice.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `intellidocs` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! intellidocs = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod service;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder, EXPORT_FILENAME};
pub use error::IntellidocsError;
pub use input::read_pdf;
pub use model::{Envelope, Record, Table};
pub use service::http::{HttpExporter, HttpProcessor};
pub use service::mock::{MockExporter, MockProcessor};
pub use service::{DocumentProcessor, ExportedFile, SpreadsheetExporter, PDF_MIME, XLSX_MIME};
pub use session::{Notice, SelectedFile, Session, SessionObserver, Step};
