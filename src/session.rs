//! The workflow session: a headless rendition of the upload → process →
//! results wizard.
//!
//! ## Why headless?
//!
//! Everything a front end needs — the step indicator, the busy flag, toast
//! notifications, the editable table — lives here behind plain methods, so a
//! terminal UI, a desktop shell, or a test harness can drive the identical
//! state machine. User-visible events flow through [`SessionObserver`], a
//! trait with no-op defaults so hosts only override what they render.
//!
//! ## State machine
//!
//! ```text
//! Upload ──select_file(pdf)──▶ Process ──process() ok──▶ Results
//!    ▲                            │  ▲                      │
//!    └────────── (never) ◀────────┘  └──process() failed────┤
//!                                                           │
//!            select_file(pdf) from Results restarts ◀───────┘
//! ```
//!
//! The steps are advisory: nothing prevents re-selecting a file from
//! `Results`, which restarts the cycle and discards the table. Guards are
//! enforced on *actions*, not transitions — a wrong MIME type, a missing
//! instruction, or an in-flight call each produce a notice and leave the
//! state untouched.

use crate::config::ClientConfig;
use crate::error::IntellidocsError;
use crate::model::Table;
use crate::service::{DocumentProcessor, SpreadsheetExporter, PDF_MIME};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The three-stage wizard indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// No file yet; awaiting selection.
    Upload,
    /// File present; awaiting instruction and submission.
    Process,
    /// Rows available for editing and export.
    Results,
}

/// A transient user-visible notification, the toast analogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    /// The notification text, regardless of severity.
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Error(m) => m,
        }
    }
}

/// Receives session events as the user works through the wizard.
///
/// All methods have default no-op implementations. Implementations must be
/// `Send + Sync` so the same observer can serve a multi-threaded host, even
/// though a single session is only ever driven from one place at a time.
pub trait SessionObserver: Send + Sync {
    /// The wizard moved to a different step.
    fn on_step_changed(&self, step: Step) {
        let _ = step;
    }

    /// A notification should be shown to the user.
    fn on_notice(&self, notice: &Notice) {
        let _ = notice;
    }

    /// The busy flag flipped; hosts disable the submit control while `true`.
    fn on_busy_changed(&self, busy: bool) {
        let _ = busy;
    }
}

/// A no-op observer for hosts that poll the session state instead.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// The file the user selected for processing.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Owns all workflow state: selected file, instruction, busy flag, result
/// table, and the current wizard step.
pub struct Session {
    config: ClientConfig,
    observer: Arc<dyn SessionObserver>,
    step: Step,
    file: Option<SelectedFile>,
    instruction: String,
    busy: bool,
    table: Table,
}

impl Session {
    /// Create a session with no observer.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_observer(config, Arc::new(NoopObserver))
    }

    /// Create a session that reports events to `observer`.
    pub fn with_observer(config: ClientConfig, observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            config,
            observer,
            step: Step::Upload,
            file: None,
            instruction: String::new(),
            busy: false,
            table: Table::default(),
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file.as_ref().map(|f| f.name.as_str())
    }

    /// Offer a file to the wizard.
    ///
    /// Accepts only MIME type exactly `application/pdf` and files within the
    /// configured size limit; anything else produces an error notice and
    /// leaves all state unchanged. Accepting a file from `Results` restarts
    /// the cycle and discards the current table.
    pub fn select_file(
        &mut self,
        name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> bool {
        let name = name.into();
        let mime = mime.into();

        if mime != PDF_MIME {
            debug!(%name, %mime, "rejected non-PDF selection");
            self.notify_error("Please upload a PDF file");
            return false;
        }
        let size = bytes.len() as u64;
        if size > self.config.max_upload_bytes {
            debug!(%name, size, limit = self.config.max_upload_bytes, "rejected oversize selection");
            self.notify_error(format!(
                "File is too large ({size} bytes, limit {} bytes)",
                self.config.max_upload_bytes
            ));
            return false;
        }

        if !self.table.is_empty() {
            // Advisory wizard: a fresh selection silently drops prior results.
            debug!(rows = self.table.row_count(), "new selection discards existing table");
            self.table = Table::default();
        }

        info!(%name, size, "file accepted");
        self.file = Some(SelectedFile { name, mime, bytes });
        self.set_step(Step::Process);
        true
    }

    /// Set the free-text instruction sent alongside the PDF.
    pub fn set_instruction(&mut self, text: impl Into<String>) {
        self.instruction = text.into();
    }

    /// Edit one table cell in place. Returns `false` for an out-of-range row.
    pub fn edit(&mut self, row: usize, column: &str, value: impl Into<String>) -> bool {
        self.table.set(row, column, value)
    }

    /// Submit the file and instruction to the document-understanding service.
    ///
    /// Returns `true` when the wizard advanced to [`Step::Results`]. Every
    /// failure path — missing inputs, a call already in flight, a service
    /// refusal, a transport error — emits a notice and returns `false` with
    /// no partial data stored and the step unchanged. Transport error detail
    /// goes to the log, not the notice.
    pub async fn process(&mut self, processor: &dyn DocumentProcessor) -> bool {
        if self.busy {
            self.notify_error("Processing is already in progress");
            return false;
        }
        if self.file.is_none() || self.instruction.trim().is_empty() {
            self.notify_error("Please upload a PDF and enter an instruction");
            return false;
        }

        self.set_busy(true);
        // take/put-back keeps the file out of self for the duration of the
        // call so the borrow doesn't overlap the busy-flag updates.
        let Some(file) = self.file.take() else {
            self.set_busy(false);
            return false;
        };
        let result = processor.process(&file.bytes, &self.instruction).await;
        self.file = Some(file);
        self.set_busy(false);

        match result {
            Ok(envelope) if envelope.success => {
                let rows = envelope.data.unwrap_or_default();
                if rows.is_empty() {
                    warn!("service reported success with no rows");
                    self.notify_error("Error processing PDF");
                    return false;
                }
                info!(rows = rows.len(), "processing succeeded");
                self.table = Table::from_rows(rows);
                self.set_step(Step::Results);
                self.notify_success("PDF processed successfully");
                true
            }
            Ok(envelope) => {
                warn!(
                    error = envelope.error.as_deref().unwrap_or("<no message>"),
                    "service declined the document"
                );
                self.notify_error("Error processing PDF");
                false
            }
            Err(e) => {
                warn!(error = %e, "processing call failed");
                self.notify_error("Error processing PDF");
                false
            }
        }
    }

    /// Export the (possibly edited) table through the spreadsheet service
    /// and save the workbook under the configured filename inside `dir`.
    ///
    /// Returns the written path on success. May be invoked repeatedly; each
    /// call re-exports the current table contents.
    pub async fn export(
        &mut self,
        exporter: &dyn SpreadsheetExporter,
        dir: &Path,
    ) -> Option<PathBuf> {
        if self.table.is_empty() {
            self.notify_error("Nothing to export yet");
            return None;
        }

        let exported = match exporter.export(self.table.rows()).await {
            Ok(file) => file,
            Err(e) => {
                warn!(error = %e, "export call failed");
                self.notify_error("Error exporting workbook");
                return None;
            }
        };

        let path = dir.join(&self.config.export_filename);
        if let Err(e) = write_atomic(&path, &exported.bytes).await {
            warn!(error = %e, "export write failed");
            self.notify_error("Error exporting workbook");
            return None;
        }

        info!(path = %path.display(), bytes = exported.bytes.len(), "workbook exported");
        self.notify_success(format!("Workbook saved to {}", path.display()));
        Some(path)
    }

    fn set_step(&mut self, step: Step) {
        if self.step != step {
            self.step = step;
            self.observer.on_step_changed(step);
        }
    }

    fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
        self.observer.on_busy_changed(busy);
    }

    fn notify_success(&self, message: impl Into<String>) {
        self.observer.on_notice(&Notice::Success(message.into()));
    }

    fn notify_error(&self, message: impl Into<String>) {
        self.observer.on_notice(&Notice::Error(message.into()));
    }
}

/// Atomic write: temp file + rename prevents partial exports.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), IntellidocsError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| IntellidocsError::ExportWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("xlsx.tmp");
    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| IntellidocsError::ExportWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| IntellidocsError::ExportWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}
