//! CLI binary for intellidocs.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ClientConfig`, drives a `Session` end to end, and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use intellidocs::{
    ClientConfig, DocumentProcessor, HttpExporter, HttpProcessor, MockExporter, MockProcessor,
    Notice, Session, SessionObserver, SpreadsheetExporter, Step,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Session observer: notices + step indicator on the terminal ──────────────

/// Prints session notices and step changes, routing output through the
/// active progress bar (when one is spinning) so lines don't tear it.
struct CliObserver {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl CliObserver {
    fn new(quiet: bool) -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
            quiet,
        })
    }

    fn set_bar(&self, bar: Option<ProgressBar>) {
        *self.bar.lock().unwrap() = bar;
    }

    fn println(&self, line: String) {
        match self.bar.lock().unwrap().as_ref() {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

impl SessionObserver for CliObserver {
    fn on_step_changed(&self, step: Step) {
        if self.quiet {
            return;
        }
        let label = match step {
            Step::Upload => "upload",
            Step::Process => "process",
            Step::Results => "results",
        };
        self.println(format!("{} {}", cyan("◆"), dim(&format!("step: {label}"))));
    }

    fn on_notice(&self, notice: &Notice) {
        match notice {
            Notice::Success(m) => {
                if !self.quiet {
                    self.println(format!("{} {m}", green("✔")));
                }
            }
            // Errors print even in quiet mode.
            Notice::Error(m) => self.println(format!("{} {m}", red("✘"))),
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process with the built-in mock services (no backend needed)
  intellidocs spec.pdf --prompt "Extract all requirements"

  # Real services
  intellidocs spec.pdf --prompt "Extract all requirements" \
      --endpoint https://docs.example/process \
      --export-endpoint https://docs.example/export

  # Edit cells before exporting (ROW:COLUMN=VALUE, rows are 0-indexed)
  intellidocs spec.pdf --prompt "Extract all requirements" \
      --set "0:requirements=Reviewed overview" \
      --set "2:owner=Security team"

  # Print the processed rows as JSON instead of exporting
  intellidocs spec.pdf --prompt "Extract all requirements" --json

  # Choose where intellidocs-export.xlsx lands
  intellidocs spec.pdf --prompt "..." --output-dir ./exports

ENVIRONMENT VARIABLES:
  INTELLIDOCS_ENDPOINT         Document-understanding service URL
  INTELLIDOCS_EXPORT_ENDPOINT  Spreadsheet-export service URL
  INTELLIDOCS_TIMEOUT          Per-call timeout in seconds
"#;

/// Turn a PDF into an editable, exportable table.
#[derive(Parser, Debug)]
#[command(
    name = "intellidocs",
    version,
    about = "Turn PDFs into structured tables using a document-understanding service",
    long_about = "Submit a PDF and a free-text instruction to a document-understanding \
service, optionally edit the returned rows, and export them as an xlsx workbook. \
Without --endpoint the built-in mock services are used, so the whole flow can be \
exercised with no deployed backend.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Free-text instruction sent alongside the PDF.
    #[arg(short, long, conflicts_with = "prompt_file")]
    prompt: Option<String>,

    /// Read the instruction from a text file instead.
    #[arg(long)]
    prompt_file: Option<PathBuf>,

    /// Directory where intellidocs-export.xlsx is written.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Document-understanding service URL. Mock processor when absent.
    #[arg(long, env = "INTELLIDOCS_ENDPOINT")]
    endpoint: Option<String>,

    /// Spreadsheet-export service URL. Mock exporter when absent.
    #[arg(long, env = "INTELLIDOCS_EXPORT_ENDPOINT")]
    export_endpoint: Option<String>,

    /// Per-service-call timeout in seconds.
    #[arg(long, env = "INTELLIDOCS_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Cell edit applied before export: ROW:COLUMN=VALUE (repeatable).
    #[arg(long = "set", value_name = "ROW:COLUMN=VALUE")]
    edits: Vec<String>,

    /// Print the processed rows as JSON instead of exporting a workbook.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // observer provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = ClientConfig::builder().api_timeout_secs(cli.timeout);
    if let Some(ref url) = cli.endpoint {
        builder = builder.process_endpoint(url.clone());
    }
    if let Some(ref url) = cli.export_endpoint {
        builder = builder.export_endpoint(url.clone());
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Resolve and validate the input PDF ───────────────────────────────
    let file = intellidocs::read_pdf(&cli.input, &config)?;

    let instruction = resolve_instruction(&cli).await?;

    // ── Wire services ────────────────────────────────────────────────────
    let processor: Box<dyn DocumentProcessor> = match config.process_endpoint.as_deref() {
        Some(url) => Box::new(HttpProcessor::new(url, &config)?),
        None => Box::new(MockProcessor::new(config.mock_latency_ms)),
    };
    let exporter: Box<dyn SpreadsheetExporter> = match config.export_endpoint.as_deref() {
        Some(url) => Box::new(HttpExporter::new(url, &config)?),
        None => Box::new(MockExporter::new(config.mock_latency_ms)),
    };

    // ── Drive the session ────────────────────────────────────────────────
    let observer = CliObserver::new(cli.quiet);
    let mut session = Session::with_observer(
        config,
        Arc::clone(&observer) as Arc<dyn SessionObserver>,
    );

    if !session.select_file(file.name, file.mime, file.bytes) {
        // The observer already printed the rejection notice.
        bail!("input file was rejected");
    }
    session.set_instruction(instruction);

    let spinner = if show_progress {
        let bar = spinner("Processing");
        observer.set_bar(Some(bar.clone()));
        Some(bar)
    } else {
        None
    };

    let advanced = session.process(&*processor).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
        observer.set_bar(None);
    }
    if !advanced {
        bail!("processing failed");
    }

    // ── Apply cell edits ─────────────────────────────────────────────────
    for spec in &cli.edits {
        let (row, column, value) =
            parse_edit(spec).with_context(|| format!("Invalid --set '{spec}'"))?;
        if !session.edit(row, &column, value) {
            bail!(
                "Row {row} is out of range (table has {} rows)",
                session.table().row_count()
            );
        }
    }

    // ── Output ───────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(session.table().rows())
            .context("Failed to serialise rows")?;
        println!("{json}");
        return Ok(());
    }

    match session.export(&*exporter, &cli.output_dir).await {
        Some(path) => {
            if !cli.quiet {
                eprintln!(
                    "{}  {} rows  →  {}",
                    green("✔"),
                    session.table().row_count(),
                    bold(&path.display().to_string()),
                );
            }
            Ok(())
        }
        None => bail!("export failed"),
    }
}

/// Resolve the instruction from `--prompt` or `--prompt-file`.
async fn resolve_instruction(cli: &Cli) -> Result<String> {
    if let Some(ref text) = cli.prompt {
        return Ok(text.clone());
    }
    if let Some(ref path) = cli.prompt_file {
        return tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path));
    }
    bail!("An instruction is required: pass --prompt or --prompt-file");
}

/// Parse a `--set` spec of the form `ROW:COLUMN=VALUE`.
fn parse_edit(spec: &str) -> Result<(usize, String, String)> {
    let (row_str, rest) = spec
        .split_once(':')
        .context("expected ROW:COLUMN=VALUE")?;
    let (column, value) = rest.split_once('=').context("expected ROW:COLUMN=VALUE")?;
    let row: usize = row_str.trim().parse().context("row must be a number")?;
    let column = column.trim();
    if column.is_empty() {
        bail!("column name must not be empty");
    }
    Ok((row, column.to_string(), value.to_string()))
}

/// A steady-tick spinner in the house style.
fn spinner(prefix: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix(prefix.to_string());
    bar.set_message("waiting for the document service…");
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_edit_accepts_well_formed_specs() {
        let (row, column, value) = parse_edit("2:requirements=Tightened wording").unwrap();
        assert_eq!(row, 2);
        assert_eq!(column, "requirements");
        assert_eq!(value, "Tightened wording");
    }

    #[test]
    fn parse_edit_keeps_equals_signs_in_the_value() {
        let (_, _, value) = parse_edit("0:formula=a=b").unwrap();
        assert_eq!(value, "a=b");
    }

    #[test]
    fn parse_edit_rejects_garbage() {
        assert!(parse_edit("no-separators").is_err());
        assert!(parse_edit("x:col=v").is_err());
        assert!(parse_edit("1:=v").is_err());
    }
}
