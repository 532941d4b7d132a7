//! CLI binary for invoice-extract.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use invoice_extract::{
    combined_line_items, combined_line_items_markdown, extract_documents, write_output,
    DocumentExtraction, ExtractionConfig, ExtractionProgressCallback, ProgressCallback,
    RowLengthPolicy,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// document. Documents may finish out of order.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
    }

    fn on_document_start(&self, _index: usize, source: &str) {
        self.bar.set_message(source.to_string());
    }

    fn on_document_complete(&self, _index: usize, source: &str, tables: usize, line_items: usize) {
        self.bar.println(format!(
            "  {} {:<32}  {}  {}",
            green("✓"),
            source,
            dim(&format!("{tables:>3} tables")),
            dim(&format!("{line_items:>4} items")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, _index: usize, source: &str, error: &str) {
        let first_line = error.lines().next().unwrap_or(error);
        self.bar
            .println(format!("  {} {:<32}  {}", red("✗"), source, red(first_line)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total_documents.saturating_sub(success_count);
        if failed == 0 {
            eprintln!(
                "{} {} documents extracted",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents extracted  ({} failed)",
                if failed == total_documents {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Tables of one analysed invoice, as Markdown
  invoice-extract invoice.json

  # Several invoices, JSON output to a file
  invoice-extract --json scans/*.json -o tables.json

  # Keep ragged tables (pad short rows, cut long ones)
  invoice-extract --lenient-rows invoice.json

  # Also ask an LLM for line items
  invoice-extract --items --provider openai --model gpt-4o-mini invoice.json

INPUT:
  Each INPUT is the JSON result of a document-analysis call (Azure Document
  Intelligence / Form Recognizer), either the full REST response
  ({"status": ..., "analyzeResult": {...}}) or the bare analyzeResult object.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (line items)
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, azure, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Log filter, e.g. invoice_extract=debug
"#;

/// Rebuild invoice tables from document-analysis results.
#[derive(Parser, Debug)]
#[command(
    name = "invoice-extract",
    version,
    about = "Rebuild invoice tables from document-analysis results",
    long_about = "Rebuild the tables of analysed invoices (row order, titles, headers, \
checkbox cleanup) from document-analysis JSON, and optionally extract line items \
with an LLM.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Analysis result JSON files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write output to this file instead of stdout.
    #[arg(short, long, env = "INVOICE_EXTRACT_OUTPUT")]
    output: Option<PathBuf>,

    /// Output structured JSON instead of Markdown.
    #[arg(long, env = "INVOICE_EXTRACT_JSON")]
    json: bool,

    /// Pad short rows and truncate long rows instead of dropping the table.
    #[arg(long, env = "INVOICE_EXTRACT_LENIENT_ROWS")]
    lenient_rows: bool,

    /// Extract line items from the document text with an LLM.
    #[arg(long, env = "INVOICE_EXTRACT_ITEMS")]
    items: bool,

    /// LLM model ID (default: gpt-4o-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, azure, anthropic, gemini, ollama.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Path to a text file with a custom line-item prompt ({document_text} placeholder).
    #[arg(long, env = "INVOICE_EXTRACT_PROMPT")]
    prompt: Option<PathBuf>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "INVOICE_EXTRACT_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Max LLM output tokens per document.
    #[arg(long, env = "INVOICE_EXTRACT_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Retries per document on LLM failure.
    #[arg(long, env = "INVOICE_EXTRACT_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "INVOICE_EXTRACT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Number of documents processed at once.
    #[arg(short, long, env = "INVOICE_EXTRACT_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Disable progress bar.
    #[arg(long, env = "INVOICE_EXTRACT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "INVOICE_EXTRACT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "INVOICE_EXTRACT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && cli.inputs.len() > 1;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Run extraction ───────────────────────────────────────────────────
    let results = extract_documents(&cli.inputs, &config)
        .await
        .context("Extraction failed")?;

    let mut documents: Vec<DocumentExtraction> = Vec::with_capacity(results.len());
    let mut failures = 0usize;
    for (path, result) in cli.inputs.iter().zip(results) {
        match result {
            Ok(doc) => documents.push(doc),
            Err(e) => {
                failures += 1;
                if !show_progress {
                    eprintln!("{} {}: {}", red("✗"), path.display(), e);
                }
            }
        }
    }

    let combined = cli.items && cli.inputs.len() > 1;
    let rendered = render_output(&documents, cli.json, combined)?;

    if let Some(ref output_path) = cli.output {
        write_output(output_path, &rendered)
            .await
            .context("Failed to write output")?;
        if !cli.quiet {
            let tables: usize = documents.iter().map(|d| d.stats.extracted_tables).sum();
            eprintln!(
                "{}  {} tables from {} documents  →  {}",
                if failures == 0 { green("✔") } else { cyan("⚠") },
                tables,
                documents.len(),
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
        if !rendered.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !cli.quiet && !show_progress {
        let skipped: usize = documents.iter().map(|d| d.stats.failed_tables).sum();
        if skipped > 0 {
            eprintln!("  {} tables skipped", skipped);
        }
        let (tokens_in, tokens_out) = documents.iter().fold((0u64, 0u64), |acc, d| {
            (acc.0 + d.stats.input_tokens, acc.1 + d.stats.output_tokens)
        });
        if cli.items {
            eprintln!(
                "   {} tokens in  /  {} tokens out",
                dim(&tokens_in.to_string()),
                dim(&tokens_out.to_string()),
            );
        }
    }

    if documents.is_empty() {
        anyhow::bail!("No document could be processed ({} failed)", failures);
    }
    Ok(())
}

/// Markdown (one section per document) or pretty JSON.
///
/// With `combined`, the line items of all documents are appended as one
/// table; in JSON the documents move under a `documents` key next to it.
fn render_output(documents: &[DocumentExtraction], json: bool, combined: bool) -> Result<String> {
    if json {
        let value = if combined {
            serde_json::json!({
                "documents": documents,
                "combined_line_items": combined_line_items(documents),
            })
        } else {
            serde_json::to_value(documents).context("Failed to serialise output")?
        };
        return serde_json::to_string_pretty(&value).context("Failed to serialise output");
    }

    let mut sections: Vec<String> = documents
        .iter()
        .map(DocumentExtraction::to_markdown)
        .collect();
    if combined {
        sections.push(combined_line_items_markdown(documents));
    }
    Ok(sections.join("\n"))
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let policy = if cli.lenient_rows {
        RowLengthPolicy::PadOrTruncate
    } else {
        RowLengthPolicy::Reject
    };

    let mut builder = ExtractionConfig::builder()
        .row_length_policy(policy)
        .extract_line_items(cli.items)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .concurrency(cli.concurrency);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref path) = cli.prompt {
        let template = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.prompt_template(template);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
