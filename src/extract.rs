//! Extraction entry points: tables from cells, documents from analysis files.
//!
//! Two layers:
//!
//! * **Table reconstruction** ([`reconstruct_table`], [`reconstruct_tables`],
//!   [`extract_tables`]) — pure and synchronous. Each table goes through
//!   grouping → title detection → assembly on its own, so one malformed table
//!   never costs the others.
//!
//! * **Document drivers** ([`extract_document`], [`extract_documents`]) —
//!   async. Load the analysis file, reconstruct its tables, and optionally ask
//!   the LLM for line items.

use crate::analysis::{load_analysis, AnalysisResult, DocumentTable};
use crate::config::{ExtractionConfig, RowLengthPolicy};
use crate::error::{ExtractError, TableError};
use crate::output::{DocumentExtraction, ExtractedTable, ExtractionStats};
use crate::pipeline::{assemble, group, items, llm, title};
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome for one input table.
pub type TableOutcome = Result<ExtractedTable, TableError>;

// ── Table reconstruction ─────────────────────────────────────────────────

/// Reconstruct the table at position `index`.
pub fn reconstruct_table(
    index: usize,
    table: &DocumentTable,
    policy: RowLengthPolicy,
) -> TableOutcome {
    let rows = group::group_rows(&table.cells);
    let title = title::extract_title(&rows);
    let normalized = assemble::assemble_table(index, &rows, title::has_title(&rows), policy)?;
    Ok(ExtractedTable {
        index,
        title,
        table: normalized,
    })
}

/// Reconstruct every table, one outcome per input table, in input order.
pub fn reconstruct_tables(tables: &[DocumentTable], policy: RowLengthPolicy) -> Vec<TableOutcome> {
    if tables.is_empty() {
        return Vec::new();
    }
    tables
        .iter()
        .enumerate()
        .map(|(i, t)| reconstruct_table(i, t, policy))
        .collect()
}

/// Reconstruct every table, keeping only the successes.
///
/// Failed tables are logged at `warn` and left out; the relative order of the
/// remaining tables is preserved. Use [`reconstruct_tables`] to see why a
/// table was dropped.
pub fn extract_tables(tables: &[DocumentTable], policy: RowLengthPolicy) -> Vec<ExtractedTable> {
    reconstruct_tables(tables, policy)
        .into_iter()
        .filter_map(|outcome| match outcome {
            Ok(t) => Some(t),
            Err(e) => {
                warn!("Skipping table: {}", e);
                None
            }
        })
        .collect()
}

// ── Document drivers ─────────────────────────────────────────────────────

/// Extract tables (and line items, if enabled) from one analysis file.
///
/// # Errors
/// Returns `Err(ExtractError)` only for fatal errors: the file is missing or
/// not an analysis result, or line items were requested and no LLM provider
/// could be resolved. Table and line-item failures are reported inside the
/// returned [`DocumentExtraction`].
pub async fn extract_document(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<DocumentExtraction, ExtractError> {
    let provider = line_item_provider(config)?;
    let path = path.as_ref();
    let source = source_name(path);
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(0, &source);
    }
    let result = extract_one(path, provider.as_ref(), config).await;
    notify_document_done(config, 0, &source, &result);
    result
}

/// Extract from an analysis result already in memory.
pub async fn extract_analysis(
    source: &str,
    analysis: &AnalysisResult,
    config: &ExtractionConfig,
) -> Result<DocumentExtraction, ExtractError> {
    let provider = line_item_provider(config)?;
    Ok(process_analysis(source, analysis, provider.as_ref(), config, Instant::now()).await)
}

/// Extract from several analysis files, up to `config.concurrency` at once.
///
/// Results come back in input order, one per path. The outer `Err` is
/// reserved for errors that affect the whole batch (provider resolution).
pub async fn extract_documents<P: AsRef<Path>>(
    paths: &[P],
    config: &ExtractionConfig,
) -> Result<Vec<Result<DocumentExtraction, ExtractError>>, ExtractError> {
    let provider = line_item_provider(config)?;
    let total = paths.len();
    info!("Extracting {} documents", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut results: Vec<(usize, Result<DocumentExtraction, ExtractError>)> =
        stream::iter(paths.iter().enumerate().map(|(i, p)| {
            let provider = provider.clone();
            let path = p.as_ref();
            async move {
                let source = source_name(path);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_document_start(i, &source);
                }
                let result = extract_one(path, provider.as_ref(), config).await;
                notify_document_done(config, i, &source, &result);
                (i, result)
            }
        }))
        .buffer_unordered(config.concurrency)
        .collect()
        .await;

    results.sort_by_key(|(i, _)| *i);
    let success = results.iter().filter(|(_, r)| r.is_ok()).count();
    info!("Batch complete: {}/{} documents", success, total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, success);
    }

    Ok(results.into_iter().map(|(_, r)| r).collect())
}

/// Synchronous wrapper around [`extract_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_document_sync(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<DocumentExtraction, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_document(path, config))
}

/// Write `contents` to `path` atomically (temp file + rename).
pub async fn write_output(path: impl AsRef<Path>, contents: &str) -> Result<(), ExtractError> {
    let path = path.as_ref();
    let write_err = |e: std::io::Error| ExtractError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn notify_document_done(
    config: &ExtractionConfig,
    index: usize,
    source: &str,
    result: &Result<DocumentExtraction, ExtractError>,
) {
    let Some(ref cb) = config.progress_callback else {
        return;
    };
    match result {
        Ok(doc) => cb.on_document_complete(index, source, doc.tables.len(), doc.line_items.len()),
        Err(e) => cb.on_document_error(index, source, &e.to_string()),
    }
}

async fn extract_one(
    path: &Path,
    provider: Option<&Arc<dyn LLMProvider>>,
    config: &ExtractionConfig,
) -> Result<DocumentExtraction, ExtractError> {
    let start = Instant::now();
    let source = source_name(path);
    info!("Extracting: {}", path.display());

    let analysis = load_analysis(path).await?;
    Ok(process_analysis(&source, &analysis, provider, config, start).await)
}

async fn process_analysis(
    source: &str,
    analysis: &AnalysisResult,
    provider: Option<&Arc<dyn LLMProvider>>,
    config: &ExtractionConfig,
    start: Instant,
) -> DocumentExtraction {
    // ── Tables ───────────────────────────────────────────────────────────
    let mut tables = Vec::new();
    let mut table_errors = Vec::new();
    for outcome in reconstruct_tables(&analysis.tables, config.row_length_policy) {
        match outcome {
            Ok(t) => tables.push(t),
            Err(e) => {
                warn!("{}: skipping table: {}", source, e);
                table_errors.push(e);
            }
        }
    }
    debug!(
        "{}: {}/{} tables reconstructed",
        source,
        tables.len(),
        analysis.tables.len()
    );

    // ── Line items ───────────────────────────────────────────────────────
    let mut line_items = Vec::new();
    let mut line_items_error = None;
    let (mut input_tokens, mut output_tokens) = (0u64, 0u64);
    let (mut llm_retries, mut llm_duration_ms) = (0u32, 0u64);

    if let Some(provider) = provider {
        if analysis.content.trim().is_empty() {
            warn!("{}: no document text, skipping line items", source);
        } else {
            match llm::request_line_items(provider, source, &analysis.content, config).await {
                Ok(answer) => {
                    input_tokens = answer.input_tokens;
                    output_tokens = answer.output_tokens;
                    llm_retries = answer.retries;
                    llm_duration_ms = answer.duration_ms;
                    match items::parse_line_items(&answer.content, source) {
                        Ok(parsed) => line_items = parsed,
                        Err(e) => {
                            warn!("{}: {}", source, e);
                            line_items_error = Some(e);
                        }
                    }
                }
                Err(e) => {
                    warn!("{}: {}", source, e);
                    line_items_error = Some(e);
                }
            }
        }
    }

    let stats = ExtractionStats {
        total_tables: analysis.tables.len(),
        extracted_tables: tables.len(),
        failed_tables: table_errors.len(),
        line_items: line_items.len(),
        input_tokens,
        output_tokens,
        llm_retries,
        llm_duration_ms,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "{}: {} tables, {} line items, {}ms",
        source, stats.extracted_tables, stats.line_items, stats.duration_ms
    );

    DocumentExtraction {
        source: source.to_string(),
        tables,
        table_errors,
        line_items,
        line_items_error,
        stats,
    }
}

/// The provider to use for line items, or `None` when the step is disabled.
fn line_item_provider(
    config: &ExtractionConfig,
) -> Result<Option<Arc<dyn LLMProvider>>, ExtractError> {
    if !config.extract_line_items {
        return Ok(None);
    }
    resolve_provider(config).map(Some)
}

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ExtractError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ExtractError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. Pre-built provider (`config.provider`).
/// 2. Named provider (`config.provider_name`) with the configured model.
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set.
/// 4. OpenAI, when `OPENAI_API_KEY` is set.
/// 5. Whatever [`ProviderFactory::from_env`] detects.
fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, ExtractError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", config.model_or_default());
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ExtractError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY (or AZURE_OPENAI_API_KEY, ANTHROPIC_API_KEY), \
                or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::TableCell;

    fn table(rows: &[&[&str]]) -> DocumentTable {
        DocumentTable::from_cells(
            rows.iter()
                .enumerate()
                .flat_map(|(r, row)| {
                    row.iter()
                        .enumerate()
                        .map(move |(c, text)| TableCell::new(r, c, *text))
                })
                .collect(),
        )
    }

    #[test]
    fn empty_input_empty_output() {
        assert!(reconstruct_tables(&[], RowLengthPolicy::Reject).is_empty());
        assert!(extract_tables(&[], RowLengthPolicy::Reject).is_empty());
    }

    #[test]
    fn title_and_header() {
        let t = table(&[&["Header A"], &["x", "1"], &["y", "2"]]);
        let out = reconstruct_table(0, &t, RowLengthPolicy::Reject).unwrap();
        assert_eq!(out.title.as_deref(), Some("Header A"));
        assert_eq!(out.table.columns, vec!["x", "1"]);
        assert_eq!(out.table.records, vec![vec!["y", "2"]]);
    }

    #[test]
    fn empty_table_is_a_failure_not_a_panic() {
        let outcomes = reconstruct_tables(&[DocumentTable::default()], RowLengthPolicy::Reject);
        assert_eq!(outcomes, vec![Err(TableError::EmptyTable { table: 0 })]);
    }

    #[test]
    fn failures_skipped_in_order() {
        let tables = vec![
            table(&[&["A", "B"], &["1", "2"]]),
            table(&[&["A", "B"], &["1"]]),
            table(&[&["T"], &["C", "D"], &["3", "4"]]),
        ];
        let out = extract_tables(&tables, RowLengthPolicy::Reject);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].index, 0);
        assert_eq!(out[1].index, 2);
        assert_eq!(out[1].title.as_deref(), Some("T"));

        let lenient = extract_tables(&tables, RowLengthPolicy::PadOrTruncate);
        assert_eq!(lenient.len(), 3);
    }

    #[test]
    fn disabled_line_items_need_no_provider() {
        let config = ExtractionConfig::default();
        assert!(line_item_provider(&config).unwrap().is_none());
    }

    #[test]
    fn source_name_is_file_name() {
        assert_eq!(source_name(Path::new("/tmp/scans/inv-001.json")), "inv-001.json");
    }
}
