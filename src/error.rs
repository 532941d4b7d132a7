//! Error types for the invoice-extract library.
//!
//! Three error types reflect three failure scopes:
//!
//! * [`ExtractError`] — **Fatal** for one document or call: the analysis file
//!   is missing or unreadable, the LLM provider is not configured, the output
//!   cannot be written.
//!
//! * [`TableError`] — **Non-fatal**: one detected table could not be
//!   reconstructed (no cells, no header, ragged rows). Every other table of
//!   the document is unaffected.
//!
//! * [`LineItemError`] — **Non-fatal**: the LLM line-item step failed. The
//!   document's tables are still returned.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the invoice-extract library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Analysis file was not found at the given path.
    #[error("Analysis file not found: '{path}'\nCheck the path exists and is readable.")]
    AnalysisNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was read but is not a document-analysis result.
    #[error("'{path}' is not a valid analysis result: {detail}")]
    InvalidAnalysis { path: PathBuf, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
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

/// A non-fatal error for a single table.
///
/// `table` is the 0-based position of the table in the analysis result.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum TableError {
    /// The table has no cells at all.
    #[error("Table {table}: no cells")]
    EmptyTable { table: usize },

    /// Only a title row was present, nothing to use as a header.
    #[error("Table {table}: no header row after the title")]
    MissingHeader { table: usize },

    /// A data row does not have as many cells as the header.
    #[error("Table {table}: row {row} has {found} cells, header has {expected}")]
    RowLengthMismatch {
        table: usize,
        row: usize,
        expected: usize,
        found: usize,
    },
}

impl TableError {
    /// Position of the failed table in the input list.
    pub fn table(&self) -> usize {
        match self {
            TableError::EmptyTable { table }
            | TableError::MissingHeader { table }
            | TableError::RowLengthMismatch { table, .. } => *table,
        }
    }
}

/// A non-fatal error from the line-item step.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum LineItemError {
    /// LLM call failed after retries.
    #[error("LLM call failed after {retries} retries: {detail}")]
    LlmFailed { retries: u32, detail: String },

    /// LLM call timed out on the last attempt.
    #[error("LLM call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The model answered, but not with the expected JSON.
    #[error("Could not decode LLM response: {detail}")]
    InvalidResponse { detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_mismatch_display() {
        let e = TableError::RowLengthMismatch {
            table: 2,
            row: 3,
            expected: 4,
            found: 1,
        };
        let msg = e.to_string();
        assert!(msg.contains("Table 2"), "got: {msg}");
        assert!(msg.contains("row 3 has 1 cells"), "got: {msg}");
    }

    #[test]
    fn table_index_accessor() {
        assert_eq!(TableError::EmptyTable { table: 7 }.table(), 7);
        assert_eq!(TableError::MissingHeader { table: 1 }.table(), 1);
    }

    #[test]
    fn invalid_analysis_display() {
        let e = ExtractError::InvalidAnalysis {
            path: PathBuf::from("scan.json"),
            detail: "expected value at line 1".into(),
        };
        assert!(e.to_string().contains("scan.json"));
        assert!(e.to_string().contains("line 1"));
    }

    #[test]
    fn llm_failed_display() {
        let e = LineItemError::LlmFailed {
            retries: 3,
            detail: "503".into(),
        };
        assert!(e.to_string().contains("3 retries"));
    }
}
