//! # invoice-extract
//!
//! Rebuild invoice tables from document-analysis results and, optionally,
//! pull line items out of the document text with an LLM.
//!
//! A document-understanding service (Azure Document Intelligence) reports
//! each detected table as an unordered bag of cells tagged with row and column
//! indices. This crate turns that bag back into a table: rows in order, an
//! optional caption row recognised as the title, checkbox markup stripped,
//! the first remaining row promoted to column headers.
//!
//! ## Pipeline Overview
//!
//! ```text
//! analysis JSON
//!  │
//!  ├─ 1. Load      bare result or REST envelope → typed tables + text
//!  ├─ 2. Group     cells → rows, sorted by (row, column)
//!  ├─ 3. Title     single-cell first row → title
//!  ├─ 4. Assemble  header + records, cleaned, row-length policy
//!  ├─ 5. LLM       optional line items from the document text
//!  └─ 6. Output    Markdown report or JSON
//! ```
//!
//! A table that cannot be rebuilt is reported (and skipped); it never takes
//! the other tables of the document down with it.
//!
//! ## Quick Start
//!
//! ```rust
//! use invoice_extract::{extract_tables, DocumentTable, RowLengthPolicy, TableCell};
//!
//! let table = DocumentTable::from_cells(vec![
//!     TableCell::new(0, 1, "Amount"),
//!     TableCell::new(0, 0, "Name"),
//!     TableCell::new(1, 0, "Apple"),
//!     TableCell::new(1, 1, "3 :unselected:"),
//! ]);
//!
//! let tables = extract_tables(&[table], RowLengthPolicy::Reject);
//! assert_eq!(tables[0].title, None);
//! assert_eq!(tables[0].table.columns, vec!["Name", "Amount"]);
//! assert_eq!(tables[0].table.records, vec![vec!["Apple", "3"]]);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `invoice-extract` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analysis;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analysis::{load_analysis, AnalysisResult, DocumentTable, TableCell};
pub use config::{ExtractionConfig, ExtractionConfigBuilder, RowLengthPolicy};
pub use error::{ExtractError, LineItemError, TableError};
pub use extract::{
    extract_analysis, extract_document, extract_document_sync, extract_documents, extract_tables,
    reconstruct_table, reconstruct_tables, write_output, TableOutcome,
};
pub use output::{
    combined_line_items, line_items_table, DocumentExtraction, ExtractedTable, ExtractionStats, LineItem,
    NormalizedTable,
};
pub use pipeline::clean::clean_cell_content;
pub use pipeline::render::combined_line_items_markdown;
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
