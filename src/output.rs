//! Output types: normalised tables, line items, and per-document results.
//!
//! Everything here is `Serialize + Deserialize` so the CLI's `--json` mode is
//! a plain `serde_json::to_string_pretty` of a [`DocumentExtraction`].

use crate::error::{ExtractError, LineItemError, TableError};
use crate::pipeline::render;
use serde::{Deserialize, Serialize};

/// A table after title removal and header extraction.
///
/// `columns` keep their left-to-right order and may repeat; every record has
/// exactly `columns.len()` values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTable {
    pub columns: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl NormalizedTable {
    /// A table with the given header and no records.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of records (the header is not counted).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of the first column with this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of the first column with this name, top to bottom.
    ///
    /// Records too short to reach the column are skipped.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.records
                .iter()
                .filter_map(|r| r.get(idx).map(String::as_str))
                .collect(),
        )
    }

    /// Cell value at `(record, column)`.
    pub fn get(&self, record: usize, column: usize) -> Option<&str> {
        self.records.get(record)?.get(column).map(String::as_str)
    }

    /// Render as a GitHub Flavored Markdown table.
    pub fn to_markdown(&self) -> String {
        render::table_to_gfm(&self.columns, &self.records)
    }
}

/// One successfully reconstructed table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedTable {
    /// 0-based position of the source table in the analysis result.
    pub index: usize,
    /// Raw content of a single-cell first row, if there was one.
    pub title: Option<String>,
    pub table: NormalizedTable,
}

impl ExtractedTable {
    /// Title paragraph (when present) followed by the GFM table.
    pub fn to_markdown(&self) -> String {
        render::titled_table(self.title.as_deref(), &self.table)
    }
}

/// One invoice line item as returned by the LLM step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub file_name: String,
    #[serde(rename = "item-name")]
    pub item_name: String,
    #[serde(rename = "item-amount")]
    pub item_amount: String,
    #[serde(rename = "item-subcategory")]
    pub item_subcategory: String,
    #[serde(rename = "item-sub-category-total")]
    pub item_subcategory_total: String,
}

/// Column names of [`line_items_table`], matching the serialised keys.
pub const LINE_ITEM_COLUMNS: [&str; 5] = [
    "file_name",
    "item-name",
    "item-amount",
    "item-subcategory",
    "item-sub-category-total",
];

/// Lay line items out as a table for rendering.
pub fn line_items_table(items: &[LineItem]) -> NormalizedTable {
    NormalizedTable {
        columns: LINE_ITEM_COLUMNS.iter().map(|c| c.to_string()).collect(),
        records: items
            .iter()
            .map(|i| {
                vec![
                    i.file_name.clone(),
                    i.item_name.clone(),
                    i.item_amount.clone(),
                    i.item_subcategory.clone(),
                    i.item_subcategory_total.clone(),
                ]
            })
            .collect(),
    }
}

/// Line items of every document in one table, in document order.
///
/// The `file_name` column tells the documents apart.
pub fn combined_line_items(documents: &[DocumentExtraction]) -> NormalizedTable {
    let items: Vec<LineItem> = documents
        .iter()
        .flat_map(|d| d.line_items.iter().cloned())
        .collect();
    line_items_table(&items)
}

/// Everything extracted from one analysed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentExtraction {
    /// File name of the analysis result (no directory).
    pub source: String,
    /// Reconstructed tables in detection order.
    pub tables: Vec<ExtractedTable>,
    /// Tables that could not be reconstructed.
    pub table_errors: Vec<TableError>,
    /// Line items; empty when the step is disabled or failed.
    pub line_items: Vec<LineItem>,
    /// Why the line-item step failed, if it did.
    pub line_items_error: Option<LineItemError>,
    pub stats: ExtractionStats,
}

impl DocumentExtraction {
    /// Markdown report: one section per table, then the line items.
    pub fn to_markdown(&self) -> String {
        render::document_markdown(self)
    }

    /// Turn any table failure into an error, for callers with zero tolerance.
    pub fn into_result(self) -> Result<Self, ExtractError> {
        if self.table_errors.is_empty() {
            Ok(self)
        } else {
            Err(ExtractError::Internal(format!(
                "{}/{} tables failed in '{}'",
                self.stats.failed_tables, self.stats.total_tables, self.source
            )))
        }
    }
}

/// Counters for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub total_tables: usize,
    pub extracted_tables: usize,
    pub failed_tables: usize,
    pub line_items: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Retries spent on the line-item call before it succeeded.
    #[serde(default)]
    pub llm_retries: u32,
    /// Wall time of the line-item call, retries included.
    #[serde(default)]
    pub llm_duration_ms: u64,
    pub duration_ms: u64,
}
