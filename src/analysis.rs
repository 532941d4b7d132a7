//! Document-analysis results: the input side of the pipeline.
//!
//! The document-understanding service (Azure Document Intelligence /
//! Form Recognizer) returns one JSON document per analysed file. Only two parts
//! of it matter here: the detected `tables` (flat cell lists) and the
//! document's full text `content`, which feeds the line-item step.
//!
//! Both wire shapes are accepted:
//!
//! ```text
//! { "status": "succeeded", "analyzeResult": { "content": …, "tables": […] } }   REST envelope
//! { "content": …, "tables": […] }                                             bare result
//! ```
//!
//! Field names follow the service (camelCase). The snake_case names written by
//! the Python SDK's `to_dict()` are accepted as aliases.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One analysed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Model that produced the result, e.g. `prebuilt-invoice`.
    #[serde(default, alias = "model_id")]
    pub model_id: Option<String>,

    /// Full document text in reading order.
    #[serde(default)]
    pub content: String,

    /// Tables in detection order.
    #[serde(default)]
    pub tables: Vec<DocumentTable>,
}

/// A detected table: an unordered bag of positioned cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTable {
    #[serde(default, alias = "row_count")]
    pub row_count: usize,
    #[serde(default, alias = "column_count")]
    pub column_count: usize,
    #[serde(default)]
    pub cells: Vec<TableCell>,
}

/// A single positioned cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    #[serde(alias = "row_index")]
    pub row_index: usize,
    #[serde(alias = "column_index")]
    pub column_index: usize,
    #[serde(default)]
    pub content: String,
    /// `content`, `columnHeader`, `rowHeader`, `stubHead`, `description`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, alias = "row_span", skip_serializing_if = "Option::is_none")]
    pub row_span: Option<usize>,
    #[serde(default, alias = "column_span", skip_serializing_if = "Option::is_none")]
    pub column_span: Option<usize>,
}

impl TableCell {
    pub fn new(row_index: usize, column_index: usize, content: impl Into<String>) -> Self {
        Self {
            row_index,
            column_index,
            content: content.into(),
            ..Default::default()
        }
    }
}

impl DocumentTable {
    /// Build a table from cells, deriving the row and column counts.
    pub fn from_cells(cells: Vec<TableCell>) -> Self {
        let row_count = cells.iter().map(|c| c.row_index + 1).max().unwrap_or(0);
        let column_count = cells.iter().map(|c| c.column_index + 1).max().unwrap_or(0);
        Self {
            row_count,
            column_count,
            cells,
        }
    }
}

impl AnalysisResult {
    /// Parse an analysis result, unwrapping the REST envelope if present.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let inner = match value {
            serde_json::Value::Object(mut map) => match map.remove("analyzeResult") {
                Some(inner) => inner,
                None => serde_json::Value::Object(map),
            },
            other => other,
        };
        serde_json::from_value(inner)
    }
}

/// Read and parse an analysis result from disk.
pub async fn load_analysis(path: impl AsRef<Path>) -> Result<AnalysisResult, ExtractError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ExtractError::AnalysisNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => ExtractError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ExtractError::InvalidAnalysis {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
    })?;

    let result = AnalysisResult::from_json(&text).map_err(|e| ExtractError::InvalidAnalysis {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    debug!(
        "Loaded {}: {} tables, {} chars of text",
        path.display(),
        result.tables.len(),
        result.content.len()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rest_envelope() {
        let json = r#"{
            "status": "succeeded",
            "analyzeResult": {
                "modelId": "prebuilt-invoice",
                "content": "INVOICE",
                "tables": [{
                    "rowCount": 1, "columnCount": 2,
                    "cells": [
                        {"kind": "columnHeader", "rowIndex": 0, "columnIndex": 0, "content": "Item"},
                        {"rowIndex": 0, "columnIndex": 1, "content": "Qty", "columnSpan": 1}
                    ]
                }]
            }
        }"#;
        let result = AnalysisResult::from_json(json).unwrap();
        assert_eq!(result.model_id.as_deref(), Some("prebuilt-invoice"));
        assert_eq!(result.content, "INVOICE");
        assert_eq!(result.tables.len(), 1);
        assert_eq!(result.tables[0].cells[0].kind.as_deref(), Some("columnHeader"));
        assert_eq!(result.tables[0].cells[1].column_index, 1);
    }

    #[test]
    fn parses_bare_result_with_snake_case() {
        let json = r#"{"tables": [{"row_count": 1, "column_count": 1,
            "cells": [{"row_index": 0, "column_index": 0, "content": "Total"}]}]}"#;
        let result = AnalysisResult::from_json(json).unwrap();
        assert_eq!(result.content, "");
        assert_eq!(result.tables[0].row_count, 1);
        assert_eq!(result.tables[0].cells[0].content, "Total");
    }

    #[test]
    fn missing_tables_means_none() {
        let result = AnalysisResult::from_json(r#"{"content": "hello"}"#).unwrap();
        assert!(result.tables.is_empty());
    }

    #[test]
    fn rejects_non_object() {
        assert!(AnalysisResult::from_json("[1, 2]").is_err());
        assert!(AnalysisResult::from_json("not json").is_err());
    }

    #[test]
    fn from_cells_derives_counts() {
        let t = DocumentTable::from_cells(vec![
            TableCell::new(0, 0, "a"),
            TableCell::new(2, 1, "b"),
        ]);
        assert_eq!(t.row_count, 3);
        assert_eq!(t.column_count, 2);
        assert_eq!(DocumentTable::from_cells(vec![]).row_count, 0);
    }
}
