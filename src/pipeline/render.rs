//! Markdown rendering for reconstructed tables and documents.
//!
//! Output is GitHub Flavored Markdown: a header row, one `---` separator row,
//! then one line per record. Cell text is made safe for a single table line:
//! `|` is escaped and line breaks (with their surrounding whitespace) become a
//! single space.

use crate::output::{combined_line_items, line_items_table, DocumentExtraction, NormalizedTable};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]*(?:\r\n|\r|\n)\s*").unwrap());

fn escape_cell(text: &str) -> String {
    RE_LINE_BREAK
        .replace_all(text, " ")
        .replace('|', "\\|")
}

fn table_line(cells: &[String]) -> String {
    let cells: Vec<String> = cells.iter().map(|c| escape_cell(c)).collect();
    format!("| {} |", cells.join(" | "))
}

/// Render a header and its records as a GFM table (no trailing newline).
pub fn table_to_gfm(columns: &[String], records: &[Vec<String>]) -> String {
    if columns.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(records.len() + 2);
    lines.push(table_line(columns));
    let sep: Vec<&str> = columns.iter().map(|_| "---").collect();
    lines.push(format!("| {} |", sep.join(" | ")));
    for record in records {
        lines.push(table_line(record));
    }
    lines.join("\n")
}

/// Bold title paragraph (when present) followed by the table.
pub fn titled_table(title: Option<&str>, table: &NormalizedTable) -> String {
    let body = table.to_markdown();
    match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => format!("**{}**\n\n{}", RE_LINE_BREAK.replace_all(t, " "), body),
        None => body,
    }
}

/// Full Markdown report for one document.
pub fn document_markdown(doc: &DocumentExtraction) -> String {
    let mut parts: Vec<String> = vec![format!("## {}", doc.source)];

    if doc.tables.is_empty() && doc.table_errors.is_empty() {
        parts.push("_No tables detected._".to_string());
    }
    for table in &doc.tables {
        parts.push(table.to_markdown());
    }
    for err in &doc.table_errors {
        parts.push(format!("_Skipped: {err}_"));
    }

    if !doc.line_items.is_empty() || doc.line_items_error.is_some() {
        parts.push("### Line items".to_string());
        if let Some(ref e) = doc.line_items_error {
            parts.push(format!("_{e}_"));
        } else {
            parts.push(line_items_table(&doc.line_items).to_markdown());
        }
    }

    let mut out = parts.join("\n\n");
    out.push('\n');
    out
}

/// Section holding the line items of every document in one table.
pub fn combined_line_items_markdown(documents: &[DocumentExtraction]) -> String {
    let table = combined_line_items(documents);
    if table.is_empty() {
        return "## Combined line items\n\n_No line items._\n".to_string();
    }
    format!("## Combined line items\n\n{}\n", table.to_markdown())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LineItemError, TableError};
    use crate::output::{ExtractedTable, ExtractionStats, LineItem};

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn renders_gfm() {
        let md = table_to_gfm(&s(&["Name", "Amount"]), &[s(&["Apple", "3"])]);
        assert_eq!(md, "| Name | Amount |\n| --- | --- |\n| Apple | 3 |");
    }

    #[test]
    fn escapes_pipes_and_newlines() {
        let md = table_to_gfm(&s(&["A|B"]), &[s(&["line one \n  line two"])]);
        assert!(md.contains("| A\\|B |"));
        assert!(md.contains("| line one line two |"));
    }

    #[test]
    fn empty_header_renders_nothing() {
        assert_eq!(table_to_gfm(&[], &[]), "");
    }

    #[test]
    fn title_prefix() {
        let t = NormalizedTable {
            columns: s(&["x", "1"]),
            records: vec![s(&["y", "2"])],
        };
        let md = titled_table(Some(" Header A "), &t);
        assert!(md.starts_with("**Header A**\n\n| x | 1 |"));
        assert!(titled_table(Some("  "), &t).starts_with("| x | 1 |"));
        assert!(titled_table(None, &t).starts_with("| x | 1 |"));
    }

    #[test]
    fn document_report() {
        let doc = DocumentExtraction {
            source: "invoice.json".into(),
            tables: vec![ExtractedTable {
                index: 0,
                title: Some("Items".into()),
                table: NormalizedTable {
                    columns: s(&["Item", "Price"]),
                    records: vec![s(&["Bolt", "1.00"])],
                },
            }],
            table_errors: vec![TableError::MissingHeader { table: 1 }],
            line_items: vec![LineItem {
                file_name: "invoice.json".into(),
                item_name: "Bolt".into(),
                item_amount: "1.00".into(),
                ..Default::default()
            }],
            line_items_error: None,
            stats: ExtractionStats::default(),
        };
        let md = document_markdown(&doc);
        assert!(md.starts_with("## invoice.json\n\n**Items**"));
        assert!(md.contains("_Skipped: Table 1: no header row after the title_"));
        assert!(md.contains("### Line items"));
        assert!(md.contains("| invoice.json | Bolt | 1.00 |  |  |"));
        assert!(md.ends_with('\n'));
    }

    #[test]
    fn document_without_tables() {
        let doc = DocumentExtraction {
            source: "blank.json".into(),
            tables: vec![],
            table_errors: vec![],
            line_items: vec![],
            line_items_error: Some(LineItemError::Timeout { secs: 60 }),
            stats: ExtractionStats::default(),
        };
        let md = document_markdown(&doc);
        assert!(md.contains("_No tables detected._"));
        assert!(md.contains("_LLM call timed out after 60s_"));
    }

    #[test]
    fn combined_section_spans_documents() {
        let doc = |source: &str, item: &str| DocumentExtraction {
            source: source.into(),
            tables: vec![],
            table_errors: vec![],
            line_items: vec![LineItem {
                file_name: source.into(),
                item_name: item.into(),
                item_amount: "2".into(),
                ..Default::default()
            }],
            line_items_error: None,
            stats: ExtractionStats::default(),
        };
        let md = combined_line_items_markdown(&[doc("a.json", "Bolt"), doc("b.json", "Nut")]);
        assert!(md.starts_with("## Combined line items\n\n| file_name | item-name |"));
        assert!(md.contains("| a.json | Bolt | 2 |  |  |\n| b.json | Nut | 2 |  |  |"));
        assert_eq!(
            combined_line_items_markdown(&[]),
            "## Combined line items\n\n_No line items._\n"
        );
    }
}
