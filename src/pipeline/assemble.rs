//! Table assembly: grouped rows → [`NormalizedTable`].
//!
//! After an optional title row is dropped, the first remaining row becomes
//! the header and every later row one record. Cells are placed by position,
//! so a row with a different width than the header is handled according to
//! [`RowLengthPolicy`].

use super::clean::clean_cell_content;
use super::group::Row;
use crate::config::RowLengthPolicy;
use crate::error::TableError;
use crate::output::NormalizedTable;

/// Build the normalised table for the table at position `table`.
///
/// `skip_title` drops `rows[0]` first; pass the result of
/// [`super::title::has_title`].
pub fn assemble_table(
    table: usize,
    rows: &[Row<'_>],
    skip_title: bool,
    policy: RowLengthPolicy,
) -> Result<NormalizedTable, TableError> {
    if rows.is_empty() {
        return Err(TableError::EmptyTable { table });
    }
    let body = if skip_title { &rows[1..] } else { rows };

    let (header, data) = body
        .split_first()
        .ok_or(TableError::MissingHeader { table })?;

    let mut out = NormalizedTable::new(clean_row(header));
    let width = out.column_count();

    for row in data {
        let mut record = clean_row(row);
        if record.len() != width {
            match policy {
                RowLengthPolicy::Reject => {
                    return Err(TableError::RowLengthMismatch {
                        table,
                        row: row[0].row_index,
                        expected: width,
                        found: record.len(),
                    });
                }
                RowLengthPolicy::PadOrTruncate => record.resize(width, String::new()),
            }
        }
        out.records.push(record);
    }

    Ok(out)
}

fn clean_row(row: &[&crate::analysis::TableCell]) -> Vec<String> {
    row.iter().map(|c| clean_cell_content(&c.content)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::TableCell;
    use crate::pipeline::group::group_rows;

    fn grid(rows: &[&[&str]]) -> Vec<TableCell> {
        rows.iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(move |(c, text)| TableCell::new(r, c, *text))
            })
            .collect()
    }

    #[test]
    fn header_and_records() {
        let cells = grid(&[&["Name", "Amount"], &["Apple", "3"], &["Pear", "5:unselected:"]]);
        let rows = group_rows(&cells);
        let t = assemble_table(0, &rows, false, RowLengthPolicy::Reject).unwrap();
        assert_eq!(t.columns, vec!["Name", "Amount"]);
        assert_eq!(t.records, vec![vec!["Apple", "3"], vec!["Pear", "5"]]);
    }

    #[test]
    fn title_row_skipped() {
        let cells = grid(&[&["Header A"], &["x", "1"], &["y", "2"]]);
        let rows = group_rows(&cells);
        let t = assemble_table(0, &rows, true, RowLengthPolicy::Reject).unwrap();
        assert_eq!(t.columns, vec!["x", "1"]);
        assert_eq!(t.records, vec![vec!["y", "2"]]);
    }

    #[test]
    fn duplicate_columns_allowed() {
        let cells = grid(&[&["Qty", "Qty"], &["1", "2"]]);
        let rows = group_rows(&cells);
        let t = assemble_table(0, &rows, false, RowLengthPolicy::Reject).unwrap();
        assert_eq!(t.columns, vec!["Qty", "Qty"]);
    }

    #[test]
    fn header_only_has_no_records() {
        let cells = grid(&[&["A", "B"]]);
        let rows = group_rows(&cells);
        let t = assemble_table(0, &rows, false, RowLengthPolicy::Reject).unwrap();
        assert!(t.is_empty());
    }

    #[test]
    fn empty_table_fails() {
        let err = assemble_table(4, &[], false, RowLengthPolicy::Reject).unwrap_err();
        assert_eq!(err, TableError::EmptyTable { table: 4 });
    }

    #[test]
    fn title_only_fails() {
        let cells = grid(&[&["Just a caption"]]);
        let rows = group_rows(&cells);
        let err = assemble_table(1, &rows, true, RowLengthPolicy::Reject).unwrap_err();
        assert_eq!(err, TableError::MissingHeader { table: 1 });
    }

    #[test]
    fn short_row_rejected() {
        let cells = grid(&[&["A", "B", "C"], &["1", "2", "3"], &["4"]]);
        let rows = group_rows(&cells);
        let err = assemble_table(2, &rows, false, RowLengthPolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            TableError::RowLengthMismatch {
                table: 2,
                row: 2,
                expected: 3,
                found: 1
            }
        );
    }

    #[test]
    fn long_row_rejected() {
        let cells = grid(&[&["A"], &["B", "C"], &["1", "2", "3"]]);
        let rows = group_rows(&cells);
        let err = assemble_table(0, &rows, true, RowLengthPolicy::Reject).unwrap_err();
        assert!(matches!(
            err,
            TableError::RowLengthMismatch {
                expected: 2,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn pad_or_truncate() {
        let cells = grid(&[&["A", "B"], &["1"], &["2", "3", "4"]]);
        let rows = group_rows(&cells);
        let t = assemble_table(0, &rows, false, RowLengthPolicy::PadOrTruncate).unwrap();
        assert_eq!(t.records, vec![vec!["1", ""], vec!["2", "3"]]);
    }
}
