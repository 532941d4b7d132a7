//! Title detection.
//!
//! A first row made of exactly one cell is taken as the table's caption.
//! A genuine one-column table whose first data row comes first is therefore
//! read as "title + data"; this false positive is kept so output matches what
//! the extractor has always produced.

use super::group::Row;
use crate::analysis::TableCell;

/// The single criterion shared by [`has_title`] and [`extract_title`].
pub fn is_title_row(row: &[&TableCell]) -> bool {
    row.len() == 1
}

pub fn has_title(rows: &[Row<'_>]) -> bool {
    rows.first().is_some_and(|r| is_title_row(r))
}

/// Raw (uncleaned) content of the title cell.
pub fn extract_title(rows: &[Row<'_>]) -> Option<String> {
    rows.first()
        .filter(|r| is_title_row(r))
        .map(|r| r[0].content.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::group::group_rows;

    #[test]
    fn single_cell_first_row_is_title() {
        let cells = vec![
            TableCell::new(0, 0, " Header A :unselected:"),
            TableCell::new(1, 0, "x"),
            TableCell::new(1, 1, "1"),
        ];
        let rows = group_rows(&cells);
        assert!(has_title(&rows));
        assert_eq!(
            extract_title(&rows).as_deref(),
            Some(" Header A :unselected:")
        );
    }

    #[test]
    fn multi_cell_first_row_is_not() {
        let cells = vec![TableCell::new(0, 0, "Name"), TableCell::new(0, 1, "Amount")];
        let rows = group_rows(&cells);
        assert!(!has_title(&rows));
        assert_eq!(extract_title(&rows), None);
    }

    #[test]
    fn criteria_agree() {
        let tables = vec![
            vec![],
            vec![TableCell::new(0, 0, "only")],
            vec![TableCell::new(0, 0, "a"), TableCell::new(0, 1, "b")],
            vec![TableCell::new(0, 0, "t"), TableCell::new(1, 0, "v")],
            vec![TableCell::new(3, 2, "t"), TableCell::new(4, 0, "v"), TableCell::new(4, 1, "w")],
        ];
        for cells in &tables {
            let rows = group_rows(cells);
            assert_eq!(has_title(&rows), extract_title(&rows).is_some());
        }
    }
}
