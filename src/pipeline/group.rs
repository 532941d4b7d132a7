//! Row grouping: flat cell list → ordered rows.
//!
//! The analysis service returns a table's cells in no guaranteed order.
//! Sorting on `(row_index, column_index)` makes the result a function of the
//! indices alone, so any permutation of the same cells groups identically.

use crate::analysis::TableCell;

/// Cells sharing one `row_index`, left to right.
pub type Row<'a> = Vec<&'a TableCell>;

/// Group cells into rows, top to bottom.
///
/// Total: an empty cell list yields no rows. Rows whose index is skipped by
/// the service simply do not appear; indices are not renumbered.
pub fn group_rows(cells: &[TableCell]) -> Vec<Row<'_>> {
    let mut sorted: Vec<&TableCell> = cells.iter().collect();
    sorted.sort_by_key(|c| (c.row_index, c.column_index));

    sorted
        .chunk_by(|a, b| a.row_index == b.row_index)
        .map(<[&TableCell]>::to_vec)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(rows: &[Row<'_>]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.content.clone()).collect())
            .collect()
    }

    #[test]
    fn empty_has_no_rows() {
        assert!(group_rows(&[]).is_empty());
    }

    #[test]
    fn sorts_and_partitions() {
        let cells = vec![
            TableCell::new(1, 1, "d"),
            TableCell::new(0, 1, "b"),
            TableCell::new(1, 0, "c"),
            TableCell::new(0, 0, "a"),
            TableCell::new(2, 0, "e"),
        ];
        let rows = group_rows(&cells);
        assert_eq!(
            contents(&rows),
            vec![vec!["a", "b"], vec!["c", "d"], vec!["e"]]
        );
    }

    #[test]
    fn order_independent() {
        let cells = vec![
            TableCell::new(0, 0, "Name"),
            TableCell::new(0, 1, "Amount"),
            TableCell::new(1, 0, "Apple"),
            TableCell::new(1, 1, "3"),
            TableCell::new(2, 0, "Pear"),
            TableCell::new(2, 1, "5"),
        ];
        let expected = contents(&group_rows(&cells));

        let mut reversed = cells.clone();
        reversed.reverse();
        assert_eq!(contents(&group_rows(&reversed)), expected);

        for k in 1..cells.len() {
            let mut rotated = cells.clone();
            rotated.rotate_left(k);
            assert_eq!(contents(&group_rows(&rotated)), expected, "rotation {k}");
        }
    }

    #[test]
    fn sparse_row_indices_kept() {
        let cells = vec![TableCell::new(5, 0, "x"), TableCell::new(2, 3, "y")];
        let rows = group_rows(&cells);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0].row_index, 2);
        assert_eq!(rows[1][0].row_index, 5);
    }
}
