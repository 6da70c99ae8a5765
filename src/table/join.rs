use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

use crate::table::{column::Column, table::Table, TableError, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Only keys present in both tables survive.
    Inner,
    /// Every left row survives; unmatched right columns become null.
    Left,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Inner => f.write_str("inner"),
            JoinKind::Left => f.write_str("left"),
        }
    }
}

/// Row accounting for one join. Unmatched left rows are a silent-data-loss
/// risk under an inner join, so the count is an explicit output rather than
/// a side effect.
#[derive(Debug, Clone, Copy)]
pub struct JoinReport {
    pub kind: JoinKind,
    pub left_rows: usize,
    pub right_rows: usize,
    pub output_rows: usize,
    pub unmatched_left: usize,
}

/// Equi-join on a key column present in both tables under the same name.
pub fn join(
    left: &Table,
    right: &Table,
    on: &str,
    kind: JoinKind,
) -> Result<(Table, JoinReport), TableError> {
    join_on(left, right, on, on, kind)
}

/// Equi-join on a key pair, for tables whose key columns are named
/// differently.
///
/// Duplicate keys on either side fan out (Cartesian product of the matching
/// key groups). Output order is deterministic: left rows in input order,
/// matches in right-table row order. Null keys never match; under a left
/// join the row still survives, with nulls in the right columns.
///
/// The right key column is dropped from the output when both keys carry the
/// same name; otherwise both columns survive.
pub fn join_on(
    left: &Table,
    right: &Table,
    left_key: &str,
    right_key: &str,
    kind: JoinKind,
) -> Result<(Table, JoinReport), TableError> {
    let left_key_idx = left.column_index(left_key)?;
    let right_key_idx = right.column_index(right_key)?;

    // Hash the right side: key -> matching row indices, in row order
    let mut index: HashMap<Value, Vec<usize>> = HashMap::new();
    for row in 0..right.row_count() {
        if let Some(key) = right.value(row, right_key_idx) {
            index.entry(key).or_default().push(row);
        }
    }

    // Right columns carried into the output
    let drop_right_key = left_key == right_key;
    let carried_right: Vec<usize> = (0..right.headers().len())
        .filter(|&i| !(drop_right_key && i == right_key_idx))
        .collect();
    for &i in &carried_right {
        let name = &right.headers()[i];
        if left.headers().iter().any(|h| h == name) {
            return Err(TableError::DuplicateColumn(name.clone()));
        }
    }

    let mut headers: Vec<String> = left.headers().to_vec();
    let mut columns: Vec<Column> = (0..left.headers().len())
        .map(|i| Column::new(left.column_at(i).column_type()))
        .collect();
    for &i in &carried_right {
        headers.push(right.headers()[i].clone());
        columns.push(Column::new(right.column_at(i).column_type()));
    }

    let left_width = left.headers().len();
    let mut output_rows = 0;
    let mut unmatched_left = 0;

    for row in 0..left.row_count() {
        let matches = left
            .value(row, left_key_idx)
            .and_then(|key| index.get(&key));

        match matches {
            Some(rows) => {
                for &rrow in rows {
                    for (col_idx, col) in columns.iter_mut().enumerate().take(left_width) {
                        col.push(left.value(row, col_idx));
                    }
                    for (out_idx, &rcol) in carried_right.iter().enumerate() {
                        columns[left_width + out_idx].push(right.value(rrow, rcol));
                    }
                    output_rows += 1;
                }
            }
            None => {
                unmatched_left += 1;
                if kind == JoinKind::Left {
                    for (col_idx, col) in columns.iter_mut().enumerate().take(left_width) {
                        col.push(left.value(row, col_idx));
                    }
                    for out_idx in 0..carried_right.len() {
                        columns[left_width + out_idx].push_null();
                    }
                    output_rows += 1;
                }
            }
        }
    }

    let report = JoinReport {
        kind,
        left_rows: left.row_count(),
        right_rows: right.row_count(),
        output_rows,
        unmatched_left,
    };

    if unmatched_left > 0 && kind == JoinKind::Inner {
        warn!(
            key = left_key,
            dropped = unmatched_left,
            "inner join dropped left rows with no match"
        );
    } else {
        debug!(
            key = left_key,
            kind = %kind,
            left = report.left_rows,
            right = report.right_rows,
            out = report.output_rows,
            unmatched = unmatched_left,
            "join"
        );
    }

    Ok((Table::new(headers, columns)?, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], columns: Vec<Column>) -> Table {
        Table::new(headers.iter().map(|s| s.to_string()).collect(), columns).unwrap()
    }

    fn products() -> Table {
        table(
            &["product_id", "category"],
            vec![
                Column::Str(vec![Some("P1".into()), Some("P2".into())]),
                Column::Str(vec![Some("cat_a".into()), Some("cat_b".into())]),
            ],
        )
    }

    #[test]
    fn duplicate_keys_fan_out() {
        let items = table(
            &["order_item_id", "product_id"],
            vec![
                Column::Int64(vec![Some(1), Some(2)]),
                Column::Str(vec![Some("P1".into()), Some("P1".into())]),
            ],
        );
        let (joined, report) = join(&items, &products(), "product_id", JoinKind::Inner).unwrap();
        assert_eq!(joined.row_count(), 2);
        assert_eq!(report.output_rows, 2);
        let cat = joined.column_index("category").unwrap();
        for row in 0..2 {
            assert_eq!(joined.value(row, cat), Some(Value::Str("cat_a".into())));
        }
        // key column carried once
        assert_eq!(joined.headers(), &["order_item_id", "product_id", "category"]);
    }

    #[test]
    fn inner_join_drops_unmatched_and_reports() {
        let items = table(
            &["order_item_id", "product_id"],
            vec![
                Column::Int64(vec![Some(1), Some(2)]),
                Column::Str(vec![Some("P1".into()), Some("P9".into())]),
            ],
        );
        let (joined, report) = join(&items, &products(), "product_id", JoinKind::Inner).unwrap();
        assert_eq!(joined.row_count(), 1);
        assert_eq!(report.unmatched_left, 1);
        assert!(joined.row_count() <= items.row_count().min(products().row_count()));
    }

    #[test]
    fn left_join_preserves_unmatched_with_nulls() {
        let items = table(
            &["order_item_id", "product_id"],
            vec![
                Column::Int64(vec![Some(1), Some(2)]),
                Column::Str(vec![Some("P1".into()), Some("P9".into())]),
            ],
        );
        let (joined, report) = join(&items, &products(), "product_id", JoinKind::Left).unwrap();
        assert_eq!(joined.row_count(), 2);
        assert!(joined.row_count() >= items.row_count());
        assert_eq!(report.unmatched_left, 1);
        let cat = joined.column_index("category").unwrap();
        assert_eq!(joined.value(0, cat), Some(Value::Str("cat_a".into())));
        assert_eq!(joined.value(1, cat), None);
    }

    #[test]
    fn join_on_keeps_both_key_columns_when_names_differ() {
        let left = table(
            &["id"],
            vec![Column::Str(vec![Some("k".into())])],
        );
        let right = table(
            &["key", "v"],
            vec![
                Column::Str(vec![Some("k".into())]),
                Column::Int64(vec![Some(42)]),
            ],
        );
        let (joined, _) = join_on(&left, &right, "id", "key", JoinKind::Inner).unwrap();
        assert_eq!(joined.headers(), &["id", "key", "v"]);
    }

    #[test]
    fn null_key_never_matches() {
        let left = table(&["k"], vec![Column::Str(vec![None, Some("a".into())])]);
        let right = table(
            &["k", "v"],
            vec![
                Column::Str(vec![Some("a".into())]),
                Column::Int64(vec![Some(1)]),
            ],
        );
        let (inner, _) = join(&left, &right, "k", JoinKind::Inner).unwrap();
        assert_eq!(inner.row_count(), 1);
        let (left_joined, report) = join(&left, &right, "k", JoinKind::Left).unwrap();
        assert_eq!(left_joined.row_count(), 2);
        assert_eq!(report.unmatched_left, 1);
    }

    #[test]
    fn colliding_non_key_column_is_rejected() {
        let left = table(
            &["k", "v"],
            vec![
                Column::Str(vec![Some("a".into())]),
                Column::Int64(vec![Some(1)]),
            ],
        );
        let right = left.clone();
        let err = join(&left, &right, "k", JoinKind::Inner).unwrap_err();
        assert!(matches!(err, TableError::DuplicateColumn(_)));
    }
}
