use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

use crate::table::{
    column::{Column, ColumnType},
    month::Month,
    table::Table,
    AggregateOp, SortOrder, TableError, Value,
};

enum Acc {
    Int { sum: i128, count: usize },
    Float { sum: f64, count: usize },
    Other { count: usize },
}

/// Groups `table` by `key_col` and reduces `value_col` with `op`, producing
/// one row per distinct key.
///
/// Key order in the output is first appearance in the input, so the result
/// is deterministic and ties in later rankings break stably. Null group keys
/// are skipped; null values do not contribute to the reduction.
pub fn group_by(
    table: &Table,
    key_col: &str,
    value_col: &str,
    op: AggregateOp,
) -> Result<Table, TableError> {
    let key_idx = table.column_index(key_col)?;
    let val_idx = table.column_index(value_col)?;
    let val_type = table.column_at(val_idx).column_type();

    if val_type == ColumnType::Str && op != AggregateOp::Count {
        return Err(TableError::TypeMismatch {
            column: value_col.to_string(),
            expected: "numeric",
        });
    }

    let mut keys: Vec<Value> = Vec::new();
    let mut slots: HashMap<Value, usize> = HashMap::new();
    let mut accs: Vec<Acc> = Vec::new();
    let mut null_keys = 0;

    for row in 0..table.row_count() {
        let Some(key) = table.value(row, key_idx) else {
            null_keys += 1;
            continue;
        };
        let slot = *slots.entry(key.clone()).or_insert_with(|| {
            keys.push(key);
            accs.push(match val_type {
                ColumnType::Int64 => Acc::Int { sum: 0, count: 0 },
                ColumnType::Float64 => Acc::Float { sum: 0.0, count: 0 },
                ColumnType::Str => Acc::Other { count: 0 },
            });
            keys.len() - 1
        });

        match (&mut accs[slot], table.value(row, val_idx)) {
            (Acc::Int { sum, count }, Some(Value::Int(v))) => {
                *sum += v as i128;
                *count += 1;
            }
            (Acc::Float { sum, count }, Some(Value::Float(v))) => {
                *sum += v;
                *count += 1;
            }
            (Acc::Other { count }, Some(_)) => *count += 1,
            (_, None) => {}
            _ => unreachable!("value column type checked against accumulator"),
        }
    }

    if null_keys > 0 {
        debug!(key = key_col, skipped = null_keys, "null group keys skipped");
    }

    // Key column keeps the key column's type
    let key_type = table.column_at(key_idx).column_type();
    let mut key_column = Column::with_capacity(key_type, keys.len());
    for key in keys {
        key_column.push(Some(key));
    }

    let value_column = match op {
        AggregateOp::Count => Column::Int64(
            accs.iter()
                .map(|acc| {
                    Some(match acc {
                        Acc::Int { count, .. }
                        | Acc::Float { count, .. }
                        | Acc::Other { count } => *count as i64,
                    })
                })
                .collect(),
        ),
        AggregateOp::Sum => match val_type {
            ColumnType::Int64 => Column::Int64(
                accs.iter()
                    .map(|acc| match acc {
                        Acc::Int { sum, .. } => Some(*sum as i64),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => Column::Float64(
                accs.iter()
                    .map(|acc| match acc {
                        Acc::Float { sum, .. } => Some(*sum),
                        _ => None,
                    })
                    .collect(),
            ),
        },
        AggregateOp::Mean => Column::Float64(
            accs.iter()
                .map(|acc| match acc {
                    Acc::Int { sum, count } if *count > 0 => {
                        Some(*sum as f64 / *count as f64)
                    }
                    Acc::Float { sum, count } if *count > 0 => Some(*sum / *count as f64),
                    _ => None,
                })
                .collect(),
        ),
    };

    Table::new(
        vec![key_col.to_string(), value_col.to_string()],
        vec![key_column, value_column],
    )
}

/// Reorders rows by the fixed Jan→Dec month vocabulary in `month_col`.
///
/// Input labels must all belong to the vocabulary; the reorder is stable for
/// rows sharing a month. Grouped-by-month input therefore comes out in
/// calendar order with at most twelve rows.
pub fn sort_by_month(table: &Table, month_col: &str) -> Result<Table, TableError> {
    let col = table.column(month_col)?;

    let mut months: Vec<Month> = Vec::with_capacity(table.row_count());
    for (row, cell) in col.iter_str().enumerate() {
        let label = cell.ok_or_else(|| {
            TableError::Parse(format!("column '{}': null month at row {}", month_col, row))
        })?;
        let month = Month::from_abbrev(label).ok_or_else(|| {
            TableError::Parse(format!(
                "column '{}': '{}' is not a month abbreviation",
                month_col, label
            ))
        })?;
        months.push(month);
    }

    let mut indices: Vec<usize> = (0..table.row_count()).collect();
    indices.sort_by_key(|&i| months[i]);
    Ok(table.take_rows(&indices))
}

/// Stable sort by a numeric column, truncated to the first `n` rows. Nulls
/// sort last under either order.
pub fn top_n(
    table: &Table,
    by_col: &str,
    order: SortOrder,
    n: usize,
) -> Result<Table, TableError> {
    let idx = table.column_index(by_col)?;
    if table.column_at(idx).column_type() == ColumnType::Str {
        return Err(TableError::TypeMismatch {
            column: by_col.to_string(),
            expected: "numeric",
        });
    }

    let keys: Vec<Option<f64>> = (0..table.row_count())
        .map(|row| table.column_at(idx).numeric(row))
        .collect();

    let mut indices: Vec<usize> = (0..table.row_count()).collect();
    indices.sort_by(|&a, &b| match (keys[a], keys[b]) {
        (Some(x), Some(y)) => match order {
            SortOrder::Ascending => x.total_cmp(&y),
            SortOrder::Descending => y.total_cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    indices.truncate(n);

    Ok(table.take_rows(&indices))
}
