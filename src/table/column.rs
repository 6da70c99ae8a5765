use crate::table::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Float64,
    Str,
}

/// A single named column. Values are nullable: a left join fills unmatched
/// rows with nulls, and an empty CSV field loads as null.
#[derive(Debug, Clone)]
pub enum Column {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Str(Vec<Option<String>>),
}

impl Column {
    pub fn new(ty: ColumnType) -> Self {
        Self::with_capacity(ty, 0)
    }

    pub fn with_capacity(ty: ColumnType, cap: usize) -> Self {
        match ty {
            ColumnType::Int64 => Column::Int64(Vec::with_capacity(cap)),
            ColumnType::Float64 => Column::Float64(Vec::with_capacity(cap)),
            ColumnType::Str => Column::Str(Vec::with_capacity(cap)),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Int64(_) => ColumnType::Int64,
            Column::Float64(_) => ColumnType::Float64,
            Column::Str(_) => ColumnType::Str,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match self {
            Column::Int64(v) => v.iter().filter(|x| x.is_none()).count(),
            Column::Float64(v) => v.iter().filter(|x| x.is_none()).count(),
            Column::Str(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Cell at `idx`; `None` means null. Strings are cloned out.
    pub fn value(&self, idx: usize) -> Option<Value> {
        match self {
            Column::Int64(v) => v[idx].map(Value::Int),
            Column::Float64(v) => v[idx].map(Value::Float),
            Column::Str(v) => v[idx].clone().map(Value::Str),
        }
    }

    /// Cell at `idx` widened to f64, for sorting and reduction.
    pub fn numeric(&self, idx: usize) -> Option<f64> {
        match self {
            Column::Int64(v) => v[idx].map(|x| x as f64),
            Column::Float64(v) => v[idx],
            Column::Str(_) => None,
        }
    }

    pub fn push(&mut self, value: Option<Value>) {
        match (self, value) {
            (Column::Int64(v), Some(Value::Int(x))) => v.push(Some(x)),
            (Column::Int64(v), None) => v.push(None),
            (Column::Float64(v), Some(Value::Float(x))) => v.push(Some(x)),
            (Column::Float64(v), None) => v.push(None),
            (Column::Str(v), Some(Value::Str(x))) => v.push(Some(x)),
            (Column::Str(v), None) => v.push(None),
            _ => panic!("Type mismatch"),
        }
    }

    pub fn push_null(&mut self) {
        self.push(None);
    }

    /// Move another column's rows onto the end of this one. Used when
    /// merging per-chunk parse results.
    pub fn append(&mut self, other: Column) {
        match (self, other) {
            (Column::Int64(a), Column::Int64(mut b)) => a.append(&mut b),
            (Column::Float64(a), Column::Float64(mut b)) => a.append(&mut b),
            (Column::Str(a), Column::Str(mut b)) => a.append(&mut b),
            _ => panic!("Type mismatch"),
        }
    }

    pub fn iter_i64(&self) -> impl Iterator<Item = Option<i64>> + '_ {
        match self {
            Column::Int64(v) => v.iter().copied(),
            _ => panic!("Wrong type"),
        }
    }

    pub fn iter_f64(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        match self {
            Column::Float64(v) => v.iter().copied(),
            _ => panic!("Wrong type"),
        }
    }

    pub fn iter_str(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        match self {
            Column::Str(v) => v.iter().map(|s| s.as_deref()),
            _ => panic!("Wrong type"),
        }
    }

    /// New column holding the rows at `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Column {
        match self {
            Column::Int64(v) => Column::Int64(indices.iter().map(|&i| v[i]).collect()),
            Column::Float64(v) => Column::Float64(indices.iter().map(|&i| v[i]).collect()),
            Column::Str(v) => Column::Str(indices.iter().map(|&i| v[i].clone()).collect()),
        }
    }
}
