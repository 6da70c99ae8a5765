use memchr::memchr_iter;
use memmap2::Mmap;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::{fmt, fs::File, path::Path};
use tracing::debug;

use crate::table::{
    column::{Column, ColumnType},
    TableError, Value,
};

/// An immutable, in-memory table with named, typed columns.
///
/// Loading infers a schema (Int64, Float64, Str) from the first data row and
/// parses the file in parallel chunks. All downstream operations (joins,
/// derived columns, group-bys) take a `Table` and return a new `Table`; no
/// step mutates its input.
///
/// # Examples
///
/// ```no_run
/// use ecom_analytics::table::table::Table;
///
/// let orders = Table::load_csv("dataset/orders.csv".as_ref())?;
/// println!("{} orders", orders.row_count());
/// # Ok::<(), ecom_analytics::table::TableError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Build a table from parallel header and column vectors.
    pub fn new(headers: Vec<String>, columns: Vec<Column>) -> Result<Self, TableError> {
        if headers.len() != columns.len() {
            return Err(TableError::Parse(format!(
                "{} headers for {} columns",
                headers.len(),
                columns.len()
            )));
        }
        let row_count = columns.first().map(|c| c.len()).unwrap_or(0);
        if columns.iter().any(|c| c.len() != row_count) {
            return Err(TableError::Parse("ragged columns".into()));
        }
        Ok(Table {
            headers,
            columns,
            row_count,
        })
    }

    /// Loads a CSV file into memory using memory mapping.
    ///
    /// Infers column types from the first data row (Int64, Float64, Str) and
    /// parses chunks in parallel. An empty field loads as null; any other
    /// field that fails its inferred type conversion aborts the load.
    ///
    /// # Errors
    /// Returns a [`TableError`] if the file cannot be opened or mapped, the
    /// header is missing, a row has the wrong field count, or a field fails
    /// to parse.
    pub fn load_csv(path: &Path) -> Result<Table, TableError> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let buf: &[u8] = &mmap[..];

        // Parse header
        let header_end = buf
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| TableError::Parse(format!("{}: missing header line", path.display())))?;
        let headers: Vec<String> = buf[..header_end]
            .split(|&b| b == b',')
            .map(|s| String::from_utf8_lossy(s).to_string())
            .collect();

        let data = &buf[header_end + 1..];

        // Infer schema from the first data row
        let first_line_end = data
            .iter()
            .position(|&b| b == b'\n')
            .unwrap_or(data.len());
        if first_line_end == 0 {
            return Err(TableError::Parse(format!(
                "{}: no data rows",
                path.display()
            )));
        }
        let schema = Self::infer_schema(&data[..first_line_end], &headers)?;

        // Parse chunks in parallel, one per rayon thread
        let chunks = Self::find_chunk_boundaries(data, rayon::current_num_threads());
        let batches: Vec<(Vec<Column>, usize)> = chunks
            .par_iter()
            .map(|(start, end)| Self::parse_chunk(&data[*start..*end], &schema, &headers))
            .collect::<Result<_, _>>()?;

        // Merge batch columns in chunk order
        let mut columns: Vec<Column> = schema.iter().map(|&ty| Column::new(ty)).collect();
        let mut row_count = 0;
        for (batch_cols, batch_rows) in batches {
            row_count += batch_rows;
            for (col, batch_col) in columns.iter_mut().zip(batch_cols) {
                col.append(batch_col);
            }
        }

        debug!(
            path = %path.display(),
            rows = row_count,
            cols = headers.len(),
            "loaded table"
        );

        Ok(Table {
            headers,
            columns,
            row_count,
        })
    }

    fn infer_schema(first_line: &[u8], headers: &[String]) -> Result<Vec<ColumnType>, TableError> {
        let fields: Vec<&[u8]> = first_line.split(|&b| b == b',').collect();

        if fields.len() != headers.len() {
            return Err(TableError::Parse(format!(
                "header/data mismatch: {} vs {}",
                headers.len(),
                fields.len()
            )));
        }

        Ok(fields
            .iter()
            .map(|field| {
                if atoi_simd::parse::<i64>(field).is_ok() {
                    ColumnType::Int64
                } else if fast_float::parse::<f64, _>(field).is_ok() {
                    ColumnType::Float64
                } else {
                    ColumnType::Str
                }
            })
            .collect())
    }

    fn find_chunk_boundaries(data: &[u8], num_chunks: usize) -> Vec<(usize, usize)> {
        if data.is_empty() {
            return vec![];
        }

        let chunk_size = data.len() / num_chunks;
        let mut boundaries = Vec::with_capacity(num_chunks);
        let mut start = 0;

        for i in 0..num_chunks.saturating_sub(1) {
            let mut end = (i + 1) * chunk_size;

            // Advance to the next newline so rows never straddle chunks
            while end < data.len() && data[end] != b'\n' {
                end += 1;
            }
            if end < data.len() {
                end += 1;
            }

            if start < end {
                boundaries.push((start, end));
            }
            start = end;
        }

        if start < data.len() {
            boundaries.push((start, data.len()));
        }

        boundaries
    }

    fn parse_chunk(
        chunk: &[u8],
        schema: &[ColumnType],
        headers: &[String],
    ) -> Result<(Vec<Column>, usize), TableError> {
        let num_cols = schema.len();
        let mut columns: Vec<Column> = schema.iter().map(|&ty| Column::new(ty)).collect();
        let mut row_count = 0;
        let mut fields: Vec<&[u8]> = Vec::with_capacity(num_cols);

        let mut start = 0;
        let mut line_starts: Vec<usize> = memchr_iter(b'\n', chunk).map(|p| p + 1).collect();
        // Final line may lack a trailing newline
        if line_starts.last() != Some(&chunk.len()) {
            line_starts.push(chunk.len() + 1);
        }

        for &next in &line_starts {
            let line = &chunk[start..next - 1];
            start = next;

            if line.is_empty() {
                continue;
            }

            fields.clear();
            let mut field_start = 0;
            for comma_pos in memchr_iter(b',', line) {
                fields.push(&line[field_start..comma_pos]);
                field_start = comma_pos + 1;
            }
            fields.push(&line[field_start..]);

            if fields.len() != num_cols {
                return Err(TableError::Parse(format!(
                    "expected {} fields, got {}",
                    num_cols,
                    fields.len()
                )));
            }

            for (col_idx, field) in fields.iter().enumerate() {
                if field.is_empty() {
                    columns[col_idx].push_null();
                    continue;
                }
                match schema[col_idx] {
                    ColumnType::Int64 => {
                        let v = atoi_simd::parse::<i64>(field).map_err(|e| {
                            TableError::Parse(format!(
                                "column '{}': '{}': {}",
                                headers[col_idx],
                                String::from_utf8_lossy(field),
                                e
                            ))
                        })?;
                        columns[col_idx].push(Some(Value::Int(v)));
                    }
                    ColumnType::Float64 => {
                        let v = fast_float::parse::<f64, _>(field).map_err(|e| {
                            TableError::Parse(format!(
                                "column '{}': '{}': {}",
                                headers[col_idx],
                                String::from_utf8_lossy(field),
                                e
                            ))
                        })?;
                        columns[col_idx].push(Some(Value::Float(v)));
                    }
                    ColumnType::Str => {
                        let s = std::str::from_utf8(field)?;
                        columns[col_idx].push(Some(Value::Str(s.to_string())));
                    }
                }
            }

            row_count += 1;
        }

        Ok((columns, row_count))
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<&Column, TableError> {
        Ok(&self.columns[self.column_index(name)?])
    }

    pub fn column_at(&self, idx: usize) -> &Column {
        &self.columns[idx]
    }

    /// Cell by row and column position; `None` means null.
    pub fn value(&self, row: usize, col_idx: usize) -> Option<Value> {
        self.columns[col_idx].value(row)
    }

    /// New table with an extra column appended.
    pub fn with_column(&self, name: &str, column: Column) -> Result<Table, TableError> {
        if self.headers.iter().any(|h| h == name) {
            return Err(TableError::DuplicateColumn(name.to_string()));
        }
        if column.len() != self.row_count {
            return Err(TableError::Parse(format!(
                "column '{}' has {} rows, table has {}",
                name,
                column.len(),
                self.row_count
            )));
        }
        let mut headers = self.headers.clone();
        let mut columns = self.columns.clone();
        headers.push(name.to_string());
        columns.push(column);
        Ok(Table {
            headers,
            columns,
            row_count: self.row_count,
        })
    }

    /// New table with a derived f64 column `name = a + b`. A null in either
    /// operand yields a null.
    pub fn derive_sum(&self, name: &str, a: &str, b: &str) -> Result<Table, TableError> {
        let ca = self.column(a)?;
        let cb = self.column(b)?;
        for (col, col_name) in [(ca, a), (cb, b)] {
            if col.column_type() == ColumnType::Str {
                return Err(TableError::TypeMismatch {
                    column: col_name.to_string(),
                    expected: "numeric",
                });
            }
        }
        let derived: Vec<Option<f64>> = (0..self.row_count)
            .map(|i| match (ca.numeric(i), cb.numeric(i)) {
                (Some(x), Some(y)) => Some(x + y),
                _ => None,
            })
            .collect();
        self.with_column(name, Column::Float64(derived))
    }

    /// New table keeping only `names`, in that order.
    pub fn select(&self, names: &[&str]) -> Result<Table, TableError> {
        let mut headers = Vec::with_capacity(names.len());
        let mut columns = Vec::with_capacity(names.len());
        for &name in names {
            let idx = self.column_index(name)?;
            headers.push(name.to_string());
            columns.push(self.columns[idx].clone());
        }
        Ok(Table {
            headers,
            columns,
            row_count: self.row_count,
        })
    }

    pub fn rename_column(&self, old: &str, new: &str) -> Result<Table, TableError> {
        let idx = self.column_index(old)?;
        let mut headers = self.headers.clone();
        headers[idx] = new.to_string();
        Ok(Table {
            headers,
            columns: self.columns.clone(),
            row_count: self.row_count,
        })
    }

    /// New table holding the rows at `indices`, in that order.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            headers: self.headers.clone(),
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            row_count: indices.len(),
        }
    }

    pub fn head(&self, n: usize) -> Table {
        let indices: Vec<usize> = (0..self.row_count.min(n)).collect();
        self.take_rows(&indices)
    }

    /// Null count per column, for the manual data check after load.
    pub fn null_counts(&self) -> Vec<(&str, usize)> {
        self.headers
            .iter()
            .zip(&self.columns)
            .map(|(h, c)| (h.as_str(), c.null_count()))
            .collect()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = (0..self.row_count)
            .map(|row| {
                (0..self.columns.len())
                    .map(|col| match self.value(row, col) {
                        Some(v) => v.to_string(),
                        None => String::new(),
                    })
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                cells
                    .iter()
                    .map(|row| row[i].len())
                    .chain(std::iter::once(h.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        for (h, w) in self.headers.iter().zip(&widths) {
            write!(f, "{:<width$}  ", h, width = *w)?;
        }
        writeln!(f)?;
        for row in &cells {
            for (cell, w) in row.iter().zip(&widths) {
                write!(f, "{:<width$}  ", cell, width = *w)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
