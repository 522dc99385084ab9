use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the spreadsheet
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring what a spreadsheet cell can hold.
/// Rows are compared structurally, so `CellValue` must be `Eq` + `Hash`.
#[derive(Debug, Clone)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    /// Missing value marker (empty cell, failed numeric coercion, …).
    Null,
}

// -- Manual Eq/Ord so full rows can be hashed and sorted --

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                DateTime(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::DateTime(d) => d.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::DateTime(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Null => write!(f, ""),
        }
    }
}

impl CellValue {
    /// Try to interpret the value as an `f64` for plotting.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn text(s: impl Into<String>) -> Self {
        CellValue::String(s.into())
    }
}

impl From<AnyValue<'_>> for CellValue {
    fn from(value: AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => CellValue::Null,
            AnyValue::Boolean(b) => CellValue::Bool(b),
            AnyValue::String(s) => CellValue::String(s.to_string()),
            AnyValue::StringOwned(s) => CellValue::String(s.to_string()),
            AnyValue::Int8(v) => CellValue::Integer(v.into()),
            AnyValue::Int16(v) => CellValue::Integer(v.into()),
            AnyValue::Int32(v) => CellValue::Integer(v.into()),
            AnyValue::Int64(v) => CellValue::Integer(v),
            AnyValue::UInt8(v) => CellValue::Integer(v.into()),
            AnyValue::UInt16(v) => CellValue::Integer(v.into()),
            AnyValue::UInt32(v) => CellValue::Integer(v.into()),
            AnyValue::UInt64(v) => {
                i64::try_from(v).map_or(CellValue::Float(v as f64), CellValue::Integer)
            }
            AnyValue::Float32(v) => CellValue::Float(v.into()),
            AnyValue::Float64(v) => CellValue::Float(v),
            AnyValue::Date(days) => DateTime::from_timestamp(i64::from(days) * 86_400, 0)
                .map_or(CellValue::Null, |d| CellValue::DateTime(d.naive_utc())),
            AnyValue::Datetime(v, unit, _) | AnyValue::DatetimeOwned(v, unit, _) => {
                let stamp = match unit {
                    TimeUnit::Milliseconds => DateTime::from_timestamp_millis(v),
                    TimeUnit::Microseconds => DateTime::from_timestamp_micros(v),
                    TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(v)),
                };
                stamp.map_or(CellValue::Null, |d| CellValue::DateTime(d.naive_utc()))
            }
            other => CellValue::String(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded sheet, backed by a polars DataFrame
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TableError {
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("row {row} has {found} cells but the header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Frame(#[from] PolarsError),
}

/// Ordered, uniquely-named, typed columns.
///
/// Each column gets one dtype: booleans, integers, numbers (integers mixed
/// with floats) or datetimes when every present value has that kind, text
/// otherwise. Columns with no values at all are text.
#[derive(Debug, Clone, Default)]
pub struct Table {
    frame: DataFrame,
    columns: Vec<String>,
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && self.rows() == other.rows()
    }
}

impl Table {
    /// Build a table, enforcing unique column names and rectangular rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self, TableError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RaggedRow {
                    row: i,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }

        let frame_columns = columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let cells: Vec<&CellValue> = rows.iter().filter_map(|row| row.get(i)).collect();
                typed_column(name, &cells)
            })
            .collect::<PolarsResult<Vec<Column>>>()?;

        Ok(Table {
            frame: DataFrame::new(frame_columns)?,
            columns,
        })
    }

    /// Wrap a frame produced by a polars pipeline.
    pub fn from_frame(frame: DataFrame) -> Self {
        let columns = frame
            .get_column_names_str()
            .into_iter()
            .map(str::to_string)
            .collect();
        Table { frame, columns }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Materialise every row, in order.
    pub fn rows(&self) -> Vec<Vec<CellValue>> {
        (0..self.len())
            .map(|r| {
                (0..self.width())
                    .map(|c| self.cell_at(r, c).unwrap_or(CellValue::Null))
                    .collect()
            })
            .collect()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// One column's values in row order.
    pub fn column_values(&self, name: &str) -> Option<Vec<CellValue>> {
        let column = self.frame.column(name).ok()?;
        Some(
            (0..column.len())
                .map(|i| column.get(i).map_or(CellValue::Null, CellValue::from))
                .collect(),
        )
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<CellValue> {
        self.cell_at(row, self.column_index(column)?)
    }

    pub fn cell_at(&self, row: usize, column: usize) -> Option<CellValue> {
        let value = self.frame.get_columns().get(column)?.get(row).ok()?;
        Some(CellValue::from(value))
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

fn typed_column(name: &str, cells: &[&CellValue]) -> PolarsResult<Column> {
    let present = || cells.iter().filter(|c| !c.is_null());
    let name: PlSmallStr = name.into();

    let series = if present().next().is_none() {
        Series::full_null(name, cells.len(), &DataType::String)
    } else if present().all(|c| matches!(c, CellValue::Bool(_))) {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|c| match c {
                CellValue::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        Series::new(name, values)
    } else if present().all(|c| matches!(c, CellValue::Integer(_))) {
        let values: Vec<Option<i64>> = cells
            .iter()
            .map(|c| match c {
                CellValue::Integer(i) => Some(*i),
                _ => None,
            })
            .collect();
        Series::new(name, values)
    } else if present().all(|c| c.as_f64().is_some()) {
        let values: Vec<Option<f64>> = cells.iter().map(|c| c.as_f64()).collect();
        Series::new(name, values)
    } else if present().all(|c| matches!(c, CellValue::DateTime(_))) {
        let millis: Vec<Option<i64>> = cells
            .iter()
            .map(|c| match c {
                CellValue::DateTime(dt) => Some(dt.and_utc().timestamp_millis()),
                _ => None,
            })
            .collect();
        Series::new(name, millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|c| (!c.is_null()).then(|| c.to_string()))
            .collect();
        Series::new(name, values)
    };
    Ok(Column::from(series))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn rejects_duplicate_columns() {
        let err = Table::new(vec!["a".into(), "a".into()], vec![]).unwrap_err();
        assert!(matches!(err, TableError::DuplicateColumn(c) if c == "a"));
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec![CellValue::Integer(1)]],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TableError::RaggedRow {
                row: 0,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn column_lookup() {
        let t = Table::new(
            vec!["x".into(), "y".into()],
            vec![
                vec![CellValue::text("a"), CellValue::Integer(1)],
                vec![CellValue::text("b"), CellValue::Float(2.5)],
            ],
        )
        .unwrap();
        assert_eq!(t.column_index("y"), Some(1));
        assert_eq!(t.cell(1, "y"), Some(CellValue::Float(2.5)));
        let ys: Vec<f64> = t
            .column_values("y")
            .unwrap()
            .iter()
            .filter_map(CellValue::as_f64)
            .collect();
        assert_eq!(ys, vec![1.0, 2.5]);
        assert!(t.column_values("z").is_none());
        assert_eq!(t.cell(5, "x"), None);
    }

    #[test]
    fn columns_get_one_dtype_each() {
        let when = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let t = Table::new(
            vec!["int".into(), "num".into(), "flag".into(), "at".into(), "mixed".into(), "blank".into()],
            vec![
                vec![
                    CellValue::Integer(1),
                    CellValue::Integer(1),
                    CellValue::Bool(true),
                    CellValue::DateTime(when),
                    CellValue::Integer(7),
                    CellValue::Null,
                ],
                vec![
                    CellValue::Null,
                    CellValue::Float(0.5),
                    CellValue::Null,
                    CellValue::Null,
                    CellValue::text("siete"),
                    CellValue::Null,
                ],
            ],
        )
        .unwrap();

        let dtypes: Vec<DataType> = t.frame().dtypes();
        assert_eq!(
            dtypes,
            vec![
                DataType::Int64,
                DataType::Float64,
                DataType::Boolean,
                DataType::Datetime(TimeUnit::Milliseconds, None),
                DataType::String,
                DataType::String,
            ]
        );
        assert_eq!(
            t.rows(),
            vec![
                vec![
                    CellValue::Integer(1),
                    CellValue::Float(1.0),
                    CellValue::Bool(true),
                    CellValue::DateTime(when),
                    CellValue::text("7"),
                    CellValue::Null,
                ],
                vec![
                    CellValue::Null,
                    CellValue::Float(0.5),
                    CellValue::Null,
                    CellValue::Null,
                    CellValue::text("siete"),
                    CellValue::Null,
                ],
            ]
        );
    }

    #[test]
    fn float_hash_and_eq_are_total() {
        let mut set = HashSet::new();
        set.insert(vec![CellValue::Float(f64::NAN), CellValue::Null]);
        assert!(set.contains(&vec![CellValue::Float(f64::NAN), CellValue::Null]));
        assert_ne!(CellValue::Integer(0), CellValue::Float(0.0));
    }
}
