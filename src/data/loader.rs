use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Range, Reader, Xlsx, XlsxError};
use chrono::NaiveDateTime;
use thiserror::Error;

use super::model::{CellValue, Table, TableError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: .{0} (expected .xlsx)")]
    UnsupportedExtension(String),

    #[error("not a readable .xlsx workbook: {0}")]
    Workbook(#[from] XlsxError),

    #[error("workbook contains no worksheet")]
    NoWorksheet,

    #[error(transparent)]
    Table(#[from] TableError),
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the first worksheet of an `.xlsx` file.  Dispatch by extension.
pub fn load_file(path: &Path) -> Result<Table, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" => {
            let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
                path: path.display().to_string(),
                source,
            })?;
            load_bytes(&bytes)
        }
        other => Err(LoadError::UnsupportedExtension(other.to_string())),
    }
}

/// Load an uploaded workbook held in memory.
///
/// The first row of the first worksheet is the header; every following row
/// becomes a table row, padded with [`CellValue::Null`] when short.
pub fn load_bytes(bytes: &[u8]) -> Result<Table, LoadError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::NoWorksheet)??;
    table_from_range(&range)
}

// ---------------------------------------------------------------------------
// Range → Table
// ---------------------------------------------------------------------------

fn table_from_range(range: &Range<Data>) -> Result<Table, LoadError> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::default());
    };
    let columns = unique_headers(header);

    let body: Vec<Vec<CellValue>> = rows
        .map(|row| {
            let mut cells: Vec<CellValue> = row.iter().map(cell_value).collect();
            cells.resize(columns.len(), CellValue::Null);
            cells
        })
        .collect();

    log::debug!(
        "Parsed worksheet with {} rows and columns {:?}",
        body.len(),
        columns
    );
    Ok(Table::new(columns, body)?)
}

/// Header cells → column names. Blank headers become `Unnamed: {i}` and
/// repeated names get a `.1`, `.2`, … suffix so names stay unique.
fn unique_headers(header: &[Data]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let base = match cell_value(cell) {
                CellValue::Null => format!("Unnamed: {i}"),
                other => other.to_string(),
            };
            let mut name = base.clone();
            let mut n = 1;
            while !seen.insert(name.clone()) {
                name = format!("{base}.{n}");
                n += 1;
            }
            name
        })
        .collect()
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => CellValue::Float(dt.as_f64()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Float(dt.as_f64())),
        Data::DateTimeIso(s) => parse_iso(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::String(s.clone())),
        Data::DurationIso(s) => CellValue::String(s.clone()),
    }
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_repeated_headers_are_made_unique() {
        let header = vec![
            Data::String("Edad".into()),
            Data::Empty,
            Data::String("Edad".into()),
            Data::String("Edad".into()),
        ];
        assert_eq!(
            unique_headers(&header),
            vec!["Edad", "Unnamed: 1", "Edad.1", "Edad.2"]
        );
    }

    #[test]
    fn cells_map_to_values() {
        assert_eq!(cell_value(&Data::Empty), CellValue::Null);
        assert_eq!(cell_value(&Data::String(String::new())), CellValue::Null);
        assert_eq!(cell_value(&Data::Int(3)), CellValue::Integer(3));
        assert_eq!(cell_value(&Data::Float(2.5)), CellValue::Float(2.5));
        assert_eq!(cell_value(&Data::Bool(true)), CellValue::Bool(true));
        assert_eq!(
            cell_value(&Data::Error(calamine::CellErrorType::NA)),
            CellValue::Null
        );
        let iso = cell_value(&Data::DateTimeIso("2021-03-04T05:06:07".into()));
        assert_eq!(iso.to_string(), "2021-03-04 05:06:07");
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = load_bytes(b"definitely not a zip archive").unwrap_err();
        assert!(matches!(err, LoadError::Workbook(_)));
    }

    #[test]
    fn rejects_other_extensions() {
        let err = load_file(Path::new("clientes.csv")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedExtension(ext) if ext == "csv"));
    }
}
