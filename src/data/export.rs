use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet, XlsxError};
use thiserror::Error;

use super::model::{CellValue, Table};

/// MIME type of every workbook download.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const SHEET_NAME: &str = "Datos";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not encode workbook: {0}")]
    Serialization(#[from] XlsxError),

    #[error("table does not fit in a worksheet ({rows} rows × {columns} columns)")]
    TooLarge { rows: usize, columns: usize },
}

/// Serialise a table into `.xlsx` bytes: one worksheet, bold header row,
/// columns in table order. Missing values are written as blank cells.
pub fn export(table: &Table) -> Result<Vec<u8>, ExportError> {
    let too_large = || ExportError::TooLarge {
        rows: table.len(),
        columns: table.width(),
    };
    // +1 for the header row.
    RowNum::try_from(table.len() + 1).map_err(|_| too_large())?;
    ColNum::try_from(table.width()).map_err(|_| too_large())?;

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (c, name) in table.columns().iter().enumerate() {
        sheet.write_string_with_format(0, c as ColNum, name, &header_format)?;
    }
    for (r, row) in table.rows().iter().enumerate() {
        let r = (r + 1) as RowNum;
        for (c, value) in row.iter().enumerate() {
            write_cell(sheet, r, c as ColNum, value, &date_format)?;
        }
    }
    sheet.autofit();

    let bytes = workbook.save_to_buffer()?;
    log::debug!(
        "Exported {} rows × {} columns ({} bytes)",
        table.len(),
        table.width(),
        bytes.len()
    );
    Ok(bytes)
}

fn write_cell(
    sheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    value: &CellValue,
    date_format: &Format,
) -> Result<(), XlsxError> {
    match value {
        CellValue::String(s) => {
            sheet.write_string(row, col, s)?;
        }
        CellValue::Integer(i) => {
            sheet.write_number(row, col, *i as f64)?;
        }
        CellValue::Float(f) if f.is_finite() => {
            sheet.write_number(row, col, *f)?;
        }
        CellValue::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        CellValue::DateTime(dt) => {
            sheet.write_datetime_with_format(row, col, dt, date_format)?;
        }
        CellValue::Float(_) | CellValue::Null => {}
    }
    Ok(())
}
