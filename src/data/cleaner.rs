use polars::prelude::*;

use super::columns::CleaningConfig;
use super::model::{Table, TableError};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Clean a table with the built-in column classification.
pub fn clean(table: &Table) -> Result<Table, TableError> {
    clean_with(table, &CleaningConfig::default())
}

/// Clean a table with an explicit column classification.
///
/// Steps, in order:
/// 1. date columns → `YYYY-MM-DD` text, unparseable values → sentinel
/// 2. drop fully identical rows, keeping the first occurrence
/// 3. income column: negatives and non-numbers → missing
/// 4. categorical columns: missing → sentinel
/// 5. numeric columns: missing → `0`
///
/// Coercion in steps 3–5 can make two rows equal again, so the duplicate
/// pass is repeated at the end. The result never contains identical rows and
/// `clean(clean(t)) == clean(t)`.
pub fn clean_with(table: &Table, config: &CleaningConfig) -> Result<Table, TableError> {
    let overlap = config.overlapping_columns();
    if !overlap.is_empty() {
        log::warn!("Columns registered under several roles: {overlap:?}");
    }

    let df = table.frame().clone();
    let before = df.height();

    let df = apply(df, date_exprs(table, config))?;
    let (df, dups) = drop_duplicate_rows(df)?;
    let income = income_expr(&df, config);
    let df = apply(df, income.into_iter().collect())?;
    let categorical = categorical_exprs(&df, config);
    let df = apply(df, categorical)?;
    let numeric = numeric_exprs(&df, config);
    let df = apply(df, numeric)?;
    let (df, late_dups) = drop_duplicate_rows(df)?;

    log::info!(
        "Cleaned {before} rows → {} rows ({} duplicates removed)",
        df.height(),
        dups + late_dups
    );
    Ok(Table::from_frame(df))
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

fn apply(df: DataFrame, exprs: Vec<Expr>) -> PolarsResult<DataFrame> {
    if exprs.is_empty() {
        return Ok(df);
    }
    df.lazy().with_columns(exprs).collect()
}

/// Configured names present in the frame, with their column.
fn present<'a>(df: &'a DataFrame, names: &'a [String]) -> impl Iterator<Item = (&'a str, &'a Column)> {
    names
        .iter()
        .filter_map(move |name| df.column(name).ok().map(|c| (name.as_str(), c)))
}

/// Returns the frame and how many rows were removed.
fn drop_duplicate_rows(df: DataFrame) -> PolarsResult<(DataFrame, usize)> {
    if df.width() == 0 {
        return Ok((df, 0));
    }
    let before = df.height();
    let unique = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
    let removed = before - unique.height();
    Ok((unique, removed))
}

fn date_exprs(table: &Table, config: &CleaningConfig) -> Vec<Expr> {
    present(table.frame(), &config.date_columns)
        .map(|(name, column)| {
            log::debug!("Normalising dates in '{name}' ({})", column.dtype());
            let parsed = parsed_date(name, column.dtype());
            let year = parsed.clone().dt().year();
            when(year.clone().gt_eq(lit(MIN_YEAR)).and(year.lt_eq(lit(MAX_YEAR))))
                .then(parsed.dt().strftime("%Y-%m-%d"))
                .otherwise(lit(config.sentinel.as_str()))
                .alias(name)
        })
        .collect()
}

/// Income: numbers stay unless negative, text is parsed, anything else
/// (booleans and dates included) is missing. Non-finite numbers are missing too.
fn income_expr(df: &DataFrame, config: &CleaningConfig) -> Option<Expr> {
    let name = config.income_column.as_deref()?;
    let column = df.column(name).ok()?;
    let value = match column.dtype() {
        dtype if dtype.is_primitive_numeric() => col(name),
        DataType::String => col(name)
            .str()
            .strip_chars(lit(NULL))
            .str()
            .replace(lit(","), lit("."), true)
            .cast(DataType::Float64),
        _ => lit(NULL).cast(DataType::Float64),
    };
    let invalid = value
        .clone()
        .lt(lit(0))
        .or(value.clone().cast(DataType::Float64).is_finite().not());
    log::debug!("Coercing income column '{name}' ({})", column.dtype());
    Some(when(invalid).then(lit(NULL)).otherwise(value).alias(name))
}

/// Text columns get the sentinel. A non-text column is only turned into
/// text when it actually has a gap to fill.
fn categorical_exprs(df: &DataFrame, config: &CleaningConfig) -> Vec<Expr> {
    present(df, &config.categorical_columns)
        .filter(|(_, column)| column.null_count() > 0)
        .map(|(name, column)| {
            log::debug!("Filling {} gaps in '{name}'", column.null_count());
            col(name)
                .cast(DataType::String)
                .fill_null(lit(config.sentinel.as_str()))
                .alias(name)
        })
        .collect()
}

fn numeric_exprs(df: &DataFrame, config: &CleaningConfig) -> Vec<Expr> {
    present(df, &config.numeric_columns)
        .filter(|(_, column)| column.null_count() > 0)
        .map(|(name, column)| {
            log::debug!("Filling {} gaps in '{name}' with 0", column.null_count());
            let dtype = column.dtype();
            let filled = if dtype.is_primitive_numeric() {
                col(name).fill_null(lit(0))
            } else if column.null_count() == column.len() {
                col(name).cast(DataType::Int64).fill_null(lit(0))
            } else {
                col(name).cast(DataType::String).fill_null(lit("0"))
            };
            filled.alias(name)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------------------

/// Text layouts tried in order. Month-first precedes day-first.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y"];

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Only four-digit years are accepted so the canonical text re-parses.
const MIN_YEAR: i32 = 1000;
const MAX_YEAR: i32 = 9999;

/// Largest serial Excel can display (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Days from 1899-12-30, the epoch Excel serial dates count from, to 1970-01-01.
const EXCEL_EPOCH_OFFSET: i64 = 25_569;

/// A `Date` expression for one column; null where nothing parses.
fn parsed_date(name: &str, dtype: &DataType) -> Expr {
    match dtype {
        DataType::Date => col(name),
        DataType::Datetime(_, _) => col(name).cast(DataType::Date),
        DataType::String => parse_date_text(col(name)),
        dtype if dtype.is_primitive_numeric() => excel_serial_to_date(col(name)),
        _ => parse_date_text(col(name).cast(DataType::String)),
    }
}

/// Text that matches no layout but reads as a number is taken as a serial,
/// since mixed columns arrive here as text.
fn parse_date_text(text: Expr) -> Expr {
    let text = text.str().strip_chars(lit(NULL));
    let serial = excel_serial_to_date(text.clone().cast(DataType::Float64));
    // Folded from the back so the first layout has priority.
    DATE_FORMATS
        .iter()
        .chain(DATETIME_FORMATS.iter())
        .rev()
        .fold(serial, |fallback, format| {
            text.clone()
                .str()
                .to_date(StrptimeOptions {
                    format: Some((*format).into()),
                    strict: false,
                    ..Default::default()
                })
                .fill_null(fallback)
        })
}

fn excel_serial_to_date(value: Expr) -> Expr {
    let serial = value.cast(DataType::Float64);
    let in_range = serial
        .clone()
        .gt_eq(lit(1.0))
        .and(serial.clone().lt_eq(lit(MAX_EXCEL_SERIAL)));
    let days = (serial.cast(DataType::Int64) - lit(EXCEL_EPOCH_OFFSET))
        .cast(DataType::Int32)
        .cast(DataType::Date);
    when(in_range).then(days).otherwise(lit(NULL).cast(DataType::Date))
}
