//! Chart layer: selection → marks → on-screen plot or PNG.
//!
//! ```text
//!   Table + ChartSpec
//!        │
//!        ▼
//!   ┌─────────────┐
//!   │ build_chart  │  title + marks (points or pie slices)
//!   └─────────────┘
//!        │
//!        ├──────────────► shell plot (egui_plot)
//!        ▼
//!   ┌─────────────┐
//!   │   render     │  Chart → PNG bytes (feature `png-export`)
//!   └─────────────┘
//! ```

pub mod color;
pub mod render;

use std::fmt;

use polars::prelude::{col, IntoLazy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::model::{CellValue, Table, TableError};

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("column '{0}' is not in the table")]
    ColumnNotFound(String),

    #[error(transparent)]
    Table(#[from] TableError),
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Scatter,
    Pie,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Bar,
        ChartKind::Line,
        ChartKind::Scatter,
        ChartKind::Pie,
    ];

    /// Label shown in the chart-kind selector.
    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Bar => "Barras",
            ChartKind::Line => "Líneas",
            ChartKind::Scatter => "Dispersión",
            ChartKind::Pie => "Pastel",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One "generate chart" request: x column, y column and chart kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub x: String,
    pub y: String,
    pub kind: ChartKind,
}

// ---------------------------------------------------------------------------
// Chart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ChartMarks {
    /// One mark per row where both values are present, in row order.
    Points(Vec<(CellValue, CellValue)>),
    /// Pie wedges: label and summed weight, in first-seen order.
    Slices(Vec<(String, f64)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub x_column: String,
    pub y_column: String,
    pub marks: ChartMarks,
}

/// Points placed on a numeric plane. An axis whose values are not all
/// numeric becomes a category axis: labels get positions `0, 1, 2, …` in
/// first-seen order and are kept for the tick labels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointLayout {
    pub points: Vec<[f64; 2]>,
    pub x_categories: Option<Vec<String>>,
    pub y_categories: Option<Vec<String>>,
}

/// Positions along one axis, plus category labels when it is not numeric.
fn axis<'a>(values: impl Iterator<Item = &'a CellValue> + Clone) -> (Vec<f64>, Option<Vec<String>>) {
    if values.clone().all(|v| v.as_f64().is_some()) {
        return (values.filter_map(CellValue::as_f64).collect(), None);
    }
    let mut categories: Vec<String> = Vec::new();
    let positions = values
        .map(|v| {
            let label = v.to_string();
            let pos = match categories.iter().position(|c| *c == label) {
                Some(p) => p,
                None => {
                    categories.push(label);
                    categories.len() - 1
                }
            };
            pos as f64
        })
        .collect();
    (positions, Some(categories))
}

impl Chart {
    /// Place point marks on the plane. Empty for pie charts.
    pub fn layout(&self) -> PointLayout {
        let ChartMarks::Points(marks) = &self.marks else {
            return PointLayout::default();
        };
        let (xs, x_categories) = axis(marks.iter().map(|(x, _)| x));
        let (ys, y_categories) = axis(marks.iter().map(|(_, y)| y));
        PointLayout {
            points: xs.into_iter().zip(ys).map(|(x, y)| [x, y]).collect(),
            x_categories,
            y_categories,
        }
    }
}

fn require_column(table: &Table, name: &str) -> Result<Vec<CellValue>, ChartError> {
    table
        .column_values(name)
        .ok_or_else(|| ChartError::ColumnNotFound(name.to_string()))
}

/// Missing, or a float that cannot be placed on an axis.
fn unplottable(value: &CellValue) -> bool {
    match value {
        CellValue::Null => true,
        CellValue::Float(v) => !v.is_finite(),
        _ => false,
    }
}

/// Build a chart of `y` against `x`.
///
/// Bar, line and scatter charts get one mark per row where both values are
/// present; text on either axis is laid out as categories. A pie chart reads
/// `x` as the slice label and sums the numeric `y` per label; slices whose
/// total is not positive are left out.
pub fn build_chart(table: &Table, x: &str, y: &str, kind: ChartKind) -> Result<Chart, ChartError> {
    let xs = require_column(table, x)?;
    let ys = require_column(table, y)?;

    let pairs = xs
        .into_iter()
        .zip(ys)
        .filter(|(xv, yv)| !unplottable(xv) && !unplottable(yv));

    let (title, marks) = match kind {
        ChartKind::Pie => {
            let mut slices: Vec<(String, f64)> = Vec::new();
            for (xv, yv) in pairs {
                let Some(weight) = yv.as_f64() else {
                    continue;
                };
                let label = xv.to_string();
                match slices.iter_mut().find(|(l, _)| *l == label) {
                    Some((_, total)) => *total += weight,
                    None => slices.push((label, weight)),
                }
            }
            slices.retain(|(_, total)| *total > 0.0);
            (format!("Distribución de {x}"), ChartMarks::Slices(slices))
        }
        ChartKind::Bar | ChartKind::Line | ChartKind::Scatter => (
            format!("Gráfico de {x} vs {y}"),
            ChartMarks::Points(pairs.collect()),
        ),
    };

    log::debug!("Built {kind} chart '{title}'");
    Ok(Chart {
        kind,
        title,
        x_column: x.to_string(),
        y_column: y.to_string(),
        marks,
    })
}

/// The two selected columns, dropping rows where either value is missing.
/// Selecting the same column twice yields a single column.
pub fn chart_rows(table: &Table, x: &str, y: &str) -> Result<Table, ChartError> {
    for name in [x, y] {
        if table.column_index(name).is_none() {
            return Err(ChartError::ColumnNotFound(name.to_string()));
        }
    }

    let selected = if x == y { vec![col(x)] } else { vec![col(x), col(y)] };
    let frame = table
        .frame()
        .clone()
        .lazy()
        .select(selected)
        .filter(col(x).is_not_null().and(col(y).is_not_null()))
        .collect()
        .map_err(TableError::from)?;

    log::debug!("Chart data for '{x}' / '{y}': {} rows", frame.height());
    Ok(Table::from_frame(frame))
}
