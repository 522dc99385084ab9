//! Customer spreadsheet cleaning and charting.
//!
//! Load an `.xlsx` upload with [`data::loader`], normalise it with
//! [`data::cleaner`], export it with [`data::export`] and build charts from
//! two of its columns with [`chart`]. [`session::Session`] ties these
//! together for the interactive shell.

pub mod chart;
pub mod data;
pub mod session;

pub use chart::{build_chart, chart_rows, Chart, ChartError, ChartKind, ChartSpec};
pub use data::cleaner::clean;
pub use data::export::{export, ExportError};
pub use data::loader::{load_bytes, load_file, LoadError};
pub use data::model::{CellValue, Table, TableError};
pub use session::{Download, Session};
