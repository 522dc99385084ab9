use std::path::Path;

use thiserror::Error;

use crate::chart::render::{self, RenderBackend, RenderError, PNG_MIME};
use crate::chart::{self, Chart, ChartError, ChartKind, ChartSpec};
use crate::data::cleaner;
use crate::data::export::{self, ExportError, XLSX_MIME};
use crate::data::model::{Table, TableError};

pub const CLEANED_FILE_NAME: &str = "datos_limpios.xlsx";
pub const CHART_IMAGE_FILE_NAME: &str = "grafico.png";
pub const CHART_DATA_FILE_NAME: &str = "datos_grafico.xlsx";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not clean the upload: {0}")]
    Clean(#[from] TableError),

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("no chart has been generated yet")]
    NoChart,
}

/// A file the user can save: default name, MIME type and contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: &'static str,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Download {
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)
    }
}

// ---------------------------------------------------------------------------
// Session – everything one uploaded file produces
// ---------------------------------------------------------------------------

/// State for one uploaded spreadsheet, passed to every handler.
#[derive(Debug, Clone)]
pub struct Session {
    pub source_name: String,
    original: Table,
    cleaned: Table,
    chart: Option<Chart>,
    backend: RenderBackend,
}

impl Session {
    /// Clean an uploaded table and start a session around it.
    pub fn from_upload(source_name: impl Into<String>, original: Table) -> Result<Self, SessionError> {
        let cleaned = cleaner::clean(&original)?;
        Ok(Session {
            source_name: source_name.into(),
            original,
            cleaned,
            chart: None,
            backend: render::render_backend(),
        })
    }

    /// Use another raster backend for the PNG download.
    pub fn with_render_backend(mut self, backend: RenderBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn original(&self) -> &Table {
        &self.original
    }

    pub fn cleaned(&self) -> &Table {
        &self.cleaned
    }

    pub fn chart(&self) -> Option<&Chart> {
        self.chart.as_ref()
    }

    /// Initial picker values: first column as x, second (or first) as y.
    pub fn default_selection(&self) -> Option<ChartSpec> {
        let columns = self.cleaned.columns();
        let x = columns.first()?.clone();
        let y = columns.get(1).unwrap_or(&x).clone();
        Some(ChartSpec {
            x,
            y,
            kind: ChartKind::default(),
        })
    }

    pub fn cleaned_download(&self) -> Result<Download, ExportError> {
        Ok(Download {
            file_name: CLEANED_FILE_NAME,
            mime: XLSX_MIME,
            bytes: export::export(&self.cleaned)?,
        })
    }

    /// Build a chart from the cleaned table and keep it as the current one.
    pub fn generate_chart(&mut self, spec: &ChartSpec) -> Result<&Chart, ChartError> {
        let built = chart::build_chart(&self.cleaned, &spec.x, &spec.y, spec.kind)?;
        Ok(&*self.chart.insert(built))
    }

    pub fn chart_image_download(&self) -> Result<Download, SessionError> {
        let chart = self.chart.as_ref().ok_or(SessionError::NoChart)?;
        Ok(Download {
            file_name: CHART_IMAGE_FILE_NAME,
            mime: PNG_MIME,
            bytes: render::render_with(self.backend, chart)?,
        })
    }

    /// The columns of the current chart, rows missing either value dropped.
    pub fn chart_data_download(&self) -> Result<Download, SessionError> {
        let chart = self.chart.as_ref().ok_or(SessionError::NoChart)?;
        let rows = chart::chart_rows(&self.cleaned, &chart.x_column, &chart.y_column)?;
        Ok(Download {
            file_name: CHART_DATA_FILE_NAME,
            mime: XLSX_MIME,
            bytes: export::export(&rows)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::render::ENABLE_HINT;
    use crate::data::columns::SENTINEL;
    use crate::data::model::CellValue;

    fn session() -> Session {
        let table = Table::new(
            vec!["Barrio".into(), "Edad".into()],
            vec![
                vec![CellValue::Null, CellValue::Integer(30)],
                vec![CellValue::text("Sur"), CellValue::Null],
                vec![CellValue::text("Sur"), CellValue::Null],
            ],
        )
        .unwrap();
        Session::from_upload("clientes.xlsx", table).unwrap()
    }

    #[test]
    fn upload_is_cleaned_once() {
        let s = session();
        assert_eq!(s.original().len(), 3);
        assert_eq!(s.cleaned().len(), 2);
        assert_eq!(s.cleaned().cell(0, "Barrio"), Some(CellValue::text(SENTINEL)));
        assert_eq!(s.cleaned().cell(1, "Edad"), Some(CellValue::Integer(0)));
    }

    #[test]
    fn default_selection_uses_first_two_columns() {
        let spec = session().default_selection().unwrap();
        assert_eq!((spec.x.as_str(), spec.y.as_str()), ("Barrio", "Edad"));
        assert_eq!(spec.kind, ChartKind::Bar);

        let single = Session::from_upload(
            "x.xlsx",
            Table::new(vec!["Edad".into()], vec![]).unwrap(),
        )
        .unwrap();
        let spec = single.default_selection().unwrap();
        assert_eq!(spec.x, spec.y);
        assert!(Session::from_upload("e.xlsx", Table::default())
            .unwrap()
            .default_selection()
            .is_none());
    }

    #[test]
    fn downloads_carry_names_and_mime() {
        let mut s = session();
        let cleaned = s.cleaned_download().unwrap();
        assert_eq!(cleaned.file_name, "datos_limpios.xlsx");
        assert_eq!(cleaned.mime, XLSX_MIME);

        assert!(matches!(s.chart_image_download(), Err(SessionError::NoChart)));
        assert!(matches!(s.chart_data_download(), Err(SessionError::NoChart)));

        let spec = s.default_selection().unwrap();
        assert_eq!(s.generate_chart(&spec).unwrap().title, "Gráfico de Barrio vs Edad");
        let data = s.chart_data_download().unwrap();
        assert_eq!(data.file_name, "datos_grafico.xlsx");

        match s.chart_image_download() {
            Ok(img) => {
                assert!(render::render_backend().is_available());
                assert_eq!((img.file_name, img.mime), ("grafico.png", "image/png"));
            }
            Err(SessionError::Render(RenderError::BackendUnavailable { .. })) => {
                assert!(!render::render_backend().is_available());
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn chart_data_follows_the_generated_chart() {
        let mut s = session();
        let columns_of = |s: &Session| {
            let data = s.chart_data_download().unwrap();
            crate::data::loader::load_bytes(&data.bytes).unwrap().columns().to_vec()
        };

        let same = ChartSpec {
            x: "Barrio".into(),
            y: "Barrio".into(),
            kind: ChartKind::Pie,
        };
        s.generate_chart(&same).unwrap();
        assert_eq!(columns_of(&s), vec!["Barrio".to_string()]);

        // A failed request keeps the previous chart and its data.
        let broken = ChartSpec {
            y: "Correo".into(),
            ..same.clone()
        };
        assert!(s.generate_chart(&broken).is_err());
        assert_eq!(columns_of(&s), vec!["Barrio".to_string()]);

        let pair = ChartSpec {
            y: "Edad".into(),
            ..same
        };
        s.generate_chart(&pair).unwrap();
        assert_eq!(columns_of(&s), vec!["Barrio".to_string(), "Edad".to_string()]);
    }

    #[test]
    fn missing_backend_fails_only_the_image() {
        let mut s = session().with_render_backend(RenderBackend::Unavailable { hint: ENABLE_HINT });
        let spec = s.default_selection().unwrap();
        s.generate_chart(&spec).unwrap();

        assert!(matches!(
            s.chart_image_download(),
            Err(SessionError::Render(RenderError::BackendUnavailable { hint })) if hint == ENABLE_HINT
        ));
        assert!(s.cleaned_download().is_ok());
        let data = s.chart_data_download().unwrap();
        assert_eq!(data.mime, XLSX_MIME);
        assert!(!data.bytes.is_empty());
    }

    #[test]
    fn bad_selection_is_reported() {
        let mut s = session();
        let spec = ChartSpec {
            x: "Barrio".into(),
            y: "Correo".into(),
            kind: ChartKind::Pie,
        };
        assert!(matches!(
            s.generate_chart(&spec),
            Err(ChartError::ColumnNotFound(c)) if c == "Correo"
        ));
        assert!(s.chart().is_none());
        assert!(matches!(s.chart_data_download(), Err(SessionError::NoChart)));
    }
}
