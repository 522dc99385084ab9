use std::path::Path;

use anyhow::{Context, Result};
use rusty_clientes::session::{Download, Session};
use rusty_clientes::{data, ChartSpec};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Current upload and everything derived from it (None until a file is loaded).
    pub session: Option<Session>,

    /// Column / kind pickers.
    pub selection: Option<ChartSpec>,

    /// Error shown in red in the top bar.
    pub status_message: Option<String>,

    /// Confirmation of the last successful save.
    pub notice: Option<String>,
}

impl AppState {
    /// Load and clean a workbook, replacing any previous session.
    pub fn open(&mut self, path: &Path) {
        match load_session(path) {
            Ok(session) => {
                self.selection = session.default_selection();
                self.session = Some(session);
                self.status_message = None;
                self.notice = None;
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.session = None;
                self.selection = None;
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Generate a chart from the current pickers.
    pub fn generate_chart(&mut self) {
        let (Some(session), Some(spec)) = (self.session.as_mut(), self.selection.as_ref()) else {
            return;
        };
        match session.generate_chart(spec) {
            Ok(chart) => {
                log::info!("Generated chart '{}'", chart.title);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Chart generation failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Run a download handler and save its result where the user picks.
    pub fn save<E: std::fmt::Display>(&mut self, make: impl FnOnce(&Session) -> Result<Download, E>) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let download = match make(session) {
            Ok(d) => d,
            Err(e) => {
                log::error!("Preparing download failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
                return;
            }
        };
        match save_with_dialog(&download) {
            Ok(Some(path)) => {
                self.notice = Some(format!("Guardado en {}", path.display()));
                self.status_message = None;
            }
            Ok(None) => {}
            Err(e) => {
                log::error!("{e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

fn load_session(path: &Path) -> Result<Session> {
    let table = data::loader::load_file(path)?;
    log::info!(
        "Loaded {} rows with columns {:?}",
        table.len(),
        table.columns()
    );
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Session::from_upload(name, table).with_context(|| format!("cleaning {}", path.display()))
}

fn save_with_dialog(download: &Download) -> Result<Option<std::path::PathBuf>> {
    let ext = Path::new(download.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let Some(path) = rfd::FileDialog::new()
        .set_title("Guardar archivo")
        .set_file_name(download.file_name)
        .add_filter(download.mime, &[ext])
        .save_file()
    else {
        return Ok(None);
    };
    download
        .save_to(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!(
        "Saved {} ({} bytes) to {}",
        download.file_name,
        download.bytes.len(),
        path.display()
    );
    Ok(Some(path))
}
