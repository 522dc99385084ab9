use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};
use rusty_clientes::session::Session;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Cleaned data (central panel)
// ---------------------------------------------------------------------------

pub fn cleaned_table(ui: &mut Ui, state: &mut AppState) {
    let Some(session) = &state.session else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("📈 Análisis de Clientes  (Archivo → Abrir…)");
        });
        return;
    };

    let mut download = false;
    ui.horizontal(|ui: &mut Ui| {
        ui.heading("📋 Datos Limpios");
        download = ui.button("📥 Descargar Datos Limpios").clicked();
    });
    ui.separator();

    let table = session.cleaned();
    if table.width() == 0 {
        ui.label("La hoja no tiene columnas.");
        return;
    }
    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .columns(Column::auto().at_least(60.0), table.width())
            .header(20.0, |mut header| {
                for name in table.columns() {
                    header.col(|ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, table.len(), |mut row| {
                    let index = row.index();
                    for c in 0..table.width() {
                        let text = table
                            .cell_at(index, c)
                            .map(|cell| cell.to_string())
                            .unwrap_or_default();
                        row.col(|ui| {
                            ui.label(text);
                        });
                    }
                });
            });
    });

    if download {
        state.save(Session::cleaned_download);
    }
}
