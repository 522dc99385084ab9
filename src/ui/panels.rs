use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use rusty_clientes::chart::render::{self, RenderBackend};
use rusty_clientes::session::Session;
use rusty_clientes::ChartKind;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – chart controls
// ---------------------------------------------------------------------------

/// Render the chart-selection panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("📊 Generar Gráficos");
    ui.separator();

    let columns = match &state.session {
        Some(s) => s.cleaned().columns().to_vec(),
        None => {
            ui.label("Carga un archivo Excel para empezar.");
            return;
        }
    };
    let Some(spec) = state.selection.as_mut() else {
        ui.label("El archivo no tiene columnas.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            column_picker(ui, "pick_x", "Selecciona la columna para el eje X", &columns, &mut spec.x);
            column_picker(ui, "pick_y", "Selecciona la columna para el eje Y", &columns, &mut spec.y);

            ui.strong("Selecciona el tipo de gráfico");
            egui::ComboBox::from_id_salt("pick_kind")
                .selected_text(spec.kind.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for kind in ChartKind::ALL {
                        ui.selectable_value(&mut spec.kind, kind, kind.label());
                    }
                });
            ui.separator();
        });

    if ui.button("Generar Gráfico").clicked() {
        state.generate_chart();
    }

    let has_chart = state.session.as_ref().is_some_and(|s| s.chart().is_some());
    if !has_chart {
        return;
    }
    ui.separator();

    match render::render_backend() {
        RenderBackend::Available => {
            if ui.button("📥 Descargar Gráfico").clicked() {
                state.save(Session::chart_image_download);
            }
        }
        RenderBackend::Unavailable { hint } => {
            ui.add_enabled(false, egui::Button::new("📥 Descargar Gráfico"));
            ui.label(RichText::new(hint).color(Color32::YELLOW));
        }
    }

    if ui.button("📥 Descargar Datos del Gráfico").clicked() {
        state.save(Session::chart_data_download);
    }
}

fn column_picker(ui: &mut Ui, id: &str, label: &str, columns: &[String], selected: &mut String) {
    ui.strong(label);
    egui::ComboBox::from_id_salt(id)
        .selected_text(selected.as_str())
        .show_ui(ui, |ui: &mut Ui| {
            for col in columns {
                ui.selectable_value(selected, col.clone(), col);
            }
        });
    ui.add_space(4.0);
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Archivo", |ui: &mut Ui| {
            if ui.button("📂 Abrir…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(session) = &state.session {
            ui.label(format!(
                "{}: {} filas cargadas, {} tras la limpieza",
                session.source_name,
                session.original().len(),
                session.cleaned().len()
            ));
        }

        ui.separator();

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        } else if let Some(msg) = &state.notice {
            ui.label(msg);
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Carga un archivo Excel")
        .add_filter("Excel", &["xlsx"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}
