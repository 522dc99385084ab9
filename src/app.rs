use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RustyClientesApp {
    pub state: AppState,
}

impl eframe::App for RustyClientesApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: chart controls ----
        egui::SidePanel::left("chart_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: chart ----
        if self.state.session.as_ref().is_some_and(|s| s.chart().is_some()) {
            egui::TopBottomPanel::bottom("chart_view")
                .resizable(true)
                .default_height(360.0)
                .show(ctx, |ui| {
                    plot::chart_plot(ui, &self.state);
                });
        }

        // ---- Central panel: cleaned data ----
        egui::CentralPanel::default().show(ctx, |ui| {
            table::cleaned_table(ui, &mut self.state);
        });
    }
}
