use std::f64::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points, Polygon};
use rusty_clientes::chart::color::{ColorMap, Rgb, SERIES_COLOR};
use rusty_clientes::chart::{Chart, ChartKind, ChartMarks};

use crate::state::AppState;

fn color32(c: Rgb) -> Color32 {
    Color32::from_rgb(c[0], c[1], c[2])
}

// ---------------------------------------------------------------------------
// Chart plot (bottom panel)
// ---------------------------------------------------------------------------

/// Render the last generated chart.
pub fn chart_plot(ui: &mut Ui, state: &AppState) {
    let Some(chart) = state.session.as_ref().and_then(|s| s.chart()) else {
        return;
    };

    ui.vertical_centered(|ui: &mut Ui| {
        ui.strong(&chart.title);
    });

    match &chart.marks {
        ChartMarks::Slices(slices) => pie_plot(ui, slices),
        ChartMarks::Points(_) => points_plot(ui, chart),
    }
}

fn points_plot(ui: &mut Ui, chart: &Chart) {
    let layout = chart.layout();
    let series = color32(SERIES_COLOR);

    let mut plot = Plot::new("chart_plot")
        .x_axis_label(chart.x_column.as_str())
        .y_axis_label(chart.y_column.as_str())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    if let Some(labels) = layout.x_categories.clone() {
        plot = plot.x_axis_formatter(move |mark, _range| category_label(&labels, mark.value));
    }
    if let Some(labels) = layout.y_categories.clone() {
        plot = plot.y_axis_formatter(move |mark, _range| category_label(&labels, mark.value));
    }

    plot.show(ui, |plot_ui| match chart.kind {
        ChartKind::Bar => {
            let bars = layout
                .points
                .iter()
                .map(|p| Bar::new(p[0], p[1]).width(0.8).fill(series))
                .collect();
            plot_ui.bar_chart(BarChart::new(bars).name(&chart.y_column));
        }
        ChartKind::Line => {
            let points: PlotPoints = layout.points.iter().copied().collect();
            plot_ui.line(Line::new(points).name(&chart.y_column).color(series).width(1.5));
        }
        ChartKind::Scatter | ChartKind::Pie => {
            let points: PlotPoints = layout.points.iter().copied().collect();
            plot_ui.points(Points::new(points).name(&chart.y_column).color(series).radius(3.0));
        }
    });
}

/// Label for a grid mark on a category axis; blank between positions.
fn category_label(labels: &[String], value: f64) -> String {
    let pos = value.round();
    if (value - pos).abs() > f64::EPSILON || pos < 0.0 {
        return String::new();
    }
    labels.get(pos as usize).cloned().unwrap_or_default()
}

/// Wedge outline segments per radian of arc.
const ARC_STEPS_PER_RAD: f64 = 24.0;

fn pie_plot(ui: &mut Ui, slices: &[(String, f64)]) {
    let total: f64 = slices.iter().map(|(_, v)| v).sum();
    let colors = ColorMap::new(slices.iter().map(|(l, _)| l.as_str()));

    Plot::new("chart_plot")
        .data_aspect(1.0)
        .legend(Legend::default())
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            if total <= 0.0 {
                return;
            }
            // Clockwise from 12 o'clock, matching the PNG export.
            let mut start = FRAC_PI_2;
            for (label, value) in slices {
                let sweep = value / total * TAU;
                let steps = (sweep * ARC_STEPS_PER_RAD).ceil().max(1.0) as usize;
                let mut outline = vec![[0.0, 0.0]];
                outline.extend((0..=steps).map(|i| {
                    let a = start - sweep * i as f64 / steps as f64;
                    [a.cos(), a.sin()]
                }));
                let pct = value / total * 100.0;
                plot_ui.polygon(
                    Polygon::new(PlotPoints::new(outline))
                        .name(format!("{label} ({pct:.1}%)"))
                        .fill_color(color32(colors.color_for(label)))
                        .stroke((1.0, Color32::WHITE)),
                );
                start -= sweep;
            }
        });
}
