use thiserror::Error;

use super::Chart;

/// Instruction shown when PNG export was compiled out.
pub const ENABLE_HINT: &str =
    "La exportación de gráficos a PNG no está disponible. Compila con: cargo build --features png-export";

pub const PNG_MIME: &str = "image/png";

/// Whether a raster backend was compiled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderBackend {
    Available,
    Unavailable { hint: &'static str },
}

impl RenderBackend {
    pub fn is_available(self) -> bool {
        matches!(self, RenderBackend::Available)
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{hint}")]
    BackendUnavailable { hint: &'static str },

    #[cfg(feature = "png-export")]
    #[error("could not encode PNG: {0}")]
    Encode(#[from] image::ImageError),

    #[cfg(feature = "png-export")]
    #[error("could not load the chart font: {0}")]
    Font(#[from] ab_glyph::InvalidFont),
}

/// Capability check for [`render_image`].
pub fn render_backend() -> RenderBackend {
    if cfg!(feature = "png-export") {
        RenderBackend::Available
    } else {
        RenderBackend::Unavailable { hint: ENABLE_HINT }
    }
}

/// Render a chart to PNG bytes with the compiled-in backend.
pub fn render_image(chart: &Chart) -> Result<Vec<u8>, RenderError> {
    render_with(render_backend(), chart)
}

/// Render through an explicit backend; an unavailable one is reported
/// without touching the raster code.
pub fn render_with(backend: RenderBackend, chart: &Chart) -> Result<Vec<u8>, RenderError> {
    match backend {
        RenderBackend::Available => render_image_sized(chart, raster::WIDTH, raster::HEIGHT),
        RenderBackend::Unavailable { hint } => {
            log::warn!("PNG export requested for '{}' without a backend", chart.title);
            Err(RenderError::BackendUnavailable { hint })
        }
    }
}

#[cfg(feature = "png-export")]
pub fn render_image_sized(chart: &Chart, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
    let bytes = raster::draw(chart, width, height)?;
    log::debug!("Rendered '{}' to {} PNG bytes", chart.title, bytes.len());
    Ok(bytes)
}

#[cfg(not(feature = "png-export"))]
pub fn render_image_sized(chart: &Chart, _width: u32, _height: u32) -> Result<Vec<u8>, RenderError> {
    render_with(render_backend(), chart)
}

// ---------------------------------------------------------------------------
// Raster backend
// ---------------------------------------------------------------------------

#[cfg(not(feature = "png-export"))]
mod raster {
    pub const WIDTH: u32 = 800;
    pub const HEIGHT: u32 = 600;
}

#[cfg(feature = "png-export")]
mod raster {
    use std::f64::consts::{FRAC_PI_2, TAU};
    use std::io::Cursor;

    use ab_glyph::{point, Font, FontRef, ScaleFont};
    use image::{ImageFormat, Rgb, RgbImage};

    use super::super::color::{self, ColorMap, AXIS_COLOR, GRID_COLOR, SERIES_COLOR};
    use super::super::{Chart, ChartKind, ChartMarks};
    use super::RenderError;

    pub const WIDTH: u32 = 800;
    pub const HEIGHT: u32 = 600;

    const LEFT: f64 = 70.0;
    const RIGHT: f64 = 30.0;
    const TOP: f64 = 50.0;
    const BOTTOM: f64 = 60.0;
    const GRID_LINES: usize = 5;

    const TITLE_SIZE: f32 = 18.0;
    const LABEL_SIZE: f32 = 12.0;
    const TEXT_COLOR: color::Rgb = [0x22, 0x22, 0x22];

    /// Most tick labels drawn on one axis; the rest are skipped evenly.
    const MAX_TICK_LABELS: usize = 12;

    /// Data range → pixel rectangle.
    struct Frame {
        left: f64,
        right: f64,
        top: f64,
        bottom: f64,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    }

    impl Frame {
        fn px(&self, x: f64) -> f64 {
            self.left + (x - self.x_min) / (self.x_max - self.x_min) * (self.right - self.left)
        }

        fn py(&self, y: f64) -> f64 {
            self.bottom - (y - self.y_min) / (self.y_max - self.y_min) * (self.bottom - self.top)
        }
    }

    #[derive(Debug, Clone, Copy)]
    enum Align {
        Start,
        Middle,
        End,
    }

    struct Canvas<'f> {
        img: RgbImage,
        font: FontRef<'f>,
    }

    impl<'f> Canvas<'f> {
        fn new(width: u32, height: u32, font: FontRef<'f>) -> Self {
            Canvas {
                img: RgbImage::from_pixel(width, height, Rgb([255, 255, 255])),
                font,
            }
        }

        fn width(&self) -> f64 {
            self.img.width() as f64
        }

        fn height(&self) -> f64 {
            self.img.height() as f64
        }

        fn put(&mut self, x: i64, y: i64, c: color::Rgb) {
            self.blend(x, y, c, 1.0);
        }

        /// Mix `c` over the pixel by `coverage` in `0..=1`.
        fn blend(&mut self, x: i64, y: i64, c: color::Rgb, coverage: f32) {
            if x < 0 || y < 0 || x as u32 >= self.img.width() || y as u32 >= self.img.height() {
                return;
            }
            let a = coverage.clamp(0.0, 1.0);
            let pixel = self.img.get_pixel_mut(x as u32, y as u32);
            for (dst, src) in pixel.0.iter_mut().zip(c) {
                *dst = (*dst as f32 * (1.0 - a) + src as f32 * a).round() as u8;
            }
        }

        fn fill_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, c: color::Rgb) {
            let (xa, xb) = (x0.min(x1).round() as i64, x0.max(x1).round() as i64);
            let (ya, yb) = (y0.min(y1).round() as i64, y0.max(y1).round() as i64);
            for y in ya..=yb {
                for x in xa..=xb {
                    self.put(x, y, c);
                }
            }
        }

        fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, c: color::Rgb) {
            let ri = r.ceil() as i64;
            let (cxi, cyi) = (cx.round() as i64, cy.round() as i64);
            for dy in -ri..=ri {
                for dx in -ri..=ri {
                    if ((dx * dx + dy * dy) as f64) <= r * r {
                        self.put(cxi + dx, cyi + dy, c);
                    }
                }
            }
        }

        /// Thick line made of overlapping discs.
        fn line(&mut self, (x0, y0): (f64, f64), (x1, y1): (f64, f64), width: f64, c: color::Rgb) {
            let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
            for i in 0..=steps {
                let t = i as f64 / steps as f64;
                self.fill_circle(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t, width / 2.0, c);
            }
        }

        fn text_width(&self, size: f32, text: &str) -> f32 {
            let scaled = self.font.as_scaled(size);
            let mut width = 0.0;
            let mut prev = None;
            for ch in text.chars() {
                let id = scaled.glyph_id(ch);
                if let Some(p) = prev {
                    width += scaled.kern(p, id);
                }
                width += scaled.h_advance(id);
                prev = Some(id);
            }
            width
        }

        /// One line of text; `y` is its vertical centre.
        fn text(&mut self, (x, y): (f64, f64), size: f32, align: Align, text: &str) {
            let width = self.text_width(size, text);
            let font = self.font.clone();
            let scaled = font.as_scaled(size);
            let mut caret = match align {
                Align::Start => x as f32,
                Align::Middle => x as f32 - width / 2.0,
                Align::End => x as f32 - width,
            };
            let baseline = y as f32 + (scaled.ascent() + scaled.descent()) / 2.0;
            let mut prev = None;
            for ch in text.chars() {
                let id = scaled.glyph_id(ch);
                if let Some(p) = prev {
                    caret += scaled.kern(p, id);
                }
                let glyph = id.with_scale_and_position(size, point(caret, baseline));
                caret += scaled.h_advance(id);
                prev = Some(id);
                let Some(outlined) = font.outline_glyph(glyph) else {
                    continue;
                };
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    self.blend(
                        bounds.min.x as i64 + gx as i64,
                        bounds.min.y as i64 + gy as i64,
                        TEXT_COLOR,
                        coverage,
                    );
                });
            }
        }

        fn encode(self) -> Result<Vec<u8>, image::ImageError> {
            let mut out = Cursor::new(Vec::new());
            self.img.write_to(&mut out, ImageFormat::Png)?;
            Ok(out.into_inner())
        }
    }

    pub fn draw(chart: &Chart, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        let font = FontRef::try_from_slice(epaint_default_fonts::UBUNTU_LIGHT)?;
        let mut canvas = Canvas::new(width, height, font);
        canvas.text((width as f64 / 2.0, TOP / 2.0 - 3.0), TITLE_SIZE, Align::Middle, &chart.title);
        match &chart.marks {
            ChartMarks::Slices(slices) => draw_pie(&mut canvas, slices),
            ChartMarks::Points(_) => draw_points(&mut canvas, chart),
        }
        Ok(canvas.encode()?)
    }

    fn padded(min: f64, max: f64) -> (f64, f64) {
        if (max - min).abs() < f64::EPSILON {
            (min - 1.0, max + 1.0)
        } else {
            let pad = (max - min) * 0.05;
            (min - pad, max + pad)
        }
    }

    fn number_label(v: f64) -> String {
        if (v - v.round()).abs() < 1e-6 {
            format!("{}", v.round() as i64)
        } else {
            format!("{v:.2}")
        }
    }

    /// Tick positions with their labels: every category, or evenly spaced
    /// values across a numeric range.
    fn ticks(categories: Option<&[String]>, min: f64, max: f64) -> Vec<(f64, String)> {
        match categories {
            Some(labels) => {
                let stride = labels.len().div_ceil(MAX_TICK_LABELS).max(1);
                labels
                    .iter()
                    .enumerate()
                    .step_by(stride)
                    .map(|(i, label)| (i as f64, label.clone()))
                    .collect()
            }
            None => (0..=GRID_LINES)
                .map(|i| {
                    let v = min + (max - min) * i as f64 / GRID_LINES as f64;
                    (v, number_label(v))
                })
                .collect(),
        }
    }

    fn draw_points(canvas: &mut Canvas<'_>, chart: &Chart) {
        let layout = chart.layout();
        let points = &layout.points;

        let (mut x_min, mut x_max) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
        let (mut y_min, mut y_max) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p[1]), hi.max(p[1])));
        if points.is_empty() {
            (x_min, x_max, y_min, y_max) = (0.0, 1.0, 0.0, 1.0);
        }
        if chart.kind == ChartKind::Bar {
            y_min = y_min.min(0.0);
            y_max = y_max.max(0.0);
            x_min -= 0.5;
            x_max += 0.5;
        }
        let (x_min, x_max) = padded(x_min, x_max);
        let (y_min, y_max) = padded(y_min, y_max);

        let frame = Frame {
            left: LEFT,
            right: canvas.width() - RIGHT,
            top: TOP,
            bottom: canvas.height() - BOTTOM,
            x_min,
            x_max,
            y_min,
            y_max,
        };

        let y_ticks = ticks(layout.y_categories.as_deref(), y_min, y_max);
        for (v, label) in &y_ticks {
            let y = frame.py(*v);
            canvas.line((frame.left, y), (frame.right, y), 1.0, GRID_COLOR);
            canvas.text((frame.left - 6.0, y), LABEL_SIZE, Align::End, label);
        }
        for (v, label) in ticks(layout.x_categories.as_deref(), x_min, x_max) {
            let x = frame.px(v);
            canvas.line((x, frame.bottom), (x, frame.bottom + 4.0), 1.0, AXIS_COLOR);
            canvas.text((x, frame.bottom + 14.0), LABEL_SIZE, Align::Middle, &label);
        }

        match chart.kind {
            ChartKind::Bar => {
                let half = bar_half_width(points, &frame);
                let base = frame.py(0.0);
                for p in points {
                    let x = frame.px(p[0]);
                    canvas.fill_rect(x - half, base, x + half, frame.py(p[1]), SERIES_COLOR);
                }
            }
            ChartKind::Line => {
                for pair in points.windows(2) {
                    let a = (frame.px(pair[0][0]), frame.py(pair[0][1]));
                    let b = (frame.px(pair[1][0]), frame.py(pair[1][1]));
                    canvas.line(a, b, 2.0, SERIES_COLOR);
                }
            }
            ChartKind::Scatter | ChartKind::Pie => {
                for p in points {
                    canvas.fill_circle(frame.px(p[0]), frame.py(p[1]), 4.0, SERIES_COLOR);
                }
            }
        }

        canvas.line((frame.left, frame.top), (frame.left, frame.bottom), 1.5, AXIS_COLOR);
        canvas.line((frame.left, frame.bottom), (frame.right, frame.bottom), 1.5, AXIS_COLOR);

        let x_name = ((frame.left + frame.right) / 2.0, frame.bottom + 38.0);
        canvas.text(x_name, LABEL_SIZE, Align::Middle, &chart.x_column);
        canvas.text((8.0, frame.top - 8.0), LABEL_SIZE, Align::Start, &chart.y_column);
    }

    /// Bars take 80% of the smallest gap between distinct x positions.
    fn bar_half_width(points: &[[f64; 2]], frame: &Frame) -> f64 {
        let mut xs: Vec<f64> = points.iter().map(|p| p[0]).collect();
        xs.sort_by(f64::total_cmp);
        xs.dedup();
        let gap = xs
            .windows(2)
            .map(|w| frame.px(w[1]) - frame.px(w[0]))
            .fold(f64::INFINITY, f64::min);
        let gap = if gap.is_finite() { gap } else { (frame.right - frame.left) / 2.0 };
        (gap * 0.4).max(1.0)
    }

    /// Wedges start at 12 o'clock and run clockwise. The legend on the right
    /// lists each label with its colour and share.
    fn draw_pie(canvas: &mut Canvas<'_>, slices: &[(String, f64)]) {
        let total: f64 = slices.iter().map(|(_, v)| v).sum();
        if slices.is_empty() || total <= 0.0 {
            return;
        }
        let colors = ColorMap::new(slices.iter().map(|(l, _)| l.as_str()));
        let mut bounds = Vec::with_capacity(slices.len());
        let mut acc = 0.0;
        for (label, v) in slices {
            acc += v / total;
            bounds.push((acc, colors.color_for(label)));
        }

        let legend_width = (canvas.width() * 0.35).min(220.0);
        let area_width = canvas.width() - legend_width;
        let (cx, cy) = (area_width / 2.0, (TOP + canvas.height()) / 2.0);
        let r = (area_width.min(canvas.height() - TOP) / 2.0 - 20.0).max(1.0);
        let ri = r.ceil() as i64;
        for dy in -ri..=ri {
            for dx in -ri..=ri {
                let (fx, fy) = (dx as f64, dy as f64);
                if fx * fx + fy * fy > r * r {
                    continue;
                }
                let angle = (fy.atan2(fx) + FRAC_PI_2).rem_euclid(TAU);
                let frac = angle / TAU;
                let c = bounds
                    .iter()
                    .find(|(end, _)| frac < *end)
                    .or(bounds.last())
                    .map(|(_, c)| *c)
                    .unwrap_or(SERIES_COLOR);
                canvas.put(cx as i64 + dx, cy as i64 + dy, c);
            }
        }

        for (i, (label, value)) in slices.iter().enumerate() {
            let y = TOP + 20.0 + i as f64 * 20.0;
            canvas.fill_rect(area_width, y - 6.0, area_width + 12.0, y + 6.0, colors.color_for(label));
            let pct = value / total * 100.0;
            canvas.text((area_width + 18.0, y), LABEL_SIZE, Align::Start, &format!("{label} ({pct:.1}%)"));
        }
    }
}
