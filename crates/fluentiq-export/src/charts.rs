//! Chart surfaces and their raster export.
//!
//! A surface is owned by whoever renders it; exporting only asks for its
//! current raster. A surface that was never rendered is skipped, not an
//! error.

use crate::artifact::{file_stamp, Artifact, MIME_PNG};
use chrono::{DateTime, Utc};
use fluentiq_analytics::{ComparisonVector, TrendPoint};
use fluentiq_core::error::Result;
use fluentiq_core::MetricLabel;
use image::{ImageFormat, Rgba, RgbaImage};
use std::f64::consts::PI;
use std::io::Cursor;

pub const OVERALL_CHART: &str = "overall_chart";
pub const RADAR_CHART: &str = "radar_chart";
pub const BAR_CHART: &str = "bar_chart";

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const AXIS: Rgba<u8> = Rgba([200, 200, 200, 255]);
const SERIES: [Rgba<u8>; 3] = [
    Rgba([54, 162, 235, 255]),
    Rgba([255, 99, 132, 255]),
    Rgba([75, 192, 192, 255]),
];
const MARGIN: u32 = 24;

/// Something that can hand over its current raster, if it has one.
pub trait ChartSurface {
    fn name(&self) -> &str;

    /// `None` when the surface has not been rendered yet.
    fn snapshot(&self) -> Option<RgbaImage>;
}

/// Outcome of a chart export: one PNG per rendered surface, one note per
/// skipped surface.
#[derive(Debug, Default)]
pub struct ChartExport {
    pub artifacts: Vec<Artifact>,
    pub notes: Vec<String>,
}

pub fn export_charts(surfaces: &[&dyn ChartSurface]) -> Result<ChartExport> {
    export_charts_at(surfaces, Utc::now())
}

pub fn export_charts_at(surfaces: &[&dyn ChartSurface], now: DateTime<Utc>) -> Result<ChartExport> {
    let mut export = ChartExport::default();
    for surface in surfaces {
        let Some(image) = surface.snapshot() else {
            tracing::warn!("Chart '{}' has not been rendered, skipping", surface.name());
            export
                .notes
                .push(format!("{} not rendered yet, skipped", surface.name()));
            continue;
        };
        export.artifacts.push(Artifact::new(
            format!("{}_{}.png", surface.name(), file_stamp(now)),
            MIME_PNG,
            encode_png(&image)?,
        ));
    }
    Ok(export)
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// In-memory chart canvas on a fixed 0-100 value axis.
#[derive(Debug, Clone)]
pub struct RasterChart {
    name: String,
    width: u32,
    height: u32,
    image: Option<RgbaImage>,
}

impl RasterChart {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width: width.max(2 * MARGIN + 1),
            height: height.max(2 * MARGIN + 1),
            image: None,
        }
    }

    pub fn overall() -> Self {
        Self::new(OVERALL_CHART, 640, 320)
    }

    pub fn radar() -> Self {
        Self::new(RADAR_CHART, 480, 480)
    }

    pub fn bars() -> Self {
        Self::new(BAR_CHART, 480, 240)
    }

    pub fn is_rendered(&self) -> bool {
        self.image.is_some()
    }

    pub fn clear(&mut self) {
        self.image = None;
    }

    fn canvas(&self) -> RgbaImage {
        RgbaImage::from_pixel(self.width, self.height, BACKGROUND)
    }

    fn plot_width(&self) -> f64 {
        (self.width - 2 * MARGIN) as f64
    }

    fn plot_height(&self) -> f64 {
        (self.height - 2 * MARGIN) as f64
    }

    /// Pixel row for a score.
    fn y_for(&self, value: f64) -> f64 {
        MARGIN as f64 + (1.0 - scale(value)) * self.plot_height()
    }

    /// Overall scores over time, oldest on the left.
    pub fn render_line(&mut self, points: &[TrendPoint]) {
        let mut img = self.canvas();
        let left = MARGIN as f64;
        let bottom = (self.height - MARGIN) as f64;
        draw_line(&mut img, (left, MARGIN as f64), (left, bottom), AXIS);
        draw_line(&mut img, (left, bottom), (left + self.plot_width(), bottom), AXIS);

        let step = if points.len() > 1 {
            self.plot_width() / (points.len() - 1) as f64
        } else {
            0.0
        };
        let coords: Vec<(f64, f64)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let x = if points.len() > 1 {
                    left + step * i as f64
                } else {
                    left + self.plot_width() / 2.0
                };
                (x, self.y_for(p.value))
            })
            .collect();

        for pair in coords.windows(2) {
            draw_line(&mut img, pair[0], pair[1], SERIES[0]);
        }
        for &point in &coords {
            draw_dot(&mut img, point, 3, SERIES[0]);
        }
        self.image = Some(img);
    }

    /// One polygon per series over evenly spaced axes.
    pub fn render_radar(&mut self, axes: usize, series: &[Vec<f64>]) {
        let mut img = self.canvas();
        let center = (self.width as f64 / 2.0, self.height as f64 / 2.0);
        let radius = self.plot_width().min(self.plot_height()) / 2.0;

        if axes > 0 {
            let vertex = |axis: usize, value: f64| {
                let angle = -PI / 2.0 + axis as f64 * 2.0 * PI / axes as f64;
                let r = radius * scale(value);
                (center.0 + r * angle.cos(), center.1 + r * angle.sin())
            };

            for ring in [25.0, 50.0, 75.0, 100.0] {
                let outline: Vec<_> = (0..axes).map(|i| vertex(i, ring)).collect();
                draw_polygon(&mut img, &outline, AXIS);
            }
            for i in 0..axes {
                draw_line(&mut img, center, vertex(i, 100.0), AXIS);
            }
            for (n, values) in series.iter().enumerate() {
                let color = SERIES[n % SERIES.len()];
                let outline: Vec<_> = (0..axes)
                    .map(|i| vertex(i, values.get(i).copied().unwrap_or(0.0)))
                    .collect();
                draw_polygon(&mut img, &outline, color);
                for &point in &outline {
                    draw_dot(&mut img, point, 2, color);
                }
            }
        }
        self.image = Some(img);
    }

    /// Side-by-side radar of a two-session comparison.
    pub fn render_comparison(&mut self, vector: &ComparisonVector) {
        self.render_radar(vector.entries.len(), &[vector.series_a(), vector.series_b()]);
    }

    /// Horizontal bars, one row per label.
    pub fn render_bars(&mut self, bars: &[(MetricLabel, f64)]) {
        let mut img = self.canvas();
        let left = MARGIN as f64;
        draw_line(&mut img, (left, MARGIN as f64), (left, (self.height - MARGIN) as f64), AXIS);

        if !bars.is_empty() {
            let row = self.plot_height() / bars.len() as f64;
            let thickness = (row * 0.6).max(1.0);
            for (i, (_, value)) in bars.iter().enumerate() {
                let top = MARGIN as f64 + row * i as f64 + (row - thickness) / 2.0;
                let width = self.plot_width() * scale(*value);
                fill_rect(&mut img, left, top, width, thickness, SERIES[i % SERIES.len()]);
            }
        }
        self.image = Some(img);
    }
}

impl ChartSurface for RasterChart {
    fn name(&self) -> &str {
        &self.name
    }

    fn snapshot(&self) -> Option<RgbaImage> {
        self.image.clone()
    }
}

/// Clamp a score onto the 0-100 axis as a fraction.
fn scale(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0) / 100.0
    } else {
        0.0
    }
}

fn put(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Bresenham between two points, clipped to the canvas.
fn draw_line(img: &mut RgbaImage, from: (f64, f64), to: (f64, f64), color: Rgba<u8>) {
    let (mut x0, mut y0) = (from.0.round() as i64, from.1.round() as i64);
    let (x1, y1) = (to.0.round() as i64, to.1.round() as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put(img, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_polygon(img: &mut RgbaImage, points: &[(f64, f64)], color: Rgba<u8>) {
    for (i, &start) in points.iter().enumerate() {
        let end = points[(i + 1) % points.len()];
        draw_line(img, start, end, color);
    }
}

fn draw_dot(img: &mut RgbaImage, center: (f64, f64), radius: i64, color: Rgba<u8>) {
    let (cx, cy) = (center.0.round() as i64, center.1.round() as i64);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}

fn fill_rect(img: &mut RgbaImage, x: f64, y: f64, w: f64, h: f64, color: Rgba<u8>) {
    let (x0, y0) = (x.round() as i64, y.round() as i64);
    let (x1, y1) = ((x + w).round() as i64, (y + h).round() as i64);
    for py in y0..y1 {
        for px in x0..x1 {
            put(img, px, py, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    fn trend(values: &[f64]) -> Vec<TrendPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| TrendPoint {
                session_id: i as i64 + 1,
                timestamp: now(),
                value: *v,
            })
            .collect()
    }

    #[test]
    fn test_unrendered_surface_is_skipped_with_note() {
        let mut overall = RasterChart::overall();
        overall.render_line(&trend(&[60.0, 80.0]));
        let radar = RasterChart::radar();

        let export = export_charts_at(&[&overall, &radar], now()).unwrap();
        assert_eq!(export.artifacts.len(), 1);
        assert_eq!(export.artifacts[0].filename, "overall_chart_2024-03-01T09:30:00.png");
        assert_eq!(export.notes, vec!["radar_chart not rendered yet, skipped"]);
    }

    #[test]
    fn test_nothing_rendered_is_not_an_error() {
        let export = export_charts_at(&[&RasterChart::radar(), &RasterChart::bars()], now()).unwrap();
        assert!(export.artifacts.is_empty());
        assert_eq!(export.notes.len(), 2);
    }

    #[test]
    fn test_png_decodes_to_chart_size() {
        let mut bars = RasterChart::bars();
        bars.render_bars(&[(MetricLabel::Fluency, 78.0), (MetricLabel::Grammar, 120.0)]);
        let export = export_charts_at(&[&bars], now()).unwrap();
        let artifact = &export.artifacts[0];
        assert_eq!(artifact.mime, MIME_PNG);

        let decoded = image::load_from_memory_with_format(&artifact.bytes, ImageFormat::Png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (480, 240));
    }

    #[test]
    fn test_line_plots_on_fixed_axis() {
        let mut chart = RasterChart::new("t", 124, 124);
        chart.render_line(&trend(&[100.0, 0.0]));
        let img = chart.snapshot().unwrap();
        // 100 at the top-left corner of the plot, 0 at the bottom-right.
        assert_eq!(*img.get_pixel(MARGIN, MARGIN), SERIES[0]);
        assert_eq!(*img.get_pixel(124 - MARGIN, 124 - MARGIN), SERIES[0]);
    }

    #[test]
    fn test_comparison_radar_renders_both_series() {
        let vector = ComparisonVector {
            session_a: 1,
            session_b: 2,
            entries: MetricLabel::ALL
                .iter()
                .map(|label| fluentiq_analytics::ComparisonEntry {
                    label: *label,
                    a: 100.0,
                    b: 50.0,
                })
                .collect(),
        };
        let mut radar = RasterChart::radar();
        radar.render_comparison(&vector);
        let img = radar.snapshot().unwrap();
        let center = (240, 240);
        let radius = (480 - 2 * MARGIN) / 2;
        // The Fluency axis points straight up.
        assert_eq!(*img.get_pixel(center.0, center.1 - radius), SERIES[0]);
        assert_eq!(*img.get_pixel(center.0, center.1 - radius / 2), SERIES[1]);
    }

    #[test]
    fn test_clear_and_empty_input() {
        let mut chart = RasterChart::overall();
        chart.render_line(&[]);
        assert!(chart.is_rendered());
        chart.clear();
        assert!(chart.snapshot().is_none());
        chart.render_radar(0, &[]);
        assert!(chart.is_rendered());
    }
}
