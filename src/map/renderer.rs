use rayon::prelude::*;

use crate::api::Snapshot;
use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_disc, draw_line, draw_ring};
use crate::map::projection::Viewport;
use crate::metric::Metric;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Level of detail for basemap data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 2.0 {
            Lod::Low
        } else if zoom < 8.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }
}

/// One region's marker, in map coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub lon: f64,
    pub lat: f64,
    pub value: u64,
    pub code: String,
    pub name: String,
}

impl Marker {
    /// Markers for every region with known coordinates and a nonzero value
    pub fn from_regions(regions: &[Snapshot], metric: Metric) -> Vec<Marker> {
        regions
            .iter()
            .filter_map(|snap| {
                let (lat, lon) = snap.coords()?;
                let code = snap.code()?;
                let value = metric.total(snap);
                (value > 0).then(|| Marker {
                    lon,
                    lat,
                    value,
                    code: code.to_string(),
                    name: snap.name().to_string(),
                })
            })
            .collect()
    }
}

/// Marker radius in pixels. Area grows with the value (sqrt scale)
/// relative to the largest value on the map; zooming in enlarges markers.
pub fn marker_radius(value: u64, max_value: u64, zoom: f64) -> i32 {
    if value == 0 || max_value == 0 {
        return 0;
    }
    let max_radius = (3.0 * zoom.sqrt()).clamp(2.0, 14.0);
    let ratio = (value as f64 / max_value as f64).min(1.0);
    ((ratio.sqrt() * max_radius).round() as i32).max(1)
}

/// Display settings for map layers
#[derive(Debug, Clone)]
pub struct DisplaySettings {
    pub show_borders: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_borders: true,
            show_labels: true,
        }
    }
}

/// Rendered layers, drawn back to front with their own colors
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    pub markers: BrailleCanvas,
    pub highlight: BrailleCanvas,
    /// (column, row, text) in cell coordinates
    pub labels: Vec<(u16, u16, String)>,
}

/// Basemap geometry plus marker drawing
pub struct MapRenderer {
    coastlines_low: Vec<LineString>,
    coastlines_medium: Vec<LineString>,
    coastlines_high: Vec<LineString>,
    borders_medium: Vec<LineString>,
    borders_high: Vec<LineString>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            coastlines_low: Vec::new(),
            coastlines_medium: Vec::new(),
            coastlines_high: Vec::new(),
            borders_medium: Vec::new(),
            borders_high: Vec::new(),
            settings: DisplaySettings::default(),
        }
    }

    /// Best available coastlines for a LOD, falling back to coarser data
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let candidates = match lod {
            Lod::High => [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low],
            Lod::Medium => [&self.coastlines_medium, &self.coastlines_low, &self.coastlines_high],
            Lod::Low => [&self.coastlines_low, &self.coastlines_medium, &self.coastlines_high],
        };
        candidates
            .into_iter()
            .find(|lines| !lines.is_empty())
            .map(|lines| lines.as_slice())
            .unwrap_or(&[])
    }

    fn borders(&self, lod: Lod) -> &[LineString] {
        match lod {
            Lod::High if !self.borders_high.is_empty() => &self.borders_high,
            _ => &self.borders_medium,
        }
    }

    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            Lod::Low | Lod::Medium => self.borders_medium.push(line),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }

    /// Render basemap and markers onto a `width` x `height` cell area.
    /// `selected` names the marker to emphasize.
    pub fn render(
        &self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        markers: &[Marker],
        selected: Option<&str>,
    ) -> MapLayers {
        let lod = Lod::from_zoom(viewport.zoom);

        let mut coastlines = BrailleCanvas::new(width, height);
        draw_lines(&mut coastlines, self.coastlines(lod), viewport);

        let mut borders = BrailleCanvas::new(width, height);
        if self.settings.show_borders {
            draw_lines(&mut borders, self.borders(lod), viewport);
        }

        let mut marker_layer = BrailleCanvas::new(width, height);
        let mut highlight = BrailleCanvas::new(width, height);
        let max_value = markers.iter().map(|m| m.value).max().unwrap_or(0);

        let mut visible: Vec<(&Marker, i32, i32, i32)> = Vec::new();
        for marker in markers {
            let (px, py) = viewport.project(marker.lon, marker.lat);
            let radius = marker_radius(marker.value, max_value, viewport.zoom);
            if radius == 0 || !viewport.is_visible(px, py, radius) {
                continue;
            }
            if radius <= 2 {
                draw_disc(&mut marker_layer, px, py, radius);
            } else {
                draw_ring(&mut marker_layer, px, py, radius);
            }
            if selected == Some(marker.code.as_str()) {
                draw_ring(&mut highlight, px, py, radius + 2);
                draw_disc(&mut highlight, px, py, 1);
            }
            visible.push((marker, px, py, radius));
        }

        let labels = if self.settings.show_labels {
            label_positions(&mut visible, viewport.zoom, width, height)
        } else {
            Vec::new()
        };

        MapLayers {
            coastlines,
            borders,
            markers: marker_layer,
            highlight,
            labels,
        }
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Project lines in parallel, then rasterize with viewport culling
fn draw_lines(canvas: &mut BrailleCanvas, lines: &[LineString], viewport: &Viewport) {
    let projected: Vec<Vec<(i32, i32)>> = lines
        .par_iter()
        .filter(|line| line.len() >= 2)
        .map(|line| {
            line.iter()
                .map(|&(lon, lat)| viewport.project(lon, lat))
                .collect()
        })
        .collect();

    for points in &projected {
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            // Segments spanning most of the canvas are antimeridian wraps
            let span = ((a.0 - b.0).abs() + (a.1 - b.1).abs()) as usize;
            if span < viewport.width && viewport.line_might_be_visible(a, b) {
                draw_line(canvas, a, b);
            }
        }
    }
}

/// Names next to the largest visible markers. More labels as the map zooms in.
fn label_positions(
    visible: &mut [(&Marker, i32, i32, i32)],
    zoom: f64,
    width: usize,
    height: usize,
) -> Vec<(u16, u16, String)> {
    let budget = (6.0 * zoom).clamp(4.0, 40.0) as usize;
    visible.sort_by(|a, b| b.0.value.cmp(&a.0.value));

    let mut taken: Vec<(u16, u16, u16)> = Vec::new();
    let mut labels = Vec::new();
    for (marker, px, py, radius) in visible.iter() {
        if labels.len() >= budget {
            break;
        }
        let col = (px + radius + 2) / 2;
        let row = py / 4;
        if col < 0 || row < 0 || col as usize >= width || row as usize >= height {
            continue;
        }
        let (col, row) = (col as u16, row as u16);
        let len = marker.name.chars().count() as u16;
        // Skip labels that would overlap one already placed on the same row
        if taken
            .iter()
            .any(|&(r, start, end)| r == row && col <= end && col + len >= start)
        {
            continue;
        }
        taken.push((row, col, col + len));
        labels.push((col, row, marker.name.clone()));
    }
    labels
}
