use std::f64::consts::PI;

use crate::geo::{clamp_lat, wrap_lon};

const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 64.0;
const ZOOM_STEP: f64 = 1.5;

/// Web Mercator y in [0, 1] for a latitude in degrees
#[inline(always)]
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.to_radians();
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

#[inline(always)]
fn inverse_mercator_y(y: f64) -> f64 {
    (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees()
}

#[inline(always)]
fn mercator_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

/// Visible map area in Braille pixels
#[derive(Debug, Clone)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Scale factor; 1.0 fits the whole world across the width
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon: wrap_lon(center_lon),
            center_lat: clamp_lat(center_lat),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    /// Scale factor for a slippy-map zoom level. Level 3 shows the whole
    /// world; each level doubles the scale.
    pub fn zoom_for_level(level: u8) -> f64 {
        2f64.powi(level as i32 - 3).clamp(MIN_ZOOM, MAX_ZOOM)
    }

    /// Recenter on a coordinate at a zoom level, keeping the canvas size
    pub fn focus(&mut self, lat: f64, lon: f64, level: u8) {
        self.center_lat = clamp_lat(lat);
        self.center_lon = wrap_lon(lon);
        self.zoom = Self::zoom_for_level(level);
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = self.scale().max(1.0);
        self.center_lon = wrap_lon(self.center_lon + dx as f64 * 360.0 / scale);
        let y = mercator_y(self.center_lat) + dy as f64 / scale;
        self.center_lat = clamp_lat(inverse_mercator_y(y));
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    /// Zoom so the geographic point under (px, py) stays put
    pub fn zoom_at(&mut self, px: i32, py: i32, zoom_in: bool) {
        let (lon, lat) = self.unproject(px, py);
        let factor = if zoom_in { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    fn scale(&self) -> f64 {
        self.zoom * self.width as f64
    }

    /// Project (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let scale = self.scale();
        let x = (mercator_x(lon) - mercator_x(self.center_lon)) * scale + self.width as f64 / 2.0;
        let y = (mercator_y(lat) - mercator_y(self.center_lat)) * scale + self.height as f64 / 2.0;
        (x.round() as i32, y.round() as i32)
    }

    /// Pixel coordinates back to (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.scale();
        let x = (px as f64 - self.width as f64 / 2.0) / scale + mercator_x(self.center_lon);
        let y = (py as f64 - self.height as f64 / 2.0) / scale + mercator_y(self.center_lat);

        (x * 360.0 - 180.0, inverse_mercator_y(y))
    }

    /// Approximate degrees of longitude covered by one pixel
    pub fn degrees_per_pixel(&self) -> f64 {
        360.0 / self.scale().max(1.0)
    }

    /// Inside the canvas, with a margin for markers that straddle the edge
    pub fn is_visible(&self, px: i32, py: i32, margin: i32) -> bool {
        px >= -margin
            && px < self.width as i32 + margin
            && py >= -margin
            && py < self.height as i32 + margin
    }

    /// Rough bounding box test for a segment
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        p1.0.max(p2.0) >= 0
            && p1.0.min(p2.0) < self.width as i32
            && p1.1.max(p2.1) >= 0
            && p1.1.min(p2.1) < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_projects_to_middle() {
        let vp = Viewport::new(42.551, 29.2985, 1.0, 200, 100);
        assert_eq!(vp.project(42.551, 29.2985), (100, 50));
    }

    #[test]
    fn test_unproject_inverts_project() {
        let vp = Viewport::new(10.0, 20.0, 4.0, 300, 160);
        let (px, py) = vp.project(12.0, 21.0);
        let (lon, lat) = vp.unproject(px, py);
        assert!((lon - 12.0).abs() < 0.5);
        assert!((lat - 21.0).abs() < 0.5);
    }

    #[test]
    fn test_levels() {
        assert_eq!(Viewport::zoom_for_level(3), 1.0);
        assert_eq!(Viewport::zoom_for_level(4), 2.0);
        assert_eq!(Viewport::zoom_for_level(0), MIN_ZOOM);
    }

    #[test]
    fn test_focus_and_pan_wrap() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        vp.focus(46.0, 2.0, 4);
        assert_eq!((vp.center_lat, vp.center_lon, vp.zoom), (46.0, 2.0, 2.0));

        vp.focus(0.0, 179.0, 3);
        vp.pan(10, 0);
        assert!(vp.center_lon < 0.0, "wrapped to {}", vp.center_lon);
    }

    #[test]
    fn test_zoom_at_keeps_point_under_cursor() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 200, 200);
        let before = vp.unproject(150, 80);
        vp.zoom_at(150, 80, true);
        let after = vp.unproject(150, 80);
        assert!((before.0 - after.0).abs() < 2.0);
        assert!((before.1 - after.1).abs() < 2.0);
        assert_eq!(vp.zoom, 1.5);
    }
}
