use std::collections::HashMap;

use crate::geo::fast_distance_km;

const KM_PER_DEGREE: f64 = 111.0;

/// Uniform lon/lat grid for point lookups (marker under the cursor)
pub struct SpatialGrid<T> {
    cells: HashMap<(i32, i32), Vec<usize>>,
    items: Vec<(f64, f64, T)>,
    /// Cell size in degrees
    cell_size: f64,
}

impl<T> SpatialGrid<T> {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            items: Vec::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        (
            (lon / self.cell_size).floor() as i32,
            (lat / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, lon: f64, lat: f64, item: T) {
        let idx = self.items.len();
        self.items.push((lon, lat, item));
        let cell = self.to_cell(lon, lat);
        self.cells.entry(cell).or_default().push(idx);
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Indices of items in the cells overlapping a radius around a point.
    /// Conservative: may include items slightly outside the radius.
    pub fn query_radius(&self, lon: f64, lat: f64, radius_km: f64) -> Vec<usize> {
        let center = self.to_cell(lon, lat);
        let cos_lat = lat.to_radians().cos().max(0.05);
        let reach_lat = (radius_km / KM_PER_DEGREE / self.cell_size).ceil() as i32;
        let reach_lon = (radius_km / (KM_PER_DEGREE * cos_lat) / self.cell_size).ceil() as i32;

        let mut results = Vec::new();
        for dy in -reach_lat..=reach_lat {
            for dx in -reach_lon..=reach_lon {
                if let Some(indices) = self.cells.get(&(center.0 + dx, center.1 + dy)) {
                    results.extend_from_slice(indices);
                }
            }
        }
        results
    }

    /// Closest item within `radius_km`, if any
    pub fn nearest(&self, lon: f64, lat: f64, radius_km: f64) -> Option<&T> {
        self.query_radius(lon, lat, radius_km)
            .into_iter()
            .filter_map(|idx| self.items.get(idx))
            .map(|(ilon, ilat, item)| (fast_distance_km(lon, lat, *ilon, *ilat), item))
            .filter(|(dist, _)| *dist <= radius_km)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, item)| item)
    }
}
