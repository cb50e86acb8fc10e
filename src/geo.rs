//! Small geographic helpers shared by the viewport and marker lookup.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Wrap longitude into [-180, 180)
#[inline(always)]
pub fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Keep latitude inside the range Web Mercator can show
#[inline(always)]
pub fn clamp_lat(lat: f64) -> f64 {
    lat.clamp(-85.0, 85.0)
}

/// Equirectangular distance approximation in kilometers.
/// Accurate enough to pick the nearest marker under the cursor.
#[inline(always)]
pub fn fast_distance_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = wrap_lon(lon2 - lon1).to_radians();
    let cos_lat = ((lat1 + lat2) * 0.5).to_radians().cos();

    let dx = dlon * cos_lat;
    EARTH_RADIUS_KM * (dx * dx + dlat * dlat).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_lon() {
        assert_eq!(wrap_lon(190.0), -170.0);
        assert_eq!(wrap_lon(-190.0), 170.0);
        assert_eq!(wrap_lon(42.5), 42.5);
    }

    #[test]
    fn test_distance_across_antimeridian() {
        let near = fast_distance_km(179.5, 0.0, -179.5, 0.0);
        assert!(near < 120.0, "got {near}");
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let d = fast_distance_km(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111.2).abs() < 0.5, "got {d}");
    }
}
