//! Basemap loading: Natural Earth GeoJSON when available, a coarse
//! built-in outline otherwise.

use crate::map::{LineString, Lod, MapRenderer};
use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;

const COASTLINE_FILES: [(&str, Lod); 4] = [
    ("ne_110m_coastline.json", Lod::Low),
    ("natural-earth.json", Lod::Medium),
    ("ne_50m_coastline.json", Lod::Medium),
    ("ne_10m_coastline.json", Lod::High),
];

const BORDER_FILES: [(&str, Lod); 3] = [
    ("ne_110m_borders.json", Lod::Low),
    ("ne_50m_borders.json", Lod::Medium),
    ("ne_10m_borders.json", Lod::High),
];

/// Load whatever basemap files exist in `data_dir`, then fall back to the
/// built-in outline if no coastline made it in. Returns the number of
/// files loaded.
pub fn load_basemap(renderer: &mut MapRenderer, data_dir: &Path) -> usize {
    let mut loaded = 0;

    if data_dir.is_dir() {
        for (filename, lod) in COASTLINE_FILES {
            let path = data_dir.join(filename);
            if !path.exists() {
                continue;
            }
            match read_lines(&path) {
                Ok(lines) => {
                    tracing::debug!(file = filename, count = lines.len(), "coastlines loaded");
                    lines.into_iter().for_each(|l| renderer.add_coastline(l, lod));
                    loaded += 1;
                }
                Err(e) => tracing::warn!(file = filename, error = %e, "skipping coastline file"),
            }
        }

        for (filename, lod) in BORDER_FILES {
            let path = data_dir.join(filename);
            if !path.exists() {
                continue;
            }
            match read_lines(&path) {
                Ok(lines) => {
                    tracing::debug!(file = filename, count = lines.len(), "borders loaded");
                    lines.into_iter().for_each(|l| renderer.add_border(l, lod));
                    loaded += 1;
                }
                Err(e) => tracing::warn!(file = filename, error = %e, "skipping border file"),
            }
        }
    } else {
        tracing::info!(dir = %data_dir.display(), "no basemap directory");
    }

    if !renderer.has_data() {
        tracing::info!("using built-in world outline");
        add_builtin_outline(renderer);
    }

    loaded
}

/// Every line-like geometry in a GeoJSON file
fn read_lines(path: &Path) -> Result<Vec<LineString>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .with_context(|| format!("parsing {}", path.display()))?;

    let mut lines = Vec::new();
    match &geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(geometry) = &feature.geometry {
                    collect_lines(geometry, &mut lines);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(geometry) = &f.geometry {
                collect_lines(geometry, &mut lines);
            }
        }
        GeoJson::Geometry(geometry) => collect_lines(geometry, &mut lines),
    }
    Ok(lines)
}

fn to_line(coords: &[Vec<f64>]) -> LineString {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| (c[0], c[1]))
        .collect()
}

fn collect_lines(geometry: &Geometry, out: &mut Vec<LineString>) {
    match &geometry.value {
        Value::LineString(coords) => out.push(to_line(coords)),
        Value::MultiLineString(lines) => out.extend(lines.iter().map(|c| to_line(c))),
        // Polygon exteriors only; holes are lakes at this resolution
        Value::Polygon(rings) => out.extend(rings.first().map(|r| to_line(r))),
        Value::MultiPolygon(polygons) => {
            out.extend(polygons.iter().filter_map(|rings| rings.first()).map(|r| to_line(r)))
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_lines(g, out);
            }
        }
        Value::Point(_) | Value::MultiPoint(_) => {}
    }
}

/// Very coarse continent outlines (lon, lat), enough to orient the markers
fn add_builtin_outline(renderer: &mut MapRenderer) {
    const OUTLINES: &[&[(f64, f64)]] = &[
        // North America
        &[
            (-165.0, 68.0), (-160.0, 58.0), (-135.0, 57.0), (-124.0, 46.0),
            (-120.0, 34.0), (-105.0, 20.0), (-87.0, 15.0), (-83.0, 9.0),
            (-77.0, 8.0), (-90.0, 20.0), (-97.0, 27.0), (-89.0, 30.0),
            (-81.0, 25.0), (-76.0, 37.0), (-66.0, 44.0), (-53.0, 47.0),
            (-62.0, 58.0), (-78.0, 62.0), (-94.0, 60.0), (-85.0, 70.0),
            (-120.0, 71.0), (-165.0, 68.0),
        ],
        // South America
        &[
            (-77.0, 8.0), (-60.0, 10.0), (-50.0, 0.0), (-35.0, -7.0),
            (-41.0, -22.0), (-53.0, -34.0), (-65.0, -45.0), (-68.0, -55.0),
            (-74.0, -50.0), (-72.0, -18.0), (-81.0, -5.0), (-77.0, 8.0),
        ],
        // Europe
        &[
            (-9.0, 37.0), (-9.0, 43.0), (-1.0, 46.0), (-4.0, 48.0),
            (4.0, 52.0), (9.0, 57.0), (5.0, 62.0), (16.0, 69.0),
            (28.0, 71.0), (40.0, 67.0), (40.0, 46.0), (29.0, 41.0),
            (24.0, 37.0), (12.0, 44.0), (3.0, 43.0), (-9.0, 37.0),
        ],
        // Africa
        &[
            (-17.0, 21.0), (-10.0, 35.0), (10.0, 37.0), (32.0, 31.0),
            (43.0, 12.0), (51.0, 11.0), (40.0, -3.0), (40.0, -15.0),
            (32.0, -28.0), (20.0, -35.0), (12.0, -17.0), (9.0, 4.0),
            (-8.0, 4.0), (-17.0, 14.0), (-17.0, 21.0),
        ],
        // Asia
        &[
            (40.0, 67.0), (70.0, 73.0), (110.0, 77.0), (150.0, 71.0),
            (180.0, 67.0), (160.0, 60.0), (141.0, 53.0), (130.0, 42.0),
            (121.0, 31.0), (110.0, 20.0), (105.0, 9.0), (100.0, 14.0),
            (98.0, 8.0), (92.0, 22.0), (80.0, 15.0), (77.0, 8.0),
            (72.0, 21.0), (57.0, 25.0), (52.0, 12.0), (43.0, 13.0),
            (35.0, 31.0), (36.0, 37.0), (29.0, 41.0), (40.0, 46.0),
            (40.0, 67.0),
        ],
        // Australia
        &[
            (114.0, -22.0), (123.0, -17.0), (131.0, -12.0), (137.0, -12.0),
            (142.0, -11.0), (146.0, -19.0), (153.0, -27.0), (150.0, -37.0),
            (141.0, -38.0), (131.0, -31.0), (115.0, -34.0), (114.0, -22.0),
        ],
    ];

    for outline in OUTLINES {
        renderer.add_coastline(outline.to_vec(), Lod::Low);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_dir_uses_builtin() {
        let mut renderer = MapRenderer::new();
        let loaded = load_basemap(&mut renderer, Path::new("/nonexistent/basemap"));
        assert_eq!(loaded, 0);
        assert!(renderer.has_data());
    }

    #[test]
    fn test_loads_coastline_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join("ne_110m_coastline.json")).unwrap();
        write!(
            file,
            r#"{{"type": "FeatureCollection", "features": [
                {{"type": "Feature", "properties": {{}}, "geometry": {{"type": "LineString", "coordinates": [[0, 0], [10, 5]]}}}},
                {{"type": "Feature", "properties": {{}}, "geometry": {{"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]], [[0.2, 0.2], [0.3, 0.2], [0.2, 0.3], [0.2, 0.2]]]}}}}
            ]}}"#
        )
        .unwrap();

        let lines = read_lines(&dir.path().join("ne_110m_coastline.json")).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], vec![(0.0, 0.0), (10.0, 5.0)]);
        assert_eq!(lines[1].len(), 4);

        let mut renderer = MapRenderer::new();
        assert_eq!(load_basemap(&mut renderer, dir.path()), 1);
        assert!(renderer.has_data());
    }

    #[test]
    fn test_bad_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ne_50m_borders.json"), "not json").unwrap();

        let mut renderer = MapRenderer::new();
        assert_eq!(load_basemap(&mut renderer, dir.path()), 0);
        assert!(renderer.has_data());
    }
}
