use std::path::Path;

use geo::{Area, Polygon};

use crate::config::FootprintConfig;
use crate::error::Result;
use crate::mask::extract_edge_mask;
use crate::model::TracedPolygon;
use crate::raster::{load_dem, mask_to_memory_raster};
use crate::reproject::{CrsTransform, RingTransform};
use crate::trace::polygonize_mask;

/// Reprojects every traced polygon and keeps the one with the largest area.
///
/// Ties keep the polygon seen first, and polygons without area are never
/// selected. The traced inputs are not modified.
pub fn find_largest_polygon<T: RingTransform>(
    polygons: &[TracedPolygon],
    transform: &T,
) -> Result<Option<TracedPolygon>> {
    let mut largest: Option<(f64, TracedPolygon)> = None;

    for traced in polygons {
        let geometry = transform.transform_polygon(&traced.geometry)?;
        let area = geometry.unsigned_area();
        let best_area = largest.as_ref().map_or(0.0, |(a, _)| *a);
        if area > best_area {
            largest = Some((
                area,
                TracedPolygon {
                    geometry,
                    ..traced.clone()
                },
            ));
        }
    }

    Ok(largest.map(|(_, polygon)| polygon))
}

/// The filled outer boundary of a traced polygon.
pub fn footprint_polygon(traced: &TracedPolygon) -> Polygon<f64> {
    Polygon::new(traced.geometry.exterior().clone(), vec![])
}

/// Computes the footprint of one DEM in the configured geographic CRS.
///
/// Returns `None` when the raster yields no polygon with area.
pub fn compute_footprint(path: &Path, config: &FootprintConfig) -> Result<Option<Polygon<f64>>> {
    let dem = load_dem(path, config.default_nodata)?;

    // 0: NoData, 1: 有効値 のマスクから境界を抽出
    let edge_mask = extract_edge_mask(&dem.grid, config.dilation_iterations);
    let mask_ds = mask_to_memory_raster(&edge_mask, &dem.georeference)?;
    let traced = polygonize_mask(&mask_ds)?;

    let transform = CrsTransform::new(&dem.georeference.projection, config.target_epsg)?;
    let largest = find_largest_polygon(&traced, &transform)?;

    match &largest {
        Some(polygon) => tracing::debug!(
            "Selected polygon {} of {} for {:?}",
            polygon.id,
            traced.len(),
            path
        ),
        None => tracing::warn!("No polygon found for {:?}", path),
    }

    Ok(largest.as_ref().map(footprint_polygon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, LineString};

    /// 座標を定数倍するだけの変換
    struct Scale(f64);

    impl RingTransform for Scale {
        fn transform_ring(&self, ring: &LineString<f64>) -> Result<LineString<f64>> {
            Ok(ring
                .coords()
                .map(|c| Coord {
                    x: c.x * self.0,
                    y: c.y * self.0,
                })
                .collect::<Vec<_>>()
                .into())
        }
    }

    fn rect(id: u32, x0: f64, y0: f64, x1: f64, y1: f64) -> TracedPolygon {
        TracedPolygon {
            id,
            value: 1,
            geometry: Polygon::new(
                LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)]),
                vec![],
            ),
        }
    }

    #[test]
    fn test_empty_input_gives_none() {
        let largest = find_largest_polygon(&[], &Scale(1.0)).unwrap();
        assert!(largest.is_none());
    }

    #[test]
    fn test_picks_largest_after_transform() {
        let polygons = vec![
            rect(1, 0.0, 0.0, 1.0, 1.0),
            rect(2, 0.0, 0.0, 10.0, 5.0),
            rect(3, 0.0, 0.0, 2.0, 2.0),
        ];
        let largest = find_largest_polygon(&polygons, &Scale(2.0)).unwrap().unwrap();
        assert_eq!(largest.id, 2);
        assert!((largest.geometry.unsigned_area() - 200.0).abs() < 1e-9);
        // 入力は変更されない
        assert!((polygons[1].geometry.unsigned_area() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_ties_keep_first() {
        let polygons = vec![rect(7, 0.0, 0.0, 2.0, 2.0), rect(8, 5.0, 5.0, 7.0, 7.0)];
        let largest = find_largest_polygon(&polygons, &Scale(1.0)).unwrap().unwrap();
        assert_eq!(largest.id, 7);
    }

    #[test]
    fn test_selection_is_idempotent() {
        let polygons = vec![rect(1, 0.0, 0.0, 3.0, 1.0), rect(2, 0.0, 0.0, 1.0, 4.0)];
        let first = find_largest_polygon(&polygons, &Scale(0.5)).unwrap();
        let second = find_largest_polygon(&polygons, &Scale(0.5)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_area_polygon_is_not_selected() {
        let polygons = vec![rect(1, 0.0, 0.0, 0.0, 5.0)];
        assert!(find_largest_polygon(&polygons, &Scale(1.0)).unwrap().is_none());
    }

    #[test]
    fn test_footprint_drops_holes() {
        let traced = TracedPolygon {
            id: 1,
            value: 1,
            geometry: Polygon::new(
                LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]),
                vec![LineString::from(vec![(1.0, 1.0), (1.0, 3.0), (3.0, 3.0), (3.0, 1.0)])],
            ),
        };
        let footprint = footprint_polygon(&traced);
        assert!(footprint.interiors().is_empty());
        assert!((footprint.unsigned_area() - 16.0).abs() < 1e-9);
        assert_eq!(footprint.exterior().0.first(), footprint.exterior().0.last());
    }
}
