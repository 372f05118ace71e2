use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use geo::{Coord, LineString, Polygon};

use crate::error::{FootprintError, Result};

/// Maps rings from one coordinate system into another.
pub trait RingTransform {
    fn transform_ring(&self, ring: &LineString<f64>) -> Result<LineString<f64>>;

    /// Transforms a copy of `polygon`; the input is left untouched.
    fn transform_polygon(&self, polygon: &Polygon<f64>) -> Result<Polygon<f64>> {
        let exterior = self.transform_ring(polygon.exterior())?;
        let interiors = polygon
            .interiors()
            .iter()
            .map(|ring| self.transform_ring(ring))
            .collect::<Result<Vec<_>>>()?;
        Ok(Polygon::new(exterior, interiors))
    }
}

/// GDAL/PROJ transformation from a raster's CRS into a geographic target CRS.
///
/// Both ends use the traditional GIS axis order, so output coordinates are
/// always `x = longitude`, `y = latitude` regardless of the EPSG axis
/// definition.
pub struct CrsTransform {
    inner: CoordTransform,
}

impl CrsTransform {
    pub fn new(source_wkt: &str, target_epsg: u32) -> Result<Self> {
        if source_wkt.trim().is_empty() {
            return Err(FootprintError::reprojection("source raster has no CRS"));
        }

        let mut source = SpatialRef::from_wkt(source_wkt).map_err(FootprintError::reprojection)?;
        source.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);

        // KMLはEPSG:4326で表現する必要がある
        let mut target = SpatialRef::from_epsg(target_epsg).map_err(FootprintError::reprojection)?;
        target.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);

        let inner = CoordTransform::new(&source, &target).map_err(FootprintError::reprojection)?;
        Ok(Self { inner })
    }
}

impl RingTransform for CrsTransform {
    fn transform_ring(&self, ring: &LineString<f64>) -> Result<LineString<f64>> {
        let mut xs: Vec<f64> = ring.coords().map(|c| c.x).collect();
        let mut ys: Vec<f64> = ring.coords().map(|c| c.y).collect();
        let mut zs = vec![0.0; xs.len()];

        self.inner
            .transform_coords(&mut xs, &mut ys, &mut zs)
            .map_err(FootprintError::reprojection)?;

        Ok(xs
            .into_iter()
            .zip(ys)
            .map(|(x, y)| Coord { x, y })
            .collect::<Vec<_>>()
            .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utm27n_wkt() -> Option<String> {
        SpatialRef::from_epsg(32627).ok()?.to_wkt().ok()
    }

    #[test]
    fn test_malformed_crs_is_reprojection_error() {
        let result = CrsTransform::new("definitely not WKT", 4326);
        assert!(matches!(result, Err(FootprintError::Reprojection { .. })));
    }

    #[test]
    fn test_empty_crs_is_reprojection_error() {
        let result = CrsTransform::new("", 4326);
        assert!(matches!(result, Err(FootprintError::Reprojection { .. })));
    }

    #[test]
    fn test_utm_to_wgs84_is_lon_lat() {
        let Some(wkt) = utm27n_wkt() else {
            eprintln!("Skipping test: EPSG database not available");
            return;
        };
        let transform = CrsTransform::new(&wkt, 4326).unwrap();

        // UTM 27N の中央子午線は西経21度
        let ring = LineString::from(vec![(500000.0, 7100000.0), (500100.0, 7100000.0)]);
        let out = transform.transform_ring(&ring).unwrap();
        let first = out.0[0];
        assert!((first.x - -21.0).abs() < 1e-6, "longitude was {}", first.x);
        assert!(first.y > 63.0 && first.y < 65.0, "latitude was {}", first.y);
        assert!(out.0[1].x > first.x);
    }

    #[test]
    fn test_transform_polygon_keeps_original() {
        let Some(wkt) = utm27n_wkt() else {
            eprintln!("Skipping test: EPSG database not available");
            return;
        };
        let transform = CrsTransform::new(&wkt, 4326).unwrap();
        let polygon = Polygon::new(
            LineString::from(vec![
                (500000.0, 7100000.0),
                (500100.0, 7100000.0),
                (500100.0, 7100100.0),
                (500000.0, 7100000.0),
            ]),
            vec![],
        );
        let copy = polygon.clone();

        let out = transform.transform_polygon(&polygon).unwrap();
        assert_eq!(polygon, copy);
        assert_eq!(out.exterior().0.len(), polygon.exterior().0.len());
        assert!(out.exterior().coords().all(|c| c.x.abs() <= 180.0));
    }
}
