//! Intersection of DEM footprints.

use std::path::Path;

use geo::{Area, BooleanOps, MultiPolygon, Polygon};

use crate::config::FootprintConfig;
use crate::error::{FootprintError, Result};
use crate::footprint::compute_footprint;
use crate::overlay::{Emission, OverlayDocument, OverlayStyle};

pub const OVERLAP_FILE_NAME: &str = "overlap.kml";

#[derive(Debug, Clone, PartialEq)]
pub enum OverlapRegion {
    Single(Polygon<f64>),
    /// Disjoint parts, largest first.
    Disjoint(Vec<Polygon<f64>>),
}

impl OverlapRegion {
    pub fn polygons(&self) -> &[Polygon<f64>] {
        match self {
            OverlapRegion::Single(polygon) => std::slice::from_ref(polygon),
            OverlapRegion::Disjoint(polygons) => polygons,
        }
    }

    pub fn area(&self) -> f64 {
        self.polygons().iter().map(|p| p.unsigned_area()).sum()
    }

    pub fn to_document(&self, style: &OverlayStyle) -> OverlayDocument {
        let mut doc = OverlayDocument::new();
        match self {
            OverlapRegion::Single(polygon) => doc.add_polygon("Overlap", polygon, style),
            OverlapRegion::Disjoint(polygons) => {
                for (i, polygon) in polygons.iter().enumerate() {
                    doc.add_polygon(format!("Overlap {}", i + 1), polygon, style);
                }
            }
        }
        doc
    }
}

/// An empty overlap is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlapOutcome {
    NoOverlap,
    Region(OverlapRegion),
}

pub fn intersect_footprints(overlap: &MultiPolygon<f64>, footprint: &Polygon<f64>) -> MultiPolygon<f64> {
    let mut result = overlap.intersection(&MultiPolygon::new(vec![footprint.clone()]));
    result.0.retain(|p| p.unsigned_area() > 0.0);
    result
}

pub fn classify(overlap: MultiPolygon<f64>) -> OverlapOutcome {
    let mut polygons = overlap.0;
    match polygons.len() {
        0 => OverlapOutcome::NoOverlap,
        1 => OverlapOutcome::Region(OverlapRegion::Single(polygons.remove(0))),
        _ => {
            polygons.sort_by(|a, b| b.unsigned_area().total_cmp(&a.unsigned_area()));
            OverlapOutcome::Region(OverlapRegion::Disjoint(polygons))
        }
    }
}

/// Folds the footprints of `paths` into their common area.
///
/// `footprint_of` is called once per path, in order, and not at all for the
/// paths that follow an empty intersection.
pub fn overlap_with<P, F>(paths: &[P], mut footprint_of: F) -> Result<OverlapOutcome>
where
    P: AsRef<Path>,
    F: FnMut(&Path) -> Result<Option<Polygon<f64>>>,
{
    if paths.len() < 2 {
        return Err(FootprintError::InvalidArgument(
            "At least two DEM files are required.".to_string(),
        ));
    }

    let mut usable_shape = |path: &Path| -> Result<Polygon<f64>> {
        footprint_of(path)?.ok_or_else(|| FootprintError::NoUsableShape(path.to_path_buf()))
    };

    let mut overlap = MultiPolygon::new(vec![usable_shape(paths[0].as_ref())?]);

    for path in &paths[1..] {
        let shape = usable_shape(path.as_ref())?;
        overlap = intersect_footprints(&overlap, &shape);

        if overlap.0.is_empty() {
            tracing::warn!("No overlapping area found (stopped at {:?}).", path.as_ref());
            return Ok(OverlapOutcome::NoOverlap);
        }
    }

    Ok(classify(overlap))
}

/// Computes the overlap of the footprints of two or more DEMs.
pub fn compute_overlap<P: AsRef<Path>>(paths: &[P], config: &FootprintConfig) -> Result<OverlapOutcome> {
    overlap_with(paths, |path| compute_footprint(path, config))
}

/// Overlap entry point: saves `overlap.kml` into `save_dir` when given,
/// otherwise returns the document in memory. `None` means no overlap.
pub fn create_overlap<P: AsRef<Path>>(
    paths: &[P],
    save_dir: Option<&Path>,
    config: &FootprintConfig,
) -> Result<Option<Emission>> {
    let region = match compute_overlap(paths, config)? {
        OverlapOutcome::NoOverlap => return Ok(None),
        OverlapOutcome::Region(region) => region,
    };

    tracing::info!(
        "Overlap of {} DEMs: {} region(s)",
        paths.len(),
        region.polygons().len()
    );

    let doc = region.to_document(&config.overlap_style);
    let destination = save_dir.map(|dir| dir.join(OVERLAP_FILE_NAME));
    doc.emit(destination.as_deref()).map(Some)
}
