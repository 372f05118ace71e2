use std::path::{Path, PathBuf};

use crate::config::FootprintConfig;
use crate::error::Result;
use crate::footprint::compute_footprint;
use crate::overlay::{Emission, OverlayDocument};

pub const OUTLINE_NAME: &str = "DEM Outline";

/// `<file stem>.kml` inside `dir`.
pub fn outline_file_name(dem_path: &Path, dir: &Path) -> PathBuf {
    let stem = dem_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("outline");
    dir.join(format!("{}.kml", stem))
}

/// Builds the outline overlay for one DEM.
///
/// A raster without a usable shape still yields a valid, empty document.
pub fn outline_document(path: &Path, config: &FootprintConfig) -> Result<OverlayDocument> {
    let mut doc = OverlayDocument::new();

    match compute_footprint(path, config)? {
        Some(footprint) => doc.add_polygon(OUTLINE_NAME, &footprint, &config.outline_style),
        None => tracing::warn!("{:?} did not produce a usable shape", path),
    }

    Ok(doc)
}

/// Outline entry point: saves `<file stem>.kml` into `save_dir` when given,
/// otherwise returns the document in memory.
pub fn create_outline(
    path: &Path,
    save_dir: Option<&Path>,
    config: &FootprintConfig,
) -> Result<Emission> {
    let doc = outline_document(path, config)?;
    let destination = save_dir.map(|dir| outline_file_name(path, dir));
    doc.emit(destination.as_deref())
}
