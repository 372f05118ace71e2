pub mod config;
pub mod error;
pub mod footprint;
pub mod mask;
pub mod model;
pub mod outline;
pub mod overlap;
pub mod overlay;
pub mod raster;
pub mod reproject;
pub mod trace;

pub use config::FootprintConfig;
pub use error::{FootprintError, Result};
pub use footprint::compute_footprint;
pub use model::{BinaryMask, DemRaster, ElevationGrid, Georeference, TracedPolygon};
pub use outline::create_outline;
pub use overlap::{compute_overlap, create_overlap, OverlapOutcome, OverlapRegion};
pub use overlay::{Emission, OverlayDocument, OverlayStyle};
