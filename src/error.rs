use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FootprintError {
    #[error("Failed to read raster {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: gdal::errors::GdalError,
    },

    #[error("Reprojection error: {reason}")]
    Reprojection { reason: String },

    #[error("{0:?} did not produce a usable shape")]
    NoUsableShape(PathBuf),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Write error: {0}")]
    Write(#[from] std::io::Error),
}

impl FootprintError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: gdal::errors::GdalError) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn reprojection(reason: impl ToString) -> Self {
        Self::Reprojection {
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FootprintError>;
