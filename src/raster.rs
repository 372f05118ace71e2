use std::path::Path;

use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};

use crate::error::{FootprintError, Result};
use crate::model::{BinaryMask, DemRaster, ElevationGrid, Georeference};

/// Reads band 1 of a DEM together with its NoData value and georeference.
///
/// `default_nodata` is used when the band does not declare a NoData value.
pub fn load_dem(path: &Path, default_nodata: f64) -> Result<DemRaster> {
    tracing::info!("Opening DEM: {:?}", path);

    let dataset = Dataset::open(path).map_err(|e| FootprintError::io(path, e))?;
    let band = dataset
        .rasterband(1)
        .map_err(|e| FootprintError::io(path, e))?;

    let (cols, rows) = dataset.raster_size();
    let nodata = band.no_data_value().unwrap_or(default_nodata);

    let buffer = band
        .read_as::<f64>((0, 0), (cols, rows), (cols, rows), None)
        .map_err(|e| FootprintError::io(path, e))?;
    let values: Vec<f64> = buffer.into_iter().collect();

    let geo_transform = dataset
        .geo_transform()
        .map_err(|e| FootprintError::io(path, e))?;

    tracing::debug!("Loaded {} x {} pixels, NoData = {}", cols, rows, nodata);

    Ok(DemRaster {
        grid: ElevationGrid {
            rows,
            cols,
            values,
            nodata,
        },
        georeference: Georeference {
            geo_transform,
            projection: dataset.projection(),
        },
    })
}

/// Copies a mask into a single-band `MEM` raster aligned with the source DEM.
pub fn mask_to_memory_raster(mask: &BinaryMask, georef: &Georeference) -> Result<Dataset> {
    let (rows, cols) = mask.shape();

    // メモリ上だけのラスタを作成
    let driver = DriverManager::get_driver_by_name("MEM")?;
    let mut dataset = driver.create_with_band_type::<u8, _>("", cols, rows, 1)?;

    // 元のDEMと位置を揃える
    dataset.set_geo_transform(&georef.geo_transform)?;
    if !georef.projection.is_empty() {
        dataset.set_projection(&georef.projection)?;
    }

    {
        let mut band = dataset.rasterband(1)?;
        let mut buffer = Buffer::new((cols, rows), mask.cells.clone());
        band.write((0, 0), (cols, rows), &mut buffer)?;
    }

    Ok(dataset)
}
