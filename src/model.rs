use geo::{Coord, Polygon};

/// Elevation values of a single band, row-major, plus the band's NoData sentinel.
#[derive(Debug, Clone)]
pub struct ElevationGrid {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f64>,
    pub nodata: f64,
}

impl ElevationGrid {
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_nodata(&self, value: f64) -> bool {
        if self.nodata.is_nan() {
            value.is_nan()
        } else {
            value == self.nodata
        }
    }
}

/// Affine pixel-to-world transform and the WKT of the source CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct Georeference {
    pub geo_transform: [f64; 6],
    pub projection: String,
}

impl Georeference {
    /// ピクセル角 (col, row) をワールド座標に変換
    pub fn pixel_to_world(&self, col: f64, row: f64) -> Coord<f64> {
        let gt = &self.geo_transform;
        Coord {
            x: gt[0] + col * gt[1] + row * gt[2],
            y: gt[3] + col * gt[4] + row * gt[5],
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemRaster {
    pub grid: ElevationGrid,
    pub georeference: Georeference,
}

/// 0/1 mask with the same shape as the grid it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<u8>,
}

impl BinaryMask {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![0; rows * cols],
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// 範囲外は 0 として扱う
    pub fn get(&self, row: isize, col: isize) -> u8 {
        if row < 0 || col < 0 || row as usize >= self.rows || col as usize >= self.cols {
            return 0;
        }
        self.cells[row as usize * self.cols + col as usize]
    }

    pub fn count_set(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }
}

/// A vectorized region of equal-valued pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedPolygon {
    pub id: u32,
    pub value: u8,
    pub geometry: Polygon<f64>,
}
