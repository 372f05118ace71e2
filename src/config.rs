use crate::overlay::OverlayStyle;

/// NoData値がバンドに設定されていない場合に使う値
pub const DEFAULT_NODATA: f64 = -9999.0;

/// KMLが期待する地理座標系 (WGS84)
pub const KML_EPSG: u32 = 4326;

/// Settings shared by the outline and overlap pipelines.
#[derive(Debug, Clone)]
pub struct FootprintConfig {
    /// Number of dilation passes applied to the boundary mask.
    pub dilation_iterations: u32,
    pub default_nodata: f64,
    pub target_epsg: u32,
    pub outline_style: OverlayStyle,
    pub overlap_style: OverlayStyle,
}

impl Default for FootprintConfig {
    fn default() -> Self {
        Self {
            dilation_iterations: 2,
            default_nodata: DEFAULT_NODATA,
            target_epsg: KML_EPSG,
            outline_style: OverlayStyle::outline(),
            overlap_style: OverlayStyle::overlap(),
        }
    }
}

impl FootprintConfig {
    pub fn with_dilation_iterations(mut self, iterations: u32) -> Self {
        self.dilation_iterations = iterations;
        self
    }
}
