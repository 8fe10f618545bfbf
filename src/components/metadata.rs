use std::fmt;

use serde::Serialize;

use crate::components::{file::RasterInfo, transforms::RasterTransform, DataType};

/// Everything about a raster except its sample values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterMetadata {
    pub driver: String,
    pub dtype: DataType,
    pub nodata: Option<f64>,
    pub width: usize,
    pub height: usize,
    pub count: usize,
    pub crs: Option<String>,
    #[serde(skip)]
    pub transform: RasterTransform,
}

impl RasterMetadata {
    pub fn from_info(info: &impl RasterInfo) -> Self {
        let (height, width) = info.shape();
        Self {
            driver: info.driver(),
            dtype: info.data_type(),
            nodata: info.nodata(),
            width,
            height,
            count: info.num_bands(),
            crs: info.crs(),
            transform: info.transform(),
        }
    }
}

impl fmt::Display for RasterMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodata = self
            .nodata
            .map(|value| format!("{value:?}"))
            .unwrap_or_else(|| "None".into());
        let crs = self.crs.as_deref().unwrap_or("None");
        writeln!(f, "{{'driver': '{}',", self.driver)?;
        writeln!(f, " 'dtype': '{}',", self.dtype)?;
        writeln!(f, " 'nodata': {nodata},")?;
        writeln!(f, " 'width': {},", self.width)?;
        writeln!(f, " 'height': {},", self.height)?;
        writeln!(f, " 'count': {},", self.count)?;
        writeln!(f, " 'crs': {crs},")?;
        write!(f, " 'transform': {}}}", self.transform)
    }
}
