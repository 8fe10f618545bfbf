#[cfg(feature = "gdal")]
pub mod gdal;
pub mod memory;
pub mod tiff;

use std::path::Path;

use log::debug;

#[cfg(feature = "gdal")]
use self::gdal::GdalFile;
pub use self::{memory::MemRaster, tiff::TiffFile};
use crate::{
    components::{
        bounds::PixelWindow, file::RasterInfo, transforms::RasterTransform, DataType, Metadata,
        RasterFile, RasterSource, Sample,
    },
    errors::Result,
};
#[cfg(not(feature = "gdal"))]
use crate::errors::FormatError;

/// Raster file backend picked when a path is opened.
#[derive(Debug)]
pub enum FileEngine {
    Tiff(TiffFile),
    #[cfg(feature = "gdal")]
    Gdal(GdalFile),
}

macro_rules! dispatch {
    ($engine:expr, $file:ident => $call:expr) => {
        match $engine {
            FileEngine::Tiff($file) => $call,
            #[cfg(feature = "gdal")]
            FileEngine::Gdal($file) => $call,
        }
    };
}

impl RasterInfo for FileEngine {
    fn driver(&self) -> String {
        dispatch!(self, file => file.driver())
    }
    fn description(&self) -> String {
        dispatch!(self, file => file.description())
    }
    fn shape(&self) -> (usize, usize) {
        dispatch!(self, file => file.shape())
    }
    fn num_bands(&self) -> usize {
        dispatch!(self, file => file.num_bands())
    }
    fn data_type(&self) -> DataType {
        dispatch!(self, file => file.data_type())
    }
    fn crs(&self) -> Option<String> {
        dispatch!(self, file => file.crs())
    }
    fn transform(&self) -> RasterTransform {
        dispatch!(self, file => file.transform())
    }
    fn nodata(&self) -> Option<f64> {
        dispatch!(self, file => file.nodata())
    }
    fn tags(&self) -> Metadata {
        dispatch!(self, file => file.tags())
    }
}

impl RasterSource for FileEngine {
    fn read_into_slice<T: Sample>(
        &self,
        band: usize,
        window: &PixelWindow,
        slice: &mut [T],
    ) -> Result<()> {
        dispatch!(self, file => file.read_into_slice(band, window, slice))
    }
}

#[cfg_attr(feature = "gdal", allow(dead_code))]
fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            extension.eq_ignore_ascii_case("tif") || extension.eq_ignore_ascii_case("tiff")
        })
}

impl RasterFile for FileEngine {
    /// GDAL opens every path when available, otherwise only GeoTIFF is read.
    fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        #[cfg(feature = "gdal")]
        {
            debug!("opening {} with GDAL", path.display());
            Ok(FileEngine::Gdal(GdalFile::open(path)?))
        }
        #[cfg(not(feature = "gdal"))]
        {
            if !is_tiff(path) {
                return Err(FormatError::new(path, "not a GeoTIFF, enable the gdal feature").into());
            }
            debug!("opening {} with the tiff decoder", path.display());
            Ok(FileEngine::Tiff(TiffFile::open(path)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_tiff_extensions() {
        assert!(is_tiff(Path::new("data/srtm.tif")));
        assert!(is_tiff(Path::new("LANDSAT.TIFF")));
        assert!(!is_tiff(Path::new("world.gpkg")));
    }
}
