use std::{fmt::Debug, path::Path};

use crate::{
    components::{
        bounds::PixelWindow, transforms::RasterTransform, DataType, Metadata, Sample,
    },
    errors::Result,
};

/// Raster metadata, available without touching sample data.
#[ambassador::delegatable_trait]
pub trait RasterInfo {
    /// Short name of the format driver, e.g. `GTiff`.
    fn driver(&self) -> String;
    fn description(&self) -> String;
    /// (rows, cols)
    fn shape(&self) -> (usize, usize);
    fn num_bands(&self) -> usize;
    fn data_type(&self) -> DataType;
    fn crs(&self) -> Option<String>;
    fn transform(&self) -> RasterTransform;
    fn nodata(&self) -> Option<f64>;
    fn tags(&self) -> Metadata;
}

/// Backend able to materialize sample data.
pub trait RasterSource: RasterInfo + Debug {
    /// Reads the pixels of `window` of the zero-based `band` into `slice`,
    /// row-major.
    ///
    /// Callers validate `band` and `window`; `slice` has `window.size()` items.
    fn read_into_slice<T: Sample>(
        &self,
        band: usize,
        window: &PixelWindow,
        slice: &mut [T],
    ) -> Result<()>;
}

/// [RasterSource] that can be opened from a path.
pub trait RasterFile: RasterSource + Sized {
    fn open<P: AsRef<Path>>(path: P) -> Result<Self>;
}
