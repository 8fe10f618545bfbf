use std::cell::Cell;

use ndarray::{Array3, Axis};

use crate::{
    components::{
        bounds::PixelWindow, cast_into, file::RasterInfo, transforms::RasterTransform,
        DataType, Metadata, RasterSource, Sample,
    },
    errors::Result,
};

/// Raster held in memory as a `(band, row, col)` array.
///
/// Counts the reads served, so callers can tell when samples materialize.
#[derive(Debug, Clone)]
pub struct MemRaster {
    data: Array3<f64>,
    data_type: DataType,
    transform: RasterTransform,
    crs: Option<String>,
    nodata: Option<f64>,
    tags: Metadata,
    reads: Cell<usize>,
}

impl MemRaster {
    pub fn new(data: Array3<f64>, transform: RasterTransform) -> Self {
        Self {
            data,
            data_type: DataType::Float64,
            transform,
            crs: None,
            nodata: None,
            tags: Metadata::new(),
            reads: Cell::new(0),
        }
    }

    pub fn with_crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = Some(crs.into());
        self
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Number of band reads served so far.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl RasterInfo for MemRaster {
    fn driver(&self) -> String {
        "MEM".into()
    }
    fn description(&self) -> String {
        String::new()
    }
    fn shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.data.dim();
        (rows, cols)
    }
    fn num_bands(&self) -> usize {
        self.data.len_of(Axis(0))
    }
    fn data_type(&self) -> DataType {
        self.data_type
    }
    fn crs(&self) -> Option<String> {
        self.crs.clone()
    }
    fn transform(&self) -> RasterTransform {
        self.transform
    }
    fn nodata(&self) -> Option<f64> {
        self.nodata
    }
    fn tags(&self) -> Metadata {
        self.tags.clone()
    }
}

impl RasterSource for MemRaster {
    fn read_into_slice<T: Sample>(
        &self,
        band: usize,
        window: &PixelWindow,
        slice: &mut [T],
    ) -> Result<()> {
        self.reads.set(self.reads.get() + 1);
        let band = self.data.index_axis(Axis(0), band);
        let cols = band.ncols();
        let values = window
            .positions(cols)
            .map(|position| band[[position / cols, position % cols]]);
        cast_into(values, slice)
    }
}
