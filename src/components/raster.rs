use either::Either;
use geo::Rect;
use log::{debug, info};
use ndarray::{Array2, Array3, Axis};
use std::{fmt, path::Path};

use crate::{
    components::{
        bounds::PixelWindow,
        engines::FileEngine,
        file::{ambassador_impl_RasterInfo, RasterFile, RasterInfo, RasterSource},
        metadata::RasterMetadata,
        transforms::RasterTransform,
        DataType, Metadata, Sample,
    },
    crs_geo::CrsGeometry,
    errors::Result,
    indexes::{BandSelection, Indexes},
};

/// Open handle on a raster.
///
/// Opening reads metadata only, samples are materialized by the `read*`
/// calls. The underlying source is released when the connection drops.
#[derive(ambassador::Delegate)]
#[delegate(RasterInfo, target = "source")]
pub struct RasterConnection<S: RasterSource> {
    source: S,
}

impl<S: RasterSource> fmt::Debug for RasterConnection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterConnection")
            .field("driver", &self.driver())
            .field("shape", &self.shape())
            .field("count", &self.num_bands())
            .field("crs", &self.crs())
            .finish()
    }
}

impl<S: RasterSource> RasterConnection<S> {
    pub fn new(source: S) -> Self {
        let connection = Self { source };
        info!("new {connection:?}");
        connection
    }

    pub fn meta(&self) -> RasterMetadata {
        RasterMetadata::from_info(&self.source)
    }

    /// Map extent of the grid.
    pub fn bounds(&self) -> Rect {
        self.transform().bounds(self.shape())
    }

    /// Grid extent tagged with the raster CRS, if it has one.
    pub fn footprint(&self) -> Option<CrsGeometry<Rect>> {
        Some(CrsGeometry::new(self.crs()?, self.bounds()))
    }

    /// Every band as `(band, row, col)`.
    pub fn read<T: Sample>(&self) -> Result<Array3<T>> {
        self.read_window(Indexes::all(), PixelWindow::full(self.shape()))
    }

    /// Band `index` (1-based) as `(row, col)`.
    pub fn read_band<T: Sample>(&self, index: usize) -> Result<Array2<T>> {
        let stack = self.read_window([index], PixelWindow::full(self.shape()))?;
        Ok(stack.index_axis_move(Axis(0), 0))
    }

    /// Selected bands as `(band, row, col)`, in selection order.
    pub fn read_bands<T: Sample>(&self, indexes: impl Into<Indexes>) -> Result<Array3<T>> {
        self.read_window(indexes, PixelWindow::full(self.shape()))
    }

    /// A single band gives a 2D array, any other selection a 3D one.
    pub fn read_selection<T: Sample>(
        &self,
        selection: impl Into<BandSelection>,
    ) -> Result<Either<Array2<T>, Array3<T>>> {
        match selection.into() {
            BandSelection::Band(index) => self.read_band(index).map(Either::Left),
            BandSelection::Bands(indexes) => self.read_bands(indexes).map(Either::Right),
            BandSelection::All => self.read().map(Either::Right),
        }
    }

    /// Selected bands restricted to `window`.
    pub fn read_window<T: Sample>(
        &self,
        indexes: impl Into<Indexes>,
        window: PixelWindow,
    ) -> Result<Array3<T>> {
        let positions = indexes.into().positions(self.num_bands())?;
        let window = window.within(self.shape())?;
        let (rows, cols) = window.shape();
        let mut buffer = vec![T::zero(); positions.len() * window.size()];
        if window.size() > 0 {
            for (band_buffer, &band) in buffer.chunks_exact_mut(window.size()).zip(positions.iter())
            {
                debug!("reading band {} {window}", band + 1);
                self.source.read_into_slice(band, &window, band_buffer)?;
            }
        }
        Ok(Array3::from_shape_vec((positions.len(), rows, cols), buffer)?)
    }

    /// Releases the underlying source.
    pub fn close(self) {
        info!("closing {self:?}");
    }

    pub fn into_source(self) -> S {
        self.source
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<F: RasterFile> RasterConnection<F> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("opening raster {}", path.display());
        Ok(Self::new(F::open(path)?))
    }
}

/// Opens `path` with the available file backends.
pub fn open(path: impl AsRef<Path>) -> Result<RasterConnection<FileEngine>> {
    RasterConnection::<FileEngine>::open(path)
}

/// Runs `f` on the raster at `path`, releasing it afterwards.
pub fn with_raster<R>(
    path: impl AsRef<Path>,
    f: impl FnOnce(&RasterConnection<FileEngine>) -> Result<R>,
) -> Result<R> {
    let connection = open(path)?;
    f(&connection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        components::{
            engines::{tiff::tests::write_fixture, MemRaster},
            transforms::RasterTransform,
            DataType,
        },
        errors::GeocompError,
    };
    use ndarray::{s, Array3};
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn connection() -> RasterConnection<MemRaster> {
        let data = Array3::from_shape_fn((3, 4, 5), |(band, row, col)| {
            (band * 1000 + row * 10 + col) as f64
        });
        let transform = RasterTransform::from_origin(-113.24, 37.52, 0.01, -0.01);
        RasterConnection::new(MemRaster::new(data, transform).with_crs("EPSG:4326"))
    }

    #[rstest]
    fn metadata_without_reading(connection: RasterConnection<MemRaster>) {
        let meta = connection.meta();
        assert_eq!((meta.count, meta.height, meta.width), (3, 4, 5));
        assert_eq!(meta.crs.as_deref(), Some("EPSG:4326"));
        assert_eq!(connection.source().reads(), 0);
    }

    #[rstest]
    fn samples_materialize_on_read(connection: RasterConnection<MemRaster>) {
        assert_eq!(connection.source().reads(), 0);
        let band = connection.read_band::<f64>(2).unwrap();
        assert_eq!(connection.source().reads(), 1);
        assert_eq!(band.dim(), (4, 5));
        assert_eq!(band[[1, 2]], 1012.);
    }

    #[rstest]
    fn stacked_band_reads_equal_full_read(connection: RasterConnection<MemRaster>) {
        let full = connection.read::<f64>().unwrap();
        let bands: Vec<Array2<f64>> = (1..=3)
            .map(|index| connection.read_band(index).unwrap())
            .collect();
        let views: Vec<_> = bands.iter().map(|band| band.view()).collect();
        let stacked = ndarray::stack(Axis(0), &views).unwrap();
        assert_eq!(stacked, full);
    }

    #[rstest]
    #[case(0)]
    #[case(4)]
    fn band_index_out_of_range(connection: RasterConnection<MemRaster>, #[case] index: usize) {
        assert!(matches!(
            connection.read_band::<f64>(index),
            Err(GeocompError::BandOutOfRange { count: 3, .. })
        ));
    }

    #[rstest]
    fn selection_shapes(connection: RasterConnection<MemRaster>) {
        let single = connection.read_selection::<f64>(1usize).unwrap();
        assert_eq!(single.left().unwrap().dim(), (4, 5));
        let several = connection.read_selection::<f64>([3usize, 1]).unwrap();
        let several = several.right().unwrap();
        assert_eq!(several.dim(), (2, 4, 5));
        assert_eq!(several[[0, 0, 0]], 2000.);
        assert_eq!(several[[1, 0, 0]], 0.);
        let all = connection
            .read_selection::<f64>(BandSelection::All)
            .unwrap();
        assert_eq!(all.right().unwrap().dim(), (3, 4, 5));
    }

    #[rstest]
    fn window_reads(connection: RasterConnection<MemRaster>) {
        let window = PixelWindow::new((1, 2), (2, 3));
        let part = connection.read_window::<f64>([1usize, 2], window).unwrap();
        let full = connection.read::<f64>().unwrap();
        assert_eq!(part, full.slice(s![0..2, 1..3, 2..5]));

        let beyond = PixelWindow::new((3, 3), (2, 3));
        assert!(matches!(
            connection.read_window::<f64>([1usize], beyond),
            Err(GeocompError::WindowOutOfRange { .. })
        ));
    }

    #[rstest]
    fn uncastable_samples(connection: RasterConnection<MemRaster>) {
        assert!(matches!(
            connection.read_band::<u8>(3),
            Err(GeocompError::Uncastable)
        ));
        assert_eq!(connection.read_band::<u8>(1).unwrap()[[3, 4]], 34);
    }

    #[rstest]
    fn footprint_carries_crs(connection: RasterConnection<MemRaster>) {
        let footprint = connection.footprint().unwrap();
        assert_eq!(footprint.crs(), "EPSG:4326");
        let (min, max) = (footprint.min(), footprint.max());
        assert!((min.x + 113.24).abs() < 1e-9);
        assert!((max.y - 37.52).abs() < 1e-9);
        assert!((max.x + 113.19).abs() < 1e-9);
        assert!((min.y - 37.48).abs() < 1e-9);
    }

    #[test_log::test]
    fn geotiff_through_open() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir);
        let meta = with_raster(&path, |raster| Ok(raster.meta())).unwrap();
        assert_eq!(meta.dtype, DataType::UInt16);
        assert_eq!(meta.crs.as_deref(), Some("EPSG:32612"));

        let raster = open(&path).unwrap();
        let band = raster.read_band::<u16>(1).unwrap();
        assert_eq!(band.row(2).to_vec(), vec![9, 10, 11, 12]);
        raster.close();
    }

    #[test]
    fn missing_raster_is_a_format_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            open(dir.path().join("absent.tif")),
            Err(GeocompError::Format(_))
        ));
    }
}
