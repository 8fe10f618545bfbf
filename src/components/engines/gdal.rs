use std::{fmt, path::Path};

use gdal::{raster::GdalDataType, Dataset, Metadata as GdalMetadata, MetadataEntry};
use log::warn;

use crate::{
    components::{
        bounds::PixelWindow, cast_into, file::RasterInfo, transforms::RasterTransform,
        DataType, Metadata, RasterFile, RasterSource, Sample,
    },
    errors::{FormatError, Result},
};

/// Raster read through a GDAL dataset handle.
pub struct GdalFile(Dataset);

impl fmt::Debug for GdalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GdalFile").field(&self.description()).finish()
    }
}

fn default_domain(metadata: &impl GdalMetadata) -> Metadata {
    metadata
        .metadata()
        .filter_map(|MetadataEntry { domain, key, value }| {
            domain.is_empty().then_some((key, value))
        })
        .collect()
}

fn data_type(gdal_type: GdalDataType) -> DataType {
    match gdal_type {
        GdalDataType::UInt8 => DataType::UInt8,
        GdalDataType::Int8 => DataType::Int8,
        GdalDataType::UInt16 => DataType::UInt16,
        GdalDataType::Int16 => DataType::Int16,
        GdalDataType::UInt32 => DataType::UInt32,
        GdalDataType::Int32 => DataType::Int32,
        GdalDataType::UInt64 => DataType::UInt64,
        GdalDataType::Int64 => DataType::Int64,
        GdalDataType::Float32 => DataType::Float32,
        _ => DataType::Float64,
    }
}

impl RasterInfo for GdalFile {
    fn driver(&self) -> String {
        self.0.driver().short_name()
    }
    fn description(&self) -> String {
        self.0.description().unwrap_or_default()
    }
    fn shape(&self) -> (usize, usize) {
        let (cols, rows) = self.0.raster_size();
        (rows, cols)
    }
    fn num_bands(&self) -> usize {
        self.0.raster_count()
    }
    fn data_type(&self) -> DataType {
        self.0
            .rasterband(1)
            .map(|band| data_type(band.band_type()))
            .unwrap_or(DataType::Float64)
    }
    /// `AUTHORITY:CODE` when the reference carries one, WKT otherwise.
    fn crs(&self) -> Option<String> {
        let srs = match self.0.spatial_ref() {
            Ok(srs) => srs,
            Err(error) => {
                warn!("{} has no spatial reference: {error}", self.description());
                return None;
            }
        };
        if let (Ok(name), Ok(code)) = (srs.auth_name(), srs.auth_code()) {
            return Some(format!("{name}:{code}"));
        }
        let wkt = self.0.projection();
        (!wkt.is_empty()).then_some(wkt)
    }
    fn transform(&self) -> RasterTransform {
        self.0
            .geo_transform()
            .map(RasterTransform::from_gdal)
            .unwrap_or_default()
    }
    fn nodata(&self) -> Option<f64> {
        self.0.rasterband(1).ok()?.no_data_value()
    }
    fn tags(&self) -> Metadata {
        default_domain(&self.0)
    }
}

impl RasterSource for GdalFile {
    fn read_into_slice<T: Sample>(
        &self,
        band: usize,
        window: &PixelWindow,
        slice: &mut [T],
    ) -> Result<()> {
        let (row, col) = window.offset();
        let (rows, cols) = window.shape();
        let band = self.0.rasterband(band + 1)?;
        macro_rules! read_native {
            ($type:ty) => {{
                let buffer = band.read_as::<$type>(
                    (col as isize, row as isize),
                    (cols, rows),
                    (cols, rows),
                    None,
                )?;
                cast_into(buffer.data().iter().copied(), slice)
            }};
        }
        match band.band_type() {
            GdalDataType::UInt8 => read_native!(u8),
            GdalDataType::Int8 => read_native!(i8),
            GdalDataType::UInt16 => read_native!(u16),
            GdalDataType::Int16 => read_native!(i16),
            GdalDataType::UInt32 => read_native!(u32),
            GdalDataType::Int32 => read_native!(i32),
            GdalDataType::UInt64 => read_native!(u64),
            GdalDataType::Int64 => read_native!(i64),
            GdalDataType::Float32 => read_native!(f32),
            _ => read_native!(f64),
        }
    }
}

impl RasterFile for GdalFile {
    fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let dataset = Dataset::open(path).map_err(|error| FormatError::new(path, error))?;
        Ok(Self(dataset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::engines::tiff::tests::write_fixture;
    use tempfile::TempDir;

    #[test]
    fn reads_geotiff_in_native_type() {
        let dir = TempDir::new().unwrap();
        let file = GdalFile::open(write_fixture(&dir)).unwrap();
        assert_eq!(file.driver(), "GTiff");
        assert_eq!(file.shape(), (3, 4));
        assert_eq!(file.data_type(), DataType::UInt16);
        assert_eq!(file.crs().as_deref(), Some("EPSG:32612"));
        assert_eq!(file.nodata(), Some(0.));

        let mut slice = [0u16; 4];
        file.read_into_slice(0, &PixelWindow::new((1, 1), (2, 2)), &mut slice)
            .unwrap();
        assert_eq!(slice, [6, 7, 10, 11]);
    }

    #[test]
    fn missing_file_is_a_format_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            GdalFile::open(dir.path().join("absent.tif")),
            Err(crate::errors::GeocompError::Format(_))
        ));
    }
}
