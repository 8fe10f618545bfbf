use std::{
    cell::{Cell, RefCell},
    fmt,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use tiff::{
    decoder::{ifd::Value, Decoder, DecodingResult},
    tags::Tag,
    TiffError, TiffResult,
};

use crate::{
    components::{
        bounds::PixelWindow, cast_into, file::RasterInfo, transforms::RasterTransform,
        DataType, Metadata, RasterFile, RasterSource, Sample,
    },
    errors::{FormatError, Result},
};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const PROJECTED_CRS_KEY: u16 = 3072;
const GEOGRAPHIC_CRS_KEY: u16 = 2048;

/// GeoTIFF read with the pure Rust `tiff` decoder.
///
/// Header and geo tags are read on open. Band reads decode only the strips
/// or tiles their window overlaps.
/// Only the first image of the file is used.
pub struct TiffFile {
    path: PathBuf,
    shape: (usize, usize),
    num_bands: usize,
    data_type: DataType,
    transform: RasterTransform,
    crs: Option<String>,
    nodata: Option<f64>,
    tags: Metadata,
    decoder: RefCell<Decoder<BufReader<File>>>,
    chunks_decoded: Cell<usize>,
}

impl fmt::Debug for TiffFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiffFile")
            .field("path", &self.path)
            .field("shape", &self.shape)
            .field("num_bands", &self.num_bands)
            .field("data_type", &self.data_type)
            .field("crs", &self.crs)
            .finish_non_exhaustive()
    }
}

fn geo_tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

fn data_type(sample_format: u32, bits: u32) -> Option<DataType> {
    let data_type = match (sample_format, bits) {
        (1, 8) => DataType::UInt8,
        (1, 16) => DataType::UInt16,
        (1, 32) => DataType::UInt32,
        (1, 64) => DataType::UInt64,
        (2, 8) => DataType::Int8,
        (2, 16) => DataType::Int16,
        (2, 32) => DataType::Int32,
        (2, 64) => DataType::Int64,
        (3, 32) => DataType::Float32,
        (3, 64) => DataType::Float64,
        _ => return None,
    };
    Some(data_type)
}

/// Transform from either the full model transformation or
/// a pixel scale and a tiepoint.
fn geo_transform(decoder: &mut Decoder<BufReader<File>>) -> TiffResult<RasterTransform> {
    if let Some(matrix) = decoder.find_tag(geo_tag(MODEL_TRANSFORMATION))? {
        let m = matrix.into_f64_vec()?;
        if m.len() >= 8 {
            return Ok(RasterTransform::from_gdal([m[3], m[0], m[1], m[7], m[4], m[5]]));
        }
    }
    let scale = decoder.find_tag(geo_tag(MODEL_PIXEL_SCALE))?;
    let tiepoint = decoder.find_tag(geo_tag(MODEL_TIEPOINT))?;
    match (scale, tiepoint) {
        (Some(scale), Some(tiepoint)) => {
            let scale = scale.into_f64_vec()?;
            let tiepoint = tiepoint.into_f64_vec()?;
            if scale.len() < 2 || tiepoint.len() < 5 {
                return Ok(RasterTransform::default());
            }
            let (dx, dy) = (scale[0], scale[1]);
            let (col, row, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
            Ok(RasterTransform::from_origin(
                x - col * dx,
                y + row * dy,
                dx,
                -dy,
            ))
        }
        _ => Ok(RasterTransform::default()),
    }
}

/// EPSG code from the geo key directory, projected before geographic.
fn geo_crs(decoder: &mut Decoder<BufReader<File>>) -> TiffResult<Option<String>> {
    let Some(directory) = decoder.find_tag(geo_tag(GEO_KEY_DIRECTORY))? else {
        return Ok(None);
    };
    let keys = directory.into_u16_vec()?;
    let entries: Vec<&[u16]> = keys.chunks_exact(4).skip(1).collect();
    let code = [PROJECTED_CRS_KEY, GEOGRAPHIC_CRS_KEY].iter().find_map(|key| {
        entries
            .iter()
            .find(|entry| entry[0] == *key && entry[1] == 0)
            .map(|entry| entry[3])
    });
    Ok(code.map(|code| format!("EPSG:{code}")))
}

fn nodata(decoder: &mut Decoder<BufReader<File>>) -> TiffResult<Option<String>> {
    let Some(value) = decoder.find_tag(geo_tag(GDAL_NODATA))? else {
        return Ok(None);
    };
    let text = value.into_string()?;
    Ok(Some(
        text.trim_matches(|c: char| c == '\0' || c.is_whitespace())
            .to_string(),
    ))
}

/// Casts the samples of a decoded chunk at `positions` into `target`.
fn cast_samples<T: Sample>(
    data: &DecodingResult,
    positions: impl Iterator<Item = usize>,
    target: &mut [T],
) -> Result<()> {
    macro_rules! cast {
        ($values:expr) => {
            cast_into(positions.map(|position| $values[position]), target)
        };
    }
    match data {
        DecodingResult::U8(values) => cast!(values),
        DecodingResult::U16(values) => cast!(values),
        DecodingResult::U32(values) => cast!(values),
        DecodingResult::U64(values) => cast!(values),
        DecodingResult::I8(values) => cast!(values),
        DecodingResult::I16(values) => cast!(values),
        DecodingResult::I32(values) => cast!(values),
        DecodingResult::I64(values) => cast!(values),
        DecodingResult::F32(values) => cast!(values),
        DecodingResult::F64(values) => cast!(values),
    }
}

fn first_u32(value: Option<Value>) -> TiffResult<Option<u32>> {
    Ok(value
        .map(|value| value.into_u32_vec())
        .transpose()?
        .and_then(|values| values.first().copied()))
}

/// Raw header fields, validated by [TiffFile::open].
struct Header {
    shape: (usize, usize),
    samples_per_pixel: u32,
    bits: u32,
    sample_format: u32,
    planar: u32,
    transform: RasterTransform,
    crs: Option<String>,
    nodata: Option<String>,
    tags: Metadata,
    decoder: Decoder<BufReader<File>>,
}

impl Header {
    fn decode(path: &Path) -> TiffResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut decoder = Decoder::new(reader)?;
        let (width, height) = decoder.dimensions()?;

        let samples_per_pixel = first_u32(decoder.find_tag(Tag::SamplesPerPixel)?)?.unwrap_or(1);
        let bits = first_u32(decoder.find_tag(Tag::BitsPerSample)?)?.unwrap_or(8);
        let sample_format = first_u32(decoder.find_tag(Tag::SampleFormat)?)?.unwrap_or(1);
        let planar = first_u32(decoder.find_tag(Tag::PlanarConfiguration)?)?.unwrap_or(1);

        let transform = geo_transform(&mut decoder)?;
        let crs = geo_crs(&mut decoder)?;
        let nodata = nodata(&mut decoder)?;

        let mut tags = Metadata::new();
        if let Some(description) = decoder.find_tag(Tag::ImageDescription)? {
            tags.insert("TIFFTAG_IMAGEDESCRIPTION".into(), description.into_string()?);
        }
        if let Some(software) = decoder.find_tag(Tag::Software)? {
            tags.insert("TIFFTAG_SOFTWARE".into(), software.into_string()?);
        }

        Ok(Self {
            shape: (height as usize, width as usize),
            samples_per_pixel,
            bits,
            sample_format,
            planar,
            transform,
            crs,
            nodata,
            tags,
            decoder,
        })
    }
}

impl TiffFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of strips or tiles decoded so far.
    pub fn chunks_decoded(&self) -> usize {
        self.chunks_decoded.get()
    }

    fn read_header(path: &Path) -> Result<Self> {
        let header = Header::decode(path).map_err(|error| FormatError::new(path, error))?;
        if header.planar != 1 {
            return Err(FormatError::new(path, "planar sample layout is not supported").into());
        }
        let data_type = data_type(header.sample_format, header.bits).ok_or_else(|| {
            FormatError::new(
                path,
                format!(
                    "unsupported sample format {} with {} bits",
                    header.sample_format, header.bits
                ),
            )
        })?;
        if header.crs.is_none() {
            warn!("{} carries no EPSG geo key", path.display());
        }
        let nodata = header.nodata.and_then(|text| match text.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("{} has an unreadable nodata value {text:?}", path.display());
                None
            }
        });
        Ok(Self {
            path: path.to_path_buf(),
            shape: header.shape,
            num_bands: header.samples_per_pixel as usize,
            data_type,
            transform: header.transform,
            crs: header.crs,
            nodata,
            tags: header.tags,
            decoder: RefCell::new(header.decoder),
            chunks_decoded: Cell::new(0),
        })
    }

    /// Decodes the strips or tiles overlapping `window`, one at a time,
    /// keeping their native sample type until the cast into `slice`.
    fn read_chunks<T: Sample>(
        &self,
        band: usize,
        window: &PixelWindow,
        slice: &mut [T],
    ) -> Result<()> {
        let (row_off, col_off) = window.offset();
        let (rows, cols) = window.shape();
        if rows == 0 || cols == 0 {
            return Ok(());
        }
        let format_error = |error: TiffError| FormatError::new(&self.path, error);
        let mut decoder = self.decoder.borrow_mut();
        let (chunk_cols, chunk_rows) = decoder.chunk_dimensions();
        let (chunk_cols, chunk_rows) = (chunk_cols as usize, chunk_rows as usize);
        if chunk_cols == 0 || chunk_rows == 0 {
            return Err(FormatError::new(&self.path, "empty strip or tile size").into());
        }
        let across = self.shape.1.div_ceil(chunk_cols);

        for chunk_row in row_off / chunk_rows..=(row_off + rows - 1) / chunk_rows {
            for chunk_col in col_off / chunk_cols..=(col_off + cols - 1) / chunk_cols {
                let index = u32::try_from(chunk_row * across + chunk_col)
                    .map_err(|_| FormatError::new(&self.path, "chunk index overflow"))?;
                let data = decoder.read_chunk(index).map_err(format_error)?;
                self.chunks_decoded.set(self.chunks_decoded.get() + 1);
                let data_cols = decoder.chunk_data_dimensions(index).0 as usize;

                let (top, left) = (chunk_row * chunk_rows, chunk_col * chunk_cols);
                let (first_row, last_row) =
                    (top.max(row_off), (top + chunk_rows).min(row_off + rows));
                let (first_col, last_col) =
                    (left.max(col_off), (left + chunk_cols).min(col_off + cols));
                for row in first_row..last_row {
                    let start = (row - row_off) * cols + first_col - col_off;
                    let positions = (first_col..last_col).map(|col| {
                        ((row - top) * data_cols + col - left) * self.num_bands + band
                    });
                    let target = &mut slice[start..start + last_col - first_col];
                    cast_samples(&data, positions, target)?;
                }
            }
        }
        debug!("read band {band} window {window} from {}", self.path.display());
        Ok(())
    }
}

impl RasterInfo for TiffFile {
    fn driver(&self) -> String {
        "GTiff".into()
    }
    fn description(&self) -> String {
        self.path.display().to_string()
    }
    fn shape(&self) -> (usize, usize) {
        self.shape
    }
    fn num_bands(&self) -> usize {
        self.num_bands
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

impl RasterSource for TiffFile {
    fn read_into_slice<T: Sample>(
        &self,
        band: usize,
        window: &PixelWindow,
        slice: &mut [T],
    ) -> Result<()> {
        self.read_chunks(band, window, slice)
    }
}

impl RasterFile for TiffFile {
    fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::read_header(path.as_ref())
    }
}
