use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, GeocompError>;

/// Source could not be opened or decoded as the expected format.
#[derive(thiserror::Error, Debug)]
#[error("could not read {}: {reason}", path.display())]
pub struct FormatError {
    pub path: PathBuf,
    pub reason: String,
}

impl FormatError {
    pub fn new(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Textual geometry could not be turned into a geometry value.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("malformed WKT: {0}")]
    Malformed(String),
    #[error("unsupported geometry kind: {0}")]
    UnsupportedKind(String),
}

#[derive(thiserror::Error, Debug)]
pub enum GeocompError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("band {index} is out of range, raster has {count} band(s)")]
    BandOutOfRange { index: usize, count: usize },
    #[error("row {index} is out of range, layer has {len} row(s)")]
    RowOutOfRange { index: usize, len: usize },
    #[error("position {index} is out of range for dimension {dim} of length {len}")]
    PositionOutOfRange {
        dim: String,
        index: usize,
        len: usize,
    },
    #[error("window {window} exceeds raster of shape {shape:?}")]
    WindowOutOfRange {
        window: String,
        shape: (usize, usize),
    },
    #[error("column {column} holds {expected} values, found {found}")]
    ValueTypeMismatch {
        column: String,
        expected: String,
        found: String,
    },
    #[error("column {0} not found")]
    ColumnNotFound(String),
    #[error("variable {0} not found")]
    VariableNotFound(String),
    #[error("dimension {0} not found")]
    DimensionNotFound(String),
    #[error("label {label} not found in dimension {dim}")]
    LabelNotFound { dim: String, label: String },
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("Value could not be cast")]
    Uncastable,
    #[error("There is no intersection between geometries")]
    NoIntersection,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    NdarrayError(#[from] ndarray::ShapeError),
    #[error(transparent)]
    ZipError(#[from] zip::result::ZipError),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
    #[cfg(feature = "gdal")]
    #[error(transparent)]
    GdalError(#[from] gdal::errors::GdalError),
    #[cfg(feature = "proj")]
    #[error(transparent)]
    ProjError(#[from] proj::ProjError),
    #[cfg(feature = "proj")]
    #[error(transparent)]
    ProjCreateError(#[from] proj::ProjCreateError),
    #[cfg(feature = "download")]
    #[error(transparent)]
    HttpError(#[from] reqwest::Error),
}
