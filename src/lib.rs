pub mod components;
pub mod config;
mod crs_geo;
pub mod data;
mod errors;
pub mod geometry;
mod indexes;
mod intersection;
pub mod labeled;
pub mod quicklook;
pub mod vector;

pub use components::{open, with_raster, RasterConnection, RasterMetadata, RasterTransform};
pub use config::DataConfig;
pub use crs_geo::CrsGeometry;
pub use data::{ensure_sample_data, extract_archive};
pub use errors::{FormatError, GeocompError, ParseError, Result};
pub use geometry::{Geometry, GeometryKind};
pub use indexes::{BandSelection, Indexes};
pub use intersection::Intersection;
pub use labeled::{open_dataset, LabeledArray, LabeledDataset};
pub use vector::{read_file, GeometryColumn, VectorLayer};
