pub mod bounds;
pub mod engines;
pub mod file;
pub mod metadata;
pub mod raster;
pub mod transforms;

pub use bounds::PixelWindow;
pub use engines::{FileEngine, MemRaster, TiffFile};
pub use file::{RasterFile, RasterInfo, RasterSource};
pub use metadata::RasterMetadata;
pub use raster::{open, with_raster, RasterConnection};
pub use transforms::RasterTransform;

use num_traits::NumCast;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Debug};

use crate::errors::{GeocompError, Result};

pub type Metadata = HashMap<String, String>;

/// Numeric type raster samples can be read as.
pub trait Sample: num::Num + NumCast + Copy + PartialOrd + Debug + Send + Sync + 'static {}

impl Sample for u8 {}
impl Sample for i8 {}
impl Sample for u16 {}
impl Sample for i16 {}
impl Sample for u32 {}
impl Sample for i32 {}
impl Sample for u64 {}
impl Sample for i64 {}
impl Sample for f32 {}
impl Sample for f64 {}

/// Sample type stored in a raster file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Float32,
    Float64,
}

impl DataType {
    pub fn name(&self) -> &'static str {
        match self {
            DataType::UInt8 => "uint8",
            DataType::Int8 => "int8",
            DataType::UInt16 => "uint16",
            DataType::Int16 => "int16",
            DataType::UInt32 => "uint32",
            DataType::Int32 => "int32",
            DataType::UInt64 => "uint64",
            DataType::Int64 => "int64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
        }
    }

    pub fn size_bits(&self) -> usize {
        match self {
            DataType::UInt8 | DataType::Int8 => 8,
            DataType::UInt16 | DataType::Int16 => 16,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => 32,
            DataType::UInt64 | DataType::Int64 | DataType::Float64 => 64,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Casts every value of `source` into `target`.
///
/// Fails with [GeocompError::Uncastable] on the first value the target type
/// cannot represent.
pub(crate) fn cast_into<S, T>(source: impl IntoIterator<Item = S>, target: &mut [T]) -> Result<()>
where
    S: NumCast + Copy,
    T: Sample,
{
    for (slot, value) in target.iter_mut().zip(source) {
        *slot = <T as NumCast>::from(value).ok_or(GeocompError::Uncastable)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casts_within_range() {
        let mut target = [0u8; 3];
        cast_into([1u16, 2, 255], &mut target).unwrap();
        assert_eq!(target, [1, 2, 255]);
    }

    #[test]
    fn refuses_values_out_of_range() {
        let mut target = [0u8; 2];
        assert!(matches!(
            cast_into([1i32, -1], &mut target),
            Err(GeocompError::Uncastable)
        ));
    }

    #[test]
    fn data_type_names_follow_numpy() {
        assert_eq!(DataType::Int16.to_string(), "int16");
        assert_eq!(DataType::Float32.size_bits(), 32);
    }
}
