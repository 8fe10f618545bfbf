use std::path::Path;

use image::{GrayImage, ImageFormat, Luma};
use itertools::{Itertools, MinMaxResult};
use ndarray::Array2;

use crate::{components::Sample, errors::Result};

/// Grayscale preview of a band, stretched linearly between its minimum and
/// maximum. Nodata and NaN pixels are black.
pub fn render_band<T: Sample>(band: &Array2<T>, nodata: Option<f64>) -> GrayImage {
    let valid = |value: &T| {
        value
            .to_f64()
            .filter(|value| value.is_finite() && Some(*value) != nodata)
    };
    let (min, max) = match band.iter().filter_map(valid).minmax_by(f64::total_cmp) {
        MinMaxResult::NoElements => (0., 0.),
        MinMaxResult::OneElement(value) => (value, value),
        MinMaxResult::MinMax(min, max) => (min, max),
    };
    let scale = if max > min { 255. / (max - min) } else { 0. };
    let (rows, cols) = band.dim();
    GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        let level = valid(&band[[y as usize, x as usize]])
            .map(|value| ((value - min) * scale).round() as u8)
            .unwrap_or(0);
        Luma([level])
    })
}

pub fn save_png(image: &GrayImage, path: impl AsRef<Path>) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
