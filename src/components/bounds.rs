use std::fmt;

use geo::{Coord, Rect};
use shrinkwraprs::Shrinkwrap;

use crate::{
    errors::{GeocompError, Result},
    intersection::Intersection,
};

/// Pixel window of a raster read.
///
/// Defined by:
///     - `offset`: (row, col) of the top left pixel of the window,
///         with origin at the top left pixel of the raster.
///     - `shape`: (rows, cols).
///
/// In the underlying rect `x` runs along columns and `y` along rows.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq)]
pub struct PixelWindow(Rect<usize>);

impl PixelWindow {
    pub fn new(offset: (usize, usize), shape: (usize, usize)) -> Self {
        let min = Coord {
            x: offset.1,
            y: offset.0,
        };
        let max = min
            + Coord {
                x: shape.1,
                y: shape.0,
            };
        Self(Rect::new(min, max))
    }

    /// Window covering a whole raster of `shape` (rows, cols).
    pub fn full(shape: (usize, usize)) -> Self {
        Self::new((0, 0), shape)
    }

    /// (row, col) of the top left pixel.
    pub fn offset(&self) -> (usize, usize) {
        (self.0.min().y, self.0.min().x)
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.0.height(), self.0.width())
    }

    /// Number of pixels in the window.
    pub fn size(&self) -> usize {
        self.0.width() * self.0.height()
    }

    /// Checks the window lies inside a raster of `shape` (rows, cols).
    pub fn within(self, shape: (usize, usize)) -> Result<Self> {
        let out_of_range = || GeocompError::WindowOutOfRange {
            window: self.to_string(),
            shape,
        };
        let clipped = self
            .0
            .intersection(&Self::full(shape).0)
            .map_err(|_| out_of_range())?;
        if clipped != self.0 {
            return Err(out_of_range());
        }
        Ok(self)
    }

    /// Row-major positions of the window's pixels in a raster `width` pixels wide.
    pub fn positions(&self, width: usize) -> impl Iterator<Item = usize> + '_ {
        let (row_off, col_off) = self.offset();
        let (rows, cols) = self.shape();
        (row_off..row_off + rows)
            .flat_map(move |row| (col_off..col_off + cols).map(move |col| row * width + col))
    }
}

impl fmt::Display for PixelWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (row, col) = self.offset();
        let (rows, cols) = self.shape();
        write!(f, "Window(row_off={row}, col_off={col}, height={rows}, width={cols})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn offset_and_shape_are_row_major() {
        let window = PixelWindow::new((2, 3), (4, 5));
        assert_eq!(window.offset(), (2, 3));
        assert_eq!(window.shape(), (4, 5));
        assert_eq!(window.size(), 20);
    }

    #[rstest]
    #[case(PixelWindow::new((0, 0), (3, 4)))]
    #[case(PixelWindow::new((1, 1), (2, 3)))]
    fn windows_inside_raster_pass(#[case] window: PixelWindow) {
        assert_eq!(window.within((3, 4)).unwrap(), window);
    }

    #[rstest]
    #[case(PixelWindow::new((0, 0), (4, 4)))]
    #[case(PixelWindow::new((2, 3), (2, 2)))]
    #[case(PixelWindow::new((10, 10), (1, 1)))]
    fn windows_beyond_raster_fail(#[case] window: PixelWindow) {
        assert!(matches!(
            window.within((3, 4)),
            Err(GeocompError::WindowOutOfRange { shape: (3, 4), .. })
        ));
    }

    #[test]
    fn positions_walk_rows_then_columns() {
        let window = PixelWindow::new((1, 1), (2, 2));
        let positions: Vec<usize> = window.positions(4).collect();
        assert_eq!(positions, vec![5, 6, 9, 10]);
    }
}
