use std::fmt;

use geo::{AffineOps, AffineTransform, Coord, Rect};
use shrinkwraprs::Shrinkwrap;

/// Affine map from (col, row) pixel space to map coordinates.
///
/// Origin is the top left corner (`x_min`, `y_max`), hence `e` (the
/// vertical resolution) is negative for north-up rasters.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq)]
pub struct RasterTransform(AffineTransform);

impl Default for RasterTransform {
    fn default() -> Self {
        Self(AffineTransform::identity())
    }
}

impl From<AffineTransform> for RasterTransform {
    fn from(value: AffineTransform) -> Self {
        Self(value)
    }
}

impl RasterTransform {
    /// From a GDAL style geotransform
    /// `[x_min, dx, row_rotation, y_max, col_rotation, dy]`.
    pub fn from_gdal(gdal_transform: [f64; 6]) -> Self {
        Self(AffineTransform::new(
            gdal_transform[1],
            gdal_transform[2],
            gdal_transform[0],
            gdal_transform[4],
            gdal_transform[5],
            gdal_transform[3],
        ))
    }

    /// North-up transform. `dy` is expected negative.
    pub fn from_origin(x_min: f64, y_max: f64, dx: f64, dy: f64) -> Self {
        Self(AffineTransform::new(dx, 0., x_min, 0., dy, y_max))
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.0.xoff(), self.0.yoff())
    }

    /// (dx, dy)
    pub fn resolution(&self) -> (f64, f64) {
        (self.0.a(), self.0.e())
    }

    /// Map coordinates of the centre of pixel (`row`, `col`).
    pub fn xy(&self, row: usize, col: usize) -> (f64, f64) {
        self.0
            .apply(Coord {
                x: col as f64 + 0.5,
                y: row as f64 + 0.5,
            })
            .x_y()
    }

    /// (row, col) of the pixel containing (`x`, `y`).
    ///
    /// `None` for a degenerate transform or a point left of or above the origin.
    pub fn rowcol(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let pixel = self.0.inverse()?.apply(Coord { x, y });
        if pixel.x < 0. || pixel.y < 0. {
            return None;
        }
        Some((pixel.y.floor() as usize, pixel.x.floor() as usize))
    }

    /// Map extent of a raster of `shape` (rows, cols).
    pub fn bounds(&self, shape: (usize, usize)) -> Rect {
        let pixels = Rect::new(
            Coord { x: 0., y: 0. },
            Coord {
                x: shape.1 as f64,
                y: shape.0 as f64,
            },
        );
        pixels.affine_transform(&self.0)
    }
}

impl fmt::Display for RasterTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.0;
        write!(
            f,
            "Affine({:?}, {:?}, {:?},\n       {:?}, {:?}, {:?})",
            t.a(),
            t.b(),
            t.xoff(),
            t.d(),
            t.e(),
            t.yoff()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn srtm_like() -> RasterTransform {
        RasterTransform::from_origin(-113.24, 37.52, 0.01, -0.01)
    }

    #[test]
    fn gdal_order_is_translated() {
        let transform = RasterTransform::from_gdal([-113.24, 0.01, 0., 37.52, 0., -0.01]);
        assert_eq!(transform, srtm_like());
        assert_eq!(transform.origin(), (-113.24, 37.52));
        assert_eq!(transform.resolution(), (0.01, -0.01));
    }

    #[test]
    fn pixel_centres_and_back() {
        let transform = RasterTransform::from_origin(100., 200., 10., -10.);
        assert_eq!(transform.xy(0, 0), (105., 195.));
        assert_eq!(transform.xy(2, 1), (115., 175.));
        assert_eq!(transform.rowcol(115., 175.), Some((2, 1)));
        assert_eq!(transform.rowcol(99., 195.), None);
    }

    #[test]
    fn bounds_span_the_grid() {
        let transform = RasterTransform::from_origin(100., 200., 10., -10.);
        let bounds = transform.bounds((3, 4));
        assert_eq!(bounds.min(), Coord { x: 100., y: 170. });
        assert_eq!(bounds.max(), Coord { x: 140., y: 200. });
    }

    #[test]
    fn display_mirrors_affine_notation() {
        let transform = RasterTransform::from_origin(100., 200., 10., -10.);
        assert_eq!(
            transform.to_string(),
            "Affine(10.0, 0.0, 100.0,\n       0.0, -10.0, 200.0)"
        );
    }
}
