use itertools::Itertools;
use rayon::prelude::*;
use shrinkwraprs::Shrinkwrap;

use crate::{
    errors::{GeocompError, Result},
    geometry::{Geometry, GeometryKind},
};

/// The geometry column of a layer, one geometry per row.
#[derive(Shrinkwrap, Debug, Clone, PartialEq, Default)]
pub struct GeometryColumn(Vec<Geometry>);

impl From<Vec<Geometry>> for GeometryColumn {
    fn from(value: Vec<Geometry>) -> Self {
        Self(value)
    }
}

impl FromIterator<Geometry> for GeometryColumn {
    fn from_iter<I: IntoIterator<Item = Geometry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for GeometryColumn {
    type Item = Geometry;
    type IntoIter = std::vec::IntoIter<Geometry>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl GeometryColumn {
    /// Geometry at position `i`, whatever the row labels.
    pub fn iloc(&self, i: usize) -> Result<&Geometry> {
        self.0.get(i).ok_or(GeocompError::RowOutOfRange {
            index: i,
            len: self.0.len(),
        })
    }

    /// `(minx, miny, maxx, maxy)` of every row, `None` for empty geometries.
    pub fn bounds(&self) -> Vec<Option<(f64, f64, f64, f64)>> {
        self.0.iter().map(Geometry::bounds).collect()
    }

    pub fn geom_types(&self) -> Vec<GeometryKind> {
        self.0.iter().map(Geometry::kind).collect()
    }

    /// Rows per geometry kind, most frequent first.
    pub fn value_counts(&self) -> Vec<(GeometryKind, usize)> {
        self.0
            .iter()
            .map(Geometry::kind)
            .counts()
            .into_iter()
            .sorted_by(|(kind_a, count_a), (kind_b, count_b)| {
                count_b
                    .cmp(count_a)
                    .then_with(|| kind_a.as_str().cmp(kind_b.as_str()))
            })
            .collect()
    }

    /// Union of the row bounds, `None` if every geometry is empty.
    pub fn total_bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.0
            .iter()
            .filter_map(Geometry::bounds)
            .reduce(|(minx, miny, maxx, maxy), (x0, y0, x1, y1)| {
                (minx.min(x0), miny.min(y0), maxx.max(x1), maxy.max(y1))
            })
    }

    /// Buffers every row by `distance`.
    pub fn buffer(&self, distance: f64) -> GeometryColumn {
        Self(
            self.0
                .par_iter()
                .map(|geometry| geometry.buffer(distance))
                .collect(),
        )
    }

    pub(crate) fn take(&self, positions: &[usize]) -> Self {
        Self(positions.iter().map(|&i| self.0[i].clone()).collect())
    }
}
