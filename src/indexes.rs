use std::{collections::HashSet, rc::Rc};

use itertools::Itertools;

use crate::errors::{GeocompError, Result};

/// Selection of raster bands by their 1-based index.
///
/// With `drop` set, the selection names the bands to leave out.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Indexes {
    selection: Rc<[usize]>,
    drop: bool,
}

impl<const N: usize> From<([usize; N], bool)> for Indexes {
    fn from(value: ([usize; N], bool)) -> Self {
        let selection = Rc::from(value.0);
        let drop = value.1;
        Indexes { selection, drop }
    }
}

impl From<(std::ops::RangeInclusive<usize>, bool)> for Indexes {
    fn from(value: (std::ops::RangeInclusive<usize>, bool)) -> Self {
        let selection = value.0.collect();
        let drop = value.1;
        Indexes { selection, drop }
    }
}

impl<const N: usize> From<[usize; N]> for Indexes {
    fn from(value: [usize; N]) -> Self {
        Indexes {
            selection: Rc::from(value),
            drop: false,
        }
    }
}

impl From<&[usize]> for Indexes {
    fn from(value: &[usize]) -> Self {
        Indexes {
            selection: Rc::from(value),
            drop: false,
        }
    }
}

impl From<Vec<usize>> for Indexes {
    fn from(value: Vec<usize>) -> Self {
        Indexes {
            selection: Rc::from(value),
            drop: false,
        }
    }
}

impl From<std::ops::RangeInclusive<usize>> for Indexes {
    fn from(value: std::ops::RangeInclusive<usize>) -> Self {
        Indexes {
            selection: value.collect(),
            drop: false,
        }
    }
}

impl Indexes {
    pub fn all() -> Self {
        Self {
            selection: Rc::from([]),
            drop: true,
        }
    }

    /// Every band except the given ones.
    pub fn except(bands: impl Into<Indexes>) -> Self {
        Self {
            selection: bands.into().selection,
            drop: true,
        }
    }

    /// Zero-based positions of the selected bands in a raster of `count` bands.
    ///
    /// Fails if any named band is outside `1..=count`.
    pub fn positions(&self, count: usize) -> Result<Rc<[usize]>> {
        if let Some(&index) = self
            .selection
            .iter()
            .find(|&&index| index == 0 || index > count)
        {
            return Err(GeocompError::BandOutOfRange { index, count });
        }
        if self.drop {
            let drop_idxs: HashSet<usize> = self.selection.iter().map(|idx| idx - 1).collect();
            Ok(Rc::from_iter(
                HashSet::<usize>::from_iter(0..count)
                    .difference(&drop_idxs)
                    .sorted()
                    .copied(),
            ))
        } else {
            Ok(self.selection.iter().map(|idx| idx - 1).collect())
        }
    }

    pub fn select_from<T: Clone>(&self, collection: &[T]) -> Result<Box<[T]>> {
        Ok(self
            .positions(collection.len())?
            .iter()
            .map(|idx| collection[*idx].clone())
            .collect())
    }
}

/// Argument of a raster read: everything, one band, or a set of bands.
///
/// Reading a single band yields a 2D array, anything else a 3D array.
#[derive(Clone, Debug, PartialEq)]
pub enum BandSelection {
    All,
    Band(usize),
    Bands(Indexes),
}

impl From<usize> for BandSelection {
    fn from(value: usize) -> Self {
        BandSelection::Band(value)
    }
}

impl From<Indexes> for BandSelection {
    fn from(value: Indexes) -> Self {
        BandSelection::Bands(value)
    }
}

impl<const N: usize> From<[usize; N]> for BandSelection {
    fn from(value: [usize; N]) -> Self {
        BandSelection::Bands(Indexes::from(value))
    }
}

impl From<Vec<usize>> for BandSelection {
    fn from(value: Vec<usize>) -> Self {
        BandSelection::Bands(Indexes::from(value))
    }
}
