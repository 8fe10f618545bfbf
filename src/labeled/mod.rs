#[cfg(feature = "gdal")]
mod multidim;

use std::{fmt, path::Path};

use itertools::Itertools;
use log::info;
use ndarray::{ArrayD, Axis};
use serde::{Deserialize, Serialize};

use crate::{
    components::{Metadata, RasterConnection, RasterInfo, RasterSource},
    errors::{FormatError, GeocompError, Result},
};

const LABEL_TOLERANCE: f64 = 1e-9;

/// Coordinate label along a dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Label {
    Number(f64),
    Text(String),
}

impl Label {
    /// Exact match, numbers within a small tolerance.
    pub fn matches(&self, other: &Label) -> bool {
        match (self, other) {
            (Label::Number(a), Label::Number(b)) => (a - b).abs() <= LABEL_TOLERANCE,
            (Label::Text(a), Label::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl From<f64> for Label {
    fn from(value: f64) -> Self {
        Label::Number(value)
    }
}

impl From<i32> for Label {
    fn from(value: i32) -> Self {
        Label::Number(value.into())
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::Text(value.into())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Number(value) => write!(f, "{value}"),
            Label::Text(text) => f.write_str(text),
        }
    }
}

/// Named axis with an optional label per position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub len: usize,
    pub coords: Option<Vec<Label>>,
}

impl Dimension {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
            coords: None,
        }
    }

    pub fn with_coords(name: impl Into<String>, coords: Vec<Label>) -> Self {
        Self {
            name: name.into(),
            len: coords.len(),
            coords: Some(coords),
        }
    }
}

/// N-dimensional values with named dimensions, coordinates and attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArray {
    name: String,
    dims: Vec<Dimension>,
    values: ArrayD<f64>,
    attrs: Metadata,
}

impl LabeledArray {
    /// Fails if `dims` do not describe the shape of `values`.
    pub fn new(
        name: impl Into<String>,
        dims: Vec<Dimension>,
        values: ArrayD<f64>,
        attrs: Metadata,
    ) -> Result<Self> {
        let lens: Vec<usize> = dims.iter().map(|dim| dim.len).collect();
        let coords_agree = dims
            .iter()
            .all(|dim| dim.coords.as_ref().map_or(true, |coords| coords.len() == dim.len));
        if lens != values.shape() || !coords_agree {
            return Err(GeocompError::UnsupportedOperation(format!(
                "dimensions {lens:?} do not describe values of shape {:?}",
                values.shape()
            )));
        }
        Ok(Self {
            name: name.into(),
            dims,
            values,
            attrs,
        })
    }

    /// `(band, y, x)` view of every band of a raster, labelled by band
    /// number and pixel centre coordinates.
    pub fn from_raster<S: RasterSource>(raster: &RasterConnection<S>) -> Result<Self> {
        let (rows, cols) = raster.shape();
        let transform = raster.transform();
        let bands = (1..=raster.num_bands())
            .map(|band| Label::Number(band as f64))
            .collect();
        let ys = (0..rows)
            .map(|row| Label::Number(transform.xy(row, 0).1))
            .collect();
        let xs = (0..cols)
            .map(|col| Label::Number(transform.xy(0, col).0))
            .collect();
        let mut attrs = raster.tags();
        if let Some(crs) = raster.crs() {
            attrs.insert("crs".into(), crs);
        }
        if let Some(nodata) = raster.nodata() {
            attrs.insert("_FillValue".into(), nodata.to_string());
        }
        attrs.insert("dtype".into(), raster.data_type().to_string());
        Self::new(
            "band_data",
            vec![
                Dimension::with_coords("band", bands),
                Dimension::with_coords("y", ys),
                Dimension::with_coords("x", xs),
            ],
            raster.read::<f64>()?.into_dyn(),
            attrs,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> Vec<&str> {
        self.dims.iter().map(|dim| dim.name.as_str()).collect()
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    pub fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    pub fn attrs(&self) -> &Metadata {
        &self.attrs
    }

    fn axis(&self, dim: &str) -> Result<usize> {
        self.dims
            .iter()
            .position(|dimension| dimension.name == dim)
            .ok_or_else(|| GeocompError::DimensionNotFound(dim.into()))
    }

    /// Coordinate labels of `dim`, `None` if it has none.
    pub fn coords(&self, dim: &str) -> Result<Option<&[Label]>> {
        let axis = self.axis(dim)?;
        Ok(self.dims[axis].coords.as_deref())
    }

    /// Selects position `index` along `dim`, dropping the dimension.
    pub fn isel(&self, dim: &str, index: usize) -> Result<Self> {
        let axis = self.axis(dim)?;
        let len = self.dims[axis].len;
        if index >= len {
            return Err(GeocompError::PositionOutOfRange {
                dim: dim.into(),
                index,
                len,
            });
        }
        let values = self.values.index_axis(Axis(axis), index).to_owned();
        let dims = self
            .dims
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != axis)
            .map(|(_, dimension)| dimension.clone())
            .collect();
        Ok(Self {
            name: self.name.clone(),
            dims,
            values,
            attrs: self.attrs.clone(),
        })
    }

    /// Selects the position labelled `label` along `dim`, dropping the dimension.
    pub fn sel(&self, dim: &str, label: impl Into<Label>) -> Result<Self> {
        let label = label.into();
        let not_found = || GeocompError::LabelNotFound {
            dim: dim.into(),
            label: label.to_string(),
        };
        let index = self
            .coords(dim)?
            .ok_or_else(not_found)?
            .iter()
            .position(|candidate| candidate.matches(&label))
            .ok_or_else(not_found)?;
        self.isel(dim, index)
    }
}

fn dims_summary<'a>(dims: impl Iterator<Item = &'a Dimension>) -> String {
    dims.map(|dim| format!("{}: {}", dim.name, dim.len)).join(", ")
}

fn coords_summary(coords: &[Label]) -> String {
    if coords.len() <= 6 {
        return coords.iter().join(" ");
    }
    let head = coords[..3].iter().join(" ");
    let tail = coords[coords.len() - 3..].iter().join(" ");
    format!("{head} ... {tail}")
}

fn write_attrs(f: &mut fmt::Formatter<'_>, attrs: &Metadata) -> fmt::Result {
    if attrs.is_empty() {
        return Ok(());
    }
    write!(f, "\nAttributes:")?;
    for (key, value) in attrs.iter().sorted() {
        write!(f, "\n    {key}: {value}")?;
    }
    Ok(())
}

impl fmt::Display for LabeledArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<LabeledArray '{}' ({})>",
            self.name,
            dims_summary(self.dims.iter())
        )?;
        let labelled: Vec<&Dimension> = self
            .dims
            .iter()
            .filter(|dim| dim.coords.is_some())
            .collect();
        if !labelled.is_empty() {
            write!(f, "\nCoordinates:")?;
            for dim in labelled {
                let coords = dim.coords.as_deref().unwrap_or_default();
                write!(f, "\n  * {:<6}({}) {}", dim.name, dim.name, coords_summary(coords))?;
            }
        }
        write_attrs(f, &self.attrs)
    }
}

/// Named variables sharing dimensions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabeledDataset {
    variables: Vec<LabeledArray>,
    attrs: Metadata,
}

impl LabeledDataset {
    pub fn new(variables: Vec<LabeledArray>, attrs: Metadata) -> Self {
        Self { variables, attrs }
    }

    pub fn names(&self) -> Vec<&str> {
        self.variables.iter().map(LabeledArray::name).collect()
    }

    pub fn attrs(&self) -> &Metadata {
        &self.attrs
    }

    pub fn variable(&self, name: &str) -> Result<&LabeledArray> {
        self.variables
            .iter()
            .find(|variable| variable.name == name)
            .ok_or_else(|| GeocompError::VariableNotFound(name.into()))
    }

    /// Every dimension used by a variable, in first-seen order.
    pub fn dimensions(&self) -> Vec<&Dimension> {
        self.variables
            .iter()
            .flat_map(|variable| variable.dims.iter())
            .unique_by(|dim| dim.name.as_str())
            .collect()
    }
}

impl fmt::Display for LabeledDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<LabeledDataset>")?;
        write!(
            f,
            "\nDimensions:  ({})",
            dims_summary(self.dimensions().into_iter())
        )?;
        write!(f, "\nData variables:")?;
        for variable in &self.variables {
            write!(
                f,
                "\n    {:<8}({}) float64",
                variable.name,
                variable.dims().join(", ")
            )?;
        }
        write_attrs(f, &self.attrs)
    }
}

/// Opens a self-describing multidimensional file such as netCDF.
///
/// Needs the `gdal` feature.
pub fn open_dataset(path: impl AsRef<Path>) -> Result<LabeledDataset> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FormatError::new(path, "no such file").into());
    }
    #[cfg(feature = "gdal")]
    {
        let dataset = multidim::read(path)?;
        info!(
            "opened {} with variables {:?}",
            path.display(),
            dataset.names()
        );
        Ok(dataset)
    }
    #[cfg(not(feature = "gdal"))]
    {
        info!("cannot open {} without GDAL", path.display());
        Err(FormatError::new(path, "multidimensional formats need the gdal feature").into())
    }
}
