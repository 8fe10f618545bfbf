use std::path::Path;

use gdal::{cpl::CslStringList, Dataset, DatasetOptions, GdalOpenFlags};
use ndarray::{ArrayD, IxDyn};

use crate::{
    components::Metadata,
    errors::{FormatError, Result},
    labeled::{Dimension, Label, LabeledArray, LabeledDataset},
};

const KNOWN_ATTRIBUTES: [&str; 4] = ["units", "long_name", "standard_name", "_FillValue"];

fn attributes(array: &gdal::raster::MDArray) -> Metadata {
    KNOWN_ATTRIBUTES
        .iter()
        .filter_map(|name| {
            let attribute = array.attribute(name).ok()?;
            Some((name.to_string(), attribute.read_as_string()))
        })
        .collect()
}

/// Reads every non-coordinate array of the root group; arrays named after a
/// dimension provide its labels.
pub(crate) fn read(path: &Path) -> Result<LabeledDataset> {
    let format_error = |error: gdal::errors::GdalError| FormatError::new(path, error);
    let options = DatasetOptions {
        open_flags: GdalOpenFlags::GDAL_OF_MULTIDIM_RASTER,
        ..Default::default()
    };
    let dataset = Dataset::open_ex(path, options).map_err(format_error)?;
    let root = dataset.root_group().map_err(format_error)?;
    let names = root.array_names(CslStringList::new());

    let mut variables = Vec::new();
    for name in &names {
        let array = root
            .open_md_array(name, CslStringList::new())
            .map_err(format_error)?;
        let dimensions = array.dimensions().map_err(format_error)?;
        if dimensions.len() == 1 && dimensions[0].name() == *name {
            continue;
        }
        let mut dims = Vec::with_capacity(dimensions.len());
        for dimension in &dimensions {
            let dim_name = dimension.name();
            let len = dimension.size();
            let coords = match names.contains(&dim_name) {
                true => {
                    let values = root
                        .open_md_array(&dim_name, CslStringList::new())
                        .and_then(|coords| coords.read_as::<f64>(vec![0], vec![len]))
                        .map_err(format_error)?;
                    Some(values.into_iter().map(Label::Number).collect())
                }
                false => None,
            };
            dims.push(match coords {
                Some(coords) => Dimension::with_coords(dim_name, coords),
                None => Dimension::new(dim_name, len),
            });
        }
        let shape: Vec<usize> = dims.iter().map(|dim| dim.len).collect();
        let values = array
            .read_as::<f64>(vec![0; shape.len()], shape.clone())
            .map_err(format_error)?;
        let values = ArrayD::from_shape_vec(IxDyn(&shape), values)?;
        variables.push(LabeledArray::new(
            name.as_str(),
            dims,
            values,
            attributes(&array),
        )?);
    }
    Ok(LabeledDataset::new(variables, Metadata::new()))
}
