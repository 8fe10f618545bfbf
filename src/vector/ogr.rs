use std::path::Path;

use gdal::{
    vector::{FieldValue, LayerAccess},
    Dataset,
};
use log::warn;

use crate::{
    errors::{FormatError, Result},
    geometry::Geometry,
    vector::{LayerBuilder, Value, VectorLayer},
};

fn value(field: Option<FieldValue>) -> Value {
    match field {
        None => Value::Null,
        Some(FieldValue::IntegerValue(value)) => Value::Integer(value.into()),
        Some(FieldValue::Integer64Value(value)) => Value::Integer(value),
        Some(FieldValue::RealValue(value)) => Value::Real(value),
        Some(FieldValue::StringValue(text)) => Value::Text(text),
        Some(FieldValue::DateValue(date)) => Value::Date(date.to_string()),
        Some(FieldValue::DateTimeValue(date_time)) => Value::Date(date_time.to_rfc3339()),
        Some(other) => Value::Text(format!("{other:?}")),
    }
}

/// First layer of any OGR dataset, geometries round-tripped through WKT.
pub(crate) fn read(path: &Path) -> Result<VectorLayer> {
    let format_error = |error: gdal::errors::GdalError| FormatError::new(path, error);
    let dataset = Dataset::open(path).map_err(format_error)?;
    let mut layer = dataset.layer(0).map_err(format_error)?;
    let crs = match layer.spatial_ref() {
        Some(srs) => match (srs.auth_name(), srs.auth_code()) {
            (Ok(name), Ok(code)) => Some(format!("{name}:{code}")),
            _ => Some(srs.to_wkt().map_err(format_error)?),
        },
        None => {
            warn!("{} has no spatial reference", path.display());
            None
        }
    };
    let mut builder = LayerBuilder::default();
    for feature in layer.features() {
        let geometry = match feature.geometry() {
            Some(geometry) => Geometry::from_wkt(&geometry.wkt().map_err(format_error)?)?,
            None => Geometry::empty(),
        };
        let attributes: Vec<(String, Value)> = feature
            .fields()
            .map(|(name, field)| (name, value(field)))
            .collect();
        builder.push(attributes, geometry);
    }
    builder.build(crs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{read_file, FieldType};
    use gdal::{
        spatial_ref::SpatialRef,
        vector::{OGRFieldType, OGRwkbGeometryType},
        DriverManager, LayerOptions,
    };
    use tempfile::TempDir;

    fn write_countries(path: &Path) {
        let driver = DriverManager::get_driver_by_name("GPKG").unwrap();
        let mut dataset = driver.create_vector_only(path).unwrap();
        let srs = SpatialRef::from_epsg(4326).unwrap();
        let mut layer = dataset
            .create_layer(LayerOptions {
                name: "world",
                srs: Some(&srs),
                ty: OGRwkbGeometryType::wkbPolygon,
                options: None,
            })
            .unwrap();
        layer
            .create_defn_fields(&[
                ("name_long", OGRFieldType::OFTString),
                ("pop", OGRFieldType::OFTReal),
            ])
            .unwrap();
        for (name, pop, wkt) in [
            ("Tanzania", 52234869., "POLYGON ((30 -10, 40 -10, 40 -1, 30 -1, 30 -10))"),
            ("Egypt", 91377000., "POLYGON ((25 22, 36 22, 36 31, 25 31, 25 22))"),
        ] {
            layer
                .create_feature_fields(
                    gdal::vector::Geometry::from_wkt(wkt).unwrap(),
                    &["name_long", "pop"],
                    &[FieldValue::StringValue(name.into()), FieldValue::RealValue(pop)],
                )
                .unwrap();
        }
    }

    #[test]
    fn reads_geopackage_layer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("world.gpkg");
        write_countries(&path);

        let world = read_file(&path).unwrap();
        assert_eq!(world.len(), 2);
        assert_eq!(world.crs(), Some("EPSG:4326"));
        assert_eq!(world.columns(), vec!["name_long", "pop", "geometry"]);
        assert_eq!(world.schema().fields()[1].field_type, FieldType::Real);

        let egypt = world.filter_eq("name_long", "Egypt").unwrap();
        assert_eq!(egypt.labels(), &[1]);
        assert_eq!(egypt.bounds(), vec![Some((25., 22., 36., 31.))]);
    }
}
