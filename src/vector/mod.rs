mod builder;
mod column;
mod display;
mod json;
#[cfg(feature = "gdal")]
mod ogr;
mod shp;

pub use column::GeometryColumn;
pub use display::{DisplayOptions, LayerDisplay};

use log::info;
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path};

use crate::{
    crs_geo::CrsGeometry,
    errors::{FormatError, GeocompError, Result},
    geometry::{Geometry, GeometryKind},
};

pub(crate) use builder::LayerBuilder;

/// Type of an attribute column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Integer,
    Real,
    Text,
    Boolean,
    /// ISO 8601 date kept as text.
    Date,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Attribute columns of a layer, in order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema(Vec<Field>);

impl From<Vec<Field>> for Schema {
    fn from(value: Vec<Field>) -> Self {
        Self(value)
    }
}

impl Schema {
    pub fn fields(&self) -> &[Field] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|field| field.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.0.iter().find(|field| field.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|field| field.name.as_str())
    }
}

/// Attribute value of a single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
    Date(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) | Value::Date(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(value) => Some(*value as f64),
            Value::Real(value) => Some(*value),
            _ => None,
        }
    }

    /// Equality where integers and reals compare by numeric value.
    pub fn matches(&self, other: &Value) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    pub(crate) fn field_type(&self) -> Option<FieldType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(FieldType::Integer),
            Value::Real(_) => Some(FieldType::Real),
            Value::Text(_) => Some(FieldType::Text),
            Value::Boolean(_) => Some(FieldType::Boolean),
            Value::Date(_) => Some(FieldType::Date),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("None"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Real(value) => write!(f, "{value}"),
            Value::Text(text) | Value::Date(text) => f.write_str(text),
            Value::Boolean(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Checks every value against its field, widening integers in real columns.
fn conform(row: Vec<Value>, schema: &Schema) -> Result<Vec<Value>> {
    row.into_iter()
        .zip(schema.fields())
        .map(|(value, field)| match (value, field.field_type) {
            (Value::Integer(value), FieldType::Real) => Ok(Value::Real(value as f64)),
            (value, field_type) if value.field_type().map_or(true, |found| found == field_type) => {
                Ok(value)
            }
            (value, field_type) => Err(GeocompError::ValueTypeMismatch {
                column: field.name.clone(),
                expected: format!("{field_type:?}"),
                found: format!("{value:?}"),
            }),
        })
        .collect()
}

/// Borrowed view of one row, handed to [VectorLayer::filter] predicates.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    label: usize,
    schema: &'a Schema,
    values: &'a [Value],
    geometry: &'a Geometry,
}

impl<'a> Row<'a> {
    /// Row label, kept through subsetting.
    pub fn label(&self) -> usize {
        self.label
    }

    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.schema
            .position(column)
            .map(|position| &self.values[position])
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    pub fn geometry(&self) -> &'a Geometry {
        self.geometry
    }
}

/// Table of attribute rows, each with exactly one geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorLayer {
    schema: Schema,
    labels: Vec<usize>,
    rows: Vec<Vec<Value>>,
    geometry: GeometryColumn,
    geometry_name: String,
    crs: Option<String>,
}

impl VectorLayer {
    /// Fails if `rows` and `geometry` differ in length or a row does not
    /// match the schema. Integers in a `Real` field are stored as reals.
    pub fn new(
        schema: Schema,
        rows: Vec<Vec<Value>>,
        geometry: GeometryColumn,
        crs: Option<String>,
    ) -> Result<Self> {
        if rows.len() != geometry.len() {
            return Err(GeocompError::UnsupportedOperation(format!(
                "{} attribute rows for {} geometries",
                rows.len(),
                geometry.len()
            )));
        }
        if let Some(row) = rows.iter().find(|row| row.len() != schema.len()) {
            return Err(GeocompError::UnsupportedOperation(format!(
                "row of {} values for {} fields",
                row.len(),
                schema.len()
            )));
        }
        let rows = rows
            .into_iter()
            .map(|row| conform(row, &schema))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            schema,
            labels: (0..rows.len()).collect(),
            rows,
            geometry,
            geometry_name: "geometry".into(),
            crs,
        })
    }

    pub fn with_geometry_name(mut self, name: impl Into<String>) -> Self {
        self.geometry_name = name.into();
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn geometry_name(&self) -> &str {
        &self.geometry_name
    }

    /// Attribute column names followed by the geometry column name.
    pub fn columns(&self) -> Vec<&str> {
        self.schema
            .names()
            .chain(std::iter::once(self.geometry_name.as_str()))
            .collect()
    }

    pub fn crs(&self) -> Option<&str> {
        self.crs.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn geometry(&self) -> &GeometryColumn {
        &self.geometry
    }

    pub fn bounds(&self) -> Vec<Option<(f64, f64, f64, f64)>> {
        self.geometry.bounds()
    }

    pub fn geom_types(&self) -> Vec<GeometryKind> {
        self.geometry.geom_types()
    }

    /// Row at position `i`.
    pub fn row(&self, i: usize) -> Result<Row<'_>> {
        let values = self.rows.get(i).ok_or(GeocompError::RowOutOfRange {
            index: i,
            len: self.len(),
        })?;
        Ok(Row {
            label: self.labels[i],
            schema: &self.schema,
            values,
            geometry: &self.geometry[i],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows
            .iter()
            .zip(self.geometry.iter())
            .zip(self.labels.iter())
            .map(|((values, geometry), &label)| Row {
                label,
                schema: &self.schema,
                values,
                geometry,
            })
    }

    /// Values of the attribute column `name`.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let position = self.position(name)?;
        Ok(self.rows.iter().map(|row| &row[position]).collect())
    }

    /// Geometry at position `i` tagged with the layer CRS.
    pub fn crs_geometry(&self, i: usize) -> Option<CrsGeometry<Geometry>> {
        let crs = self.crs.as_deref()?;
        let geometry = self.geometry.get(i)?;
        Some(CrsGeometry::new(crs, geometry.clone()))
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.schema
            .position(name)
            .ok_or_else(|| GeocompError::ColumnNotFound(name.into()))
    }

    /// Layer with only the named attribute columns, in the order given.
    ///
    /// The geometry column is always kept and may be named.
    pub fn select(&self, columns: &[&str]) -> Result<Self> {
        let positions = columns
            .iter()
            .filter(|&&name| name != self.geometry_name)
            .map(|name| self.position(name))
            .collect::<Result<Vec<usize>>>()?;
        let schema = Schema(
            positions
                .iter()
                .map(|&position| self.schema.0[position].clone())
                .collect(),
        );
        let rows = self
            .rows
            .iter()
            .map(|row| positions.iter().map(|&position| row[position].clone()).collect())
            .collect();
        Ok(Self {
            schema,
            labels: self.labels.clone(),
            rows,
            geometry: self.geometry.clone(),
            geometry_name: self.geometry_name.clone(),
            crs: self.crs.clone(),
        })
    }

    /// Rows for which `predicate` holds, labels and geometries unchanged.
    pub fn filter(&self, predicate: impl Fn(&Row<'_>) -> bool) -> Self {
        let positions: Vec<usize> = self
            .iter()
            .enumerate()
            .filter(|(_, row)| predicate(row))
            .map(|(position, _)| position)
            .collect();
        self.take(&positions)
    }

    /// Rows where `column` equals `value`, numbers compared by value.
    pub fn filter_eq(&self, column: &str, value: impl Into<Value>) -> Result<Self> {
        let position = self.position(column)?;
        let value = value.into();
        Ok(self.filter(|row| row.values()[position].matches(&value)))
    }

    /// Same rows with `geometry` in place of the current geometry column.
    pub fn with_geometry(&self, geometry: GeometryColumn) -> Result<Self> {
        if geometry.len() != self.len() {
            return Err(GeocompError::UnsupportedOperation(format!(
                "geometry column of {} rows for a layer of {} rows",
                geometry.len(),
                self.len()
            )));
        }
        Ok(Self {
            geometry,
            ..self.clone()
        })
    }

    pub fn display(&self, options: DisplayOptions) -> LayerDisplay<'_> {
        LayerDisplay::new(self, options)
    }

    fn take(&self, positions: &[usize]) -> Self {
        Self {
            schema: self.schema.clone(),
            labels: positions.iter().map(|&i| self.labels[i]).collect(),
            rows: positions.iter().map(|&i| self.rows[i].clone()).collect(),
            geometry: self.geometry.take(positions),
            geometry_name: self.geometry_name.clone(),
            crs: self.crs.clone(),
        }
    }
}

impl fmt::Display for VectorLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display(DisplayOptions::default()).fmt(f)
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase)
}

/// Loads the first layer of a vector dataset.
///
/// GeoJSON and Shapefile are read natively, any other OGR format needs the
/// `gdal` feature.
pub fn read_file(path: impl AsRef<Path>) -> Result<VectorLayer> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FormatError::new(path, "no such file").into());
    }
    let layer = match extension(path).as_deref() {
        Some("geojson" | "json") => json::read(path)?,
        Some("shp") => shp::read(path)?,
        #[cfg(feature = "gdal")]
        _ => ogr::read(path)?,
        #[cfg(not(feature = "gdal"))]
        _ => {
            return Err(
                FormatError::new(path, "unrecognised vector format, enable the gdal feature")
                    .into(),
            )
        }
    };
    info!(
        "read {} features with {} fields from {}",
        layer.len(),
        layer.schema().len(),
        path.display()
    );
    Ok(layer)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    pub(crate) fn world() -> VectorLayer {
        let schema = Schema::from(vec![
            Field::new("iso_a2", FieldType::Text),
            Field::new("name_long", FieldType::Text),
            Field::new("pop", FieldType::Real),
        ]);
        let rows = vec![
            vec!["FJ".into(), "Fiji".into(), Value::Real(885806.)],
            vec!["TZ".into(), "Tanzania".into(), Value::Real(52234869.)],
            vec!["EG".into(), "Egypt".into(), Value::Real(91377000.)],
            vec!["EH".into(), "Western Sahara".into(), Value::Null],
            vec!["ZA".into(), "South Africa".into(), Value::Real(54539571.)],
        ];
        let geometry = [
            "MULTIPOLYGON (((178 -17, 179 -17, 179 -16, 178 -17)))",
            "POLYGON ((30 -10, 40 -10, 40 -1, 30 -1, 30 -10))",
            "POLYGON ((25 22, 36 22, 36 31, 25 31, 25 22))",
            "POLYGON ((-17 21, -8 21, -8 27, -17 27, -17 21))",
            "POLYGON ((16 -34, 32 -34, 32 -22, 16 -22, 16 -34))",
        ]
        .into_iter()
        .map(|wkt| Geometry::from_wkt(wkt).unwrap())
        .collect();
        VectorLayer::new(schema, rows, geometry, Some("EPSG:4326".into())).unwrap()
    }

    #[rstest]
    fn select_keeps_geometry(world: VectorLayer) {
        let selected = world.select(&["name_long", "geometry"]).unwrap();
        assert_eq!(selected.columns(), vec!["name_long", "geometry"]);
        assert_eq!(selected.geometry(), world.geometry());
        assert_eq!(selected.len(), 5);
    }

    #[rstest]
    fn select_unknown_column(world: VectorLayer) {
        assert!(matches!(
            world.select(&["name_long", "continent"]),
            Err(GeocompError::ColumnNotFound(name)) if name == "continent"
        ));
    }

    #[rstest]
    fn filter_egypt(world: VectorLayer) {
        let egypt = world.filter_eq("name_long", "Egypt").unwrap();
        assert_eq!(egypt.len(), 1);
        assert_eq!(egypt.labels(), &[2]);
        assert_eq!(egypt.geometry().iloc(0).unwrap(), &world.geometry()[2]);
        assert_eq!(
            egypt.row(0).unwrap().get("iso_a2"),
            Some(&Value::from("EG"))
        );
    }

    #[rstest]
    fn filter_by_predicate(world: VectorLayer) {
        let populous = world.filter(|row| {
            row.get("pop")
                .and_then(Value::as_f64)
                .is_some_and(|pop| pop > 50e6)
        });
        assert_eq!(populous.labels(), &[1, 2, 4]);
        assert!(world.filter(|_| false).is_empty());
    }

    #[rstest]
    fn rows_and_columns(world: VectorLayer) {
        assert!(matches!(
            world.row(5),
            Err(GeocompError::RowOutOfRange { index: 5, len: 5 })
        ));
        let names = world.column("name_long").unwrap();
        assert_eq!(names[4], &Value::from("South Africa"));
        assert!(world.column("geometry").is_err());
    }

    #[rstest]
    fn geometry_replacement(world: VectorLayer) {
        let buffered = world.with_geometry(world.geometry().buffer(0.5)).unwrap();
        assert_eq!(buffered.len(), world.len());
        assert!(buffered.geometry()[1].area() > world.geometry()[1].area());
        let short = GeometryColumn::from(vec![Geometry::empty()]);
        assert!(world.with_geometry(short).is_err());
    }

    #[rstest]
    fn geometry_with_crs(world: VectorLayer) {
        let egypt = world.crs_geometry(2).unwrap();
        assert_eq!(egypt.crs(), "EPSG:4326");
        assert_eq!(
            egypt.bounding_rect().unwrap().geometry().min().x_y(),
            (25., 22.)
        );
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let result = VectorLayer::new(
            Schema::default(),
            vec![vec![], vec![]],
            GeometryColumn::from(vec![Geometry::empty()]),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn values_must_match_their_field_type() {
        let schema = Schema::from(vec![Field::new("name_long", FieldType::Text)]);
        let result = VectorLayer::new(
            schema,
            vec![vec![Value::Integer(7)]],
            GeometryColumn::from(vec![Geometry::empty()]),
            None,
        );
        assert!(matches!(
            result,
            Err(GeocompError::ValueTypeMismatch { column, .. }) if column == "name_long"
        ));
    }

    #[test]
    fn integers_widen_into_real_fields() {
        let schema = Schema::from(vec![Field::new("pop", FieldType::Real)]);
        let layer = VectorLayer::new(
            schema,
            vec![vec![Value::Integer(7)], vec![Value::Null]],
            GeometryColumn::from(vec![Geometry::empty(), Geometry::empty()]),
            None,
        )
        .unwrap();
        assert_eq!(layer.column("pop").unwrap(), vec![&Value::Real(7.), &Value::Null]);
    }

    #[rstest]
    fn filter_eq_compares_numbers_by_value(world: VectorLayer) {
        let egypt = world.filter_eq("pop", 91377000i64).unwrap();
        assert_eq!(egypt.labels(), &[2]);
        assert!(world.filter_eq("pop", "91377000").unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_a_format_error() {
        assert!(matches!(
            read_file("does/not/exist.gpkg"),
            Err(GeocompError::Format(_))
        ));
    }
}
