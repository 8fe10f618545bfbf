use std::{fs, io, path::Path};

use geo::{Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use shapefile::{
    dbase::{self, FieldValue},
    PolygonRing, Shape,
};

use crate::{
    errors::{FormatError, Result},
    geometry::Geometry,
    vector::{FieldType, LayerBuilder, Value, VectorLayer},
};

macro_rules! coord {
    ($point:expr) => {
        Coord {
            x: $point.x,
            y: $point.y,
        }
    };
}

macro_rules! points {
    ($points:expr) => {
        Geometry::MultiPoint(MultiPoint::new(
            $points.iter().map(|point| Point::from(coord!(point))).collect(),
        ))
    };
}

macro_rules! lines {
    ($parts:expr) => {{
        let mut lines: Vec<LineString> = $parts
            .iter()
            .map(|part| part.iter().map(|point| coord!(point)).collect())
            .collect();
        match lines.len() {
            1 => Geometry::LineString(lines.remove(0)),
            _ => Geometry::MultiLineString(MultiLineString::new(lines)),
        }
    }};
}

/// Holes follow the outer ring they belong to.
macro_rules! polygons {
    ($rings:expr) => {{
        let mut polygons: Vec<Polygon> = Vec::new();
        for ring in $rings.iter() {
            let line: LineString = ring.points().iter().map(|point| coord!(point)).collect();
            match (ring, polygons.last_mut()) {
                (PolygonRing::Inner(_), Some(outer)) => outer.interiors_push(line),
                _ => polygons.push(Polygon::new(line, vec![])),
            }
        }
        match polygons.len() {
            1 => Geometry::Polygon(polygons.remove(0)),
            _ => Geometry::MultiPolygon(MultiPolygon::new(polygons)),
        }
    }};
}

fn geometry(shape: Shape) -> std::result::Result<Geometry, String> {
    let geometry = match shape {
        Shape::NullShape => Geometry::empty(),
        Shape::Point(point) => Geometry::Point(Point::from(coord!(point))),
        Shape::PointM(point) => Geometry::Point(Point::from(coord!(point))),
        Shape::PointZ(point) => Geometry::Point(Point::from(coord!(point))),
        Shape::Multipoint(multipoint) => points!(multipoint.points()),
        Shape::MultipointM(multipoint) => points!(multipoint.points()),
        Shape::MultipointZ(multipoint) => points!(multipoint.points()),
        Shape::Polyline(polyline) => lines!(polyline.parts()),
        Shape::PolylineM(polyline) => lines!(polyline.parts()),
        Shape::PolylineZ(polyline) => lines!(polyline.parts()),
        Shape::Polygon(polygon) => polygons!(polygon.rings()),
        Shape::PolygonM(polygon) => polygons!(polygon.rings()),
        Shape::PolygonZ(polygon) => polygons!(polygon.rings()),
        Shape::Multipatch(_) => return Err("multipatch shapes are not supported".into()),
    };
    Ok(geometry)
}

fn field_type(field_type: dbase::FieldType) -> FieldType {
    match field_type {
        dbase::FieldType::Integer => FieldType::Integer,
        dbase::FieldType::Numeric
        | dbase::FieldType::Float
        | dbase::FieldType::Double
        | dbase::FieldType::Currency => FieldType::Real,
        dbase::FieldType::Logical => FieldType::Boolean,
        dbase::FieldType::Date => FieldType::Date,
        _ => FieldType::Text,
    }
}

fn value(field: FieldValue) -> Value {
    match field {
        FieldValue::Character(text) => text.map(|text| text.trim_end().to_string()).into(),
        FieldValue::Memo(text) => Value::Text(text),
        FieldValue::Numeric(number) => number.into(),
        FieldValue::Float(number) => number.map(f64::from).into(),
        FieldValue::Double(number) | FieldValue::Currency(number) => Value::Real(number),
        FieldValue::Integer(number) => Value::Integer(number.into()),
        FieldValue::Logical(flag) => flag.into(),
        FieldValue::Date(date) => date
            .map(|date| {
                Value::Date(format!(
                    "{:04}-{:02}-{:02}",
                    date.year(),
                    date.month(),
                    date.day()
                ))
            })
            .unwrap_or(Value::Null),
        other => Value::Text(format!("{other:?}")),
    }
}

/// CRS from the `.prj` sidecar, kept as WKT. A missing sidecar means no CRS.
fn crs(path: &Path) -> std::result::Result<Option<String>, String> {
    let prj = match fs::read_to_string(path.with_extension("prj")) {
        Ok(prj) => prj,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(format!("unreadable .prj: {error}")),
    };
    let prj = prj.trim();
    Ok((!prj.is_empty()).then(|| prj.to_string()))
}

fn read_layer(path: &Path) -> std::result::Result<VectorLayer, String> {
    let dbf =
        dbase::Reader::from_path(path.with_extension("dbf")).map_err(|error| error.to_string())?;
    let fields: Vec<(String, FieldType)> = dbf
        .fields()
        .iter()
        .filter(|field| field.name() != "DeletionFlag")
        .map(|field| (field.name().to_string(), field_type(field.field_type())))
        .collect();

    let mut builder = LayerBuilder::default();
    for (name, field_type) in &fields {
        builder.field(name.clone(), *field_type);
    }
    let mut reader = shapefile::Reader::from_path(path).map_err(|error| error.to_string())?;
    for shape_record in reader.iter_shapes_and_records() {
        let (shape, record) = shape_record.map_err(|error| error.to_string())?;
        let attributes: Vec<(String, Value)> = fields
            .iter()
            .filter_map(|(name, _)| Some((name.clone(), value(record.get(name)?.clone()))))
            .collect();
        builder.push(attributes, geometry(shape)?);
    }
    builder.build(crs(path)?).map_err(|error| error.to_string())
}

pub(crate) fn read(path: &Path) -> Result<VectorLayer> {
    Ok(read_layer(path).map_err(|reason| FormatError::new(path, reason))?)
}
