use std::{fs, path::Path};

use geo::{Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use geojson::{GeoJson, JsonObject, JsonValue, Position};

use crate::{
    errors::{FormatError, Result},
    geometry::Geometry,
    vector::{LayerBuilder, Value, VectorLayer},
};

const DEFAULT_CRS: &str = "EPSG:4326";

fn coord(position: &Position) -> std::result::Result<Coord, String> {
    match position.as_slice() {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(format!("position with {} ordinate(s)", position.len())),
    }
}

fn line_string(positions: &[Position]) -> std::result::Result<LineString, String> {
    positions.iter().map(coord).collect::<std::result::Result<Vec<_>, _>>().map(LineString::new)
}

fn polygon(rings: &[Vec<Position>]) -> std::result::Result<Polygon, String> {
    let mut rings = rings.iter().map(|ring| line_string(ring));
    let exterior = rings.next().transpose()?.unwrap_or_else(|| LineString::new(vec![]));
    let interiors = rings.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn geometry(value: &geojson::Value) -> std::result::Result<Geometry, String> {
    use geojson::Value as V;
    let geometry = match value {
        V::Point(position) => Geometry::Point(Point::from(coord(position)?)),
        V::MultiPoint(positions) => Geometry::MultiPoint(MultiPoint::new(
            positions
                .iter()
                .map(|position| coord(position).map(Point::from))
                .collect::<std::result::Result<_, _>>()?,
        )),
        V::LineString(positions) => Geometry::LineString(line_string(positions)?),
        V::MultiLineString(lines) => Geometry::MultiLineString(MultiLineString::new(
            lines
                .iter()
                .map(|line| line_string(line))
                .collect::<std::result::Result<_, _>>()?,
        )),
        V::Polygon(rings) => Geometry::Polygon(polygon(rings)?),
        V::MultiPolygon(polygons) => Geometry::MultiPolygon(MultiPolygon::new(
            polygons
                .iter()
                .map(|rings| polygon(rings))
                .collect::<std::result::Result<_, _>>()?,
        )),
        V::GeometryCollection(members) => Geometry::GeometryCollection(
            members
                .iter()
                .map(|member| geometry(&member.value))
                .collect::<std::result::Result<_, _>>()?,
        ),
    };
    Ok(geometry)
}

fn value(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(value) => Value::Boolean(value),
        JsonValue::Number(number) => match number.as_i64() {
            Some(value) => Value::Integer(value),
            None => number.as_f64().map_or(Value::Null, Value::Real),
        },
        JsonValue::String(text) => Value::Text(text),
        other => Value::Text(other.to_string()),
    }
}

fn attributes(properties: Option<JsonObject>) -> impl Iterator<Item = (String, Value)> {
    properties
        .into_iter()
        .flatten()
        .map(|(key, json)| (key, value(json)))
}

/// CRS named by a legacy `crs` member, WGS84 otherwise.
fn crs(foreign_members: Option<&JsonObject>) -> String {
    let name = foreign_members
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.pointer("/properties/name"))
        .and_then(JsonValue::as_str);
    match name {
        Some(name) if name.ends_with("CRS84") => DEFAULT_CRS.into(),
        Some(name) => match name.rsplit_once("EPSG::") {
            Some((_, code)) => format!("EPSG:{code}"),
            None => name.into(),
        },
        None => DEFAULT_CRS.into(),
    }
}

pub(crate) fn parse(text: &str) -> std::result::Result<VectorLayer, String> {
    let geojson: GeoJson = text.parse().map_err(|error: geojson::Error| error.to_string())?;
    let mut builder = LayerBuilder::default();
    let crs = match geojson {
        GeoJson::FeatureCollection(collection) => {
            let crs = crs(collection.foreign_members.as_ref());
            for feature in collection.features {
                let geometry = match &feature.geometry {
                    Some(geojson_geometry) => geometry(&geojson_geometry.value)?,
                    None => Geometry::empty(),
                };
                builder.push(attributes(feature.properties), geometry);
            }
            crs
        }
        GeoJson::Feature(feature) => {
            let geometry = match &feature.geometry {
                Some(geojson_geometry) => geometry(&geojson_geometry.value)?,
                None => Geometry::empty(),
            };
            builder.push(attributes(feature.properties), geometry);
            DEFAULT_CRS.into()
        }
        GeoJson::Geometry(geojson_geometry) => {
            builder.push(std::iter::empty(), geometry(&geojson_geometry.value)?);
            DEFAULT_CRS.into()
        }
    };
    builder.build(Some(crs)).map_err(|error| error.to_string())
}

pub(crate) fn read(path: &Path) -> Result<VectorLayer> {
    let text = fs::read_to_string(path).map_err(|error| FormatError::new(path, error))?;
    Ok(parse(&text).map_err(|reason| FormatError::new(path, reason))?)
}
