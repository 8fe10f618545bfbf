use geo::{
    Area, BooleanOps, BoundingRect, Buffer, Centroid, Intersects, MultiLineString, MultiPoint,
    MultiPolygon, Point, Rect,
};

use crate::{
    errors::{GeocompError, Result},
    geometry::Geometry,
};

/// Topological dimension of a geometry's members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionClass {
    Puntal,
    Lineal,
    Areal,
    Mixed,
}

fn polygonal(mut polygons: MultiPolygon) -> Geometry {
    match polygons.0.len() {
        1 => Geometry::Polygon(polygons.0.remove(0)),
        _ => Geometry::MultiPolygon(polygons),
    }
}

impl Geometry {
    pub fn dimension_class(&self) -> DimensionClass {
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => DimensionClass::Puntal,
            Geometry::LineString(_) | Geometry::MultiLineString(_) => DimensionClass::Lineal,
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => DimensionClass::Areal,
            Geometry::GeometryCollection(_) => DimensionClass::Mixed,
        }
    }

    /// All polygons contained in the geometry, collections included.
    fn areal_part(&self) -> MultiPolygon {
        match self {
            Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon.clone()]),
            Geometry::MultiPolygon(polygons) => polygons.clone(),
            Geometry::GeometryCollection(members) => MultiPolygon::new(
                members
                    .iter()
                    .flat_map(|member| member.areal_part().0)
                    .collect(),
            ),
            _ => MultiPolygon::new(Vec::new()),
        }
    }

    fn lineal_part(&self) -> MultiLineString {
        match self {
            Geometry::LineString(line) => MultiLineString::new(vec![line.clone()]),
            Geometry::MultiLineString(lines) => lines.clone(),
            Geometry::GeometryCollection(members) => MultiLineString::new(
                members
                    .iter()
                    .flat_map(|member| member.lineal_part().0)
                    .collect(),
            ),
            _ => MultiLineString::new(Vec::new()),
        }
    }

    fn points(&self) -> Vec<Point> {
        match self {
            Geometry::Point(point) => vec![*point],
            Geometry::MultiPoint(points) => points.0.clone(),
            _ => Vec::new(),
        }
    }

    /// Area covered within `distance` of the geometry.
    ///
    /// A single resulting polygon is returned as a [Geometry::Polygon].
    pub fn buffer(&self, distance: f64) -> Geometry {
        polygonal(self.to_geo().buffer(distance))
    }

    /// Part of `self` not shared with `other`.
    pub fn difference(&self, other: &Geometry) -> Result<Geometry> {
        match self.dimension_class() {
            DimensionClass::Areal => {
                Ok(polygonal(self.areal_part().difference(&other.areal_part())))
            }
            DimensionClass::Lineal => {
                if !other.lineal_part().0.is_empty() {
                    return Err(GeocompError::UnsupportedOperation(format!(
                        "difference of {} and {}",
                        self.geom_type(),
                        other.geom_type()
                    )));
                }
                let lines = self.lineal_part();
                let area = other.areal_part();
                let mut remaining = if area.0.is_empty() {
                    lines
                } else {
                    area.clip(&lines, true)
                };
                Ok(match self {
                    Geometry::LineString(_) if remaining.0.len() == 1 => {
                        Geometry::LineString(remaining.0.remove(0))
                    }
                    _ => Geometry::MultiLineString(remaining),
                })
            }
            DimensionClass::Puntal => {
                let other = other.to_geo();
                let remaining: Vec<Point> = self
                    .points()
                    .into_iter()
                    .filter(|point| !point.intersects(&other))
                    .collect();
                Ok(match self {
                    Geometry::Point(_) if remaining.len() == 1 => Geometry::Point(remaining[0]),
                    _ => Geometry::MultiPoint(MultiPoint::new(remaining)),
                })
            }
            DimensionClass::Mixed => {
                let members = self.geoms().unwrap_or_default();
                Ok(Geometry::GeometryCollection(
                    members
                        .iter()
                        .map(|member| member.difference(other))
                        .collect::<Result<Vec<_>>>()?,
                ))
            }
        }
    }

    /// Bounding box, `None` for empty geometries.
    pub fn bounding_box(&self) -> Option<Rect> {
        self.to_geo().bounding_rect()
    }

    /// `(minx, miny, maxx, maxy)` of the bounding box.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.bounding_box()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    pub fn area(&self) -> f64 {
        self.to_geo().unsigned_area()
    }

    pub fn centroid(&self) -> Option<Point> {
        self.to_geo().centroid()
    }
}
