//! Simple Features geometry values.
//!
//! [Geometry] is a closed variant over the seven Simple Features kinds.
//! Values are immutable: every operator in [ops] returns a new geometry.

mod ops;
mod wkt;

use std::fmt::{self, Display};

use geo::{Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde::Serialize;

pub use ops::DimensionClass;

/// The seven Simple Features geometry kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::LineString => "LineString",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPolygon => "MultiPolygon",
            GeometryKind::GeometryCollection => "GeometryCollection",
        }
    }
}

impl Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    MultiPoint(MultiPoint),
    LineString(LineString),
    MultiLineString(MultiLineString),
    Polygon(Polygon),
    MultiPolygon(MultiPolygon),
    GeometryCollection(Vec<Geometry>),
}

impl Geometry {
    /// Empty collection, used where a source row carries no geometry.
    pub fn empty() -> Self {
        Geometry::GeometryCollection(Vec::new())
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
            Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryKind::GeometryCollection,
        }
    }

    /// Name of the geometry kind, e.g. `"LineString"`.
    pub fn geom_type(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(_) => false,
            Geometry::MultiPoint(points) => points.0.is_empty(),
            Geometry::LineString(line) => line.0.is_empty(),
            Geometry::MultiLineString(lines) => lines.0.iter().all(|line| line.0.is_empty()),
            Geometry::Polygon(polygon) => polygon.exterior().0.is_empty(),
            Geometry::MultiPolygon(polygons) => polygons
                .0
                .iter()
                .all(|polygon| polygon.exterior().0.is_empty()),
            Geometry::GeometryCollection(members) => members.iter().all(Geometry::is_empty),
        }
    }

    /// Raw coordinates of a point or line string.
    pub fn coords(&self) -> Option<Vec<(f64, f64)>> {
        match self {
            Geometry::Point(point) => Some(vec![point.x_y()]),
            Geometry::LineString(line) => Some(line.coords().map(|coord| coord.x_y()).collect()),
            _ => None,
        }
    }

    /// Exterior ring of a polygon.
    pub fn exterior(&self) -> Option<&LineString> {
        match self {
            Geometry::Polygon(polygon) => Some(polygon.exterior()),
            _ => None,
        }
    }

    /// Interior rings (holes) of a polygon.
    pub fn interiors(&self) -> Option<&[LineString]> {
        match self {
            Geometry::Polygon(polygon) => Some(polygon.interiors()),
            _ => None,
        }
    }

    /// Members of a multi geometry or a collection.
    pub fn geoms(&self) -> Option<Vec<Geometry>> {
        match self {
            Geometry::MultiPoint(points) => {
                Some(points.iter().copied().map(Geometry::Point).collect())
            }
            Geometry::MultiLineString(lines) => {
                Some(lines.iter().cloned().map(Geometry::LineString).collect())
            }
            Geometry::MultiPolygon(polygons) => {
                Some(polygons.iter().cloned().map(Geometry::Polygon).collect())
            }
            Geometry::GeometryCollection(members) => Some(members.clone()),
            _ => None,
        }
    }

    pub fn to_geo(&self) -> geo::Geometry {
        match self {
            Geometry::Point(point) => geo::Geometry::Point(*point),
            Geometry::MultiPoint(points) => geo::Geometry::MultiPoint(points.clone()),
            Geometry::LineString(line) => geo::Geometry::LineString(line.clone()),
            Geometry::MultiLineString(lines) => geo::Geometry::MultiLineString(lines.clone()),
            Geometry::Polygon(polygon) => geo::Geometry::Polygon(polygon.clone()),
            Geometry::MultiPolygon(polygons) => geo::Geometry::MultiPolygon(polygons.clone()),
            Geometry::GeometryCollection(members) => geo::Geometry::GeometryCollection(
                members.iter().map(Geometry::to_geo).collect(),
            ),
        }
    }
}

impl From<geo::Geometry> for Geometry {
    fn from(value: geo::Geometry) -> Self {
        match value {
            geo::Geometry::Point(point) => Geometry::Point(point),
            geo::Geometry::Line(line) => {
                Geometry::LineString(LineString::new(vec![line.start, line.end]))
            }
            geo::Geometry::LineString(line) => Geometry::LineString(line),
            geo::Geometry::Polygon(polygon) => Geometry::Polygon(polygon),
            geo::Geometry::MultiPoint(points) => Geometry::MultiPoint(points),
            geo::Geometry::MultiLineString(lines) => Geometry::MultiLineString(lines),
            geo::Geometry::MultiPolygon(polygons) => Geometry::MultiPolygon(polygons),
            geo::Geometry::GeometryCollection(collection) => Geometry::GeometryCollection(
                collection.into_iter().map(Geometry::from).collect(),
            ),
            geo::Geometry::Rect(rect) => Geometry::Polygon(rect.to_polygon()),
            geo::Geometry::Triangle(triangle) => Geometry::Polygon(triangle.to_polygon()),
        }
    }
}

impl From<Geometry> for geo::Geometry {
    fn from(value: Geometry) -> Self {
        value.to_geo()
    }
}

impl From<Point> for Geometry {
    fn from(value: Point) -> Self {
        Geometry::Point(value)
    }
}

impl From<Polygon> for Geometry {
    fn from(value: Polygon) -> Self {
        Geometry::Polygon(value)
    }
}

impl From<MultiPolygon> for Geometry {
    fn from(value: MultiPolygon) -> Self {
        Geometry::MultiPolygon(value)
    }
}

impl From<LineString> for Geometry {
    fn from(value: LineString) -> Self {
        Geometry::LineString(value)
    }
}

/// Ring built from `(x, y)` pairs.
pub fn ring(coords: &[(f64, f64)]) -> LineString {
    LineString::from_iter(coords.iter().map(|&(x, y)| Coord { x, y }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn polygon() -> Geometry {
        Geometry::from_wkt("POLYGON ((1 5, 2 2, 4 1, 4 4, 1 5), (2 4, 3 4, 3 3, 2 3, 2 4))")
            .unwrap()
    }

    #[test]
    fn exterior_coords_of_polygon() {
        let coords: Vec<(f64, f64)> = polygon()
            .exterior()
            .unwrap()
            .coords()
            .map(|coord| coord.x_y())
            .collect();
        assert_eq!(
            coords,
            vec![(1., 5.), (2., 2.), (4., 1.), (4., 4.), (1., 5.)]
        );
        assert_eq!(polygon().interiors().unwrap().len(), 1);
    }

    #[test]
    fn accessors_on_wrong_kind_are_none() {
        let point = Geometry::from_wkt("POINT (5 2)").unwrap();
        assert!(point.exterior().is_none());
        assert!(point.geoms().is_none());
        assert_eq!(point.coords(), Some(vec![(5., 2.)]));
        assert!(polygon().coords().is_none());
    }

    #[rstest]
    #[case("MULTIPOINT ((5 2), (1 3), (3 4), (3 2))", 4)]
    #[case("MULTILINESTRING ((1 5, 4 4, 4 1, 2 2, 3 2), (1 2, 2 4))", 2)]
    #[case("MULTIPOLYGON (((1 5, 2 2, 4 1, 4 4, 1 5)), ((0 2, 1 2, 1 3, 0 3, 0 2)))", 2)]
    #[case(
        "GEOMETRYCOLLECTION (MULTIPOINT (5 2, 1 3, 3 4, 3 2), LINESTRING (1 5, 4 4, 4 1, 2 2, 3 2))",
        2
    )]
    fn geoms_of_multi_kinds(#[case] wkt: &str, #[case] members: usize) {
        let geometry = Geometry::from_wkt(wkt).unwrap();
        assert_eq!(geometry.geoms().unwrap().len(), members);
    }

    #[test]
    fn rect_converts_to_polygon() {
        let rect = geo::Rect::new(Coord { x: 0., y: 0. }, Coord { x: 1., y: 2. });
        let geometry = Geometry::from(geo::Geometry::Rect(rect));
        assert_eq!(geometry.kind(), GeometryKind::Polygon);
        assert_eq!(geometry.exterior().unwrap().0.len(), 5);
    }

    #[test]
    fn empty_collection_is_empty() {
        assert!(Geometry::empty().is_empty());
        assert!(!polygon().is_empty());
        assert_eq!(Geometry::empty().geom_type(), "GeometryCollection");
    }
}
