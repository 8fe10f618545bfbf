use std::{fmt, str::FromStr};

use geo::{Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use geo_traits::{
    CoordTrait, GeometryCollectionTrait, GeometryTrait, GeometryType, LineStringTrait,
    MultiLineStringTrait, MultiPointTrait, MultiPolygonTrait, PointTrait, PolygonTrait,
};
use wkt::{ToWkt, Wkt};

use crate::{
    errors::{ParseError, Result},
    geometry::Geometry,
};

type ParseResult<T> = std::result::Result<T, ParseError>;

fn coord(coord: impl CoordTrait<T = f64>) -> Coord {
    Coord {
        x: coord.x(),
        y: coord.y(),
    }
}

fn point(point: &impl PointTrait<T = f64>) -> ParseResult<Point> {
    point
        .coord()
        .map(|c| Point(coord(c)))
        .ok_or_else(|| ParseError::UnsupportedKind("POINT EMPTY".into()))
}

fn line_string(line: &impl LineStringTrait<T = f64>) -> LineString {
    line.coords().map(coord).collect()
}

fn polygon(polygon: &impl PolygonTrait<T = f64>) -> Polygon {
    let exterior = polygon
        .exterior()
        .map(|ring| line_string(&ring))
        .unwrap_or_else(|| LineString::new(Vec::new()));
    let interiors = polygon.interiors().map(|ring| line_string(&ring)).collect();
    Polygon::new(exterior, interiors)
}

/// Converts anything implementing [GeometryTrait] into one of the seven kinds.
pub(crate) fn from_geometry_trait(geometry: &impl GeometryTrait<T = f64>) -> ParseResult<Geometry> {
    Ok(match geometry.as_type() {
        GeometryType::Point(p) => Geometry::Point(point(p)?),
        GeometryType::LineString(l) => Geometry::LineString(line_string(l)),
        GeometryType::Polygon(p) => Geometry::Polygon(polygon(p)),
        GeometryType::MultiPoint(mp) => Geometry::MultiPoint(MultiPoint::new(
            mp.points()
                .map(|p| point(&p))
                .collect::<ParseResult<Vec<_>>>()?,
        )),
        GeometryType::MultiLineString(ml) => Geometry::MultiLineString(MultiLineString::new(
            ml.line_strings().map(|l| line_string(&l)).collect(),
        )),
        GeometryType::MultiPolygon(mp) => Geometry::MultiPolygon(MultiPolygon::new(
            mp.polygons().map(|p| polygon(&p)).collect(),
        )),
        GeometryType::GeometryCollection(gc) => Geometry::GeometryCollection(
            gc.geometries()
                .map(|member| from_geometry_trait(&member))
                .collect::<ParseResult<Vec<_>>>()?,
        ),
        GeometryType::Rect(_) => return Err(ParseError::UnsupportedKind("RECT".into())),
        GeometryType::Triangle(_) => return Err(ParseError::UnsupportedKind("TRIANGLE".into())),
        GeometryType::Line(_) => return Err(ParseError::UnsupportedKind("LINE".into())),
    })
}

impl Geometry {
    /// Parses a well-known-text string.
    ///
    /// Z and M ordinates are dropped.
    pub fn from_wkt(text: &str) -> Result<Geometry> {
        let parsed: Wkt<f64> =
            Wkt::from_str(text).map_err(|err| ParseError::Malformed(err.to_string()))?;
        Ok(from_geometry_trait(&parsed)?)
    }

    pub fn to_wkt(&self) -> String {
        self.to_geo().wkt_string()
    }
}

impl FromStr for Geometry {
    type Err = crate::errors::GeocompError;

    fn from_str(s: &str) -> Result<Self> {
        Geometry::from_wkt(s)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wkt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::GeocompError, geometry::GeometryKind};
    use rstest::rstest;

    #[rstest]
    #[case("POINT (5 2)", GeometryKind::Point)]
    #[case("MULTIPOINT ((5 2), (1 3), (3 4), (3 2))", GeometryKind::MultiPoint)]
    #[case("LINESTRING (1 5, 4 4, 4 1, 2 2, 3 2)", GeometryKind::LineString)]
    #[case(
        "MULTILINESTRING ((1 5, 4 4, 4 1, 2 2, 3 2), (1 2, 2 4))",
        GeometryKind::MultiLineString
    )]
    #[case(
        "POLYGON ((1 5, 2 2, 4 1, 4 4, 1 5), (2 4, 3 4, 3 3, 2 3, 2 4))",
        GeometryKind::Polygon
    )]
    #[case(
        "MULTIPOLYGON (((1 5, 2 2, 4 1, 4 4, 1 5)), ((0 2, 1 2, 1 3, 0 3, 0 2)))",
        GeometryKind::MultiPolygon
    )]
    #[case(
        "GEOMETRYCOLLECTION (MULTIPOINT (5 2, 1 3, 3 4, 3 2), LINESTRING (1 5, 4 4, 4 1, 2 2, 3 2))",
        GeometryKind::GeometryCollection
    )]
    fn round_trips_through_wkt(#[case] text: &str, #[case] kind: GeometryKind) {
        let geometry = Geometry::from_wkt(text).unwrap();
        assert_eq!(geometry.kind(), kind);
        let reparsed = Geometry::from_wkt(&geometry.to_wkt()).unwrap();
        assert_eq!(reparsed, geometry);
    }

    #[rstest]
    #[case("POINT (5)")]
    #[case("LINESTRING (1 5, 4")]
    #[case("CIRCLE (0 0, 1)")]
    #[case("")]
    fn malformed_text_is_a_parse_error(#[case] text: &str) {
        assert!(matches!(
            Geometry::from_wkt(text),
            Err(GeocompError::Parse(ParseError::Malformed(_)))
        ));
    }

    #[test]
    fn empty_point_is_rejected() {
        assert!(matches!(
            Geometry::from_wkt("POINT EMPTY"),
            Err(GeocompError::Parse(ParseError::UnsupportedKind(_)))
        ));
    }

    #[test]
    fn empty_polygon_parses() {
        let geometry = Geometry::from_wkt("POLYGON EMPTY").unwrap();
        assert!(geometry.is_empty());
        assert_eq!(geometry.kind(), GeometryKind::Polygon);
    }

    #[test]
    fn third_ordinate_is_dropped() {
        let geometry = Geometry::from_wkt("POINT Z (1 2 3)").unwrap();
        assert_eq!(geometry.coords(), Some(vec![(1., 2.)]));
    }

    #[test]
    fn display_prints_wkt() {
        let line: Geometry = "LINESTRING (1 5, 4 4, 4 1, 2 2, 3 2)".parse().unwrap();
        let printed = line.to_string();
        assert!(printed.starts_with("LINESTRING"));
        assert_eq!(Geometry::from_wkt(&printed).unwrap(), line);
    }
}
