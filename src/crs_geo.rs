use std::rc::Rc;

use geo::Rect;
use shrinkwraprs::Shrinkwrap;

use crate::{
    errors::{GeocompError, Result},
    geometry::Geometry,
    intersection::Intersection,
};

/// Geometry paired with the identifier of its coordinate reference system.
#[derive(Shrinkwrap, Debug, Clone, PartialEq)]
pub struct CrsGeometry<G> {
    crs: Rc<str>,
    #[shrinkwrap(main_field)]
    geometry: G,
}

impl<G> CrsGeometry<G> {
    pub fn new(crs: impl Into<Rc<str>>, geometry: G) -> Self {
        Self {
            crs: crs.into(),
            geometry,
        }
    }

    pub fn crs(&self) -> &str {
        self.crs.as_ref()
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    pub fn into_inner(self) -> G {
        self.geometry
    }
}

impl CrsGeometry<Geometry> {
    pub fn bounding_rect(&self) -> Option<CrsGeometry<Rect>> {
        let geometry = self.geometry.bounding_box()?;
        Some(CrsGeometry {
            crs: Rc::clone(&self.crs),
            geometry,
        })
    }
}

impl Intersection for CrsGeometry<Rect> {
    type Output = CrsGeometry<Rect>;
    /// Both footprints must share a crs, nothing is reprojected.
    fn intersection(&self, rhs: &Self) -> Result<Self::Output> {
        if self.crs != rhs.crs {
            return Err(GeocompError::UnsupportedOperation(format!(
                "intersection of footprints in {} and {}",
                self.crs, rhs.crs
            )));
        }
        let geometry = self.geometry.intersection(&rhs.geometry)?;
        Ok(CrsGeometry::new(Rc::clone(&self.crs), geometry))
    }
}

#[cfg(feature = "proj")]
mod reproject {
    use super::*;
    use proj::{Proj, Transform};

    impl CrsGeometry<Geometry> {
        pub fn with_crs(self, crs: &str) -> Result<Self> {
            if self.crs().eq(crs) {
                return Ok(self);
            }
            let geometry = self.projected_geometry(crs)?;
            Ok(Self::new(crs, geometry))
        }

        /// Clones if crs is same.
        pub fn projected_geometry(&self, crs: &str) -> Result<Geometry> {
            if self.crs().eq(crs) {
                return Ok(self.geometry.clone());
            }
            let proj = Proj::new_known_crs(self.crs(), crs, None)?;
            let projected = self.geometry.to_geo().transformed(&proj)?;
            Ok(Geometry::from(projected))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;

    #[test]
    fn bounding_rect_keeps_crs() {
        let geometry = Geometry::from_wkt("LINESTRING (1 5, 4 4, 4 1, 2 2, 3 2)").unwrap();
        let crs_geometry = CrsGeometry::new("EPSG:4326", geometry);
        let rect = crs_geometry.bounding_rect().unwrap();
        assert_eq!(rect.crs(), "EPSG:4326");
        assert_eq!(rect.min(), Coord { x: 1., y: 1. });
        assert_eq!(crs_geometry.geom_type(), "LineString");
    }

    #[test]
    fn disjoint_footprints_do_not_intersect() {
        let a = CrsGeometry::new("EPSG:32612", Rect::new((0., 0.), (1., 1.)));
        let b = CrsGeometry::new("EPSG:32612", Rect::new((2., 2.), (3., 3.)));
        assert!(matches!(a.intersection(&b), Err(GeocompError::NoIntersection)));
        let c = CrsGeometry::new("EPSG:32612", Rect::new((0.5, 0.5), (3., 3.)));
        let overlap = a.intersection(&c).unwrap();
        assert_eq!(overlap.max(), Coord { x: 1., y: 1. });
    }

    #[test]
    fn footprints_in_other_crs_are_refused() {
        let utm = CrsGeometry::new("EPSG:32612", Rect::new((0., 0.), (1., 1.)));
        let wgs84 = CrsGeometry::new("EPSG:4326", Rect::new((0., 0.), (1., 1.)));
        assert!(matches!(
            utm.intersection(&wgs84),
            Err(GeocompError::UnsupportedOperation(_))
        ));
    }
}
