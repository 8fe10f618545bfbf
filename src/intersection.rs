use geo::{CoordNum, Rect};

use crate::errors::{GeocompError, Result};

pub trait Intersection {
    type Output;
    fn intersection(&self, rhs: &Self) -> Result<Self::Output>;
}

impl<T: CoordNum> Intersection for Rect<T> {
    type Output = Rect<T>;
    fn intersection(&self, rhs: &Self) -> Result<Rect<T>> {
        let (lhs_min, lhs_max) = (self.min(), self.max());
        let (rhs_min, rhs_max) = (rhs.min(), rhs.max());
        if (lhs_max.x < rhs_min.x) | (lhs_max.y < rhs_min.y) {
            return Err(GeocompError::NoIntersection);
        }
        if (lhs_min.x > rhs_max.x) | (lhs_min.y > rhs_max.y) {
            return Err(GeocompError::NoIntersection);
        }

        let max_of = |x: T, y: T| if x > y { x } else { y };
        let min_of = |x: T, y: T| if x < y { x } else { y };
        let min = (max_of(lhs_min.x, rhs_min.x), max_of(lhs_min.y, rhs_min.y));
        let max = (min_of(lhs_max.x, rhs_max.x), min_of(lhs_max.y, rhs_max.y));

        Ok(Rect::new(min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_rects_intersect_in_an_edge() {
        let a = Rect::new((0usize, 0usize), (2, 2));
        let b = Rect::new((2usize, 0usize), (4, 2));
        let edge = a.intersection(&b).unwrap();
        assert_eq!(edge.width(), 0);
        assert_eq!(edge.height(), 2);
    }

    #[test]
    fn contained_rect_is_its_own_intersection() {
        let outer = Rect::new((0., 0.), (10., 10.));
        let inner = Rect::new((2., 3.), (4., 5.));
        assert_eq!(outer.intersection(&inner).unwrap(), inner);
    }
}
