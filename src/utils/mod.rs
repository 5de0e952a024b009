//! Various unsorted geometrical and logical operators.

pub use self::sorted_pair::SortedPair;

pub mod hashmap;
pub mod hashset;
mod sorted_pair;

use crate::math::{Point2, Real, Vector2};

/// The center of a set of 2D points.
pub fn center2(pts: &[Point2<Real>]) -> Point2<Real> {
    let denom = 1.0 / (pts.len() as Real);
    let coords = pts.iter().fold(Vector2::zeros(), |a, p| a + p.coords);
    Point2::from(coords * denom)
}

/// Tests if the given point is inside of a polygon with arbitrary orientation.
///
/// The polygon is assumed to be closed, i.e., first and last points are
/// implicitly joined.
pub fn point_in_poly2d(pt: &Point2<Real>, poly: &[Point2<Real>]) -> bool {
    if poly.is_empty() {
        return false;
    }

    let mut sign = 0.0;
    for i1 in 0..poly.len() {
        let i2 = (i1 + 1) % poly.len();
        let seg_dir = poly[i2] - poly[i1];
        let dpt = pt - poly[i1];
        let perp = dpt.perp(&seg_dir);

        if sign * perp < 0.0 {
            return false;
        } else if perp.abs() > 0.0 {
            sign = perp;
        }
    }

    true
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point2;

    #[test]
    fn point_in_poly2d_concave() {
        let poly = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        assert!(point_in_poly2d(&Point2::new(1.0, 1.0), &poly));
        assert!(!point_in_poly2d(&Point2::new(3.0, 1.0), &poly));
        assert!(!point_in_poly2d(&Point2::new(-0.1, 1.0), &poly));
    }

    #[test]
    fn center_of_square() {
        let poly = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        assert_eq!(center2(&poly), Point2::new(1.0, 1.0));
    }
}
