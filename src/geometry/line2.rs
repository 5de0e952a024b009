//! Infinite oriented lines in the 2D frame of a support plane.

use crate::math::{Point2, Real, Vector2, TOLERANCE};

/// An infinite oriented line in the 2D frame of a support plane.
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct Line2 {
    /// A point on the line.
    pub origin: Point2<Real>,
    /// The direction of the line. Not necessarily unit-length.
    pub dir: Vector2<Real>,
}

impl Line2 {
    /// The line supported by the two given points, oriented from `a` to `b`.
    #[inline]
    pub fn through_points(a: Point2<Real>, b: Point2<Real>) -> Self {
        Line2 {
            origin: a,
            dir: b - a,
        }
    }

    /// The orthogonal projection of `pt` onto this line.
    pub fn projection(&self, pt: &Point2<Real>) -> Point2<Real> {
        let sq_norm = self.dir.norm_squared();
        if sq_norm == 0.0 {
            return self.origin;
        }
        self.origin + self.dir * ((pt - self.origin).dot(&self.dir) / sq_norm)
    }

    /// The signed abscissa of the projection of `pt` along this line.
    ///
    /// The abscissa is expressed in units of `self.dir`, so the origin maps
    /// to `0` and `origin + dir` maps to `1`.
    pub fn parameter_of(&self, pt: &Point2<Real>) -> Real {
        let sq_norm = self.dir.norm_squared();
        if sq_norm == 0.0 {
            return 0.0;
        }
        (pt - self.origin).dot(&self.dir) / sq_norm
    }

    /// The intersection point of two lines, if they are not parallel.
    pub fn intersection(&self, other: &Line2) -> Option<Point2<Real>> {
        let denom = self.dir.perp(&other.dir);
        if denom.abs() < TOLERANCE {
            return None;
        }
        let t = (other.origin - self.origin).perp(&other.dir) / denom;
        Some(self.origin + self.dir * t)
    }

    /// The distance from `pt` to this line.
    pub fn distance_to_point(&self, pt: &Point2<Real>) -> Real {
        (self.projection(pt) - pt).norm()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn projection_is_idempotent() {
        let line = Line2::through_points(Point2::new(0.0, 1.0), Point2::new(2.0, 1.0));
        let proj = line.projection(&Point2::new(0.7, 5.0));
        assert_relative_eq!(proj, Point2::new(0.7, 1.0));
        assert_relative_eq!(line.projection(&proj), proj);
    }

    #[test]
    fn intersection_of_crossing_lines() {
        let l1 = Line2::through_points(Point2::new(-1.0, 0.0), Point2::new(1.0, 0.0));
        let l2 = Line2::through_points(Point2::new(0.5, -1.0), Point2::new(0.5, 1.0));
        assert_relative_eq!(l1.intersection(&l2).unwrap(), Point2::new(0.5, 0.0));
        assert!(l1.intersection(&l1).is_none());
    }
}
