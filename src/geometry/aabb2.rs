//! Axis-aligned bounding rectangles on a support plane.

use crate::math::{Point2, Real, Vector2};

/// An axis-aligned bounding box in the 2D frame of a support plane.
#[derive(Debug, PartialEq, Copy, Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Aabb2 {
    /// The minimum of the AABB.
    pub mins: Point2<Real>,
    /// The maximum of the AABB.
    pub maxs: Point2<Real>,
}

impl Aabb2 {
    /// Creates a new AABB.
    ///
    /// `mins` must be componentwise smaller than `maxs`.
    #[inline]
    pub fn new(mins: Point2<Real>, maxs: Point2<Real>) -> Aabb2 {
        Aabb2 { mins, maxs }
    }

    /// The smallest AABB containing all the given points.
    ///
    /// Returns an empty AABB centered at the origin if the iterator is empty.
    pub fn from_points<'a, I>(pts: I) -> Aabb2
    where
        I: IntoIterator<Item = &'a Point2<Real>>,
    {
        let mut mins = Point2::new(Real::MAX, Real::MAX);
        let mut maxs = Point2::new(-Real::MAX, -Real::MAX);

        for pt in pts {
            mins = mins.inf(pt);
            maxs = maxs.sup(pt);
        }

        if mins.x > maxs.x {
            Aabb2::new(Point2::origin(), Point2::origin())
        } else {
            Aabb2::new(mins, maxs)
        }
    }

    /// Enlarges this AABB by `amount` on all sides.
    #[inline]
    pub fn loosened(&self, amount: Real) -> Aabb2 {
        Aabb2 {
            mins: self.mins - Vector2::repeat(amount),
            maxs: self.maxs + Vector2::repeat(amount),
        }
    }

    /// Checks if this AABB intersects another one.
    #[inline]
    pub fn intersects(&self, other: &Aabb2) -> bool {
        self.mins.x <= other.maxs.x
            && other.mins.x <= self.maxs.x
            && self.mins.y <= other.maxs.y
            && other.mins.y <= self.maxs.y
    }

    /// Checks if this AABB contains the given point.
    #[inline]
    pub fn contains_point(&self, pt: &Point2<Real>) -> bool {
        pt.x >= self.mins.x && pt.x <= self.maxs.x && pt.y >= self.mins.y && pt.y <= self.maxs.y
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn intersects_is_symmetric() {
        let a = Aabb2::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        let b = Aabb2::new(Point2::new(0.5, 0.5), Point2::new(2.0, 2.0));
        let c = Aabb2::new(Point2::new(1.5, 1.5), Point2::new(2.0, 2.0));
        assert!(a.intersects(&b) && b.intersects(&a));
        assert!(!a.intersects(&c) && !c.intersects(&a));
    }
}
