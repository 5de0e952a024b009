//! Line segments in the 2D frame of a support plane and in ambient space.

use crate::geometry::Aabb2;
use crate::math::{Point2, Point3, Real, Vector2, Vector3};
use na::Unit;

/// A line segment in the 2D frame of a support plane.
#[derive(PartialEq, Debug, Copy, Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Segment2 {
    /// The segment first point.
    pub a: Point2<Real>,
    /// The segment second point.
    pub b: Point2<Real>,
}

/// A line segment in ambient 3D space.
#[derive(PartialEq, Debug, Copy, Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Segment3 {
    /// The segment first point.
    pub a: Point3<Real>,
    /// The segment second point.
    pub b: Point3<Real>,
}

/// Logical description of the location of a point on a segment.
#[derive(PartialEq, Debug, Copy, Clone)]
pub enum SegmentPointLocation {
    /// The point lies on the vertex with the given index.
    OnVertex(u32),
    /// The point lies on the segment interior, with the given barycentric
    /// coordinates.
    OnEdge([Real; 2]),
}

impl SegmentPointLocation {
    /// The barycentric coordinates corresponding to this point location.
    pub fn barycentric_coordinates(&self) -> [Real; 2] {
        let mut bcoords = [0.0; 2];
        match self {
            SegmentPointLocation::OnVertex(i) => bcoords[*i as usize] = 1.0,
            SegmentPointLocation::OnEdge(uv) => {
                bcoords[0] = uv[0];
                bcoords[1] = uv[1];
            }
        }
        bcoords
    }
}

impl Segment2 {
    /// Creates a new segment from two points.
    #[inline]
    pub fn new(a: Point2<Real>, b: Point2<Real>) -> Self {
        Segment2 { a, b }
    }

    /// The direction of this segment scaled by its length.
    ///
    /// Points from `self.a` toward `self.b`.
    #[inline]
    pub fn scaled_direction(&self) -> Vector2<Real> {
        self.b - self.a
    }

    /// The length of this segment.
    #[inline]
    pub fn length(&self) -> Real {
        self.scaled_direction().norm()
    }

    /// The unit direction of this segment, if it is not degenerate.
    pub fn direction(&self) -> Option<Unit<Vector2<Real>>> {
        Unit::try_new(self.scaled_direction(), crate::math::DEFAULT_EPSILON)
    }

    /// The point at the given parameter: `a + t * (b - a)`.
    #[inline]
    pub fn point_at(&self, t: Real) -> Point2<Real> {
        self.a + self.scaled_direction() * t
    }

    /// The point matching the given location on this segment.
    pub fn point_at_location(&self, loc: &SegmentPointLocation) -> Point2<Real> {
        match *loc {
            SegmentPointLocation::OnVertex(0) => self.a,
            SegmentPointLocation::OnVertex(_) => self.b,
            SegmentPointLocation::OnEdge(bcoords) => {
                self.a * bcoords[0] + self.b.coords * bcoords[1]
            }
        }
    }

    /// The axis-aligned bounding box of this segment.
    pub fn local_aabb(&self) -> Aabb2 {
        Aabb2::new(self.a.inf(&self.b), self.a.sup(&self.b))
    }
}

impl Segment3 {
    /// Creates a new segment from two points.
    #[inline]
    pub fn new(a: Point3<Real>, b: Point3<Real>) -> Self {
        Segment3 { a, b }
    }

    /// The direction of this segment scaled by its length.
    #[inline]
    pub fn scaled_direction(&self) -> Vector3<Real> {
        self.b - self.a
    }

    /// The length of this segment.
    #[inline]
    pub fn length(&self) -> Real {
        self.scaled_direction().norm()
    }

    /// The point at the given parameter: `a + t * (b - a)`.
    #[inline]
    pub fn point_at(&self, t: Real) -> Point3<Real> {
        self.a + self.scaled_direction() * t
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn segment2_point_at() {
        let seg = Segment2::new(Point2::new(1.0, 0.0), Point2::new(3.0, 0.0));
        assert_eq!(seg.point_at(0.5), Point2::new(2.0, 0.0));
        assert_eq!(seg.length(), 2.0);
    }

    #[test]
    fn degenerate_segment_has_no_direction() {
        let seg = Segment2::new(Point2::new(1.0, 1.0), Point2::new(1.0, 1.0));
        assert!(seg.direction().is_none());
    }
}
