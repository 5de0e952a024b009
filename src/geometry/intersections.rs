//! Intersection predicates between segments, lines, and planes.

use crate::geometry::{Line2, Plane, Segment3, SegmentPointLocation};
use crate::math::{Point2, Point3, Real};

/// The orientation of a 2D triangle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TriangleOrientation {
    /// Counter-clockwise.
    CounterClockwise,
    /// Clockwise.
    Clockwise,
    /// Degenerate (the three points are collinear).
    Degenerate,
}

/// The orientation of the 2D triangle `(a, b, c)` with the given epsilon on
/// the doubled signed area.
pub fn orientation2d(
    a: &Point2<Real>,
    b: &Point2<Real>,
    c: &Point2<Real>,
    epsilon: Real,
) -> TriangleOrientation {
    let area2 = (b - a).perp(&(c - a));
    if area2 > epsilon {
        TriangleOrientation::CounterClockwise
    } else if area2 < -epsilon {
        TriangleOrientation::Clockwise
    } else {
        TriangleOrientation::Degenerate
    }
}

/// Intersection between two segments.
pub enum SegmentsIntersection {
    /// Single point of intersection.
    Point {
        /// Location of the intersection point on the first segment.
        loc1: SegmentPointLocation,
        /// Location of the intersection point on the second segment.
        loc2: SegmentPointLocation,
    },
    /// Intersection along a segment (when both segments are collinear).
    Segment {
        /// Location of the first intersection point on the first segment.
        first_loc1: SegmentPointLocation,
        /// Location of the first intersection point on the second segment.
        first_loc2: SegmentPointLocation,
        /// Location of the second intersection point on the first segment.
        second_loc1: SegmentPointLocation,
        /// Location of the second intersection point on the second segment.
        second_loc2: SegmentPointLocation,
    },
}

/// Computes the intersection between two segments `[a, b]` and `[c, d]`.
pub fn segments_intersection2d(
    a: &Point2<Real>,
    b: &Point2<Real>,
    c: &Point2<Real>,
    d: &Point2<Real>,
    epsilon: Real,
) -> Option<SegmentsIntersection> {
    let denom = a.x * (d.y - c.y) + b.x * (c.y - d.y) + d.x * (b.y - a.y) + c.x * (a.y - b.y);

    // If denom is zero, then segments are parallel: handle separately.
    if denom.abs() < epsilon || ulps_eq!(denom, 0.0) {
        return parallel_intersection(a, b, c, d, epsilon);
    }

    let num = a.x * (d.y - c.y) + c.x * (a.y - d.y) + d.x * (c.y - a.y);
    let s = num / denom;

    let num = -(a.x * (c.y - b.y) + b.x * (a.y - c.y) + c.x * (b.y - a.y));
    let t = num / denom;

    if 0.0 > s || s > 1.0 || 0.0 > t || t > 1.0 {
        None
    } else {
        let loc1 = if s == 0.0 {
            SegmentPointLocation::OnVertex(0)
        } else if s == 1.0 {
            SegmentPointLocation::OnVertex(1)
        } else {
            SegmentPointLocation::OnEdge([1.0 - s, s])
        };

        let loc2 = if t == 0.0 {
            SegmentPointLocation::OnVertex(0)
        } else if t == 1.0 {
            SegmentPointLocation::OnVertex(1)
        } else {
            SegmentPointLocation::OnEdge([1.0 - t, t])
        };

        Some(SegmentsIntersection::Point { loc1, loc2 })
    }
}

fn parallel_intersection(
    a: &Point2<Real>,
    b: &Point2<Real>,
    c: &Point2<Real>,
    d: &Point2<Real>,
    epsilon: Real,
) -> Option<SegmentsIntersection> {
    if orientation2d(a, b, c, epsilon) != TriangleOrientation::Degenerate {
        return None;
    }

    let ab_c = between(a, b, c);
    let ab_d = between(a, b, d);
    if let (Some(loc1), Some(loc2)) = (ab_c, ab_d) {
        return Some(SegmentsIntersection::Segment {
            first_loc1: loc1,
            first_loc2: SegmentPointLocation::OnVertex(0),
            second_loc1: loc2,
            second_loc2: SegmentPointLocation::OnVertex(1),
        });
    }

    let cd_a = between(c, d, a);
    let cd_b = between(c, d, b);
    if let (Some(loc1), Some(loc2)) = (cd_a, cd_b) {
        return Some(SegmentsIntersection::Segment {
            first_loc1: SegmentPointLocation::OnVertex(0),
            first_loc2: loc1,
            second_loc1: SegmentPointLocation::OnVertex(1),
            second_loc2: loc2,
        });
    }

    if let (Some(loc1), Some(loc2)) = (ab_c, cd_b) {
        return Some(SegmentsIntersection::Segment {
            first_loc1: loc1,
            first_loc2: SegmentPointLocation::OnVertex(0),
            second_loc1: SegmentPointLocation::OnVertex(1),
            second_loc2: loc2,
        });
    }

    if let (Some(loc1), Some(loc2)) = (ab_c, cd_a) {
        return Some(SegmentsIntersection::Segment {
            first_loc1: loc1,
            first_loc2: SegmentPointLocation::OnVertex(0),
            second_loc1: SegmentPointLocation::OnVertex(0),
            second_loc2: loc2,
        });
    }

    if let (Some(loc1), Some(loc2)) = (ab_d, cd_b) {
        return Some(SegmentsIntersection::Segment {
            first_loc1: loc1,
            first_loc2: SegmentPointLocation::OnVertex(1),
            second_loc1: SegmentPointLocation::OnVertex(1),
            second_loc2: loc2,
        });
    }

    if let (Some(loc1), Some(loc2)) = (ab_d, cd_a) {
        return Some(SegmentsIntersection::Segment {
            first_loc1: loc1,
            first_loc2: SegmentPointLocation::OnVertex(1),
            second_loc1: SegmentPointLocation::OnVertex(0),
            second_loc2: loc2,
        });
    }

    None
}

// Checks that `c` is in-between `a` and `b`.
// Assumes the three points are collinear.
fn between(a: &Point2<Real>, b: &Point2<Real>, c: &Point2<Real>) -> Option<SegmentPointLocation> {
    // If ab not vertical, check betweenness on x; else on y.
    if a.x != b.x {
        if a.x <= c.x && c.x <= b.x {
            let bcoord = (c.x - a.x) / (b.x - a.x);
            return Some(SegmentPointLocation::OnEdge([1.0 - bcoord, bcoord]));
        } else if a.x >= c.x && c.x >= b.x {
            let bcoord = (c.x - b.x) / (a.x - b.x);
            return Some(SegmentPointLocation::OnEdge([bcoord, 1.0 - bcoord]));
        }
    } else if a.y != b.y {
        if a.y <= c.y && c.y <= b.y {
            let bcoord = (c.y - a.y) / (b.y - a.y);
            return Some(SegmentPointLocation::OnEdge([1.0 - bcoord, bcoord]));
        } else if a.y >= c.y && c.y >= b.y {
            let bcoord = (c.y - b.y) / (a.y - b.y);
            return Some(SegmentPointLocation::OnEdge([bcoord, 1.0 - bcoord]));
        }
    } else if a.x == c.x && a.y == c.y {
        return Some(SegmentPointLocation::OnVertex(0));
    }

    None
}

/// The intersection of two lines, if they are not parallel.
pub fn line_line_intersection(l1: &Line2, l2: &Line2) -> Option<Point2<Real>> {
    l1.intersection(l2)
}

/// The intersection of a plane and a segment, if the segment crosses the
/// plane transversally.
///
/// Segments lying inside the plane are reported as no intersection.
pub fn plane_segment_intersection(plane: &Plane, segment: &Segment3) -> Option<Point3<Real>> {
    let dir = segment.scaled_direction();
    let denom = plane.normal.dot(&dir);
    if denom.abs() < crate::math::TOLERANCE {
        return None;
    }
    let t = -(plane.normal.dot(&segment.a.coords) + plane.offset) / denom;
    if t < -crate::math::TOLERANCE || t > 1.0 + crate::math::TOLERANCE {
        return None;
    }
    Some(segment.point_at(t.clamp(0.0, 1.0)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::{Point3, Vector3};
    use na::Unit;

    #[test]
    fn crossing_segments() {
        let inter = segments_intersection2d(
            &Point2::new(-1.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(0.0, -1.0),
            &Point2::new(0.0, 1.0),
            1.0e-12,
        );
        match inter {
            Some(SegmentsIntersection::Point { loc1, loc2 }) => {
                assert_eq!(loc1.barycentric_coordinates(), [0.5, 0.5]);
                assert_eq!(loc2.barycentric_coordinates(), [0.5, 0.5]);
            }
            _ => panic!("expected a point intersection"),
        }
    }

    #[test]
    fn disjoint_parallel_segments() {
        let inter = segments_intersection2d(
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(0.0, 1.0),
            &Point2::new(1.0, 1.0),
            1.0e-12,
        );
        assert!(inter.is_none());
    }

    #[test]
    fn plane_cuts_segment() {
        let plane = Plane::from_unit_normal(
            Unit::new_normalize(Vector3::new(0.0, 1.0, 0.0)),
            Point3::new(0.0, 0.5, 0.0),
        );
        let seg = Segment3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 2.0, 0.0));
        let pt = plane_segment_intersection(&plane, &seg).unwrap();
        assert_relative_eq!(pt, Point3::new(0.0, 0.5, 0.0));

        let seg = Segment3::new(Point3::new(1.0, 0.6, 0.0), Point3::new(0.0, 2.0, 0.0));
        assert!(plane_segment_intersection(&plane, &seg).is_none());

        let seg = Segment3::new(Point3::new(1.0, 0.6, 0.0), Point3::new(0.0, 0.7, 0.0));
        assert!(plane_segment_intersection(&plane, &seg).is_none());
    }
}
