//! Geometric primitives and predicates used by the kinetic process.

pub use self::aabb2::Aabb2;
pub use self::intersections::{
    line_line_intersection, plane_segment_intersection, segments_intersection2d,
    SegmentsIntersection, TriangleOrientation,
};
pub use self::line2::Line2;
pub use self::plane::Plane;
pub use self::segment::{Segment2, Segment3, SegmentPointLocation};

mod aabb2;
mod intersections;
mod line2;
mod plane;
mod segment;
