//! Support plane equations and their 2D coordinate frames.

use crate::geometry::{Segment2, Segment3};
use crate::math::{Point2, Point3, Real, Vector2, Vector3, TOLERANCE};
use na::Unit;

/// A plane in 3D space together with an orthonormal in-plane frame.
///
/// The plane is the zero-set of `normal . x + offset`. The frame maps plane
/// points to 2D coordinates through a rigid isometry, so `to_2d` and `to_3d`
/// are exact inverses of each other (up to arithmetic noise) and preserve
/// distances.
#[derive(Debug, Clone)]
pub struct Plane {
    /// The unit normal of the plane.
    pub normal: Unit<Vector3<Real>>,
    /// The signed offset of the plane: `normal . x + offset = 0` on the plane.
    pub offset: Real,
    origin: Point3<Real>,
    basis: [Vector3<Real>; 2],
}

impl Plane {
    /// The plane with the given unit normal passing through `point`.
    pub fn from_unit_normal(normal: Unit<Vector3<Real>>, point: Point3<Real>) -> Self {
        let offset = -normal.dot(&point.coords);
        let basis = orthonormal_basis(&normal);
        Plane {
            normal,
            offset,
            origin: point,
            basis,
        }
    }

    /// The supporting plane of the given polygon, with the normal oriented by
    /// the winding of the points.
    ///
    /// Returns `None` if the points are all (nearly) collinear.
    pub fn from_points(points: &[Point3<Real>]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }

        // Newell's method: robust for nearly-degenerate polygons.
        let mut n = Vector3::zeros();
        let mut c = Vector3::zeros();
        for i in 0..points.len() {
            let p = points[i];
            let q = points[(i + 1) % points.len()];
            n.x += (p.y - q.y) * (p.z + q.z);
            n.y += (p.z - q.z) * (p.x + q.x);
            n.z += (p.x - q.x) * (p.y + q.y);
            c += p.coords;
        }

        let normal = Unit::try_new(n, TOLERANCE)?;
        let center = Point3::from(c / points.len() as Real);
        Some(Self::from_unit_normal(normal, center))
    }

    /// The signed distance from `pt` to this plane.
    #[inline]
    pub fn signed_distance(&self, pt: &Point3<Real>) -> Real {
        self.normal.dot(&pt.coords) + self.offset
    }

    /// Whether `pt` lies on this plane, up to the kernel tolerance.
    #[inline]
    pub fn contains_point(&self, pt: &Point3<Real>) -> bool {
        self.signed_distance(pt).abs() <= TOLERANCE * 10.0
    }

    /// Maps an ambient point to the 2D frame of this plane.
    ///
    /// The point is first orthogonally projected onto the plane.
    pub fn to_2d(&self, pt: &Point3<Real>) -> Point2<Real> {
        let d = pt - self.origin;
        Point2::new(d.dot(&self.basis[0]), d.dot(&self.basis[1]))
    }

    /// Maps a 2D point of the plane frame back to ambient space.
    pub fn to_3d(&self, pt: &Point2<Real>) -> Point3<Real> {
        self.origin + self.basis[0] * pt.x + self.basis[1] * pt.y
    }

    /// Maps an ambient vector to the 2D frame of this plane.
    pub fn to_2d_vector(&self, v: &Vector3<Real>) -> Vector2<Real> {
        Vector2::new(v.dot(&self.basis[0]), v.dot(&self.basis[1]))
    }

    /// Maps a 2D vector of the plane frame back to ambient space.
    pub fn to_3d_vector(&self, v: &Vector2<Real>) -> Vector3<Real> {
        self.basis[0] * v.x + self.basis[1] * v.y
    }

    /// Maps an ambient segment to the 2D frame of this plane.
    pub fn to_2d_segment(&self, seg: &Segment3) -> Segment2 {
        Segment2::new(self.to_2d(&seg.a), self.to_2d(&seg.b))
    }

    /// Whether this plane and `other` describe the same (unoriented) plane,
    /// up to the kernel tolerance.
    pub fn is_same_plane(&self, other: &Plane) -> bool {
        let cos = self.normal.dot(&other.normal);
        if cos.abs() < 1.0 - TOLERANCE {
            return false;
        }
        let offset = if cos > 0.0 {
            other.offset
        } else {
            -other.offset
        };
        (self.offset - offset).abs() <= TOLERANCE * 10.0
    }
}

/// An orthonormal basis of the subspace orthogonal to `n`.
fn orthonormal_basis(n: &Unit<Vector3<Real>>) -> [Vector3<Real>; 2] {
    // Pick the coordinate axis least aligned with the normal.
    let a = if n.x.abs() <= n.y.abs() && n.x.abs() <= n.z.abs() {
        Vector3::x()
    } else if n.y.abs() <= n.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };

    let b0 = n.cross(&a).normalize();
    let b1 = n.cross(&b0);
    [b0, b1]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn to_2d_to_3d_roundtrip() {
        let plane = Plane::from_points(&[
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ])
        .unwrap();

        let pt = Point3::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0);
        let pt2 = plane.to_2d(&pt);
        assert_relative_eq!(plane.to_3d(&pt2), pt, epsilon = 1.0e-10);
    }

    #[test]
    fn frame_preserves_distances() {
        let plane = Plane::from_points(&[
            Point3::new(0.0, 0.5, 0.0),
            Point3::new(1.0, 0.5, 0.0),
            Point3::new(1.0, 0.5, 1.0),
        ])
        .unwrap();

        let a = Point3::new(0.25, 0.5, 0.75);
        let b = Point3::new(-0.5, 0.5, 0.25);
        let d3 = (b - a).norm();
        let d2 = (plane.to_2d(&b) - plane.to_2d(&a)).norm();
        assert_relative_eq!(d3, d2, epsilon = 1.0e-10);
    }

    #[test]
    fn coplanarity_is_orientation_independent() {
        let p1 = Plane::from_points(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ])
        .unwrap();
        let p2 = Plane::from_points(&[
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ])
        .unwrap();
        let p3 = Plane::from_points(&[
            Point3::new(0.0, 0.0, 0.5),
            Point3::new(1.0, 0.0, 0.5),
            Point3::new(1.0, 1.0, 0.5),
        ])
        .unwrap();

        assert!(p1.is_same_plane(&p2));
        assert!(!p1.is_same_plane(&p3));
    }
}
