//! A support plane: the plane equation of one input polygon (or bounding-box
//! face) together with the planar mesh carrying its time-evolving
//! subdivision.

use std::collections::BTreeSet;

use crate::geometry::{Aabb2, Plane, Segment2};
use crate::igraph::{IEdgeId, IVertexId};
use crate::math::{Point2, Point3, Real, Vector2, TOLERANCE};
use crate::mesh::{EdgeId, FaceId, PlanarMesh, VertexId};

/// A support plane and its kinetic 2D state.
#[derive(Debug, Clone)]
pub struct SupportPlane {
    plane: Plane,
    mesh: PlanarMesh,
    unique_iedges: BTreeSet<IEdgeId>,
    iedges: Vec<IEdgeId>,
    isegments: Vec<Segment2>,
    ibboxes: Vec<Aabb2>,
    k: u32,
    input: Vec<usize>,
}

impl SupportPlane {
    /// A support plane from its geometric plane.
    pub fn new(plane: Plane) -> Self {
        SupportPlane {
            plane,
            mesh: PlanarMesh::new(),
            unique_iedges: BTreeSet::new(),
            iedges: Vec::new(),
            isegments: Vec::new(),
            ibboxes: Vec::new(),
            k: 1,
            input: Vec::new(),
        }
    }

    /// The supporting plane of the given polygon, oriented by its winding.
    pub fn from_polygon(points: &[Point3<Real>]) -> Option<Self> {
        Plane::from_points(points).map(Self::new)
    }

    /// The plane equation and 2D frame.
    #[inline]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// The planar mesh of this plane.
    #[inline]
    pub fn mesh(&self) -> &PlanarMesh {
        &self.mesh
    }

    /// Mutable access to the planar mesh of this plane.
    #[inline]
    pub fn mesh_mut(&mut self) -> &mut PlanarMesh {
        &mut self.mesh
    }

    /// Replaces the planar mesh of this plane. Used once, by the polygon
    /// splitter, when the initial subdivision replaces the raw input polygon.
    pub fn set_mesh(&mut self, mesh: PlanarMesh) {
        self.mesh = mesh;
    }

    /// The remaining crossing budget of this plane.
    #[inline]
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Sets the crossing budget of this plane.
    pub fn set_k(&mut self, k: u32) {
        self.k = k;
    }

    /// Decrements the crossing budget of this plane.
    pub fn decrement_k(&mut self) {
        debug_assert!(self.k > 1);
        self.k -= 1;
    }

    /// The indices of the input polygons carried by this plane.
    #[inline]
    pub fn input(&self) -> &[usize] {
        &self.input
    }

    /*
     * Conversions between the plane frame and ambient space.
     */

    /// Maps an ambient point to the 2D frame of this plane.
    #[inline]
    pub fn to_2d(&self, point: &Point3<Real>) -> Point2<Real> {
        self.plane.to_2d(point)
    }

    /// Maps a 2D point of this plane back to ambient space.
    #[inline]
    pub fn to_3d(&self, point: &Point2<Real>) -> Point3<Real> {
        self.plane.to_3d(point)
    }

    /// The position of a mesh vertex at the given time.
    #[inline]
    pub fn position_at(&self, v: VertexId, t: Real) -> Point2<Real> {
        self.mesh.position_at(v, t)
    }

    /// The 3D position of a mesh vertex at the given time.
    pub fn point_3(&self, v: VertexId, t: Real) -> Point3<Real> {
        self.to_3d(&self.position_at(v, t))
    }

    /*
     * Intersection-edge bookkeeping.
     */

    /// The set of intersection arcs crossing this plane, populated during
    /// initialization.
    #[inline]
    pub fn unique_iedges(&self) -> &BTreeSet<IEdgeId> {
        &self.unique_iedges
    }

    /// Mutable access to the set of intersection arcs crossing this plane.
    #[inline]
    pub fn unique_iedges_mut(&mut self) -> &mut BTreeSet<IEdgeId> {
        &mut self.unique_iedges
    }

    /// The cached arcs crossing this plane, in a fixed order. Only available
    /// once initialization finished.
    #[inline]
    pub fn iedges(&self) -> &[IEdgeId] {
        &self.iedges
    }

    /// The cached 2D segments of [`Self::iedges`], parallel to it.
    #[inline]
    pub fn isegments(&self) -> &[Segment2] {
        &self.isegments
    }

    /// The cached 2D bounding boxes of [`Self::iedges`], parallel to it.
    #[inline]
    pub fn ibboxes(&self) -> &[Aabb2] {
        &self.ibboxes
    }

    /// Moves `unique_iedges` into the parallel `iedges`, `isegments` and
    /// `ibboxes` caches. The set is drained to avoid double storage during
    /// the kinetic phase.
    pub fn cache_iedges(&mut self, segments: Vec<Segment2>) {
        self.iedges = std::mem::take(&mut self.unique_iedges).into_iter().collect();
        debug_assert_eq!(self.iedges.len(), segments.len());
        self.ibboxes = segments.iter().map(|s| s.local_aabb()).collect();
        self.isegments = segments;
    }

    /*
     * Polygon installation.
     */

    /// Installs the initial face of an input polygon.
    ///
    /// `points` is the preprocessed polygon in the plane frame, sorted
    /// counter-clockwise around `centroid`. Every corner starts moving so
    /// that each polygon edge advances along its outward normal at unit
    /// speed.
    pub fn add_input_polygon(
        &mut self,
        points: &[Point2<Real>],
        centroid: &Point2<Real>,
        input_indices: &[usize],
    ) -> Result<FaceId, String> {
        let n = points.len();
        if n < 3 {
            return Err("input polygon with fewer than 3 corners".to_string());
        }

        let vs: Vec<VertexId> = points.iter().map(|p| self.mesh.add_vertex(*p)).collect();
        let f = self.mesh.add_face(&vs)?;
        self.mesh.finalize_borders()?;

        for i in 0..n {
            let prev = points[(i + n - 1) % n];
            let curr = points[i];
            let next = points[(i + 1) % n];
            let dir = corner_velocity(&prev, &curr, &next)
                .ok_or_else(|| "degenerate polygon corner".to_string())?;
            debug_assert!((curr - centroid).dot(&dir) > 0.0, "corner moves inwards");
            self.mesh.set_motion(vs[i], 0.0, dir);
        }

        self.input.extend_from_slice(input_indices);
        self.mesh.face_mut(f).input = input_indices.to_vec();
        Ok(f)
    }

    /// Installs the rectangular face of a bounding-box plane. The four
    /// corners are frozen and bound to the given intersection vertices.
    pub fn add_bbox_polygon(
        &mut self,
        points: &[Point2<Real>; 4],
        ivertices: &[IVertexId; 4],
    ) -> Result<[VertexId; 4], String> {
        let vs = [
            self.mesh.add_vertex(points[0]),
            self.mesh.add_vertex(points[1]),
            self.mesh.add_vertex(points[2]),
            self.mesh.add_vertex(points[3]),
        ];
        let _ = self.mesh.add_face(&vs)?;
        self.mesh.finalize_borders()?;
        for i in 0..4 {
            self.mesh.vertex_mut(vs[i]).ivertex = Some(ivertices[i]);
        }
        Ok(vs)
    }

    /*
     * Bindings to intersection simplices.
     */

    /// Binds a mesh vertex to an intersection vertex.
    pub fn set_ivertex(&mut self, v: VertexId, iv: IVertexId) {
        self.mesh.vertex_mut(v).ivertex = Some(iv);
    }

    /// Binds a mesh vertex to the intersection arc it slides along.
    pub fn set_iedge(&mut self, v: VertexId, ie: IEdgeId) {
        self.mesh.vertex_mut(v).iedge = Some(ie);
    }

    /// Binds a mesh edge to an intersection arc.
    pub fn set_edge_iedge(&mut self, e: EdgeId, ie: IEdgeId) {
        self.mesh.edge_mut(e).iedge = Some(ie);
    }

    /// Binds the edge between `v` and `u`, and both endpoints, to an
    /// intersection arc.
    pub fn set_iedge_between(&mut self, v: VertexId, u: VertexId, ie: IEdgeId) -> Result<(), String> {
        let e = self
            .mesh
            .edge_between(v, u)
            .ok_or_else(|| "no edge between the given vertices".to_string())?;
        self.mesh.edge_mut(e).iedge = Some(ie);
        self.mesh.vertex_mut(v).iedge = Some(ie);
        self.mesh.vertex_mut(u).iedge = Some(ie);
        Ok(())
    }

    /// The intersection vertex bound to a mesh vertex.
    #[inline]
    pub fn ivertex_of(&self, v: VertexId) -> Option<IVertexId> {
        self.mesh.vertex(v).ivertex
    }

    /// The intersection arc bound to a mesh vertex.
    #[inline]
    pub fn iedge_of(&self, v: VertexId) -> Option<IEdgeId> {
        self.mesh.vertex(v).iedge
    }

    /// The intersection arc bound to a mesh edge.
    #[inline]
    pub fn iedge_of_edge(&self, e: EdgeId) -> Option<IEdgeId> {
        self.mesh.edge(e).iedge
    }
}

/// The velocity of a polygon corner such that both incident edges advance
/// along their outward normals at unit speed.
///
/// The corner `curr` sits between `prev` and `next` on a counter-clockwise
/// polygon. Returns `None` if an incident edge is degenerate or the corner is
/// a half-turn.
pub fn corner_velocity(
    prev: &Point2<Real>,
    curr: &Point2<Real>,
    next: &Point2<Real>,
) -> Option<Vector2<Real>> {
    let d1 = curr - prev;
    let d2 = next - curr;
    if d1.norm() < TOLERANCE || d2.norm() < TOLERANCE {
        return None;
    }
    // Outward normal of a CCW edge points to its right.
    let n1 = Vector2::new(d1.y, -d1.x).normalize();
    let n2 = Vector2::new(d2.y, -d2.x).normalize();
    let denom = 1.0 + n1.dot(&n2);
    if denom.abs() < TOLERANCE {
        return None;
    }
    Some((n1 + n2) / denom)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::Plane;
    use crate::math::{Point3, Vector3};
    use na::Unit;

    fn xy_plane() -> SupportPlane {
        SupportPlane::new(Plane::from_unit_normal(
            Unit::new_normalize(Vector3::z()),
            Point3::origin(),
        ))
    }

    #[test]
    fn corner_velocity_of_square_moves_diagonally_at_edge_speed_one() {
        // Unit-square corner at the origin, CCW.
        let dir = corner_velocity(
            &Point2::new(0.0, 1.0),
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(dir, Vector2::new(-1.0, -1.0), epsilon = 1.0e-9);

        // Both edges must advance at unit speed along their normals.
        let n1 = Vector2::new(-1.0, 0.0);
        let n2 = Vector2::new(0.0, -1.0);
        assert_relative_eq!(dir.dot(&n1), 1.0, epsilon = 1.0e-9);
        assert_relative_eq!(dir.dot(&n2), 1.0, epsilon = 1.0e-9);
    }

    #[test]
    fn input_polygon_grows_outward() {
        let mut sp = xy_plane();
        let points = [
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, -1.0),
            Point2::new(1.0, 1.0),
            Point2::new(-1.0, 1.0),
        ];
        let centroid = Point2::origin();
        let f = sp.add_input_polygon(&points, &centroid, &[0]).unwrap();
        assert_eq!(sp.mesh().face_vertices(f).len(), 4);

        for v in sp.mesh().vertices().collect::<Vec<_>>() {
            let p0 = sp.position_at(v, 0.0);
            let p1 = sp.position_at(v, 1.0);
            assert!((p1 - centroid).norm() > (p0 - centroid).norm());
        }
    }

    #[test]
    fn bbox_polygon_is_frozen() {
        let mut sp = xy_plane();
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let ivs = [IVertexId(0), IVertexId(1), IVertexId(2), IVertexId(3)];
        let vs = sp.add_bbox_polygon(&points, &ivs).unwrap();
        for (i, v) in vs.iter().enumerate() {
            assert!(sp.mesh().is_frozen(*v));
            assert_eq!(sp.ivertex_of(*v), Some(ivs[i]));
        }
    }
}
