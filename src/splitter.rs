//! The polygon splitter: builds the initial constrained subdivision of each
//! support plane from its polygon and the intersection arcs crossing the
//! plane.
//!
//! The subdivision is computed as a constrained Delaunay triangulation of
//! the polygon boundary plus the crossing arcs clipped to the polygon, whose
//! triangles are then merged across non-constraint edges into the cells of
//! the induced arrangement.

use spade::{ConstrainedDelaunayTriangulation, Point2 as SpadePoint, Triangulation};

use crate::data_structure::DataStructure;
use crate::error::Error;
use crate::geometry::Segment2;
use crate::igraph::{IEdgeId, IVertexId};
use crate::math::{Point2, Real, Vector2, TOLERANCE};
use crate::mesh::{PlanarMesh, VertexId};
use crate::utils::hashmap::HashMap;
use crate::utils::point_in_poly2d;

// Matching slack for snapping subdivision elements back onto the
// intersection graph. Wider than the kernel tolerance to absorb the noise
// of the triangulation.
const BIND_EPS: Real = TOLERANCE * 100.0;

/// Ensures the given coordinate does not leave the range of values the
/// triangulation accepts.
fn sanitize_coord(coord: Real) -> Real {
    let abs = coord.abs();
    if (abs as f64) <= spade::MIN_ALLOWED_VALUE {
        return 0.0;
    }
    coord
}

fn sanitize_point(p: &Point2<Real>) -> SpadePoint<f64> {
    SpadePoint::new(sanitize_coord(p.x) as f64, sanitize_coord(p.y) as f64)
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut walk = i;
        while self.parent[walk] != root {
            let next = self.parent[walk];
            self.parent[walk] = root;
            walk = next;
        }
        root
    }

    fn union(&mut self, i: usize, j: usize) {
        let ri = self.find(i);
        let rj = self.find(j);
        if ri != rj {
            self.parent[ri] = rj;
        }
    }
}

/// Splits the polygon of the given support plane along every intersection
/// arc crossing the plane, and replaces the plane's mesh by the resulting
/// subdivision with all bindings and initial velocities installed.
pub fn split_support_plane(data: &mut DataStructure, plane: usize) -> Result<(), Error> {
    let is_bbox = data.is_bbox_plane(plane);

    // The polygon carried by the plane, with the per-corner state installed
    // when the polygon was added.
    let (polygon, old_corners) = {
        let mesh = data.mesh(plane);
        let faces: Vec<_> = mesh.faces().collect();
        if faces.len() != 1 {
            return Err(Error::invariant(format!(
                "plane {plane} must carry exactly one face before splitting"
            )));
        }
        let vs = mesh.face_vertices(faces[0]);
        let polygon: Vec<Point2<Real>> = vs.iter().map(|&v| mesh.vertex(v).point).collect();
        let corners: Vec<(Point2<Real>, Vector2<Real>, Option<IVertexId>)> = vs
            .iter()
            .map(|&v| {
                let vtx = mesh.vertex(v);
                (vtx.point, vtx.direction, vtx.ivertex)
            })
            .collect();
        (polygon, corners)
    };

    // Crossing arcs, their 2D segments, and the intersection vertices at
    // their endpoints.
    let iedges: Vec<IEdgeId> = data.support_plane(plane).unique_iedges().iter().copied().collect();
    let isegments: Vec<Segment2> = iedges.iter().map(|&ie| data.segment_2(plane, ie)).collect();
    let mut ivertex_candidates: Vec<(Point2<Real>, IVertexId)> = Vec::new();
    for &ie in &iedges {
        for iv in [data.igraph().source(ie), data.igraph().target(ie)] {
            let p = data.point_2_of_ivertex(plane, iv);
            if !ivertex_candidates
                .iter()
                .any(|(q, known)| *known == iv || (q - p).norm() <= TOLERANCE)
            {
                ivertex_candidates.push((p, iv));
            }
        }
    }

    // Constrained triangulation of the polygon boundary plus the clipped
    // crossing segments.
    let mut cdt: ConstrainedDelaunayTriangulation<SpadePoint<f64>> =
        ConstrainedDelaunayTriangulation::new();

    let mut boundary_handles = Vec::with_capacity(polygon.len());
    for p in &polygon {
        let handle = cdt
            .insert(sanitize_point(p))
            .map_err(|_| Error::DegenerateInput(format!("unmeshable polygon on plane {plane}")))?;
        boundary_handles.push(handle);
    }
    for i in 0..boundary_handles.len() {
        let j = (i + 1) % boundary_handles.len();
        if boundary_handles[i] != boundary_handles[j] {
            let _ = cdt.add_constraint_and_split(boundary_handles[i], boundary_handles[j], |v| v);
        }
    }

    for seg in &isegments {
        let Some(clipped) = clip_segment_to_polygon(seg, &polygon) else {
            continue;
        };
        if collinear_with_boundary(&clipped, &polygon) {
            // The boundary is already a constraint; re-inserting a collinear
            // copy would only create slivers.
            continue;
        }
        let a = cdt
            .insert(sanitize_point(&clipped.a))
            .map_err(|_| Error::DegenerateInput(format!("unmeshable polygon on plane {plane}")))?;
        let b = cdt
            .insert(sanitize_point(&clipped.b))
            .map_err(|_| Error::DegenerateInput(format!("unmeshable polygon on plane {plane}")))?;
        if a != b {
            let _ = cdt.add_constraint_and_split(a, b, |v| v);
        }
    }

    // Merge triangles into arrangement cells across non-constraint edges.
    let num_faces = cdt.all_faces().count();
    let mut uf = UnionFind::new(num_faces);
    let mut keep = vec![false; num_faces];

    for face in cdt.inner_faces() {
        let idx = face.fix().index();
        let vs = face.vertices();
        let center = Point2::new(
            (vs[0].position().x + vs[1].position().x + vs[2].position().x) / 3.0,
            (vs[0].position().y + vs[1].position().y + vs[2].position().y) / 3.0,
        );
        keep[idx] = point_in_poly2d(&center, &polygon);
    }

    for face in cdt.inner_faces() {
        let idx = face.fix().index();
        if !keep[idx] {
            continue;
        }
        for edge in face.adjacent_edges() {
            if cdt.is_constraint_edge(edge.as_undirected().fix()) {
                continue;
            }
            if let Some(neighbor) = edge.rev().face().as_inner() {
                let nidx = neighbor.fix().index();
                if keep[nidx] {
                    uf.union(idx, nidx);
                }
            }
        }
    }

    // Trace the border loop of every cell.
    let mut cells: HashMap<usize, Vec<(usize, usize)>> = HashMap::default();
    for face in cdt.inner_faces() {
        let idx = face.fix().index();
        if !keep[idx] {
            continue;
        }
        let root = uf.find(idx);
        for edge in face.adjacent_edges() {
            let neighbor_in_cell = edge
                .rev()
                .face()
                .as_inner()
                .map(|n| keep[n.fix().index()] && uf.find(n.fix().index()) == root)
                .unwrap_or(false);
            if !neighbor_in_cell {
                cells
                    .entry(root)
                    .or_default()
                    .push((edge.from().fix().index(), edge.to().fix().index()));
            }
        }
    }

    let positions: Vec<Point2<Real>> = cdt
        .vertices()
        .map(|v| Point2::new(v.position().x as Real, v.position().y as Real))
        .collect();

    // Build the new mesh.
    let mut mesh = PlanarMesh::new();
    let mut vertex_of: HashMap<usize, VertexId> = HashMap::default();
    let mut roots: Vec<usize> = cells.keys().copied().collect();
    roots.sort_unstable();

    let mut new_faces = Vec::new();
    for root in roots {
        let boundary = &cells[&root];
        let loop_indices = chain_boundary(boundary).ok_or_else(|| {
            Error::invariant(format!("open cell boundary on plane {plane}"))
        })?;
        let loop_vertices: Vec<VertexId> = loop_indices
            .iter()
            .map(|&i| {
                *vertex_of
                    .entry(i)
                    .or_insert_with(|| mesh.add_vertex(positions[i]))
            })
            .collect();
        let f = mesh
            .add_face(&loop_vertices)
            .map_err(Error::InvariantViolation)?;
        new_faces.push(f);
    }
    mesh.finalize_borders().map_err(Error::InvariantViolation)?;

    // Provenance.
    let input = data.support_plane(plane).input().to_vec();
    for &f in &new_faces {
        mesh.face_mut(f).input = input.clone();
    }

    // Bindings and initial velocities.
    let vertices: Vec<VertexId> = mesh.vertices().collect();
    for v in vertices {
        let p = mesh.vertex(v).point;

        if let Some((_, iv)) = ivertex_candidates
            .iter()
            .find(|(q, _)| (q - p).norm() <= BIND_EPS)
        {
            // A subdivision vertex sitting on the intersection graph is
            // terminal from the start.
            mesh.vertex_mut(v).ivertex = Some(*iv);
            continue;
        }

        if is_bbox {
            continue;
        }

        if let Some((_, dir, iv)) = old_corners
            .iter()
            .find(|(q, _, _)| (q - p).norm() <= BIND_EPS)
        {
            mesh.vertex_mut(v).direction = *dir;
            mesh.vertex_mut(v).ivertex = *iv;
            continue;
        }

        if let Some(edge_normal) = boundary_edge_normal(&p, &polygon) {
            // A crossing arc leaves the polygon here: the vertex slides
            // along the arc while the polygon edge it sits on advances at
            // unit speed.
            let hit = iedges
                .iter()
                .zip(isegments.iter())
                .find(|(_, seg)| distance_to_segment(&p, seg) <= BIND_EPS);
            if let Some((&ie, seg)) = hit {
                if let Some(line_dir) = seg.direction() {
                    let denom = line_dir.dot(&edge_normal);
                    if denom.abs() > TOLERANCE {
                        mesh.vertex_mut(v).direction = line_dir.into_inner() / denom;
                        mesh.vertex_mut(v).iedge = Some(ie);
                        continue;
                    }
                }
                mesh.vertex_mut(v).iedge = Some(ie);
            } else {
                log::warn!(
                    "plane {plane}: boundary vertex at {p:?} is not carried by any arc"
                );
            }
            continue;
        }

        // Interior vertex away from any intersection vertex: keep it frozen
        // and record the arc it lies on, if any.
        if let Some((&ie, _)) = iedges
            .iter()
            .zip(isegments.iter())
            .find(|(_, seg)| distance_to_segment(&p, seg) <= BIND_EPS)
        {
            mesh.vertex_mut(v).iedge = Some(ie);
        }
    }

    let edges: Vec<_> = mesh.edges().collect();
    for e in edges {
        let (s, t) = mesh.edge_vertices(e);
        let mid =
            Point2::from((mesh.vertex(s).point.coords + mesh.vertex(t).point.coords) * 0.5);
        if let Some((&ie, _)) = iedges
            .iter()
            .zip(isegments.iter())
            .find(|(_, seg)| distance_to_segment(&mid, seg) <= BIND_EPS)
        {
            mesh.edge_mut(e).iedge = Some(ie);
        }
    }

    data.support_plane_mut(plane).set_mesh(mesh);
    Ok(())
}

/// Clips a segment to a convex counter-clockwise polygon. Returns `None`
/// when the clipped part is shorter than the tolerance.
fn clip_segment_to_polygon(seg: &Segment2, polygon: &[Point2<Real>]) -> Option<Segment2> {
    let dir = seg.scaled_direction();
    let mut t0: Real = 0.0;
    let mut t1: Real = 1.0;

    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        let edge = b - a;
        // Interior lies to the left of every CCW edge.
        let f0 = edge.perp(&(seg.a - a));
        let f1 = edge.perp(&(seg.b - a));
        if f0 < -TOLERANCE && f1 < -TOLERANCE {
            return None;
        }
        if f0 >= -TOLERANCE && f1 >= -TOLERANCE {
            continue;
        }
        let t = f0 / (f0 - f1);
        if f0 < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
    }

    if t1 <= t0 {
        return None;
    }
    let clipped = Segment2::new(seg.a + dir * t0, seg.a + dir * t1);
    if clipped.length() <= TOLERANCE {
        None
    } else {
        Some(clipped)
    }
}

/// Whether the segment lies along one of the polygon's boundary edges.
fn collinear_with_boundary(seg: &Segment2, polygon: &[Point2<Real>]) -> bool {
    for i in 0..polygon.len() {
        let edge = Segment2::new(polygon[i], polygon[(i + 1) % polygon.len()]);
        if distance_to_segment(&seg.a, &edge) <= BIND_EPS
            && distance_to_segment(&seg.b, &edge) <= BIND_EPS
        {
            return true;
        }
    }
    false
}

/// The outward unit normal of the polygon edge carrying `p`, if `p` lies on
/// the polygon boundary.
fn boundary_edge_normal(p: &Point2<Real>, polygon: &[Point2<Real>]) -> Option<Vector2<Real>> {
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        let edge = Segment2::new(a, b);
        if distance_to_segment(p, &edge) <= BIND_EPS {
            let d = edge.direction()?;
            return Some(Vector2::new(d.y, -d.x));
        }
    }
    None
}

fn distance_to_segment(p: &Point2<Real>, seg: &Segment2) -> Real {
    let dir = seg.scaled_direction();
    let sq = dir.norm_squared();
    if sq == 0.0 {
        return (p - seg.a).norm();
    }
    let t = ((p - seg.a).dot(&dir) / sq).clamp(0.0, 1.0);
    (p - seg.point_at(t)).norm()
}

/// Chains undirected cell boundary half-edges into a single vertex loop.
fn chain_boundary(boundary: &[(usize, usize)]) -> Option<Vec<usize>> {
    if boundary.is_empty() {
        return None;
    }
    let mut next: HashMap<usize, usize> = HashMap::default();
    for &(from, to) in boundary {
        if next.insert(from, to).is_some() {
            // A pinched cell boundary cannot be chained.
            return None;
        }
    }

    let start = boundary[0].0;
    let mut out = Vec::with_capacity(boundary.len());
    let mut current = start;
    loop {
        out.push(current);
        current = *next.get(&current)?;
        if current == start {
            break;
        }
        if out.len() > boundary.len() {
            return None;
        }
    }
    if out.len() == boundary.len() {
        Some(out)
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clip_keeps_the_inner_part() {
        let polygon = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        let seg = Segment2::new(Point2::new(-1.0, 1.0), Point2::new(3.0, 1.0));
        let clipped = clip_segment_to_polygon(&seg, &polygon).unwrap();
        assert_relative_eq!(clipped.a, Point2::new(0.0, 1.0), epsilon = 1.0e-9);
        assert_relative_eq!(clipped.b, Point2::new(2.0, 1.0), epsilon = 1.0e-9);

        let outside = Segment2::new(Point2::new(-1.0, 3.0), Point2::new(3.0, 3.0));
        assert!(clip_segment_to_polygon(&outside, &polygon).is_none());
    }

    #[test]
    fn chain_boundary_orders_a_loop() {
        let boundary = [(0, 1), (2, 0), (1, 2)];
        let looped = chain_boundary(&boundary).unwrap();
        assert_eq!(looped, vec![0, 1, 2]);
    }
}
