//! The static intersection graph: vertices and arcs of the pairwise
//! intersection lines of all support planes, clipped by the bounding box.
//!
//! The graph owns its elements in arenas and hands out stable integer
//! descriptors. Elements are never destroyed: splitting an arc deactivates
//! it and allocates two fresh descriptors, so readers holding old ids can
//! still detect the change through the `active` flag.

use std::collections::BTreeSet;

use crate::geometry::Segment3;
use crate::math::{Point3, Real, TOLERANCE};
use crate::utils::hashmap::HashMap;
use crate::utils::SortedPair;

/// Descriptor of an intersection-graph vertex.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct IVertexId(pub u32);

/// Descriptor of an intersection-graph arc.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct IEdgeId(pub u32);

/// Identifier of an infinite intersection line. Arcs with the same line id
/// are collinear fragments separated by intersection vertices.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct LineId(pub u32);

/// A node of the intersection graph.
#[derive(Clone, Debug)]
pub struct IVertex {
    /// The position of this vertex.
    pub point: Point3<Real>,
    /// The support planes meeting at this vertex.
    pub planes: BTreeSet<usize>,
    /// Whether this vertex is still part of the graph.
    pub active: bool,
}

/// A directed arc of the intersection graph.
#[derive(Clone, Debug)]
pub struct IEdge {
    /// The arc source.
    pub source: IVertexId,
    /// The arc target.
    pub target: IVertexId,
    /// The support planes this arc lies on. Always at least two once the
    /// graph is fully built.
    pub planes: BTreeSet<usize>,
    /// The infinite line this arc is a fragment of.
    pub line: Option<LineId>,
    /// Whether this arc is still part of the graph.
    pub active: bool,
}

/// The intersection graph of all support planes.
#[derive(Clone, Debug, Default)]
pub struct IntersectionGraph {
    vertices: Vec<IVertex>,
    edges: Vec<IEdge>,
    incident: Vec<Vec<IEdgeId>>,
    edge_map: HashMap<SortedPair<u32>, IEdgeId>,
    point_map: HashMap<(i64, i64, i64), IVertexId>,
    nb_lines: u32,
}

fn point_key(point: &Point3<Real>) -> (i64, i64, i64) {
    // Cells two orders of magnitude wider than the tolerance, so points
    // merged by the tolerance land in the same or in a neighboring cell.
    let quantum = TOLERANCE * 100.0;
    (
        (point.x / quantum).round() as i64,
        (point.y / quantum).round() as i64,
        (point.z / quantum).round() as i64,
    )
}

impl IntersectionGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the graph.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
        self.incident.clear();
        self.edge_map.clear();
        self.point_map.clear();
        self.nb_lines = 0;
    }

    /*
     * Vertices.
     */

    /// Adds a vertex at the given point lying on the given support planes.
    ///
    /// Two calls with points closer than the kernel tolerance return the same
    /// descriptor, with the plane sets merged. The second component tells
    /// whether a new vertex was allocated.
    pub fn add_vertex(
        &mut self,
        point: Point3<Real>,
        planes: impl IntoIterator<Item = usize>,
    ) -> (IVertexId, bool) {
        if let Some(id) = self.find_vertex(&point) {
            self.vertices[id.0 as usize].planes.extend(planes);
            return (id, false);
        }

        let id = IVertexId(self.vertices.len() as u32);
        self.vertices.push(IVertex {
            point,
            planes: planes.into_iter().collect(),
            active: true,
        });
        self.incident.push(Vec::new());
        let _ = self.point_map.insert(point_key(&point), id);
        (id, true)
    }

    /// Looks up the vertex lying at `point`, up to the kernel tolerance.
    pub fn find_vertex(&self, point: &Point3<Real>) -> Option<IVertexId> {
        let key = point_key(point);
        for dx in -1..=1i64 {
            for dy in -1..=1i64 {
                for dz in -1..=1i64 {
                    let probe = (key.0 + dx, key.1 + dy, key.2 + dz);
                    if let Some(&id) = self.point_map.get(&probe) {
                        if (self.vertices[id.0 as usize].point - point).norm() <= TOLERANCE * 100.0
                        {
                            return Some(id);
                        }
                    }
                }
            }
        }
        None
    }

    /// The position of a vertex.
    #[inline]
    pub fn point_3(&self, v: IVertexId) -> Point3<Real> {
        self.vertices[v.0 as usize].point
    }

    /// The support planes registered on a vertex.
    #[inline]
    pub fn vertex_planes(&self, v: IVertexId) -> &BTreeSet<usize> {
        &self.vertices[v.0 as usize].planes
    }

    /// Whether a vertex is active.
    #[inline]
    pub fn is_vertex_active(&self, v: IVertexId) -> bool {
        self.vertices[v.0 as usize].active
    }

    /// Sets the active flag of a vertex.
    pub fn set_vertex_active(&mut self, v: IVertexId, active: bool) {
        self.vertices[v.0 as usize].active = active;
    }

    /// The active arcs incident to a vertex.
    #[inline]
    pub fn incident_edges(&self, v: IVertexId) -> &[IEdgeId] {
        &self.incident[v.0 as usize]
    }

    /// Descriptors of all vertices ever created.
    pub fn vertices(&self) -> impl Iterator<Item = IVertexId> + '_ {
        (0..self.vertices.len()).map(|i| IVertexId(i as u32))
    }

    /// The number of vertices ever created.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /*
     * Edges.
     */

    /// Adds an arc between `u` and `v` lying on the given support planes.
    ///
    /// Idempotent on the unordered pair `(u, v)`: when the arc already
    /// exists, the plane indices are merged into it and the second component
    /// is `false`.
    pub fn add_edge(
        &mut self,
        u: IVertexId,
        v: IVertexId,
        planes: impl IntoIterator<Item = usize>,
    ) -> (IEdgeId, bool) {
        debug_assert!(u != v, "degenerate intersection arc");
        // Both endpoints must lie on a common supporting line, so their
        // plane sets cannot be disjoint.
        debug_assert!(
            !self.vertices[u.0 as usize]
                .planes
                .is_disjoint(&self.vertices[v.0 as usize].planes),
            "intersection arc between vertices sharing no support plane"
        );
        let key = SortedPair::new(u.0, v.0);
        if let Some(&e) = self.edge_map.get(&key) {
            self.edges[e.0 as usize].planes.extend(planes);
            return (e, false);
        }

        let e = IEdgeId(self.edges.len() as u32);
        self.edges.push(IEdge {
            source: u,
            target: v,
            planes: planes.into_iter().collect(),
            line: None,
            active: true,
        });
        self.incident[u.0 as usize].push(e);
        self.incident[v.0 as usize].push(e);
        let _ = self.edge_map.insert(key, e);
        (e, true)
    }

    /// Allocates a fresh line identifier.
    pub fn add_line(&mut self) -> LineId {
        let id = LineId(self.nb_lines);
        self.nb_lines += 1;
        id
    }

    /// The number of allocated line identifiers.
    pub fn nb_lines(&self) -> usize {
        self.nb_lines as usize
    }

    /// Assigns an arc to an infinite line.
    pub fn set_line(&mut self, e: IEdgeId, line: LineId) {
        self.edges[e.0 as usize].line = Some(line);
    }

    /// The line an arc is a fragment of.
    #[inline]
    pub fn line(&self, e: IEdgeId) -> Option<LineId> {
        self.edges[e.0 as usize].line
    }

    /// The source vertex of an arc.
    #[inline]
    pub fn source(&self, e: IEdgeId) -> IVertexId {
        self.edges[e.0 as usize].source
    }

    /// The target vertex of an arc.
    #[inline]
    pub fn target(&self, e: IEdgeId) -> IVertexId {
        self.edges[e.0 as usize].target
    }

    /// The endpoint of `e` opposite to `v`.
    pub fn opposite(&self, e: IEdgeId, v: IVertexId) -> IVertexId {
        let edge = &self.edges[e.0 as usize];
        if edge.source == v {
            edge.target
        } else {
            debug_assert_eq!(edge.target, v);
            edge.source
        }
    }

    /// The support planes incident to an arc.
    #[inline]
    pub fn intersected_planes(&self, e: IEdgeId) -> &BTreeSet<usize> {
        &self.edges[e.0 as usize].planes
    }

    /// Registers an extra support plane on an arc.
    pub fn add_intersected_plane(&mut self, e: IEdgeId, plane: usize) {
        let _ = self.edges[e.0 as usize].planes.insert(plane);
    }

    /// The support planes meeting at a vertex, gathered from its incident
    /// arcs. Bounding-box planes (indices below 6) are skipped unless
    /// `keep_bbox` is set.
    pub fn intersected_planes_of_vertex(&self, v: IVertexId, keep_bbox: bool) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        for &e in self.incident_edges(v) {
            for &plane in self.intersected_planes(e) {
                if !keep_bbox && plane < 6 {
                    continue;
                }
                let _ = out.insert(plane);
            }
        }
        out
    }

    /// Whether an active arc connects `u` and `v`.
    pub fn is_edge(&self, u: IVertexId, v: IVertexId) -> bool {
        self.edge_map
            .get(&SortedPair::new(u.0, v.0))
            .is_some_and(|e| self.edges[e.0 as usize].active)
    }

    /// The arc connecting `u` and `v`, if any.
    pub fn edge_between(&self, u: IVertexId, v: IVertexId) -> Option<IEdgeId> {
        self.edge_map.get(&SortedPair::new(u.0, v.0)).copied()
    }

    /// Whether an arc is active.
    #[inline]
    pub fn is_edge_active(&self, e: IEdgeId) -> bool {
        self.edges[e.0 as usize].active
    }

    /// Sets the active flag of an arc.
    pub fn set_edge_active(&mut self, e: IEdgeId, active: bool) {
        self.edges[e.0 as usize].active = active;
    }

    /// The 3D segment supporting an arc.
    pub fn segment_3(&self, e: IEdgeId) -> Segment3 {
        let edge = &self.edges[e.0 as usize];
        Segment3::new(self.point_3(edge.source), self.point_3(edge.target))
    }

    /// Descriptors of all arcs ever created.
    pub fn edges(&self) -> impl Iterator<Item = IEdgeId> + '_ {
        (0..self.edges.len()).map(|i| IEdgeId(i as u32))
    }

    /// Descriptors of all active arcs.
    pub fn active_edges(&self) -> impl Iterator<Item = IEdgeId> + '_ {
        self.edges().filter(|e| self.is_edge_active(*e))
    }

    /// The number of arcs ever created.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Splits the arc `e` at the vertex `w`, which must lie on its segment.
    ///
    /// The two new arcs inherit the plane set and line id of `e`; `e` is
    /// deactivated and detached from its endpoints. Callers must update the
    /// per-plane arc caches accordingly.
    pub fn split_edge(&mut self, e: IEdgeId, w: IVertexId) -> (IEdgeId, IEdgeId) {
        let (u, v, planes, line) = {
            let edge = &self.edges[e.0 as usize];
            (edge.source, edge.target, edge.planes.clone(), edge.line)
        };

        debug_assert!(
            {
                let seg = self.segment_3(e);
                let p = self.point_3(w);
                let d = seg.scaled_direction();
                let t = (p - seg.a).dot(&d) / d.norm_squared();
                (seg.point_at(t.clamp(0.0, 1.0)) - p).norm() <= TOLERANCE * 100.0
            },
            "split point does not lie on the arc"
        );

        self.edges[e.0 as usize].active = false;
        self.incident[u.0 as usize].retain(|&x| x != e);
        self.incident[v.0 as usize].retain(|&x| x != e);
        let _ = self.edge_map.remove(&SortedPair::new(u.0, v.0));

        let (e1, _) = self.add_edge(u, w, planes.iter().copied());
        let (e2, _) = self.add_edge(w, v, planes.iter().copied());
        if let Some(line) = line {
            self.set_line(e1, line);
            self.set_line(e2, line);
        }
        (e1, e2)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point3;

    #[test]
    fn add_vertex_dedupes_by_point() {
        let mut graph = IntersectionGraph::new();
        let (v1, inserted1) = graph.add_vertex(Point3::new(0.0, 0.0, 0.0), [0, 1]);
        let (v2, inserted2) = graph.add_vertex(Point3::new(1.0e-12, 0.0, 0.0), [2]);
        assert!(inserted1 && !inserted2);
        assert_eq!(v1, v2);
        assert_eq!(
            graph.vertex_planes(v1).iter().copied().collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn add_edge_is_idempotent() {
        let mut graph = IntersectionGraph::new();
        let (u, _) = graph.add_vertex(Point3::new(0.0, 0.0, 0.0), [0]);
        let (v, _) = graph.add_vertex(Point3::new(1.0, 0.0, 0.0), [0]);
        let (e1, inserted1) = graph.add_edge(u, v, [0, 1]);
        let (e2, inserted2) = graph.add_edge(v, u, [2]);
        assert!(inserted1 && !inserted2);
        assert_eq!(e1, e2);
        assert_eq!(graph.intersected_planes(e1).len(), 3);
    }

    #[test]
    fn split_edge_preserves_line_and_planes() {
        let mut graph = IntersectionGraph::new();
        let (u, _) = graph.add_vertex(Point3::new(0.0, 0.0, 0.0), [0, 1]);
        let (v, _) = graph.add_vertex(Point3::new(2.0, 0.0, 0.0), [0, 1]);
        let (e, _) = graph.add_edge(u, v, [0, 1]);
        let line = graph.add_line();
        graph.set_line(e, line);

        let (w, _) = graph.add_vertex(Point3::new(1.0, 0.0, 0.0), [0, 1, 2]);
        let (e1, e2) = graph.split_edge(e, w);

        assert!(!graph.is_edge_active(e));
        assert_eq!(graph.line(e1), Some(line));
        assert_eq!(graph.line(e2), Some(line));
        assert_eq!(graph.intersected_planes(e1).len(), 2);
        assert_eq!(graph.incident_edges(w).len(), 2);
        assert_eq!(graph.incident_edges(u), &[e1]);

        // Rejoining the two halves yields a graph isomorphic to the original
        // arc, up to edge identity.
        assert_eq!(graph.opposite(e1, w), u);
        assert_eq!(graph.opposite(e2, w), v);
        let rejoined: std::collections::BTreeSet<_> = graph
            .intersected_planes(e1)
            .union(graph.intersected_planes(e2))
            .copied()
            .collect();
        assert_eq!(&rejoined, graph.intersected_planes(e));
    }
}
