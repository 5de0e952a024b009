//! Planar half-edge mesh carrying the time-evolving polygons of one support
//! plane.
//!
//! Each vertex stores its kinetic state `(point, direction, last event time)`
//! so its position at simulated time `t` is
//! `point + (t - last_event_time) * direction`. A zero direction means the
//! vertex is frozen. Vertices and edges may additionally be bound to the
//! simplices of the intersection graph.

use crate::igraph::{IEdgeId, IVertexId};
use crate::math::{Point2, Real, Vector2};
use crate::utils::hashmap::HashMap;

/// Index of a vertex of a planar mesh.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct VertexId(pub u32);

/// Index of a half-edge of a planar mesh.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct HalfedgeId(pub u32);

/// Index of an (undirected) edge of a planar mesh.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct EdgeId(pub u32);

/// Index of a face of a planar mesh.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct FaceId(pub u32);

const INVALID: u32 = u32::MAX;

impl FaceId {
    /// The sentinel face index marking border half-edges.
    pub const NONE: FaceId = FaceId(INVALID);
}

#[derive(Copy, Clone, Debug)]
struct Halfedge {
    target: VertexId,
    next: HalfedgeId,
    prev: HalfedgeId,
    opposite: HalfedgeId,
    edge: EdgeId,
    face: FaceId,
    active: bool,
}

/// The kinetic and binding state of one mesh vertex.
#[derive(Clone, Debug)]
pub struct Vertex {
    /// Position of the vertex at time `last_event_time`.
    pub point: Point2<Real>,
    /// Velocity of the vertex. Zero means the vertex is frozen.
    pub direction: Vector2<Real>,
    /// Time at which `point` was sampled.
    pub last_event_time: Real,
    /// Whether the vertex is still part of the subdivision.
    pub active: bool,
    /// The intersection-graph vertex this vertex is attached to, if any.
    pub ivertex: Option<IVertexId>,
    /// The intersection-graph edge this vertex slides along, if any.
    pub iedge: Option<IEdgeId>,
    halfedge: HalfedgeId,
}

/// The state of one mesh edge.
#[derive(Clone, Debug)]
pub struct Edge {
    /// The intersection-graph edge this edge lies on, if any.
    pub iedge: Option<IEdgeId>,
    /// Whether the edge is still part of the subdivision.
    pub active: bool,
    halfedge: HalfedgeId,
}

/// The state of one mesh face.
#[derive(Clone, Debug)]
pub struct Face {
    /// Indices of the input polygons this face originates from.
    pub input: Vec<usize>,
    /// Whether the face is still part of the subdivision.
    pub active: bool,
    halfedge: HalfedgeId,
}

/// A planar half-edge mesh with kinetic vertices.
///
/// Elements are arena-allocated and never recycled: removal only clears the
/// `active` flag, so element ids stay valid for the whole lifetime of the
/// mesh.
#[derive(Clone, Debug, Default)]
pub struct PlanarMesh {
    vertices: Vec<Vertex>,
    halfedges: Vec<Halfedge>,
    edges: Vec<Edge>,
    faces: Vec<Face>,
    // Directed pair (source, target) to half-edge, for stitching faces
    // during construction.
    edge_map: HashMap<(u32, u32), HalfedgeId>,
}

impl PlanarMesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /*
     * Element access.
     */

    /// The kinetic state of a vertex.
    #[inline]
    pub fn vertex(&self, v: VertexId) -> &Vertex {
        &self.vertices[v.0 as usize]
    }

    /// Mutable kinetic state of a vertex.
    #[inline]
    pub fn vertex_mut(&mut self, v: VertexId) -> &mut Vertex {
        &mut self.vertices[v.0 as usize]
    }

    /// The state of an edge.
    #[inline]
    pub fn edge(&self, e: EdgeId) -> &Edge {
        &self.edges[e.0 as usize]
    }

    /// Mutable state of an edge.
    #[inline]
    pub fn edge_mut(&mut self, e: EdgeId) -> &mut Edge {
        &mut self.edges[e.0 as usize]
    }

    /// The state of a face.
    #[inline]
    pub fn face(&self, f: FaceId) -> &Face {
        &self.faces[f.0 as usize]
    }

    /// Mutable state of a face.
    #[inline]
    pub fn face_mut(&mut self, f: FaceId) -> &mut Face {
        &mut self.faces[f.0 as usize]
    }

    #[inline]
    fn he(&self, h: HalfedgeId) -> &Halfedge {
        &self.halfedges[h.0 as usize]
    }

    #[inline]
    fn he_mut(&mut self, h: HalfedgeId) -> &mut Halfedge {
        &mut self.halfedges[h.0 as usize]
    }

    /*
     * Topology queries.
     */

    /// The vertex a half-edge points to.
    #[inline]
    pub fn target(&self, h: HalfedgeId) -> VertexId {
        self.he(h).target
    }

    /// The vertex a half-edge starts from.
    #[inline]
    pub fn source(&self, h: HalfedgeId) -> VertexId {
        self.target(self.opposite(h))
    }

    /// The next half-edge along its face (or border loop).
    #[inline]
    pub fn next(&self, h: HalfedgeId) -> HalfedgeId {
        self.he(h).next
    }

    /// The previous half-edge along its face (or border loop).
    #[inline]
    pub fn prev(&self, h: HalfedgeId) -> HalfedgeId {
        self.he(h).prev
    }

    /// The half-edge paired with `h`, pointing the other way.
    #[inline]
    pub fn opposite(&self, h: HalfedgeId) -> HalfedgeId {
        self.he(h).opposite
    }

    /// The face of a half-edge, or `FaceId::NONE` on the border.
    #[inline]
    pub fn face_of(&self, h: HalfedgeId) -> FaceId {
        self.he(h).face
    }

    /// Whether a half-edge lies on the border of the subdivision.
    #[inline]
    pub fn is_border(&self, h: HalfedgeId) -> bool {
        self.he(h).face == FaceId::NONE
    }

    /// The undirected edge supporting a half-edge.
    #[inline]
    pub fn edge_of(&self, h: HalfedgeId) -> EdgeId {
        self.he(h).edge
    }

    /// The canonical half-edge of an edge.
    #[inline]
    pub fn halfedge_of_edge(&self, e: EdgeId) -> HalfedgeId {
        self.edge(e).halfedge
    }

    /// One half-edge of a face.
    #[inline]
    pub fn halfedge_of_face(&self, f: FaceId) -> HalfedgeId {
        self.face(f).halfedge
    }

    /// One half-edge pointing to `v`.
    #[inline]
    pub fn halfedge_of_vertex(&self, v: VertexId) -> HalfedgeId {
        self.vertex(v).halfedge
    }

    /// The two endpoints of an edge.
    pub fn edge_vertices(&self, e: EdgeId) -> (VertexId, VertexId) {
        let h = self.halfedge_of_edge(e);
        (self.source(h), self.target(h))
    }

    /// All half-edges pointing to `v`, in rotation order.
    pub fn halfedges_around_target(&self, v: VertexId) -> Vec<HalfedgeId> {
        let mut out = Vec::new();
        let start = self.vertex(v).halfedge;
        if start.0 == INVALID || !self.he(start).active {
            return out;
        }
        let mut h = start;
        loop {
            out.push(h);
            // Next half-edge pointing to the same vertex.
            h = self.opposite(self.next(h));
            if h == start || out.len() > self.halfedges.len() {
                break;
            }
        }
        out
    }

    /// The distinct faces incident to `v` (at most two for a border vertex of
    /// a planar subdivision of a convex region, but possibly more around an
    /// interior vertex).
    pub fn faces_around_vertex(&self, v: VertexId) -> Vec<FaceId> {
        let mut out = Vec::new();
        for h in self.halfedges_around_target(v) {
            let f = self.face_of(h);
            if f != FaceId::NONE && !out.contains(&f) {
                out.push(f);
            }
        }
        out
    }

    /// The incoming border half-edge of `v`, if `v` lies on the border.
    pub fn border_in(&self, v: VertexId) -> Option<HalfedgeId> {
        self.halfedges_around_target(v)
            .into_iter()
            .find(|&h| self.is_border(h))
    }

    /// The number of active edges incident to `v`.
    pub fn degree(&self, v: VertexId) -> usize {
        self.halfedges_around_target(v).len()
    }

    /// The half-edge of face `f` pointing to `v`, if any.
    pub fn halfedge_in_face_targeting(&self, v: VertexId, f: FaceId) -> Option<HalfedgeId> {
        self.halfedges_around_target(v)
            .into_iter()
            .find(|&h| self.face_of(h) == f)
    }

    /// The half-edge from `u` to `v`, if the two vertices are connected.
    pub fn halfedge_between(&self, u: VertexId, v: VertexId) -> Option<HalfedgeId> {
        self.halfedges_around_target(v)
            .into_iter()
            .find(|&h| self.source(h) == u)
    }

    /// The edge connecting `u` and `v`, if any.
    pub fn edge_between(&self, u: VertexId, v: VertexId) -> Option<EdgeId> {
        self.halfedge_between(u, v).map(|h| self.edge_of(h))
    }

    /// The vertices of a face, in order.
    pub fn face_vertices(&self, f: FaceId) -> Vec<VertexId> {
        self.face_halfedges(f)
            .into_iter()
            .map(|h| self.target(h))
            .collect()
    }

    /// The half-edges of a face, in order.
    pub fn face_halfedges(&self, f: FaceId) -> Vec<HalfedgeId> {
        let mut out = Vec::new();
        let start = self.face(f).halfedge;
        let mut h = start;
        loop {
            out.push(h);
            h = self.next(h);
            if h == start || out.len() > self.halfedges.len() {
                break;
            }
        }
        out
    }

    /// The edges of a face, in order.
    pub fn face_edges(&self, f: FaceId) -> Vec<EdgeId> {
        self.face_halfedges(f)
            .into_iter()
            .map(|h| self.edge_of(h))
            .collect()
    }

    /// The previous and next vertices of `v` along the border of face `f`.
    pub fn prev_next_in_face(&self, v: VertexId, f: FaceId) -> Option<(VertexId, VertexId)> {
        let h = self.halfedge_in_face_targeting(v, f)?;
        Some((self.source(h), self.target(self.next(h))))
    }

    /// The previous and next vertices of `v` along the border loop of the
    /// subdivision.
    pub fn border_prev_and_next(&self, v: VertexId) -> Option<(VertexId, VertexId)> {
        let b = self.border_in(v)?;
        Some((self.source(b), self.target(self.next(b))))
    }

    /*
     * Iterators.
     */

    /// Ids of all active vertices.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.active)
            .map(|(i, _)| VertexId(i as u32))
    }

    /// Ids of all active edges.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.active)
            .map(|(i, _)| EdgeId(i as u32))
    }

    /// Ids of all active faces.
    pub fn faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.active)
            .map(|(i, _)| FaceId(i as u32))
    }

    /// Number of active faces.
    pub fn num_faces(&self) -> usize {
        self.faces.iter().filter(|f| f.active).count()
    }

    /// Number of active vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.iter().filter(|v| v.active).count()
    }

    /*
     * Kinetic state.
     */

    /// The position of `v` at simulated time `t`.
    #[inline]
    pub fn position_at(&self, v: VertexId, t: Real) -> Point2<Real> {
        let vtx = self.vertex(v);
        vtx.point + vtx.direction * (t - vtx.last_event_time)
    }

    /// Whether `v` has a zero velocity.
    #[inline]
    pub fn is_frozen(&self, v: VertexId) -> bool {
        self.vertex(v).direction == Vector2::zeros()
    }

    /// Re-anchors the kinetic state of `v` at time `t` with a new direction.
    pub fn set_motion(&mut self, v: VertexId, t: Real, direction: Vector2<Real>) {
        let point = self.position_at(v, t);
        let vtx = self.vertex_mut(v);
        vtx.point = point;
        vtx.last_event_time = t;
        vtx.direction = direction;
    }

    /// Stops `v` at its position at time `t`.
    pub fn freeze(&mut self, v: VertexId, t: Real) {
        self.set_motion(v, t, Vector2::zeros());
    }

    /*
     * Construction.
     */

    /// Adds an isolated, frozen vertex.
    pub fn add_vertex(&mut self, point: Point2<Real>) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Vertex {
            point,
            direction: Vector2::zeros(),
            last_event_time: 0.0,
            active: true,
            ivertex: None,
            iedge: None,
            halfedge: HalfedgeId(INVALID),
        });
        id
    }

    fn new_edge(&mut self, u: VertexId, v: VertexId) -> (HalfedgeId, HalfedgeId) {
        let h = HalfedgeId(self.halfedges.len() as u32);
        let o = HalfedgeId(h.0 + 1);
        let e = EdgeId(self.edges.len() as u32);
        self.halfedges.push(Halfedge {
            target: v,
            next: HalfedgeId(INVALID),
            prev: HalfedgeId(INVALID),
            opposite: o,
            edge: e,
            face: FaceId::NONE,
            active: true,
        });
        self.halfedges.push(Halfedge {
            target: u,
            next: HalfedgeId(INVALID),
            prev: HalfedgeId(INVALID),
            opposite: h,
            edge: e,
            face: FaceId::NONE,
            active: true,
        });
        self.edges.push(Edge {
            iedge: None,
            active: true,
            halfedge: h,
        });
        (h, o)
    }

    /// Adds a face from a counter-clockwise loop of vertices, stitching it to
    /// already-inserted faces along shared edges.
    ///
    /// Border links are left unresolved until [`Self::finalize_borders`] is
    /// called.
    pub fn add_face(&mut self, loop_vertices: &[VertexId]) -> Result<FaceId, String> {
        let n = loop_vertices.len();
        if n < 3 {
            return Err("face with fewer than 3 vertices".to_string());
        }

        let f = FaceId(self.faces.len() as u32);
        let mut hes = Vec::with_capacity(n);

        for i in 0..n {
            let u = loop_vertices[i];
            let v = loop_vertices[(i + 1) % n];
            let h = match self.edge_map.get(&(u.0, v.0)).copied() {
                Some(h) => {
                    if self.face_of(h) != FaceId::NONE {
                        return Err(format!("non-manifold edge ({}, {})", u.0, v.0));
                    }
                    h
                }
                None => {
                    let (h, o) = self.new_edge(u, v);
                    let _ = self.edge_map.insert((u.0, v.0), h);
                    let _ = self.edge_map.insert((v.0, u.0), o);
                    h
                }
            };
            hes.push(h);
        }

        for i in 0..n {
            let h = hes[i];
            let hn = hes[(i + 1) % n];
            self.he_mut(h).face = f;
            self.he_mut(h).next = hn;
            self.he_mut(hn).prev = h;
        }

        self.faces.push(Face {
            input: Vec::new(),
            active: true,
            halfedge: hes[0],
        });
        Ok(f)
    }

    /// Links the border half-edges into loops and assigns each vertex a
    /// half-edge reference (preferring an incoming border half-edge).
    ///
    /// Must be called once after the last [`Self::add_face`].
    pub fn finalize_borders(&mut self) -> Result<(), String> {
        // One outgoing border half-edge per border vertex.
        let mut border_out: HashMap<u32, HalfedgeId> = HashMap::default();
        for i in 0..self.halfedges.len() {
            let h = HalfedgeId(i as u32);
            if !self.he(h).active || !self.is_border(h) {
                continue;
            }
            let src = self.source(h);
            if border_out.insert(src.0, h).is_some() {
                return Err(format!("vertex {} has a pinched border", src.0));
            }
        }

        for i in 0..self.halfedges.len() {
            let h = HalfedgeId(i as u32);
            if !self.he(h).active || !self.is_border(h) {
                continue;
            }
            let t = self.target(h);
            let next = *border_out
                .get(&t.0)
                .ok_or_else(|| format!("open border at vertex {}", t.0))?;
            self.he_mut(h).next = next;
            self.he_mut(next).prev = h;
        }

        for i in 0..self.halfedges.len() {
            let h = HalfedgeId(i as u32);
            if !self.he(h).active {
                continue;
            }
            let t = self.target(h);
            let cur = self.vertex(t).halfedge;
            if cur.0 == INVALID || (self.is_border(h) && !self.is_border(cur)) {
                self.vertex_mut(t).halfedge = h;
            }
        }

        self.edge_map.clear();
        Ok(())
    }

    /*
     * Kinetic mutations.
     */

    /// Splits the face corner at the target of `h_in` by inserting a new
    /// vertex `w` right after it along the face loop.
    ///
    /// Given the face chain `p -> v -> n` with `h_in` pointing to `v`, the
    /// chain becomes `p -> v -> w -> n` and the border is rerouted through
    /// `w`. The corner must open onto the border: the half-edge opposite to
    /// `next(h_in)` must be a border half-edge.
    ///
    /// Returns the new vertex, the new edge `(v, w)` and the new interior
    /// half-edge `v -> w`.
    pub fn split_corner(
        &mut self,
        h_in: HalfedgeId,
    ) -> Result<(VertexId, EdgeId, HalfedgeId), String> {
        let f = self.face_of(h_in);
        if f == FaceId::NONE {
            return Err("cannot split a border corner".to_string());
        }
        let v = self.target(h_in);
        let h2 = self.next(h_in);
        let o2 = self.opposite(h2);
        if !self.is_border(o2) {
            return Err("the corner does not open onto the border".to_string());
        }

        let point = self.vertex(v).point;
        let w = self.add_vertex(point);
        {
            // The new vertex inherits the kinetic anchor of the split one.
            let (p, t0) = {
                let vtx = self.vertex(v);
                (vtx.point, vtx.last_event_time)
            };
            let wtx = self.vertex_mut(w);
            wtx.point = p;
            wtx.last_event_time = t0;
        }

        let (hn, on) = self.new_edge(v, w);
        let e_n = self.edge_of(hn);

        // Interior chain p -> v -> w -> n.
        self.he_mut(hn).face = f;
        self.he_mut(h_in).next = hn;
        self.he_mut(hn).prev = h_in;
        self.he_mut(hn).next = h2;
        self.he_mut(h2).prev = hn;

        // The half-edge entering the old corner from the border side now
        // enters the new vertex.
        self.he_mut(o2).target = w;

        // Border chain ... -> o2 -> on -> (old border out of v) -> ...
        let b_out = self.next(o2);
        self.he_mut(o2).next = on;
        self.he_mut(on).prev = o2;
        self.he_mut(on).next = b_out;
        self.he_mut(b_out).prev = on;

        self.vertex_mut(w).halfedge = o2;
        self.vertex_mut(v).halfedge = on;

        Ok((w, e_n, hn))
    }

    /// Collapses the border edge supported by the interior half-edge `h`,
    /// merging its target into its source.
    ///
    /// The half-edge opposite to `h` must be a border half-edge. If the face
    /// of `h` degenerates to two edges, it is dissolved and its two edges are
    /// merged.
    pub fn collapse_border_edge(&mut self, h: HalfedgeId) -> Result<(), String> {
        let f = self.face_of(h);
        let o = self.opposite(h);
        if f == FaceId::NONE || !self.is_border(o) {
            return Err("not an interior half-edge with a border opposite".to_string());
        }
        let a = self.source(h);
        let b = self.target(h);
        if a == b {
            return Err("cannot collapse a self-loop".to_string());
        }

        // Re-target every half-edge pointing to the removed vertex.
        let incoming = self.halfedges_around_target(b);
        if incoming.is_empty() || incoming.len() > 64 {
            return Err("broken vertex ring".to_string());
        }
        for x in &incoming {
            self.he_mut(*x).target = a;
        }

        let hp = self.prev(h);
        let hn = self.next(h);
        self.he_mut(hp).next = hn;
        self.he_mut(hn).prev = hp;

        let bp = self.prev(o);
        let bn = self.next(o);
        self.he_mut(bp).next = bn;
        self.he_mut(bn).prev = bp;

        let e = self.edge_of(h);
        self.edge_mut(e).active = false;
        self.he_mut(h).active = false;
        self.he_mut(o).active = false;
        self.vertex_mut(b).active = false;

        if self.face(f).halfedge == h {
            self.face_mut(f).halfedge = hp;
        }
        // `bp` is a border half-edge that now points to the surviving vertex.
        self.vertex_mut(a).halfedge = bp;

        // Dissolve the face if it degenerated to two edges.
        if self.next(hn) == hp && self.next(hp) == hn {
            self.dissolve_digon(f, hp, hn)?;
        }

        Ok(())
    }

    fn dissolve_digon(&mut self, f: FaceId, d1: HalfedgeId, d2: HalfedgeId) -> Result<(), String> {
        let o1 = self.opposite(d1);
        let o2 = self.opposite(d2);
        if self.is_border(o1) && self.is_border(o2) {
            return Err("digon face with no neighbor".to_string());
        }

        let t1 = self.target(d1);
        let s1 = self.target(d2);

        self.he_mut(o1).opposite = o2;
        self.he_mut(o2).opposite = o1;

        let e1 = self.edge_of(d1);
        let e2 = self.edge_of(d2);
        self.he_mut(o2).edge = e1;
        self.edge_mut(e1).halfedge = o1;
        if self.edge(e1).iedge.is_none() {
            self.edge_mut(e1).iedge = self.edge(e2).iedge;
        }
        self.edge_mut(e2).active = false;

        self.he_mut(d1).active = false;
        self.he_mut(d2).active = false;
        self.face_mut(f).active = false;

        if self.vertex(t1).halfedge == d1 || self.vertex(t1).halfedge == d2 {
            self.vertex_mut(t1).halfedge = o2;
        }
        if self.vertex(s1).halfedge == d1 || self.vertex(s1).halfedge == d2 {
            self.vertex_mut(s1).halfedge = o1;
        }
        Ok(())
    }

    /*
     * Validity.
     */

    /// Checks the structural soundness of the mesh: pairing involution, face
    /// loop closure, next/prev consistency, and target consistency.
    pub fn check_valid(&self) -> Result<(), String> {
        for i in 0..self.halfedges.len() {
            let h = HalfedgeId(i as u32);
            if !self.he(h).active {
                continue;
            }
            let o = self.opposite(h);
            if self.opposite(o) != h {
                return Err(format!("halfedge {i}: pairing is not an involution"));
            }
            if !self.he(o).active {
                return Err(format!("halfedge {i}: paired with an inactive half-edge"));
            }
            if self.prev(self.next(h)) != h {
                return Err(format!("halfedge {i}: next/prev mismatch"));
            }
            if self.face_of(self.next(h)) != self.face_of(h) {
                return Err(format!("halfedge {i}: next jumps across faces"));
            }
            if !self.vertex(self.target(h)).active {
                return Err(format!("halfedge {i}: points to an inactive vertex"));
            }
            if self.edge(self.edge_of(h)).active
                && self.he(self.edge(self.edge_of(h)).halfedge).edge != self.edge_of(h)
            {
                return Err(format!("halfedge {i}: edge record mismatch"));
            }
        }

        for i in 0..self.faces.len() {
            let f = FaceId(i as u32);
            if !self.face(f).active {
                continue;
            }
            let hes = self.face_halfedges(f);
            if hes.len() < 3 {
                return Err(format!("face {i}: fewer than 3 half-edges"));
            }
            for h in hes {
                if self.face_of(h) != f {
                    return Err(format!("face {i}: loop leaks into another face"));
                }
            }
        }

        for i in 0..self.vertices.len() {
            let v = VertexId(i as u32);
            if !self.vertex(v).active {
                continue;
            }
            let h = self.vertex(v).halfedge;
            if h.0 != INVALID && (!self.he(h).active || self.target(h) != v) {
                return Err(format!("vertex {i}: stale half-edge reference"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn square_mesh() -> (PlanarMesh, [VertexId; 4], FaceId) {
        let mut mesh = PlanarMesh::new();
        let vs = [
            mesh.add_vertex(Point2::new(0.0, 0.0)),
            mesh.add_vertex(Point2::new(1.0, 0.0)),
            mesh.add_vertex(Point2::new(1.0, 1.0)),
            mesh.add_vertex(Point2::new(0.0, 1.0)),
        ];
        let f = mesh.add_face(&vs).unwrap();
        mesh.finalize_borders().unwrap();
        (mesh, vs, f)
    }

    #[test]
    fn build_single_face() {
        let (mesh, vs, f) = square_mesh();
        mesh.check_valid().unwrap();
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.face_vertices(f).len(), 4);
        let (prev, next) = mesh.prev_next_in_face(vs[1], f).unwrap();
        assert_eq!(prev, vs[0]);
        assert_eq!(next, vs[2]);
        // The border loop of a single CCW face runs clockwise.
        let (bprev, bnext) = mesh.border_prev_and_next(vs[1]).unwrap();
        assert_eq!(bprev, vs[2]);
        assert_eq!(bnext, vs[0]);
    }

    #[test]
    fn build_two_faces_shares_edge() {
        let mut mesh = PlanarMesh::new();
        let v0 = mesh.add_vertex(Point2::new(0.0, 0.0));
        let v1 = mesh.add_vertex(Point2::new(1.0, 0.0));
        let v2 = mesh.add_vertex(Point2::new(1.0, 1.0));
        let v3 = mesh.add_vertex(Point2::new(0.0, 1.0));
        let f0 = mesh.add_face(&[v0, v1, v2]).unwrap();
        let f1 = mesh.add_face(&[v0, v2, v3]).unwrap();
        mesh.finalize_borders().unwrap();
        mesh.check_valid().unwrap();

        let shared = mesh.edge_between(v0, v2).unwrap();
        let h = mesh.halfedge_of_edge(shared);
        let faces = [mesh.face_of(h), mesh.face_of(mesh.opposite(h))];
        assert!(faces.contains(&f0) && faces.contains(&f1));
        assert_eq!(mesh.faces_around_vertex(v0).len(), 2);
        assert_eq!(mesh.faces_around_vertex(v1).len(), 1);
    }

    #[test]
    fn split_corner_inserts_border_vertex() {
        let (mut mesh, vs, f) = square_mesh();
        let h_in = mesh.halfedge_in_face_targeting(vs[1], f).unwrap();
        let (w, _e, _h) = mesh.split_corner(h_in).unwrap();
        mesh.check_valid().unwrap();

        let loop_vs = mesh.face_vertices(f);
        assert_eq!(loop_vs.len(), 5);
        let i1 = loop_vs.iter().position(|&v| v == vs[1]).unwrap();
        assert_eq!(loop_vs[(i1 + 1) % 5], w);
        assert_eq!(mesh.vertex(w).point, mesh.vertex(vs[1]).point);
    }

    #[test]
    fn collapse_border_edge_merges_vertices() {
        let (mut mesh, vs, f) = square_mesh();
        let h_in = mesh.halfedge_in_face_targeting(vs[1], f).unwrap();
        let (w, _, h_vw) = mesh.split_corner(h_in).unwrap();
        mesh.collapse_border_edge(h_vw).unwrap();
        mesh.check_valid().unwrap();

        assert!(!mesh.vertex(w).active);
        assert_eq!(mesh.face_vertices(f).len(), 4);
        assert_eq!(mesh.num_vertices(), 4);
    }

    #[test]
    fn kinetic_positions_interpolate() {
        let (mut mesh, vs, _) = square_mesh();
        mesh.set_motion(vs[0], 0.0, Vector2::new(1.0, 2.0));
        assert_eq!(mesh.position_at(vs[0], 0.5), Point2::new(0.5, 1.0));
        mesh.set_motion(vs[0], 0.5, Vector2::new(-1.0, 0.0));
        assert_eq!(mesh.position_at(vs[0], 1.0), Point2::new(0.0, 1.0));
        mesh.freeze(vs[0], 1.0);
        assert!(mesh.is_frozen(vs[0]));
        assert_eq!(mesh.position_at(vs[0], 7.0), Point2::new(0.0, 1.0));
    }
}
