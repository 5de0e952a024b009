//! The central kinetic data structure: all support planes, the intersection
//! graph, the limit-line memo, and every query the event handlers rely on.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::error::Error;
use crate::geometry::{Line2, Segment2, Segment3};
use crate::igraph::{IEdgeId, IVertexId, IntersectionGraph, LineId};
use crate::math::{Point2, Point3, Real, Vector2, TOLERANCE};
use crate::mesh::{EdgeId, FaceId, PlanarMesh, VertexId};
use crate::support_plane::SupportPlane;

/// A vertex of the planar mesh of one support plane.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PVertex {
    /// The support plane index.
    pub plane: usize,
    /// The mesh vertex on that plane.
    pub vertex: VertexId,
}

/// An edge of the planar mesh of one support plane.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PEdge {
    /// The support plane index.
    pub plane: usize,
    /// The mesh edge on that plane.
    pub edge: EdgeId,
}

/// A face of the planar mesh of one support plane.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PFace {
    /// The support plane index.
    pub plane: usize,
    /// The mesh face on that plane.
    pub face: FaceId,
}

impl PVertex {
    /// A new tagged vertex.
    pub fn new(plane: usize, vertex: VertexId) -> Self {
        PVertex { plane, vertex }
    }
}

impl PEdge {
    /// A new tagged edge.
    pub fn new(plane: usize, edge: EdgeId) -> Self {
        PEdge { plane, edge }
    }
}

impl PFace {
    /// A new tagged face.
    pub fn new(plane: usize, face: FaceId) -> Self {
        PFace { plane, face }
    }
}

/// One record of the limit-line memo: the ordered pair of planes that
/// traversed the line, and whether the traversal exhausted the budget.
pub type LimitLine = Vec<((usize, usize), bool)>;

/// The kinetic data structure owning all support planes and the intersection
/// graph.
#[derive(Debug, Default)]
pub struct DataStructure {
    support_planes: Vec<SupportPlane>,
    igraph: IntersectionGraph,
    limit_lines: Vec<LimitLine>,
    previous_time: Real,
    current_time: Real,
    verbose: bool,
    input_polygon_map: BTreeMap<usize, usize>,
    pface_neighbors: BTreeMap<PFace, (Option<usize>, Option<usize>)>,
}

impl DataStructure {
    /// An empty data structure.
    pub fn new(verbose: bool) -> Self {
        DataStructure {
            verbose,
            ..Default::default()
        }
    }

    /// Clears everything.
    pub fn clear(&mut self) {
        self.support_planes.clear();
        self.igraph.clear();
        self.limit_lines.clear();
        self.previous_time = 0.0;
        self.current_time = 0.0;
        self.input_polygon_map.clear();
        self.pface_neighbors.clear();
    }

    /// Whether event traces are logged.
    #[inline]
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /*
     * General access.
     */

    /// The number of support planes.
    #[inline]
    pub fn number_of_support_planes(&self) -> usize {
        self.support_planes.len()
    }

    /// Whether the given plane is one of the six bounding-box faces.
    #[inline]
    pub fn is_bbox_plane(&self, plane: usize) -> bool {
        plane < 6
    }

    /// The support plane at the given index.
    #[inline]
    pub fn support_plane(&self, plane: usize) -> &SupportPlane {
        &self.support_planes[plane]
    }

    /// Mutable support plane at the given index.
    #[inline]
    pub fn support_plane_mut(&mut self, plane: usize) -> &mut SupportPlane {
        &mut self.support_planes[plane]
    }

    /// The planar mesh of the given plane.
    #[inline]
    pub fn mesh(&self, plane: usize) -> &PlanarMesh {
        self.support_planes[plane].mesh()
    }

    /// Mutable planar mesh of the given plane.
    #[inline]
    pub fn mesh_mut(&mut self, plane: usize) -> &mut PlanarMesh {
        self.support_planes[plane].mesh_mut()
    }

    /// The intersection graph.
    #[inline]
    pub fn igraph(&self) -> &IntersectionGraph {
        &self.igraph
    }

    /// Mutable intersection graph.
    #[inline]
    pub fn igraph_mut(&mut self) -> &mut IntersectionGraph {
        &mut self.igraph
    }

    /// The simulated time of the last processed event.
    #[inline]
    pub fn current_time(&self) -> Real {
        self.current_time
    }

    /// The simulated time of the event before the last one.
    #[inline]
    pub fn previous_time(&self) -> Real {
        self.previous_time
    }

    /// Advances the simulated time.
    pub fn update_positions(&mut self, time: Real) {
        self.previous_time = self.current_time;
        self.current_time = time;
    }

    /// The crossing budget of a plane.
    #[inline]
    pub fn k(&self, plane: usize) -> u32 {
        self.support_planes[plane].k()
    }

    /// The per-line limit memo.
    #[inline]
    pub fn limit_lines(&self) -> &[LimitLine] {
        &self.limit_lines
    }

    /// Maps an input polygon index to its support plane.
    pub fn support_plane_of_input(&self, input_index: usize) -> Option<usize> {
        self.input_polygon_map.get(&input_index).copied()
    }

    /// The map from input polygon indices to support planes.
    pub fn input_polygon_map(&self) -> &BTreeMap<usize, usize> {
        &self.input_polygon_map
    }

    /// The per-face pair of neighboring volume indices, filled by an external
    /// volume-extraction pass.
    pub fn pface_neighbors(&self) -> &BTreeMap<PFace, (Option<usize>, Option<usize>)> {
        &self.pface_neighbors
    }

    /// Mutable per-face pair of neighboring volume indices.
    pub fn pface_neighbors_mut(&mut self) -> &mut BTreeMap<PFace, (Option<usize>, Option<usize>)> {
        &mut self.pface_neighbors
    }

    /*
     * PSimplices.
     */

    /// The active vertices of the given plane.
    pub fn pvertices(&self, plane: usize) -> Vec<PVertex> {
        self.mesh(plane)
            .vertices()
            .map(|v| PVertex::new(plane, v))
            .collect()
    }

    /// The active edges of the given plane.
    pub fn pedges(&self, plane: usize) -> Vec<PEdge> {
        self.mesh(plane)
            .edges()
            .map(|e| PEdge::new(plane, e))
            .collect()
    }

    /// The active faces of the given plane.
    pub fn pfaces(&self, plane: usize) -> Vec<PFace> {
        self.mesh(plane)
            .faces()
            .map(|f| PFace::new(plane, f))
            .collect()
    }

    /// The vertices of a face, in order.
    pub fn pvertices_of_pface(&self, pface: PFace) -> Vec<PVertex> {
        self.mesh(pface.plane)
            .face_vertices(pface.face)
            .into_iter()
            .map(|v| PVertex::new(pface.plane, v))
            .collect()
    }

    /// The edges of a face, in order.
    pub fn pedges_of_pface(&self, pface: PFace) -> Vec<PEdge> {
        self.mesh(pface.plane)
            .face_edges(pface.face)
            .into_iter()
            .map(|e| PEdge::new(pface.plane, e))
            .collect()
    }

    /// The first face incident to a vertex.
    pub fn pface_of_pvertex(&self, pvertex: PVertex) -> Option<PFace> {
        self.mesh(pvertex.plane)
            .faces_around_vertex(pvertex.vertex)
            .first()
            .map(|f| PFace::new(pvertex.plane, *f))
    }

    /// All faces incident to a vertex.
    pub fn pfaces_of_pvertex(&self, pvertex: PVertex) -> Vec<PFace> {
        self.mesh(pvertex.plane)
            .faces_around_vertex(pvertex.vertex)
            .into_iter()
            .map(|f| PFace::new(pvertex.plane, f))
            .collect()
    }

    /// The previous and next neighbors of a vertex along the border of its
    /// first incident face.
    pub fn prev_and_next(&self, pvertex: PVertex) -> Option<(PVertex, PVertex)> {
        let mesh = self.mesh(pvertex.plane);
        let f = *mesh.faces_around_vertex(pvertex.vertex).first()?;
        let (p, n) = mesh.prev_next_in_face(pvertex.vertex, f)?;
        Some((PVertex::new(pvertex.plane, p), PVertex::new(pvertex.plane, n)))
    }

    /// The previous and next vertices along the border loop of the
    /// subdivision.
    pub fn border_prev_and_next(&self, pvertex: PVertex) -> Option<(PVertex, PVertex)> {
        let (p, n) = self.mesh(pvertex.plane).border_prev_and_next(pvertex.vertex)?;
        Some((PVertex::new(pvertex.plane, p), PVertex::new(pvertex.plane, n)))
    }

    /// The two endpoints of an edge.
    pub fn pedge_vertices(&self, pedge: PEdge) -> (PVertex, PVertex) {
        let (s, t) = self.mesh(pedge.plane).edge_vertices(pedge.edge);
        (PVertex::new(pedge.plane, s), PVertex::new(pedge.plane, t))
    }

    /*
     * Kinetic state of pvertices.
     */

    /// The 2D position of a vertex at the given time.
    #[inline]
    pub fn point_2(&self, pvertex: PVertex, time: Real) -> Point2<Real> {
        self.support_plane(pvertex.plane)
            .position_at(pvertex.vertex, time)
    }

    /// The 3D position of a vertex at the given time.
    pub fn point_3(&self, pvertex: PVertex, time: Real) -> Point3<Real> {
        self.support_plane(pvertex.plane).point_3(pvertex.vertex, time)
    }

    /// The 2D direction of a vertex.
    #[inline]
    pub fn direction(&self, pvertex: PVertex) -> Vector2<Real> {
        self.mesh(pvertex.plane).vertex(pvertex.vertex).direction
    }

    /// The speed of a vertex.
    pub fn speed(&self, pvertex: PVertex) -> Real {
        self.direction(pvertex).norm()
    }

    /// Whether a vertex has a zero direction.
    #[inline]
    pub fn is_frozen(&self, pvertex: PVertex) -> bool {
        self.mesh(pvertex.plane).is_frozen(pvertex.vertex)
    }

    /// Whether a vertex is still part of the subdivision.
    #[inline]
    pub fn is_active(&self, pvertex: PVertex) -> bool {
        self.mesh(pvertex.plane).vertex(pvertex.vertex).active
    }

    /// Deactivates a vertex, together with the intersection simplices bound
    /// to it.
    pub fn deactivate(&mut self, pvertex: PVertex) {
        let (iedge, ivertex) = {
            let v = self.mesh(pvertex.plane).vertex(pvertex.vertex);
            (v.iedge, v.ivertex)
        };
        self.mesh_mut(pvertex.plane).vertex_mut(pvertex.vertex).active = false;
        if let Some(ie) = iedge {
            self.igraph.set_edge_active(ie, false);
        }
        if let Some(iv) = ivertex {
            self.igraph.set_vertex_active(iv, false);
        }
    }

    /// Re-activates a vertex, together with the intersection simplices bound
    /// to it.
    pub fn activate(&mut self, pvertex: PVertex) {
        let (iedge, ivertex) = {
            let v = self.mesh(pvertex.plane).vertex(pvertex.vertex);
            (v.iedge, v.ivertex)
        };
        self.mesh_mut(pvertex.plane).vertex_mut(pvertex.vertex).active = true;
        if let Some(ie) = iedge {
            self.igraph.set_edge_active(ie, true);
        }
        if let Some(iv) = ivertex {
            self.igraph.set_vertex_active(iv, true);
        }
    }

    /*
     * Connectivity between psimplices and isimplices.
     */

    /// The intersection vertex bound to a vertex.
    pub fn ivertex_of(&self, pvertex: PVertex) -> Option<IVertexId> {
        self.support_plane(pvertex.plane).ivertex_of(pvertex.vertex)
    }

    /// The intersection arc a vertex slides along.
    pub fn iedge_of(&self, pvertex: PVertex) -> Option<IEdgeId> {
        self.support_plane(pvertex.plane).iedge_of(pvertex.vertex)
    }

    /// The intersection arc an edge lies on.
    pub fn iedge_of_pedge(&self, pedge: PEdge) -> Option<IEdgeId> {
        self.support_plane(pedge.plane).iedge_of_edge(pedge.edge)
    }

    /// Binds a vertex to an intersection vertex.
    pub fn connect_ivertex(&mut self, pvertex: PVertex, iv: IVertexId) {
        self.support_plane_mut(pvertex.plane)
            .set_ivertex(pvertex.vertex, iv);
    }

    /// Binds a vertex to an intersection arc.
    pub fn connect_iedge(&mut self, pvertex: PVertex, ie: IEdgeId) {
        self.support_plane_mut(pvertex.plane)
            .set_iedge(pvertex.vertex, ie);
    }

    /// Binds an edge to an intersection arc.
    pub fn connect_pedge(&mut self, pedge: PEdge, ie: IEdgeId) {
        self.support_plane_mut(pedge.plane)
            .set_edge_iedge(pedge.edge, ie);
    }

    /// Clears the arc binding of a vertex and returns it.
    pub fn disconnect_iedge(&mut self, pvertex: PVertex) -> Option<IEdgeId> {
        let sp = self.support_plane_mut(pvertex.plane);
        let old = sp.iedge_of(pvertex.vertex);
        sp.mesh_mut().vertex_mut(pvertex.vertex).iedge = None;
        old
    }

    /*
     * Conversions.
     */

    /// Maps an ambient point to the 2D frame of a plane.
    pub fn to_2d(&self, plane: usize, point: &Point3<Real>) -> Point2<Real> {
        self.support_plane(plane).to_2d(point)
    }

    /// Maps a 2D point of a plane frame back to ambient space.
    pub fn to_3d(&self, plane: usize, point: &Point2<Real>) -> Point3<Real> {
        self.support_plane(plane).to_3d(point)
    }

    /// The 2D position of an intersection vertex on a plane.
    pub fn point_2_of_ivertex(&self, plane: usize, iv: IVertexId) -> Point2<Real> {
        self.to_2d(plane, &self.igraph.point_3(iv))
    }

    /// The 2D segment of an intersection arc on a plane.
    pub fn segment_2(&self, plane: usize, ie: IEdgeId) -> Segment2 {
        self.support_plane(plane)
            .plane()
            .to_2d_segment(&self.igraph.segment_3(ie))
    }

    /// The 3D segment of an edge at the given time.
    pub fn segment_3_of_pedge(&self, pedge: PEdge, time: Real) -> Segment3 {
        let (s, t) = self.pedge_vertices(pedge);
        Segment3::new(self.point_3(s, time), self.point_3(t, time))
    }

    /// Whether an intersection arc lies on a bounding-box plane.
    pub fn is_bbox_iedge(&self, ie: IEdgeId) -> bool {
        self.igraph
            .intersected_planes(ie)
            .iter()
            .any(|&plane| plane < 6)
    }

    /*
     * Predicates used by the event handlers.
     */

    /// The edges bound to `query_iedge` on every incident plane other than
    /// `exclude_plane` and the bounding-box planes.
    pub fn get_occupied_pedges(
        &self,
        exclude_plane: Option<usize>,
        query_iedge: IEdgeId,
    ) -> Vec<PEdge> {
        let mut out = Vec::new();
        for &plane in self.igraph.intersected_planes(query_iedge) {
            if Some(plane) == exclude_plane || plane < 6 {
                continue;
            }
            for pedge in self.pedges(plane) {
                if self.iedge_of_pedge(pedge) == Some(query_iedge) {
                    out.push(pedge);
                }
            }
        }
        out
    }

    /// Whether `query_iedge` is already occupied by a polygon on a plane
    /// other than the one of `pvertex`.
    ///
    /// The first component tells whether at least two faces are already
    /// attached to the arc elsewhere; the second whether the arc lies on a
    /// bounding-box plane.
    pub fn is_occupied(&self, pvertex: PVertex, query_iedge: IEdgeId) -> (bool, bool) {
        let mut num_adjacent_faces = 0;
        for &plane in self.igraph.intersected_planes(query_iedge) {
            if plane == pvertex.plane {
                continue;
            }
            if plane < 6 {
                return (true, true);
            }
            let mesh = self.mesh(plane);
            for pedge in self.pedges(plane) {
                if self.iedge_of_pedge(pedge) != Some(query_iedge) {
                    continue;
                }
                let h = mesh.halfedge_of_edge(pedge.edge);
                if mesh.face_of(h) != FaceId::NONE {
                    num_adjacent_faces += 1;
                }
                if mesh.face_of(mesh.opposite(h)) != FaceId::NONE {
                    num_adjacent_faces += 1;
                }
            }
        }

        (num_adjacent_faces > 1, false)
    }

    /// Same as [`Self::is_occupied`], but restricted to occupied edges with
    /// an endpoint bound to `ivertex`.
    pub fn is_occupied_at_ivertex(
        &self,
        pvertex: PVertex,
        ivertex: IVertexId,
        query_iedge: IEdgeId,
    ) -> (bool, bool) {
        let (has_polygon, bbox_reached) = self.is_occupied(pvertex, query_iedge);
        if bbox_reached {
            return (true, true);
        }
        if !has_polygon {
            return (false, false);
        }

        for pedge in self.get_occupied_pedges(Some(pvertex.plane), query_iedge) {
            let (s, t) = self.pedge_vertices(pedge);
            if self.ivertex_of(s) == Some(ivertex) || self.ivertex_of(t) == Some(ivertex) {
                return (true, false);
            }
        }
        (false, false)
    }

    /// Whether two vertices about to meet on `iedge` approach it from the
    /// same side of an occupied arc. A sneak means an event was missed.
    pub fn is_sneaking_pedge(&self, pvertex: PVertex, pother: PVertex, iedge: IEdgeId) -> bool {
        let sneaking =
            self.is_occupied(pvertex, iedge).0 || self.is_occupied(pother, iedge).0;
        debug_assert!(
            !sneaking,
            "two vertices sneak to the other side of an occupied edge"
        );
        sneaking
    }

    /// Allocates the per-line limit memo. Called once after initialization.
    ///
    /// For every line occupied by the initial subdivisions, the ordered plane
    /// pairs that already traversed it are recorded as non-limit entries.
    pub fn set_limit_lines(&mut self) -> Result<(), Error> {
        self.limit_lines = vec![Vec::new(); self.igraph.nb_lines()];

        for line_idx in 0..self.limit_lines.len() {
            let line = LineId(line_idx as u32);
            let iedges: Vec<IEdgeId> = self
                .igraph
                .active_edges()
                .filter(|&e| self.igraph.line(e) == Some(line))
                .collect();
            if iedges.is_empty() {
                continue;
            }

            let mut unique_pedges = BTreeSet::new();
            for &iedge in &iedges {
                unique_pedges.extend(self.get_occupied_pedges(None, iedge));
            }
            if unique_pedges.is_empty() {
                continue;
            }

            let unique_sps: BTreeSet<usize> =
                unique_pedges.iter().map(|pedge| pedge.plane).collect();
            let sps: Vec<usize> = unique_sps.into_iter().collect();

            let mut pairs = Vec::new();
            match sps.len() {
                1 => {
                    let sp_idx_1 = sps[0];
                    let potential: Vec<usize> = self
                        .igraph
                        .intersected_planes(iedges[0])
                        .iter()
                        .copied()
                        .filter(|&plane| plane != sp_idx_1 && plane >= 6)
                        .collect();
                    match potential.len() {
                        0 => {}
                        1 => pairs.push(((sp_idx_1, potential[0]), false)),
                        _ => {
                            return Err(Error::Unsupported(format!(
                                "more than two planes intersected along line {line_idx}"
                            )))
                        }
                    }
                    // The swapped pair is intentionally not recorded: doing
                    // so behaves like increasing k on this line.
                }
                2 => {
                    pairs.push(((sps[0], sps[1]), false));
                    pairs.push(((sps[1], sps[0]), false));
                }
                _ => {
                    return Err(Error::Unsupported(format!(
                        "more than two planes occupied along line {line_idx}"
                    )))
                }
            }
            self.limit_lines[line_idx] = pairs;
        }
        Ok(())
    }

    /// Consults and updates the limit-line memo when the vertex `pvertex`
    /// reaches `iedge`, and spends the crossing budget of its plane.
    ///
    /// Returns whether the line is limited for that plane: a limited line
    /// freezes every vertex of the plane arriving at it.
    pub fn update_limit_lines_and_k(
        &mut self,
        pvertex: PVertex,
        iedge: IEdgeId,
        is_occupied_iedge: bool,
    ) -> Result<bool, Error> {
        let sp_idx_1 = pvertex.plane;
        let mut sp_idx_2 = None;
        for &plane in self.igraph.intersected_planes(iedge) {
            if plane == sp_idx_1 {
                continue;
            }
            if plane < 6 {
                // A bounding-box plane always stops the traversal.
                return Ok(true);
            }
            sp_idx_2 = Some(plane);
            break;
        }
        let sp_idx_2 = sp_idx_2.ok_or_else(|| {
            Error::invariant(format!(
                "intersection arc {:?} has a single incident plane",
                iedge
            ))
        })?;

        let line = self.igraph.line(iedge).ok_or_else(|| {
            Error::invariant(format!("intersection arc {:?} has no line id", iedge))
        })?;
        let line_idx = line.0 as usize;

        for ((first, second), is_limit) in &self.limit_lines[line_idx] {
            if *first == sp_idx_1 && *second == sp_idx_2 {
                return Ok(*is_limit);
            }
        }

        // The memo holds at most two ordered pairs: a third distinct pair
        // means a third plane traverses this line.
        if self.limit_lines[line_idx].len() >= 2 {
            return Err(Error::Unsupported(format!(
                "more than two planes intersected along line {line_idx}"
            )));
        }

        let is_limit = if is_occupied_iedge {
            if self.k(sp_idx_1) == 1 {
                true
            } else {
                self.support_plane_mut(sp_idx_1).decrement_k();
                false
            }
        } else {
            false
        };
        self.limit_lines[line_idx].push(((sp_idx_1, sp_idx_2), is_limit));
        Ok(is_limit)
    }

    /*
     * Future points and directions.
     */

    fn slope(p: &Point2<Real>, q: &Point2<Real>) -> Real {
        let dx = q.x - p.x;
        if dx.abs() > TOLERANCE {
            (q.y - p.y) / dx
        } else {
            100_000.0
        }
    }

    /// The future points and directions of the two vertices replacing an
    /// unconstrained vertex that reaches `iedge`.
    ///
    /// The first result is driven by the previous neighbor of `pvertex`, the
    /// second by its next neighbor. Each result carries the anchor point on
    /// the arc at the current time, the direction, and whether the neighbor
    /// edge is parallel to the arc.
    pub fn compute_future_points_and_directions(
        &self,
        pvertex: PVertex,
        iedge: IEdgeId,
    ) -> Result<[(Point2<Real>, Vector2<Real>, bool); 2], Error> {
        let (prev, next) = self.prev_and_next(pvertex).ok_or_else(|| {
            Error::kinetic(format!("vertex {pvertex:?} has no incident face"))
        })?;

        let source_p = self.point_2_of_ivertex(pvertex.plane, self.igraph.source(iedge));
        let target_p = self.point_2_of_ivertex(pvertex.plane, self.igraph.target(iedge));
        if (source_p - target_p).norm() <= TOLERANCE {
            return Err(Error::kinetic("zero-length intersection arc".to_string()));
        }

        let iedge_line = Line2::through_points(source_p, target_p);
        let curr_p = self.point_2(pvertex, self.current_time);
        let pinit = iedge_line.projection(&curr_p);

        let a = self.future_along_line(
            prev,
            pvertex,
            &iedge_line,
            &source_p,
            &target_p,
            &pinit,
        )?;
        let b = self.future_along_line(
            next,
            pvertex,
            &iedge_line,
            &source_p,
            &target_p,
            &pinit,
        )?;
        Ok([a, b])
    }

    /// The future point and direction of a constrained vertex driven by a
    /// single neighbor.
    pub fn compute_future_point_and_direction(
        &self,
        pvertex: PVertex,
        pother: PVertex,
        iedge: IEdgeId,
    ) -> Result<(Point2<Real>, Vector2<Real>, bool), Error> {
        let source_p = self.point_2_of_ivertex(pvertex.plane, self.igraph.source(iedge));
        let target_p = self.point_2_of_ivertex(pvertex.plane, self.igraph.target(iedge));
        if (source_p - target_p).norm() <= TOLERANCE {
            return Err(Error::kinetic("zero-length intersection arc".to_string()));
        }
        let iedge_line = Line2::through_points(source_p, target_p);
        let curr_p = self.point_2(pvertex, self.current_time);
        let pinit = iedge_line.projection(&curr_p);
        self.future_along_line(pother, pvertex, &iedge_line, &source_p, &target_p, &pinit)
    }

    // Shared skeleton of all future-point computations: intersect the line
    // through the future positions of (neighbor, vertex) with the arc line,
    // falling back to the arc endpoints when the two lines are parallel.
    fn future_along_line(
        &self,
        neighbor: PVertex,
        pvertex: PVertex,
        iedge_line: &Line2,
        source_p: &Point2<Real>,
        target_p: &Point2<Real>,
        pinit: &Point2<Real>,
    ) -> Result<(Point2<Real>, Vector2<Real>, bool), Error> {
        let t1 = self.current_time + 1.0;
        let curr_p = self.point_2(pvertex, self.current_time);
        let neigh_p = self.point_2(neighbor, self.current_time);

        let future_line = Line2::through_points(
            self.point_2(neighbor, t1),
            self.point_2(pvertex, t1),
        );

        let m_edge = Self::slope(source_p, target_p);
        let m_neigh = Self::slope(&neigh_p, &curr_p);

        let (future_point, is_parallel) = if (m_neigh - m_edge).abs() < TOLERANCE {
            // The neighbor edge is parallel to the arc: walk toward the arc
            // endpoint matching the motion.
            let iedge_vec = target_p - source_p;
            let current_vec = curr_p - neigh_p;
            if current_vec.dot(&iedge_vec) < 0.0 {
                (*target_p, true)
            } else {
                (*source_p, true)
            }
        } else {
            let inter = future_line.intersection(iedge_line).ok_or_else(|| {
                Error::kinetic(
                    "no intersection between the future edge and the arc line".to_string(),
                )
            })?;
            (inter, false)
        };

        if (future_point - pinit).norm() <= TOLERANCE {
            // The vertex is exactly at its future point: it will not move.
            return Ok((*pinit, Vector2::zeros(), is_parallel));
        }
        let future_direction = future_point - pinit;
        Ok((*pinit, future_direction, is_parallel))
    }

    /// The future point and direction of a vertex spawned at `ivertex` along
    /// the arc `iedge`, driven by the wedge neighbors `prev` and `next`.
    pub fn compute_future_point_and_direction_open(
        &self,
        plane: usize,
        ivertex: IVertexId,
        iedge: IEdgeId,
        prev: PVertex,
        next: PVertex,
    ) -> Result<(Point2<Real>, Vector2<Real>, bool), Error> {
        let source_p = self.point_2_of_ivertex(plane, self.igraph.source(iedge));
        let target_p = self.point_2_of_ivertex(plane, self.igraph.target(iedge));
        if (source_p - target_p).norm() <= TOLERANCE {
            return Err(Error::kinetic("zero-length intersection arc".to_string()));
        }
        let iedge_line = Line2::through_points(source_p, target_p);
        let pinit = self.point_2_of_ivertex(plane, ivertex);

        let t1 = self.current_time + 1.0;
        let prev_p1 = self.point_2(prev, t1);
        let next_p1 = self.point_2(next, t1);
        let future_line = Line2::through_points(prev_p1, next_p1);

        let m_edge = Self::slope(&source_p, &target_p);
        let m_open = Self::slope(&self.point_2(prev, self.current_time), &self.point_2(next, self.current_time));

        let (future_point, is_parallel) = if (m_open - m_edge).abs() < TOLERANCE {
            let other = if (source_p - pinit).norm() <= TOLERANCE {
                target_p
            } else {
                source_p
            };
            (other, true)
        } else {
            let inter = future_line.intersection(&iedge_line).ok_or_else(|| {
                Error::kinetic(
                    "no intersection between the open wedge and the arc line".to_string(),
                )
            })?;
            (inter, false)
        };

        if (future_point - pinit).norm() <= TOLERANCE {
            return Ok((pinit, Vector2::zeros(), is_parallel));
        }
        Ok((pinit, future_point - pinit, is_parallel))
    }

    /// Whether the pair of future directions computed for the two vertices
    /// replacing an unconstrained vertex is ordered backwards along the arc.
    ///
    /// The previous-side vertex must end up on the same side of the arc as
    /// the projection of the previous neighbor, and symmetrically for the
    /// next side; when the computed pair violates this, the two motions must
    /// be exchanged.
    pub fn must_be_swapped(
        &self,
        prev: PVertex,
        next: PVertex,
        iedge: IEdgeId,
        pinit: &Point2<Real>,
        dir_a: &Vector2<Real>,
        dir_b: &Vector2<Real>,
    ) -> bool {
        let plane = prev.plane;
        let seg = self.segment_2(plane, iedge);
        let line = Line2::through_points(seg.a, seg.b);
        let t1 = self.current_time + 1.0;

        let ta = line.parameter_of(&(pinit + dir_a));
        let tb = line.parameter_of(&(pinit + dir_b));
        let tprev = line.parameter_of(&line.projection(&self.point_2(prev, t1)));
        let tnext = line.parameter_of(&line.projection(&self.point_2(next, t1)));

        (ta - tb) * (tprev - tnext) < 0.0
    }

    /*
     * Cluster discovery around an intersection vertex.
     */

    /// The contiguous chain of vertices about to meet `ivertex`, discovered
    /// by walking the border away from `pvertex` in both directions.
    ///
    /// The walk stops at the first vertex whose arc does not touch
    /// `ivertex`, at the first frozen vertex, at a vertex moving away from
    /// `ivertex`, or at a vertex whose position has not reached `ivertex`.
    /// The returned chain is ordered along the border and always contains
    /// `pvertex`.
    pub fn pvertices_around_ivertex(&self, pvertex: PVertex, ivertex: IVertexId) -> Vec<PVertex> {
        let iv_2d = self.point_2_of_ivertex(pvertex.plane, ivertex);
        let mut chain = std::collections::VecDeque::new();
        chain.push_back(pvertex);

        let Some((prev, next)) = self.border_prev_and_next(pvertex) else {
            return chain.into_iter().collect();
        };

        for (start, front) in [(prev, true), (next, false)] {
            let mut previous = pvertex;
            let mut current = start;
            loop {
                if !self.belongs_to_cluster(current, ivertex, &iv_2d) {
                    break;
                }
                if front {
                    chain.push_front(current);
                } else {
                    chain.push_back(current);
                }
                let Some((p, n)) = self.border_prev_and_next(current) else {
                    break;
                };
                let following = if p == previous { n } else { p };
                previous = current;
                current = following;
                if chain.len() > 64 {
                    break;
                }
            }
        }

        chain.into_iter().collect()
    }

    fn belongs_to_cluster(
        &self,
        pvertex: PVertex,
        ivertex: IVertexId,
        iv_2d: &Point2<Real>,
    ) -> bool {
        if !self.is_active(pvertex) {
            return false;
        }
        let Some(iedge) = self.iedge_of(pvertex) else {
            return false;
        };
        if self.igraph.source(iedge) != ivertex && self.igraph.target(iedge) != ivertex {
            return false;
        }
        if self.is_frozen(pvertex) {
            return false;
        }
        // Filter vertices moving away from the meeting point.
        let to_iv = iv_2d - self.point_2(pvertex, self.previous_time);
        if self.direction(pvertex).dot(&to_iv) < 0.0 {
            return false;
        }
        // Only vertices that actually arrived belong to the cluster.
        (self.point_2(pvertex, self.current_time) - iv_2d).norm() <= TOLERANCE * 100.0
    }

    /*
     * Structural checks.
     */

    /// Checks that every face of the six bounding-box planes is fully bound
    /// to the intersection graph.
    pub fn check_bbox(&self) -> Result<(), Error> {
        for plane in 0..6.min(self.number_of_support_planes()) {
            for pface in self.pfaces(plane) {
                for pvertex in self.pvertices_of_pface(pface) {
                    if self.ivertex_of(pvertex).is_none() {
                        return Err(Error::invariant(format!(
                            "bounding-box vertex {pvertex:?} is missing an intersection vertex"
                        )));
                    }
                }
                for pedge in self.pedges_of_pface(pface) {
                    if self.iedge_of_pedge(pedge).is_none() {
                        return Err(Error::invariant(format!(
                            "bounding-box edge {pedge:?} is missing an intersection arc"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Checks that every face of the interior planes is fully bound to the
    /// intersection graph. Only meaningful once the propagation resolved
    /// every vertex.
    pub fn check_interior(&self) -> Result<(), Error> {
        for plane in 6..self.number_of_support_planes() {
            for pface in self.pfaces(plane) {
                for pvertex in self.pvertices_of_pface(pface) {
                    if self.ivertex_of(pvertex).is_none() && self.iedge_of(pvertex).is_none() {
                        return Err(Error::invariant(format!(
                            "interior vertex {pvertex:?} is missing an intersection binding"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Checks that every active intersection vertex keeps at least three
    /// incident arcs.
    pub fn check_vertices(&self) -> Result<(), Error> {
        for iv in self.igraph.vertices() {
            if !self.igraph.is_vertex_active(iv) {
                continue;
            }
            let n = self
                .igraph
                .incident_edges(iv)
                .iter()
                .filter(|&&e| self.igraph.is_edge_active(e))
                .count();
            if n < 3 {
                return Err(Error::invariant(format!(
                    "intersection vertex {iv:?} has {n} incident arcs"
                )));
            }
        }
        Ok(())
    }

    /// The faces attached to an intersection arc, over all its incident
    /// planes.
    pub fn incident_pfaces_of_iedge(&self, query_iedge: IEdgeId) -> Vec<PFace> {
        let mut out = Vec::new();
        for &plane in self.igraph.intersected_planes(query_iedge) {
            let mesh = self.mesh(plane);
            for pedge in self.pedges(plane) {
                if self.iedge_of_pedge(pedge) != Some(query_iedge) {
                    continue;
                }
                let h = mesh.halfedge_of_edge(pedge.edge);
                for hh in [h, mesh.opposite(h)] {
                    let f = mesh.face_of(hh);
                    if f != FaceId::NONE {
                        let pface = PFace::new(plane, f);
                        if !out.contains(&pface) {
                            out.push(pface);
                        }
                    }
                }
            }
        }
        out
    }

    /// Checks that no intersection arc has exactly one attached face.
    pub fn check_edges(&self) -> Result<(), Error> {
        for ie in self.igraph.active_edges() {
            let n = self.incident_pfaces_of_iedge(ie).len();
            if n == 1 {
                return Err(Error::invariant(format!(
                    "intersection arc {ie:?} has exactly one attached face"
                )));
            }
        }
        Ok(())
    }

    /// Checks the mutual consistency of the planes and the intersection
    /// graph, and the structural soundness of every mesh.
    pub fn check_integrity(&self, initialized: bool) -> Result<(), Error> {
        for plane in 0..self.number_of_support_planes() {
            self.mesh(plane)
                .check_valid()
                .map_err(|msg| Error::invariant(format!("mesh {plane}: {msg}")))?;

            let iedges: Vec<IEdgeId> = if initialized {
                self.support_plane(plane).iedges().to_vec()
            } else {
                self.support_plane(plane).unique_iedges().iter().copied().collect()
            };
            for iedge in iedges {
                if !self.igraph.intersected_planes(iedge).contains(&plane) {
                    return Err(Error::invariant(format!(
                        "plane {plane} caches arc {iedge:?} but the arc does not register the plane"
                    )));
                }
            }
        }

        for iedge in self.igraph.active_edges() {
            for &plane in self.igraph.intersected_planes(iedge) {
                let registered = if initialized {
                    self.support_plane(plane).iedges().contains(&iedge)
                } else {
                    self.support_plane(plane).unique_iedges().contains(&iedge)
                };
                if !registered {
                    return Err(Error::invariant(format!(
                        "arc {iedge:?} intersects plane {plane} but the plane does not cache it"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Checks that every arc endpoint lies on every plane registered on the
    /// arc.
    pub fn check_edge_planes(&self) -> Result<(), Error> {
        for iedge in self.igraph.active_edges() {
            let seg = self.igraph.segment_3(iedge);
            for &plane in self.igraph.intersected_planes(iedge) {
                let p = self.support_plane(plane).plane();
                if !p.contains_point(&seg.a) || !p.contains_point(&seg.b) {
                    return Err(Error::invariant(format!(
                        "arc {iedge:?} does not lie on plane {plane}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Checks that every constrained vertex lies on the 2D projection of its
    /// arc at the given time.
    pub fn check_constrained_vertices(&self, time: Real) -> Result<(), Error> {
        for plane in 0..self.number_of_support_planes() {
            for pvertex in self.pvertices(plane) {
                let Some(iedge) = self.iedge_of(pvertex) else {
                    continue;
                };
                let seg = self.segment_2(plane, iedge);
                let line = Line2::through_points(seg.a, seg.b);
                let pos = self.point_2(pvertex, time);
                if line.distance_to_point(&pos) > TOLERANCE * 1000.0 {
                    return Err(Error::invariant(format!(
                        "constrained vertex {pvertex:?} drifted off its arc"
                    )));
                }
            }
        }
        Ok(())
    }

    /*
     * Plane and polygon insertion.
     */

    /// Registers the support plane of the given polygon.
    ///
    /// Returns `Err(existing)` when an already-registered plane carries the
    /// same equation: coplanar input is refused by the caller.
    pub fn add_support_plane(&mut self, points: &[Point3<Real>]) -> Result<usize, usize> {
        let new_plane = SupportPlane::from_polygon(points).ok_or(usize::MAX)?;
        for (i, sp) in self.support_planes.iter().enumerate() {
            if sp.plane().is_same_plane(new_plane.plane()) {
                return Err(i);
            }
        }
        self.support_planes.push(new_plane);
        Ok(self.support_planes.len() - 1)
    }

    /// Intersects the plane `plane` with every arc of the graph, producing
    /// its convex trace on the bounding box: new vertices on the crossed
    /// bounding-box edges and new boundary arcs between consecutive crossing
    /// points.
    pub fn intersect_with_bbox(&mut self, plane: usize) -> Result<(), Error> {
        if plane < 6 {
            return Ok(());
        }

        // Crossing points of the plane over all existing arcs.
        let mut intersections: Vec<(IEdgeId, Point3<Real>)> = Vec::new();
        let mut centroid = Vector2::zeros();
        let plane_geom = self.support_plane(plane).plane().clone();
        for iedge in self.igraph.active_edges().collect::<Vec<_>>() {
            let seg = self.igraph.segment_3(iedge);
            if let Some(point) =
                crate::geometry::plane_segment_intersection(&plane_geom, &seg)
            {
                centroid += self.to_2d(plane, &point).coords;
                intersections.push((iedge, point));
            }
        }
        if intersections.len() < 3 {
            return Err(Error::DegenerateInput(format!(
                "plane {plane} crosses only {} bounding-box edges",
                intersections.len()
            )));
        }
        let centroid = Point2::from(centroid / intersections.len() as Real);

        // Angular sort around the centroid of the clipped polygon.
        let mut keyed: Vec<(Real, IEdgeId, Point3<Real>)> = intersections
            .into_iter()
            .map(|(iedge, point)| {
                let p2 = self.to_2d(plane, &point);
                let d = p2 - centroid;
                (d.y.atan2(d.x), iedge, point)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = keyed.len();
        let mut vertices = Vec::with_capacity(n);
        let mut common_planes = Vec::with_capacity(n);
        let mut map_lines: BTreeMap<usize, LineId> = BTreeMap::new();

        for i in 0..n {
            let (_, iedge0, point) = keyed[i];
            let (_, iedge1, _) = keyed[(i + 1) % n];

            // The bounding-box plane shared by two consecutive crossed arcs
            // supports the boundary arc between them.
            let planes0 = self.igraph.intersected_planes(iedge0).clone();
            let planes1 = self.igraph.intersected_planes(iedge1);
            let common = planes0
                .intersection(planes1)
                .copied()
                .find(|&idx| idx < 6)
                .ok_or_else(|| {
                    Error::invariant(format!(
                        "consecutive crossing points on plane {plane} share no bounding-box plane"
                    ))
                })?;
            common_planes.push(common);
            if !map_lines.contains_key(&common) {
                let line = self.igraph.add_line();
                let _ = map_lines.insert(common, line);
            }

            let mut vplanes: Vec<usize> = planes0.iter().copied().collect();
            vplanes.push(plane);
            let (iv, _) = self.igraph.add_vertex(point, vplanes);
            vertices.push(iv);
        }

        for i in 0..n {
            let (_, iedge, _) = keyed[i];
            let iv = vertices[i];

            // Split the crossed arc unless the crossing point is one of its
            // endpoints.
            if self.igraph.is_edge_active(iedge)
                && self.igraph.source(iedge) != iv
                && self.igraph.target(iedge) != iv
            {
                let iplanes: Vec<usize> =
                    self.igraph.intersected_planes(iedge).iter().copied().collect();
                for &sp_idx in &iplanes {
                    let _ = self.support_plane_mut(sp_idx).unique_iedges_mut().remove(&iedge);
                }
                let (e1, e2) = self.igraph.split_edge(iedge, iv);
                for e in [e1, e2] {
                    let planes: Vec<usize> =
                        self.igraph.intersected_planes(e).iter().copied().collect();
                    for sp_idx in planes {
                        let _ = self.support_plane_mut(sp_idx).unique_iedges_mut().insert(e);
                    }
                }
            }
        }

        for i in 0..n {
            let u = vertices[i];
            let v = vertices[(i + 1) % n];
            if u == v {
                continue;
            }
            let (new_edge, _) = self.igraph.add_edge(u, v, [plane]);
            self.igraph.add_intersected_plane(new_edge, common_planes[i]);
            self.igraph.set_line(new_edge, map_lines[&common_planes[i]]);

            let _ = self.support_plane_mut(plane).unique_iedges_mut().insert(new_edge);
            let _ = self
                .support_plane_mut(common_planes[i])
                .unique_iedges_mut()
                .insert(new_edge);
        }

        Ok(())
    }

    /// Installs one bounding-box face: its support plane, the four corner
    /// intersection vertices, the four boundary arcs, and the frozen
    /// rectangular mesh face.
    pub fn add_bbox_polygon(&mut self, polygon: &[Point3<Real>; 4]) -> Result<(), Error> {
        let plane = self
            .add_support_plane(polygon)
            .map_err(|_| Error::DegenerateInput("degenerate bounding-box face".to_string()))?;

        let mut ivertices = [IVertexId(0); 4];
        let mut points = [Point2::origin(); 4];
        for i in 0..4 {
            points[i] = self.to_2d(plane, &polygon[i]);
            ivertices[i] = self.igraph.add_vertex(polygon[i], [plane]).0;
        }

        let vertices = self
            .support_plane_mut(plane)
            .add_bbox_polygon(&points, &ivertices)
            .map_err(Error::InvariantViolation)?;

        for i in 0..4 {
            let (iedge, inserted) =
                self.igraph
                    .add_edge(ivertices[i], ivertices[(i + 1) % 4], [plane]);
            if inserted {
                let line = self.igraph.add_line();
                self.igraph.set_line(iedge, line);
            }

            self.support_plane_mut(plane)
                .set_iedge_between(vertices[i], vertices[(i + 1) % 4], iedge)
                .map_err(Error::InvariantViolation)?;
            let _ = self.support_plane_mut(plane).unique_iedges_mut().insert(iedge);
        }
        Ok(())
    }

    /// Installs one input polygon: its support plane, its bounding-box
    /// trace, and the initial moving face.
    pub fn add_input_polygon(
        &mut self,
        polygon: &[Point3<Real>],
        input_index: usize,
    ) -> Result<usize, Error> {
        let plane = self.add_support_plane(polygon).map_err(|existing| {
            if existing == usize::MAX {
                Error::DegenerateInput(format!("input polygon {input_index} is degenerate"))
            } else {
                let other = self
                    .support_plane(existing)
                    .input()
                    .first()
                    .copied()
                    .unwrap_or(existing);
                Error::CoplanarPolygons(other, input_index)
            }
        })?;

        self.intersect_with_bbox(plane)?;

        let mut points: Vec<Point2<Real>> =
            polygon.iter().map(|p| self.to_2d(plane, p)).collect();
        self.preprocess(&mut points, TOLERANCE, 10.0)?;
        let centroid = self.sort_points_by_direction(&mut points)?;

        self.support_plane_mut(plane)
            .add_input_polygon(&points, &centroid, &[input_index])
            .map_err(Error::DegenerateInput)?;
        let _ = self.input_polygon_map.insert(input_index, plane);
        Ok(plane)
    }

    /// Creates the polyline of arcs covering one transverse intersection
    /// line: the vertices are sorted by distance from the first one and
    /// joined by arcs sharing a fresh line id.
    pub fn add_iedge_polyline(
        &mut self,
        planes: &BTreeSet<usize>,
        mut vertices: Vec<IVertexId>,
    ) -> Result<(), Error> {
        if vertices.len() < 2 {
            return Err(Error::invariant(
                "an intersection line needs at least two vertices".to_string(),
            ));
        }
        let source = self.igraph.point_3(vertices[0]);
        vertices.sort_by(|a, b| {
            let da = (self.igraph.point_3(*a) - source).norm_squared();
            let db = (self.igraph.point_3(*b) - source).norm_squared();
            da.total_cmp(&db)
        });
        vertices.dedup();

        let line = self.igraph.add_line();
        for pair in vertices.windows(2) {
            let (iedge, _) = self.igraph.add_edge(pair[0], pair[1], planes.iter().copied());
            self.igraph.set_line(iedge, line);
            for &plane in planes {
                let _ = self.support_plane_mut(plane).unique_iedges_mut().insert(iedge);
            }
        }
        Ok(())
    }

    /// Moves every `unique_iedges` set into the parallel per-plane caches of
    /// arcs, 2D segments, and 2D bounding boxes.
    pub fn precompute_iedge_data(&mut self) {
        for plane in 0..self.number_of_support_planes() {
            let segments: Vec<Segment2> = self
                .support_plane(plane)
                .unique_iedges()
                .iter()
                .map(|&ie| self.segment_2(plane, ie))
                .collect();
            self.support_plane_mut(plane).cache_iedges(segments);
        }
    }

    /*
     * Input polygon preprocessing.
     */

    /// Removes near-duplicate and collinear corners from a raw polygon.
    pub fn preprocess(
        &self,
        points: &mut Vec<Point2<Real>>,
        min_dist: Real,
        min_angle: Real,
    ) -> Result<(), Error> {
        remove_equal_points(points, min_dist);
        remove_collinear_points(points, min_angle)?;
        if points.len() < 3 {
            return Err(Error::DegenerateInput(
                "input polygon collapses below the tolerance".to_string(),
            ));
        }
        Ok(())
    }

    /// Sorts the polygon corners counter-clockwise around the centroid of
    /// their Delaunay triangulation, and returns that centroid.
    pub fn sort_points_by_direction(
        &self,
        points: &mut [Point2<Real>],
    ) -> Result<Point2<Real>, Error> {
        let centroid = delaunay_centroid(points)
            .ok_or_else(|| Error::DegenerateInput("flat input polygon".to_string()))?;
        points.sort_by(|a, b| {
            let da = a - centroid;
            let db = b - centroid;
            da.y.atan2(da.x).total_cmp(&db.y.atan2(db.x))
        });
        Ok(centroid)
    }
}

/// Walks the polygon cyclically and drops every corner closer than
/// `min_dist` to the previously kept one.
pub fn remove_equal_points(points: &mut Vec<Point2<Real>>, min_dist: Real) {
    let mut kept: Vec<Point2<Real>> = Vec::with_capacity(points.len());
    for p in points.iter() {
        if kept.last().map_or(true, |q| (p - q).norm() >= min_dist) {
            kept.push(*p);
        }
    }
    while kept.len() > 1 && (kept[0] - kept[kept.len() - 1]).norm() < min_dist {
        let _ = kept.pop();
    }
    *points = kept;
}

/// Drops every corner where the boundary turn deviates from a straight line
/// by less than `min_angle` (in degrees). When fewer than three corners
/// survive, the threshold is halved and the pass re-runs; the halving is
/// bounded.
pub fn remove_collinear_points(
    points: &mut Vec<Point2<Real>>,
    min_angle: Real,
) -> Result<(), Error> {
    let mut angle = min_angle;
    for _ in 0..32 {
        let n = points.len();
        if n < 3 {
            break;
        }
        let mut kept = Vec::with_capacity(n);
        for i in 0..n {
            let p = points[(i + n - 1) % n];
            let q = points[i];
            let r = points[(i + 1) % n];
            let d1 = (r - q).normalize();
            let d2 = (p - q).normalize();
            // Angle between the two incident edges: 180 degrees on a
            // straight boundary.
            let inner = d1.dot(&d2).clamp(-1.0, 1.0).acos().to_degrees();
            let deviation = 180.0 - inner;
            if deviation > angle {
                kept.push(q);
            }
        }
        if kept.len() >= 3 {
            *points = kept;
            return Ok(());
        }
        angle *= 0.5;
        if angle < TOLERANCE {
            break;
        }
    }
    if points.len() < 3 {
        return Err(Error::DegenerateInput(
            "polygon reduced below three corners".to_string(),
        ));
    }
    Ok(())
}

/// The area-weighted centroid of the Delaunay triangulation of the points.
fn delaunay_centroid(points: &[Point2<Real>]) -> Option<Point2<Real>> {
    use spade::{DelaunayTriangulation, Point2 as SpadePoint, Triangulation};

    let mut tri: DelaunayTriangulation<SpadePoint<f64>> = DelaunayTriangulation::new();
    for p in points {
        let _ = tri.insert(SpadePoint::new(p.x as f64, p.y as f64)).ok()?;
    }

    let mut weighted = Vector2::zeros();
    let mut total_area = 0.0;
    for face in tri.inner_faces() {
        let vs = face.vertices();
        let a = vs[0].position();
        let b = vs[1].position();
        let c = vs[2].position();
        let area = ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)).abs() * 0.5;
        let cx = (a.x + b.x + c.x) / 3.0;
        let cy = (a.y + b.y + c.y) / 3.0;
        weighted += Vector2::new(cx as Real, cy as Real) * (area as Real);
        total_area += area as Real;
    }

    if total_area <= 0.0 {
        None
    } else {
        Some(Point2::from(weighted / total_area))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn remove_equal_points_drops_duplicates() {
        let mut points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0 + 1.0e-12, 1.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0e-12, 1.0e-12),
        ];
        remove_equal_points(&mut points, 1.0e-9);
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn remove_collinear_points_drops_straight_corners() {
        let mut points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.5, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        remove_collinear_points(&mut points, 10.0).unwrap();
        assert_eq!(points.len(), 4);
        assert!(!points.contains(&Point2::new(0.5, 0.0)));
    }

    #[test]
    fn remove_collinear_points_halves_the_threshold_on_thin_polygons() {
        // A very flat triangle: every corner deviates by less than the
        // default threshold, so the first pass drops everything.
        let mut points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.01),
            Point2::new(2.0, 0.0),
        ];
        remove_collinear_points(&mut points, 10.0).unwrap();
        assert_eq!(points.len(), 3);
    }

    #[test]
    fn sort_points_by_direction_yields_ccw_order() {
        let data = DataStructure::new(false);
        let mut points = vec![
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 0.0),
        ];
        let centroid = data.sort_points_by_direction(&mut points).unwrap();
        assert_relative_eq!(centroid, Point2::new(0.5, 0.5), epsilon = 1.0e-9);

        let mut area2 = 0.0;
        for i in 0..points.len() {
            let p = points[i];
            let q = points[(i + 1) % points.len()];
            area2 += p.x * q.y - q.x * p.y;
        }
        assert!(area2 > 0.0, "polygon must come out counter-clockwise");
    }
}
