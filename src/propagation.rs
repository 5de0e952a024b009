//! The kinetic event loop: candidate generation, staleness filtering, and
//! the four event handlers.
//!
//! The loop advances in windows of one time step, as the initializer
//! precomputed it. At the start of every window, candidate events are
//! generated for every moving vertex; the queue is then drained in
//! non-decreasing time order, each handler mutating the data structure and
//! re-enqueueing candidates for the vertices it affected. The loop ends when
//! no moving vertex remains.

use crate::data_structure::{DataStructure, PEdge, PVertex};
use crate::error::Error;
use crate::event::{Event, EventQueue};
use crate::geometry::{Line2, Segment2, SegmentsIntersection};
use crate::igraph::{IEdgeId, IVertexId};
use crate::math::{Point2, Real, Vector2, TOLERANCE};
use crate::parameters::Parameters;

// Wider matching slack used when snapping event geometry back onto the
// intersection graph.
const MEET_EPS: Real = TOLERANCE * 100.0;

// Hard cap on the number of time windows; reaching it means the process
// stopped converging.
const MAX_WINDOWS: usize = 10_000;

/// Statistics of one propagation run.
#[derive(Debug, Default, Clone, Copy)]
pub struct PropagationStats {
    /// Number of processed (non-stale) events.
    pub num_events: usize,
    /// Number of time windows the loop went through.
    pub num_windows: usize,
}

/// Runs the kinetic process until every polygon vertex is frozen.
pub fn propagate(
    data: &mut DataStructure,
    time_step: Real,
    parameters: &Parameters,
) -> Result<PropagationStats, Error> {
    let mut queue = EventQueue::new();
    let mut stats = PropagationStats::default();

    loop {
        let moving = moving_pvertices(data);
        if moving.is_empty() {
            break;
        }

        stats.num_windows += 1;
        if stats.num_windows > MAX_WINDOWS {
            return Err(Error::kinetic(format!(
                "the process did not converge within {MAX_WINDOWS} time windows"
            )));
        }

        let window_end = data.current_time() + time_step;
        for &pvertex in &moving {
            compute_events_of_pvertex(data, pvertex, window_end, &mut queue);
        }

        while let Some(event) = queue.pop() {
            if is_stale(data, &event) {
                continue;
            }
            if data.is_verbose() {
                log::debug!("applying {event}");
            }

            let time = event.time.max(data.current_time());
            data.update_positions(time);

            let affected = apply_event(data, &event, &mut queue)?;
            stats.num_events += 1;
            if parameters
                .max_events
                .is_some_and(|cap| stats.num_events >= cap)
            {
                // Every mutation of the last event completed: the partial
                // partition is consistent.
                log::debug!("event cap reached after {} events", stats.num_events);
                return Ok(stats);
            }

            for pvertex in affected {
                if data.is_active(pvertex) && !data.is_frozen(pvertex) {
                    compute_events_of_pvertex(data, pvertex, window_end, &mut queue);
                }
            }

            if parameters.debug {
                data.check_integrity(true)?;
                data.check_constrained_vertices(data.current_time())?;
            }
        }

        data.update_positions(window_end);
    }

    log::debug!(
        "propagation finished: {} events over {} windows",
        stats.num_events,
        stats.num_windows
    );
    Ok(stats)
}

/// Every active vertex that still moves, over all planes.
fn moving_pvertices(data: &DataStructure) -> Vec<PVertex> {
    let mut out = Vec::new();
    for plane in 0..data.number_of_support_planes() {
        for pvertex in data.pvertices(plane) {
            if !data.is_frozen(pvertex) {
                out.push(pvertex);
            }
        }
    }
    out
}

/*
 * Candidate generation.
 */

/// Pushes every event the given vertex can reach before `window_end`.
fn compute_events_of_pvertex(
    data: &DataStructure,
    pvertex: PVertex,
    window_end: Real,
    queue: &mut EventQueue,
) {
    if !data.is_active(pvertex) || data.is_frozen(pvertex) {
        return;
    }
    match data.iedge_of(pvertex) {
        None => compute_unconstrained_events(data, pvertex, window_end, queue),
        Some(iedge) => compute_constrained_events(data, pvertex, iedge, window_end, queue),
    }
}

/// Events of a vertex moving freely in its plane: it may reach any
/// intersection arc crossing the plane, or one of the arc endpoints.
fn compute_unconstrained_events(
    data: &DataStructure,
    pvertex: PVertex,
    window_end: Real,
    queue: &mut EventQueue,
) {
    let now = data.current_time();
    let plane = pvertex.plane;
    let sp = data.support_plane(plane);

    let p0 = data.point_2(pvertex, now);
    let p1 = data.point_2(pvertex, window_end);
    let swept = Segment2::new(p0, p1);
    let swept_bbox = swept.local_aabb().loosened(MEET_EPS);

    for ((&iedge, isegment), ibbox) in sp
        .iedges()
        .iter()
        .zip(sp.isegments().iter())
        .zip(sp.ibboxes().iter())
    {
        if !data.igraph().is_edge_active(iedge) {
            continue;
        }
        if !swept_bbox.intersects(ibbox) {
            continue;
        }

        let inter = crate::geometry::segments_intersection2d(
            &swept.a, &swept.b, &isegment.a, &isegment.b, TOLERANCE,
        );
        let Some(SegmentsIntersection::Point { loc1, loc2 }) = inter else {
            continue;
        };

        let bary = loc1.barycentric_coordinates();
        let time = now + bary[1] * (window_end - now);
        if time < now - TOLERANCE {
            continue;
        }
        let time = time.max(now);
        let hit = isegment.point_at_location(&loc2);

        // A hit landing on an arc endpoint is a vertex event and takes
        // precedence over the arc event.
        let mut at_ivertex = None;
        for iv in [data.igraph().source(iedge), data.igraph().target(iedge)] {
            if (data.point_2_of_ivertex(plane, iv) - hit).norm() <= MEET_EPS {
                at_ivertex = Some(iv);
                break;
            }
        }

        match at_ivertex {
            Some(iv) => {
                queue.push(Event::unconstrained_pvertex_to_ivertex(pvertex, iv, time))
            }
            None => queue.push(Event::pvertex_to_iedge(pvertex, iedge, time)),
        }
    }
}

/// Events of a vertex sliding along an arc: it may reach one of the arc
/// endpoints, or meet another vertex sliding along the same arc.
fn compute_constrained_events(
    data: &DataStructure,
    pvertex: PVertex,
    iedge: IEdgeId,
    window_end: Real,
    queue: &mut EventQueue,
) {
    let now = data.current_time();
    let plane = pvertex.plane;
    let p0 = data.point_2(pvertex, now);
    let dir = data.direction(pvertex);
    let sq_speed = dir.norm_squared();
    if sq_speed == 0.0 {
        return;
    }

    // Arrival at one of the arc endpoints.
    for iv in [data.igraph().source(iedge), data.igraph().target(iedge)] {
        let target = data.point_2_of_ivertex(plane, iv);
        let to_target = target - p0;
        let time = now + to_target.dot(&dir) / sq_speed;
        if time < now - TOLERANCE || time > window_end {
            continue;
        }
        // The vertex slides along the arc, so the target must sit on its
        // trajectory.
        let residual = to_target - dir * (time - now);
        if residual.norm() > MEET_EPS {
            continue;
        }
        queue.push(Event::constrained_pvertex_to_ivertex(
            pvertex,
            iv,
            time.max(now),
        ));
    }

    // Collision with the other vertices sliding along the same arc.
    for pother in data.pvertices(plane) {
        if pother.vertex <= pvertex.vertex
            || data.iedge_of(pother) != Some(iedge)
            || data.is_frozen(pother)
        {
            continue;
        }
        let q0 = data.point_2(pother, now);
        if (q0 - p0).norm() <= MEET_EPS {
            // Already coincident: a fresh contact pair separating from its
            // common anchor, not a collision.
            continue;
        }
        let rel_dir = dir - data.direction(pother);
        let rel_sq = rel_dir.norm_squared();
        if rel_sq <= TOLERANCE {
            continue;
        }
        let time = now + (q0 - p0).dot(&rel_dir) / rel_sq;
        if time < now - TOLERANCE || time > window_end {
            continue;
        }
        let residual = (q0 - p0) - rel_dir * (time - now);
        if residual.norm() > MEET_EPS {
            continue;
        }
        queue.push(Event::pvertex_to_pvertex(pvertex, pother, time.max(now)));
    }
}

/*
 * Staleness.
 */

/// Whether a popped event no longer describes the current state.
fn is_stale(data: &DataStructure, event: &Event) -> bool {
    if !data.is_active(event.pvertex) {
        return true;
    }
    if let Some(pother) = event.pother {
        if !data.is_active(pother) {
            return true;
        }
    }

    if event.is_constrained {
        let iedge = data.iedge_of(event.pvertex);
        if iedge.is_none() || data.is_frozen(event.pvertex) {
            return true;
        }
        if let Some(pother) = event.pother {
            if data.iedge_of(pother) != iedge || data.is_frozen(pother) {
                return true;
            }
            // The motions may have been recomputed since the event was
            // queued: the two vertices must still meet at that time.
            let gap = data.point_2(event.pvertex, event.time) - data.point_2(pother, event.time);
            if gap.norm() > MEET_EPS * 10.0 {
                return true;
            }
        }
        if let Some(ivertex) = event.ivertex {
            let iedge = iedge.unwrap();
            if data.igraph().source(iedge) != ivertex && data.igraph().target(iedge) != ivertex {
                return true;
            }
            let iv_2d = data.point_2_of_ivertex(event.pvertex.plane, ivertex);
            if (data.point_2(event.pvertex, event.time) - iv_2d).norm() > MEET_EPS * 10.0 {
                return true;
            }
        }
        false
    } else {
        // An unconstrained vertex bound since the event was queued is gone.
        if data.iedge_of(event.pvertex).is_some() || data.is_frozen(event.pvertex) {
            return true;
        }
        if let Some(iedge) = event.iedge {
            if !data.igraph().is_edge_active(iedge) {
                return true;
            }
        }
        false
    }
}

/*
 * Dispatch.
 */

fn apply_event(
    data: &mut DataStructure,
    event: &Event,
    queue: &mut EventQueue,
) -> Result<Vec<PVertex>, Error> {
    if let Some(ivertex) = event.ivertex {
        apply_pvertices_meet_ivertex(data, event.pvertex, ivertex, queue)
    } else if let Some(pother) = event.pother {
        apply_pvertex_meets_pvertex(data, event.pvertex, pother, queue)
    } else if let Some(iedge) = event.iedge {
        apply_pvertex_meets_iedge(data, event.pvertex, iedge, queue)
    } else {
        Err(Error::kinetic("event with no participants".to_string()))
    }
}

/// An unconstrained vertex reaches an intersection arc: it develops a
/// contact edge on the arc, replaced by two vertices sliding along it. On a
/// limited line, the contact freezes instead of sliding.
fn apply_pvertex_meets_iedge(
    data: &mut DataStructure,
    pvertex: PVertex,
    iedge: IEdgeId,
    queue: &mut EventQueue,
) -> Result<Vec<PVertex>, Error> {
    let plane = pvertex.plane;
    let now = data.current_time();

    let (occupied, bbox_reached) = data.is_occupied(pvertex, iedge);
    let blocked = data.update_limit_lines_and_k(pvertex, iedge, occupied)?;
    let freeze = blocked && !bbox_reached && !data.is_bbox_iedge(iedge);

    let [(pinit, dir_a, _), (_, dir_b, _)] =
        data.compute_future_points_and_directions(pvertex, iedge)?;
    let (prev, next) = data
        .prev_and_next(pvertex)
        .ok_or_else(|| Error::kinetic(format!("vertex {pvertex:?} has no incident face")))?;
    let (dir_a, dir_b) = if data.must_be_swapped(prev, next, iedge, &pinit, &dir_a, &dir_b) {
        (dir_b, dir_a)
    } else {
        (dir_a, dir_b)
    };

    let faces = data.mesh(plane).faces_around_vertex(pvertex.vertex);
    if faces.len() != 1 {
        // A vertex shared by several faces cannot develop a single contact
        // edge; stop it on the arc instead of guessing.
        log::error!("vertex {pvertex:?} reaches {iedge:?} while shared by {} faces", faces.len());
        debug_assert!(faces.len() == 1);
        let mesh = data.mesh_mut(plane);
        mesh.set_motion(pvertex.vertex, now, Vector2::zeros());
        data.connect_iedge(pvertex, iedge);
        return Ok(vec![pvertex]);
    }

    let h_in = data
        .mesh(plane)
        .halfedge_in_face_targeting(pvertex.vertex, faces[0])
        .ok_or_else(|| Error::kinetic("broken vertex ring".to_string()))?;

    let (new_vertex, new_edge, _) = data
        .mesh_mut(plane)
        .split_corner(h_in)
        .map_err(Error::KineticInconsistency)?;
    let pother = PVertex::new(plane, new_vertex);

    {
        let mesh = data.mesh_mut(plane);
        for (v, dir) in [(pvertex.vertex, dir_a), (new_vertex, dir_b)] {
            let vtx = mesh.vertex_mut(v);
            vtx.point = pinit;
            vtx.last_event_time = now;
            vtx.direction = if freeze { Vector2::zeros() } else { dir };
        }
    }

    data.connect_iedge(pvertex, iedge);
    data.connect_iedge(pother, iedge);
    data.connect_pedge(PEdge::new(plane, new_edge), iedge);

    queue.invalidate(pvertex);

    // The new sliders may collide with everything already on the arc.
    let mut affected = vec![pvertex, pother];
    for other in data.pvertices(plane) {
        if other != pvertex && other != pother && data.iedge_of(other) == Some(iedge) {
            affected.push(other);
        }
    }
    Ok(affected)
}

/// Two vertices sliding along the same arc meet: they merge into one, and
/// the survivor's motion is recomputed from its new neighbors.
fn apply_pvertex_meets_pvertex(
    data: &mut DataStructure,
    pvertex: PVertex,
    pother: PVertex,
    queue: &mut EventQueue,
) -> Result<Vec<PVertex>, Error> {
    let plane = pvertex.plane;
    let now = data.current_time();
    let iedge = data
        .iedge_of(pvertex)
        .ok_or_else(|| Error::kinetic("meeting vertex lost its arc".to_string()))?;

    if data.is_sneaking_pedge(pvertex, pother, iedge) {
        log::error!("skipping a sneaking contact between {pvertex:?} and {pother:?}");
        return Ok(Vec::new());
    }

    let survivor = match merge_border_vertices(data, plane, pvertex.vertex, pother.vertex) {
        Some(survivor) => PVertex::new(plane, survivor),
        None => {
            // The two vertices are not border-adjacent: freeze both rather
            // than tearing the mesh.
            log::error!("cannot merge non-adjacent vertices {pvertex:?} and {pother:?}");
            debug_assert!(false, "merging non-adjacent vertices");
            let mesh = data.mesh_mut(plane);
            mesh.set_motion(pvertex.vertex, now, Vector2::zeros());
            mesh.set_motion(pother.vertex, now, Vector2::zeros());
            return Ok(vec![pvertex, pother]);
        }
    };

    queue.invalidate(pvertex);
    queue.invalidate(pother);
    data.connect_iedge(survivor, iedge);

    // Recompute the survivor's motion from its new neighbors: when both
    // neighbor edges lie along the arc the contact is complete and the
    // vertex stops.
    let seg = data.segment_2(plane, iedge);
    let line = Line2::through_points(seg.a, seg.b);
    let (bprev, bnext) = data
        .border_prev_and_next(survivor)
        .ok_or_else(|| Error::kinetic("merged vertex left the border".to_string()))?;
    let t1 = now + 1.0;
    let prev_on = line.distance_to_point(&data.point_2(bprev, t1)) <= MEET_EPS;
    let next_on = line.distance_to_point(&data.point_2(bnext, t1)) <= MEET_EPS;

    match (prev_on, next_on) {
        (true, true) => data.mesh_mut(plane).freeze(survivor.vertex, now),
        (off_prev, _) => {
            let driver = if off_prev { bnext } else { bprev };
            let (pinit, dir, _) = data.compute_future_point_and_direction(survivor, driver, iedge)?;
            let vtx = data.mesh_mut(plane).vertex_mut(survivor.vertex);
            vtx.point = pinit;
            vtx.last_event_time = now;
            vtx.direction = dir;
        }
    }

    Ok(vec![survivor, bprev, bnext])
}

/// One or more vertices reach an intersection vertex: the whole arriving
/// cluster merges into a single frozen vertex bound to it, and new sliding
/// vertices are spawned along the incident arcs that continue inside the
/// expanding wedge of each incident face.
fn apply_pvertices_meet_ivertex(
    data: &mut DataStructure,
    pvertex: PVertex,
    ivertex: IVertexId,
    queue: &mut EventQueue,
) -> Result<Vec<PVertex>, Error> {
    let plane = pvertex.plane;
    let now = data.current_time();
    let iv_2d = data.point_2_of_ivertex(plane, ivertex);

    let cluster = data.pvertices_around_ivertex(pvertex, ivertex);
    for &member in &cluster {
        queue.invalidate(member);
    }

    // Merge the cluster chain into a single vertex.
    let mut survivor = cluster[0];
    for &member in &cluster[1..] {
        if !data.is_active(member) || member == survivor {
            continue;
        }
        match merge_border_vertices(data, plane, survivor.vertex, member.vertex) {
            Some(kept) => survivor = PVertex::new(plane, kept),
            None => {
                log::error!("cluster member {member:?} is not adjacent to the merged vertex");
                debug_assert!(false, "disconnected cluster");
            }
        }
    }

    {
        let mesh = data.mesh_mut(plane);
        let vtx = mesh.vertex_mut(survivor.vertex);
        vtx.point = iv_2d;
        vtx.last_event_time = now;
        vtx.direction = Vector2::zeros();
        vtx.ivertex = Some(ivertex);
        vtx.iedge = None;
    }

    // Local simplification: a frozen vertex already sitting at the same
    // intersection vertex next to the survivor is redundant.
    loop {
        let Some((bprev, bnext)) = data.border_prev_and_next(survivor) else {
            break;
        };
        let mut collapsed = false;
        for neighbor in [bprev, bnext] {
            if data.is_active(neighbor)
                && data.is_frozen(neighbor)
                && (data.point_2(neighbor, now) - iv_2d).norm() <= MEET_EPS
            {
                if let Some(kept) =
                    merge_border_vertices(data, plane, survivor.vertex, neighbor.vertex)
                {
                    survivor = PVertex::new(plane, kept);
                    data.mesh_mut(plane).vertex_mut(survivor.vertex).ivertex = Some(ivertex);
                    queue.invalidate(neighbor);
                    collapsed = true;
                    break;
                }
            }
        }
        if !collapsed {
            break;
        }
    }

    let mut affected = Vec::new();

    // Spawn the continuation sliders, face by face.
    let faces = data.mesh(plane).faces_around_vertex(survivor.vertex);
    for f in faces {
        let Some((pf, nf)) = data.mesh(plane).prev_next_in_face(survivor.vertex, f) else {
            continue;
        };
        let pf = PVertex::new(plane, pf);
        let nf = PVertex::new(plane, nf);
        affected.push(pf);
        affected.push(nf);

        let t1 = now + 1.0;
        let dir_prev = data.point_2(pf, t1) - iv_2d;
        let dir_next = data.point_2(nf, t1) - iv_2d;
        if dir_prev.norm() <= TOLERANCE || dir_next.norm() <= TOLERANCE {
            continue;
        }

        // Arcs at the intersection vertex that continue inside this face's
        // expanding wedge.
        let candidates: Vec<(IEdgeId, Vector2<Real>)> = data
            .support_plane(plane)
            .iedges()
            .iter()
            .filter(|&&ie| {
                data.igraph().is_edge_active(ie)
                    && (data.igraph().source(ie) == ivertex
                        || data.igraph().target(ie) == ivertex)
            })
            .map(|&ie| {
                let other = data.igraph().opposite(ie, ivertex);
                let away = data.point_2_of_ivertex(plane, other) - iv_2d;
                (ie, away)
            })
            .filter(|(_, away)| in_ccw_sector(&dir_next, &dir_prev, away))
            .collect();

        for (ie, away) in candidates {
            let (occupied, bbox_reached) = data.is_occupied_at_ivertex(survivor, ivertex, ie);
            let blocked = data.update_limit_lines_and_k(survivor, ie, occupied)?;
            if blocked && !bbox_reached && !data.is_bbox_iedge(ie) {
                continue;
            }

            let (_, dir, _) = data
                .compute_future_point_and_direction_open(plane, ivertex, ie, pf, nf)?;
            if dir.dot(&away) <= 0.0 {
                continue;
            }

            let h_in = data
                .mesh(plane)
                .halfedge_in_face_targeting(survivor.vertex, f)
                .ok_or_else(|| Error::kinetic("broken vertex ring".to_string()))?;
            let (spawned, new_edge, _) = data
                .mesh_mut(plane)
                .split_corner(h_in)
                .map_err(Error::KineticInconsistency)?;
            {
                let mesh = data.mesh_mut(plane);
                let vtx = mesh.vertex_mut(spawned);
                vtx.point = iv_2d;
                vtx.last_event_time = now;
                vtx.direction = dir;
                vtx.ivertex = None;
                vtx.iedge = Some(ie);
            }
            data.connect_pedge(PEdge::new(plane, new_edge), ie);
            affected.push(PVertex::new(plane, spawned));
        }
    }

    rebind_edges_at(data, survivor);

    affected.push(survivor);
    affected.retain(|pv| data.is_active(*pv));
    Ok(affected)
}

/// Merges two border-adjacent vertices and returns the survivor, or `None`
/// when no collapsible edge connects them.
fn merge_border_vertices(
    data: &mut DataStructure,
    plane: usize,
    a: crate::mesh::VertexId,
    b: crate::mesh::VertexId,
) -> Option<crate::mesh::VertexId> {
    let mesh = data.mesh_mut(plane);
    let h = mesh.halfedge_between(a, b)?;

    // Collapse the half-edge whose opposite runs along the border; the
    // survivor is its source.
    for candidate in [h, mesh.opposite(h)] {
        if mesh.face_of(candidate) != crate::mesh::FaceId::NONE
            && mesh.is_border(mesh.opposite(candidate))
        {
            let survivor = mesh.source(candidate);
            return mesh.collapse_border_edge(candidate).ok().map(|_| survivor);
        }
    }
    None
}

/// Re-derives the arc bindings of the border edges around a vertex from the
/// cached arc segments of its plane. Used after a cluster merge, when face
/// edges land exactly on intersection arcs.
fn rebind_edges_at(data: &mut DataStructure, pvertex: PVertex) {
    let plane = pvertex.plane;
    let t = data.current_time();

    let mut bindings = Vec::new();
    {
        let mesh = data.mesh(plane);
        let sp = data.support_plane(plane);
        for h in mesh.halfedges_around_target(pvertex.vertex) {
            let e = mesh.edge_of(h);
            if mesh.edge(e).iedge.is_some() {
                continue;
            }
            let (s, tt) = mesh.edge_vertices(e);
            let mid = Point2::from(
                (mesh.position_at(s, t).coords + mesh.position_at(tt, t).coords) * 0.5,
            );
            for (&ie, seg) in sp.iedges().iter().zip(sp.isegments().iter()) {
                let line = Line2::through_points(seg.a, seg.b);
                let t_param = line.parameter_of(&mid);
                if t_param >= -TOLERANCE
                    && t_param <= 1.0 + TOLERANCE
                    && line.distance_to_point(&mid) <= MEET_EPS
                {
                    bindings.push((e, ie));
                    break;
                }
            }
        }
    }

    for (e, ie) in bindings {
        data.mesh_mut(plane).edge_mut(e).iedge = Some(ie);
    }
}

/// Whether `dir` lies strictly inside the sector swept counter-clockwise
/// from `from` to `to`.
fn in_ccw_sector(from: &Vector2<Real>, to: &Vector2<Real>, dir: &Vector2<Real>) -> bool {
    let eps = TOLERANCE;
    if from.perp(to) > 0.0 {
        from.perp(dir) > eps && dir.perp(to) > eps
    } else {
        from.perp(dir) > eps || dir.perp(to) > eps
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sector_test_narrow_and_wide() {
        let east = Vector2::new(1.0, 0.0);
        let north = Vector2::new(0.0, 1.0);
        let south = Vector2::new(0.0, -1.0);
        let north_east = Vector2::new(1.0, 1.0);

        // Narrow quadrant between east and north.
        assert!(in_ccw_sector(&east, &north, &north_east));
        assert!(!in_ccw_sector(&east, &north, &south));
        // Boundaries are excluded.
        assert!(!in_ccw_sector(&east, &north, &east));
        assert!(!in_ccw_sector(&east, &north, &north));

        // Wide sector from north to east (three quadrants).
        assert!(in_ccw_sector(&north, &east, &south));
        assert!(!in_ccw_sector(&north, &east, &north_east));
    }
}
