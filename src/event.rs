//! Events of the kinetic process and the time-ordered event queue.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use crate::data_structure::PVertex;
use crate::igraph::{IEdgeId, IVertexId};
use crate::math::{Real, TOLERANCE};
use crate::utils::hashmap::HashMap;

/// One future event of the kinetic simulation.
///
/// The event kind is encoded by which optional participants are present,
/// matching the four cases of the process: an unconstrained vertex reaching
/// an arc, an unconstrained vertex reaching an intersection vertex, two
/// constrained vertices meeting, and constrained vertices reaching an
/// intersection vertex.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Event {
    /// The simulated time at which the event occurs.
    pub time: Real,
    /// The primary moving vertex.
    pub pvertex: PVertex,
    /// The secondary moving vertex, for vertex-vertex events.
    pub pother: Option<PVertex>,
    /// The intersection vertex reached, if any.
    pub ivertex: Option<IVertexId>,
    /// The intersection arc reached, if any.
    pub iedge: Option<IEdgeId>,
    /// Whether the primary vertex is constrained when the event occurs.
    pub is_constrained: bool,
}

impl Event {
    /// An event where two constrained vertices sliding along the same arc
    /// meet.
    pub fn pvertex_to_pvertex(pvertex: PVertex, pother: PVertex, time: Real) -> Self {
        Event {
            time,
            pvertex,
            pother: Some(pother),
            ivertex: None,
            iedge: None,
            is_constrained: true,
        }
    }

    /// An event where an unconstrained vertex reaches an intersection arc.
    pub fn pvertex_to_iedge(pvertex: PVertex, iedge: IEdgeId, time: Real) -> Self {
        Event {
            time,
            pvertex,
            pother: None,
            ivertex: None,
            iedge: Some(iedge),
            is_constrained: false,
        }
    }

    /// An event where an unconstrained vertex reaches an intersection
    /// vertex.
    pub fn unconstrained_pvertex_to_ivertex(
        pvertex: PVertex,
        ivertex: IVertexId,
        time: Real,
    ) -> Self {
        Event {
            time,
            pvertex,
            pother: None,
            ivertex: Some(ivertex),
            iedge: None,
            is_constrained: false,
        }
    }

    /// An event where a constrained vertex reaches an intersection vertex at
    /// the end of its arc.
    pub fn constrained_pvertex_to_ivertex(
        pvertex: PVertex,
        ivertex: IVertexId,
        time: Real,
    ) -> Self {
        Event {
            time,
            pvertex,
            pother: None,
            ivertex: Some(ivertex),
            iedge: None,
            is_constrained: true,
        }
    }

    /// The support plane of the primary vertex.
    #[inline]
    pub fn support_plane(&self) -> usize {
        self.pvertex.plane
    }

    /// Whether this is a vertex-vertex event.
    pub fn is_pvertex_to_pvertex(&self) -> bool {
        self.pother.is_some()
    }

    /// Whether this is a vertex-arc event.
    pub fn is_pvertex_to_iedge(&self) -> bool {
        self.iedge.is_some()
    }

    /// Whether this is a lone vertex reaching an intersection vertex.
    pub fn is_pvertex_to_ivertex(&self) -> bool {
        self.pother.is_none() && self.ivertex.is_some()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let constr = if self.is_constrained {
            "constrained"
        } else {
            "unconstrained"
        };
        if let Some(pother) = self.pother {
            if let Some(iv) = self.ivertex {
                write!(
                    f,
                    "{constr} event at t = {} between {:?}, {:?} and {:?}",
                    self.time, self.pvertex, pother, iv
                )
            } else {
                write!(
                    f,
                    "{constr} event at t = {} between {:?} and {:?}",
                    self.time, self.pvertex, pother
                )
            }
        } else if let Some(ie) = self.iedge {
            write!(
                f,
                "{constr} event at t = {} between {:?} and {:?}",
                self.time, self.pvertex, ie
            )
        } else if let Some(iv) = self.ivertex {
            write!(
                f,
                "{constr} event at t = {} between {:?} and {:?}",
                self.time, self.pvertex, iv
            )
        } else {
            write!(f, "invalid event at t = {}", self.time)
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct QueueEntry {
    time: Real,
    ivertex_first: bool,
    plane: usize,
    vertex: u32,
    id: usize,
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Within the tolerance band, vertex-to-intersection-vertex events
        // run first so the same intersection vertex is not crossed twice by
        // spuriously ordered events. Outside the band, plain time order.
        if (self.time - other.time).abs() < TOLERANCE {
            (other.ivertex_first, self.plane, self.vertex, self.id).cmp(&(
                self.ivertex_first,
                other.plane,
                other.vertex,
                other.id,
            ))
        } else {
            self.time.total_cmp(&other.time)
        }
    }
}

/// The time-ordered queue of future events.
///
/// Two indices over the same owned records: a priority heap ordered by time,
/// and a per-vertex index used to drop candidates when a vertex is merged or
/// rebound. Records are immutable once pushed; staleness is detected when
/// popping.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<std::cmp::Reverse<QueueEntry>>,
    records: Vec<Event>,
    dead: Vec<bool>,
    by_pvertex: HashMap<PVertex, Vec<usize>>,
}

impl EventQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of live records in the queue.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no live record remains.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Pushes an event.
    pub fn push(&mut self, event: Event) {
        let id = self.records.len();
        self.records.push(event);
        self.dead.push(false);
        self.by_pvertex.entry(event.pvertex).or_default().push(id);
        if let Some(pother) = event.pother {
            self.by_pvertex.entry(pother).or_default().push(id);
        }
        self.heap.push(std::cmp::Reverse(QueueEntry {
            time: event.time,
            ivertex_first: event.is_pvertex_to_ivertex(),
            plane: event.support_plane(),
            vertex: event.pvertex.vertex.0,
            id,
        }));
    }

    /// Pops the earliest live event.
    pub fn pop(&mut self) -> Option<Event> {
        while let Some(std::cmp::Reverse(entry)) = self.heap.pop() {
            if !self.dead[entry.id] {
                self.dead[entry.id] = true;
                return Some(self.records[entry.id]);
            }
        }
        None
    }

    /// Drops every queued candidate involving the given vertex.
    pub fn invalidate(&mut self, pvertex: PVertex) {
        if let Some(ids) = self.by_pvertex.get(&pvertex) {
            for &id in ids {
                self.dead[id] = true;
            }
        }
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.records.clear();
        self.dead.clear();
        self.by_pvertex.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::VertexId;

    fn pv(plane: usize, vertex: u32) -> PVertex {
        PVertex::new(plane, VertexId(vertex))
    }

    #[test]
    fn pops_in_time_order() {
        let mut queue = EventQueue::new();
        queue.push(Event::pvertex_to_iedge(pv(6, 0), IEdgeId(0), 0.5));
        queue.push(Event::pvertex_to_iedge(pv(6, 1), IEdgeId(1), 0.25));
        queue.push(Event::pvertex_to_iedge(pv(7, 2), IEdgeId(2), 1.0));

        assert_eq!(queue.pop().unwrap().time, 0.25);
        assert_eq!(queue.pop().unwrap().time, 0.5);
        assert_eq!(queue.pop().unwrap().time, 1.0);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn ivertex_events_run_first_within_the_tolerance_band() {
        let mut queue = EventQueue::new();
        queue.push(Event::pvertex_to_iedge(pv(6, 0), IEdgeId(0), 0.5));
        queue.push(Event::unconstrained_pvertex_to_ivertex(
            pv(6, 0),
            IVertexId(3),
            0.5,
        ));

        let first = queue.pop().unwrap();
        assert!(first.is_pvertex_to_ivertex());
        let second = queue.pop().unwrap();
        assert!(second.is_pvertex_to_iedge());
    }

    #[test]
    fn invalidate_drops_candidates_of_a_vertex() {
        let mut queue = EventQueue::new();
        queue.push(Event::pvertex_to_iedge(pv(6, 0), IEdgeId(0), 0.5));
        queue.push(Event::pvertex_to_pvertex(pv(6, 1), pv(6, 0), 0.25));
        queue.push(Event::pvertex_to_iedge(pv(6, 2), IEdgeId(1), 0.75));

        queue.invalidate(pv(6, 0));
        let ev = queue.pop().unwrap();
        assert_eq!(ev.pvertex, pv(6, 2));
        assert!(queue.pop().is_none());
    }
}
