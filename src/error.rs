//! Errors reported by the kinetic partition core.

/// Errors that can occur while building or propagating a kinetic partition.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The input is too degenerate to build a bounding box or an initial
    /// polygon: all points collapse below the tolerance on two or more axes,
    /// or a polygon has fewer than three non-coincident corners.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// Two input polygons share the same supporting plane (up to the kernel
    /// tolerance). Merging coplanar polygons requires an explicit policy and
    /// is refused by the core.
    #[error("input polygons {0} and {1} share the same supporting plane")]
    CoplanarPolygons(usize, usize),

    /// A structural invariant was broken by a mutation. This is a bug in the
    /// kinetic process, not a user error; the partition cannot be recovered.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The event loop reached a state it cannot resolve: a vertex sneaked
    /// across an occupied edge, a stale event could not be discarded, or an
    /// expected geometric intersection was not found.
    #[error("kinetic inconsistency: {0}")]
    KineticInconsistency(String),

    /// The input exercises a configuration the process does not define, such
    /// as more than two non-box planes meeting along one intersection line.
    #[error("unsupported configuration: {0}")]
    Unsupported(String),
}

impl Error {
    /// Shorthand used by invariant checks.
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        Error::InvariantViolation(msg.into())
    }

    /// Shorthand used by the event handlers.
    pub(crate) fn kinetic(msg: impl Into<String>) -> Self {
        Error::KineticInconsistency(msg.into())
    }
}
