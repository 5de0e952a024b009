/*!
cleave3d
========

**cleave3d** partitions a 3-dimensional bounding box into convex polyhedral
cells by simulating a kinetic process: every input planar polygon expands
inside its supporting plane at unit speed along its edge normals, and the
expansion is constrained whenever a polygon boundary reaches the intersection
line of two supporting planes. When the simulation ends, every supporting
plane carries a planar subdivision and the supporting planes together induce
a convex decomposition of the box.

The crate exposes the kinetic core only: building the intersection graph,
splitting the input polygons into their initial subdivisions, and running the
event loop until every polygon vertex is frozen. Extracting volumes, fitting
planes, or labeling cells are left to the caller.
*/

#![deny(non_camel_case_types)]
#![deny(unused_parens)]
#![deny(non_upper_case_globals)]
#![warn(missing_docs)]
#![warn(unused_imports)]
#![allow(missing_copy_implementations)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::manual_range_contains)] // This usually makes it way more verbose that it could be.
#![doc(html_root_url = "https://docs.rs/cleave3d/0.1.0")]

#[cfg(feature = "serde-serialize")]
#[macro_use]
extern crate serde;
#[macro_use]
extern crate approx;

pub extern crate nalgebra as na;

pub mod data_structure;
pub mod error;
pub mod event;
pub mod geometry;
pub mod igraph;
pub mod initializer;
pub mod mesh;
pub mod parameters;
pub mod partition;
pub mod propagation;
pub mod splitter;
pub mod support_plane;
pub mod utils;

pub use crate::error::Error;
pub use crate::parameters::Parameters;
pub use crate::partition::{KineticPartition3, Partition};

mod real {
    /// The scalar type used throughout this crate.
    #[cfg(feature = "f64")]
    pub use f64 as Real;

    /// The scalar type used throughout this crate.
    #[cfg(feature = "f32")]
    pub use f32 as Real;
}

/// Aliases for the mathematical types used throughout this crate.
pub mod math {
    pub use super::real::*;
    pub use na::{Isometry3, Matrix3, Point2, Point3, UnitVector2, UnitVector3, Vector2, Vector3};

    /// The default tolerance used for geometric operations.
    pub const DEFAULT_EPSILON: Real = Real::EPSILON;

    /// The threshold under which two scalar quantities are considered equal
    /// despite arithmetic noise.
    ///
    /// Every "is on the line", "is the same plane", or "happens at the same
    /// time" comparison in this crate goes through this constant.
    #[cfg(feature = "f64")]
    pub const TOLERANCE: Real = 1.0e-9;

    /// The threshold under which two scalar quantities are considered equal
    /// despite arithmetic noise.
    #[cfg(feature = "f32")]
    pub const TOLERANCE: Real = 1.0e-5;

    /// The dimension of the ambient space.
    pub const DIM: usize = 3;
}
