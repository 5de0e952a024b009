//! User-facing configuration of the kinetic process.

use crate::math::{Point3, Real};

/// Parameters controlling the kinetic partition.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Parameters {
    /// Per-plane crossing budget: how many already-occupied intersection
    /// lines a plane may absorb before its polygon freezes there.
    pub k: u32,
    /// Ratio by which the bounding box of the input is inflated. Must be
    /// `>= 1`; the value `1` is bumped to `1 + 2 * tolerance` so the box
    /// strictly encloses the input.
    pub enlarge_bbox_ratio: Real,
    /// Use an oriented bounding box instead of the axis-aligned one.
    pub reorient: bool,
    /// Emit event traces through the `log` crate at the `debug` level.
    pub verbose: bool,
    /// Run the full set of invariant checks after every processed event.
    pub debug: bool,
    /// Explicit axis-aligned bounding box `[min, max]`. When set, it is used
    /// as-is (no inflation) instead of the box computed from the input. This
    /// is the only way to partition an empty input.
    pub bbox: Option<[Point3<Real>; 2]>,
    /// Optional cap on the number of processed events. When reached, the
    /// propagation stops and returns the current, possibly partial but
    /// internally consistent, partition.
    pub max_events: Option<usize>,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            k: 1,
            enlarge_bbox_ratio: 1.0,
            reorient: false,
            verbose: false,
            debug: false,
            bbox: None,
            max_events: None,
        }
    }
}

impl Parameters {
    /// Parameters with the given crossing budget and defaults elsewhere.
    pub fn with_k(k: u32) -> Self {
        Parameters {
            k,
            ..Default::default()
        }
    }
}
