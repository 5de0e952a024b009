//! A hash-set that behaves deterministically when the
//! `enhanced-determinism` feature is enabled.

#[cfg(feature = "enhanced-determinism")]
pub use indexmap::IndexSet as HashSet;

/// Hashset using [`hashbrown::HashSet`]
#[cfg(not(feature = "enhanced-determinism"))]
pub type HashSet<K> = hashbrown::hash_set::HashSet<K, foldhash::fast::FixedState>;
