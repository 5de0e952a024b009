//! A hash-map that behaves deterministically when the
//! `enhanced-determinism` feature is enabled.

#[cfg(feature = "enhanced-determinism")]
pub use {indexmap::map::Entry, indexmap::IndexMap as HashMap};

#[cfg(not(feature = "enhanced-determinism"))]
pub use hashbrown::hash_map::Entry;
/// Hashmap using [`hashbrown::HashMap`]
#[cfg(not(feature = "enhanced-determinism"))]
pub type HashMap<K, V> = hashbrown::hash_map::HashMap<K, V, foldhash::fast::FixedState>;
