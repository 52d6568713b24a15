//! Internal implementation details.

pub(crate) mod sync;

pub(crate) use sync::Mutex;

/// Hash map used for the registry, the cache and sub-containers.
#[cfg(feature = "ahash")]
pub(crate) type Map<K, V> = ahash::AHashMap<K, V>;
#[cfg(not(feature = "ahash"))]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V>;

/// Resolution path carried by each scope handle for cycle detection.
/// Dependency chains are shallow in practice, so the smallvec variant
/// keeps the hot path allocation-free.
#[cfg(feature = "smallvec")]
pub(crate) type KeyPath = smallvec::SmallVec<[std::sync::Arc<str>; 8]>;
#[cfg(not(feature = "smallvec"))]
pub(crate) type KeyPath = Vec<std::sync::Arc<str>>;
