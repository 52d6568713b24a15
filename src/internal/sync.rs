//! Lock primitives, switchable to parking_lot.

#[cfg(feature = "parking-lot")]
pub(crate) use parking_lot::Mutex;

#[cfg(not(feature = "parking-lot"))]
pub(crate) struct Mutex<T>(std::sync::Mutex<T>);

#[cfg(not(feature = "parking-lot"))]
impl<T> Mutex<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(std::sync::Mutex::new(value))
    }

    /// Locks the mutex, recovering the data from a poisoned lock. The cache
    /// state stays internally consistent under panic (single inserts and
    /// removes), so poisoning carries no information here.
    pub(crate) fn lock(&self) -> std::sync::MutexGuard<'_, T> {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(not(feature = "parking-lot"))]
impl<T: Default> Default for Mutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
