//! Diagnostic observers for resolution traceability.
//!
//! Observers hook the engine's resolution events: construction start, the
//! dependency set a discovery pass recorded, completion with timing, and
//! failures. They fire once per real construction; cache hits and joined
//! in-flight calls are silent.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;

/// Observer for scope resolution events.
///
/// Calls are made synchronously on the resolving task; keep implementations
/// lightweight.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use lazy_di::{DiError, ScopeObserver};
///
/// struct Tracing;
///
/// impl ScopeObserver for Tracing {
///     fn resolving(&self, key: &str) {
///         println!("resolving {}", key);
///     }
///     fn resolved(&self, key: &str, duration: Duration) {
///         println!("resolved {} in {:?}", key, duration);
///     }
///     fn failed(&self, key: &str, error: &DiError) {
///         eprintln!("failed {}: {}", key, error);
///     }
/// }
///
/// let observer: Arc<dyn ScopeObserver> = Arc::new(Tracing);
/// ```
pub trait ScopeObserver: Send + Sync {
    /// Called when a cache-missing construction begins, before the
    /// discovery pass.
    fn resolving(&self, key: &str);

    /// Called after the discovery pass with the recorded dependency keys,
    /// before any of them resolve.
    fn discovered(&self, key: &str, dependencies: &[Arc<str>]) {
        let _ = (key, dependencies);
    }

    /// Called when the real pass completes successfully.
    fn resolved(&self, key: &str, duration: Duration);

    /// Called when either pass, or a dependency resolution, fails.
    fn failed(&self, key: &str, error: &DiError);
}

/// Observer that prints resolution events to stdout/stderr.
pub struct LoggingObserver;

impl ScopeObserver for LoggingObserver {
    fn resolving(&self, key: &str) {
        println!("[lazy-di] resolving: {}", key);
    }

    fn discovered(&self, key: &str, dependencies: &[Arc<str>]) {
        let names: Vec<&str> = dependencies.iter().map(|key| &**key).collect();
        println!("[lazy-di] {} depends on [{}]", key, names.join(", "));
    }

    fn resolved(&self, key: &str, duration: Duration) {
        println!("[lazy-di] resolved: {} in {:?}", key, duration);
    }

    fn failed(&self, key: &str, error: &DiError) {
        eprintln!("[lazy-di] failed: {}: {}", key, error);
    }
}

/// Registered observers, notified in registration order.
#[derive(Clone)]
pub(crate) struct Observers {
    observers: Arc<[Arc<dyn ScopeObserver>]>,
}

impl Observers {
    pub(crate) fn new(observers: Vec<Arc<dyn ScopeObserver>>) -> Self {
        Self {
            observers: observers.into(),
        }
    }

    pub(crate) fn resolving(&self, key: &str) {
        for observer in self.observers.iter() {
            observer.resolving(key);
        }
    }

    pub(crate) fn discovered(&self, key: &str, dependencies: &[Arc<str>]) {
        for observer in self.observers.iter() {
            observer.discovered(key, dependencies);
        }
    }

    pub(crate) fn resolved(&self, key: &str, duration: Duration) {
        for observer in self.observers.iter() {
            observer.resolved(key, duration);
        }
    }

    pub(crate) fn failed(&self, key: &str, error: &DiError) {
        for observer in self.observers.iter() {
            observer.failed(key, error);
        }
    }
}
