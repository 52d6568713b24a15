//! Dependency snooping for the discovery pass.
//!
//! A snooper backs the container a provider sees during its first
//! invocation: every distinct key read is recorded, nothing is constructed.
//! Once the pass completes, [`Snooper::resolve`] reads exactly the recorded
//! keys through the real scope (zero-argument, static form), awaits them
//! concurrently, and produces the minimal sub-container for the real pass.

use std::sync::Arc;

use futures::future::try_join_all;

use crate::context::{Container, ServiceValue};
use crate::error::DiResult;
use crate::internal::{Map, Mutex};
use crate::scope::Scope;

/// Shared record of the keys a provider touched.
///
/// Insertion-ordered; dependency sets are small, so a vector with a
/// contains-check beats hashing here.
#[derive(Clone)]
pub(crate) struct Recorder {
    seen: Arc<Mutex<Vec<Arc<str>>>>,
}

impl Recorder {
    pub(crate) fn new() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Records a read of `key`, interning it so repeated reads share one
    /// allocation. Returns the interned key.
    pub(crate) fn record(&self, key: &str) -> Arc<str> {
        let mut seen = self.seen.lock();
        if let Some(existing) = seen.iter().find(|k| &***k == key) {
            return existing.clone();
        }
        let key: Arc<str> = Arc::from(key);
        seen.push(key.clone());
        key
    }

    /// Snapshot of the recorded keys, in first-read order.
    pub(crate) fn keys(&self) -> Vec<Arc<str>> {
        self.seen.lock().clone()
    }
}

/// One discovery pass worth of recording plus the resolution step that
/// turns it into a sub-container.
pub(crate) struct Snooper {
    recorder: Recorder,
}

impl Snooper {
    pub(crate) fn new() -> Self {
        Self {
            recorder: Recorder::new(),
        }
    }

    /// The container to run the discovery pass against.
    pub(crate) fn container(&self) -> Container {
        Container::snooping(self.recorder.clone())
    }

    /// The keys recorded so far, for diagnostics.
    pub(crate) fn recorded(&self) -> Vec<Arc<str>> {
        self.recorder.keys()
    }

    /// Resolves exactly the recorded keys through `scope` and builds the
    /// sub-container. Must only run after the discovery pass has completed;
    /// each key resolves through its own full protocol and cache, and all
    /// of them are awaited concurrently.
    ///
    /// Only static, zero-argument dependencies are resolvable through this
    /// path; anything parameterized goes through the scope directly.
    pub(crate) async fn resolve(self, scope: &Scope) -> DiResult<Container> {
        let keys = self.recorder.keys();
        let resolutions = keys.into_iter().map(|key| {
            let scope = scope.clone();
            async move {
                let value: ServiceValue = scope.resolve(&key).await?;
                Ok::<_, crate::error::DiError>((key, value))
            }
        });

        let mut entries = Map::default();
        for (key, value) in try_join_all(resolutions).await? {
            entries.insert(key, value);
        }
        Ok(Container::resolved(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_dedupes_and_keeps_first_read_order() {
        let recorder = Recorder::new();
        recorder.record("b");
        recorder.record("a");
        recorder.record("b");

        let keys = recorder.keys();
        assert_eq!(keys, vec![Arc::<str>::from("b"), Arc::<str>::from("a")]);
    }

    #[test]
    fn record_interns_keys() {
        let recorder = Recorder::new();
        let first = recorder.record("config");
        let second = recorder.record("config");
        assert!(Arc::ptr_eq(&first, &second));
    }
}
