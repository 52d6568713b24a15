//! The scope: lazy, memoized, two-phase resolution.
//!
//! A [`Scope`] is the long-lived resolution surface built from a
//! [`Registry`](crate::Registry). Resolving a key runs the two-phase
//! protocol on a cache miss:
//!
//! 1. *Discovery*: the provider runs under [`Decorator::Discovery`]
//!    against a snooping container; every sibling key it reads is recorded
//!    and nothing is constructed.
//! 2. *Sub-container*: exactly the recorded keys resolve through this same
//!    scope (recursively, each through its own protocol and cache),
//!    awaited concurrently.
//! 3. *Real pass*: the provider runs again under
//!    [`Decorator::Real`] with the minimal resolved sub-container; the
//!    result is cached under the call signature.
//!
//! The ordering is strict: a provider can never observe a partially
//! resolved sub-container.

use std::sync::Arc;
use std::time::Instant;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

use crate::context::{ProviderContext, ServiceValue};
use crate::decorator::Decorator;
use crate::error::{DiError, DiResult};
use crate::internal::{KeyPath, Map, Mutex};
use crate::method::MethodHandle;
use crate::observer::{Observers, ScopeObserver};
use crate::registry::Provide;
use crate::signature::{CallArgs, CallSignature};
use crate::snoop::Snooper;

/// Key shown to observers for ad-hoc resolutions.
const ANONYMOUS: &str = "(anonymous)";

type Construction = Shared<BoxFuture<'static, DiResult<ServiceValue>>>;

/// Cache and in-flight state, keyed by call signature.
#[derive(Default)]
struct CacheState {
    /// Values produced by completed real passes. Never evicted; scopes are
    /// long-lived singletons and memoization is the point.
    settled: Map<CallSignature, ServiceValue>,
    /// Constructions currently running. Concurrent identical signatures
    /// join these instead of constructing twice.
    inflight: Map<CallSignature, Construction>,
}

struct ScopeState {
    providers: Map<Arc<str>, Arc<dyn Provide>>,
    cache: Mutex<CacheState>,
    observers: Observers,
}

/// The live resolution surface derived from a registry.
///
/// Cheap to clone; all clones share one registry and one cache. Each handle
/// additionally carries the resolution path that led to it, which is how
/// dependency cycles are detected across both container and scope reads.
///
/// # Examples
///
/// ```rust
/// use lazy_di::{service, ProviderContext, Registry};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut registry = Registry::new();
/// registry.register("prefix", |_ctx: ProviderContext| async {
///     Ok(service("42".to_string()))
/// });
///
/// let provider = registry.build();
/// let scope = provider.scope();
///
/// let first = scope.get::<String>("prefix").await.unwrap();
/// let second = scope.get::<String>("prefix").await.unwrap();
/// assert!(std::sync::Arc::ptr_eq(&first, &second)); // one construction
/// # });
/// ```
#[derive(Clone)]
pub struct Scope {
    state: Arc<ScopeState>,
    path: KeyPath,
}

impl Scope {
    fn new(state: Arc<ScopeState>) -> Self {
        Self {
            state,
            path: KeyPath::new(),
        }
    }

    /// A handle whose resolution path is extended by `key`; handed to the
    /// provider of `key` so everything it resolves is checked against the
    /// chain that led to it.
    fn enter(&self, key: Arc<str>) -> Self {
        let mut path = self.path.clone();
        path.push(key);
        Self {
            state: self.state.clone(),
            path,
        }
    }

    fn cycle(&self, key: &str) -> DiError {
        let mut path: Vec<String> = self.path.iter().map(|key| key.to_string()).collect();
        path.push(key.to_string());
        DiError::Circular(path)
    }

    /// Resolves `key` with no arguments (the static form).
    pub async fn resolve(&self, key: &str) -> DiResult<ServiceValue> {
        self.resolve_with(key, CallArgs::new()).await
    }

    /// Resolves `key` with positional arguments (the dynamic form).
    ///
    /// At most one real construction happens per distinct call signature
    /// for the lifetime of the scope: repeats return the cached value with
    /// no re-discovery and no re-invocation, and concurrent identical calls
    /// join one in-flight construction. Nothing is cached on failure, so an
    /// identical later call retries from scratch.
    pub async fn resolve_with(&self, key: &str, args: CallArgs) -> DiResult<ServiceValue> {
        if self.path.iter().any(|entry| &**entry == key) {
            return Err(self.cycle(key));
        }

        // Strict missing-key policy: a typo in a dependency name surfaces
        // here, naming the key.
        let (key, provider) = match self.state.providers.get_key_value(key) {
            Some((key, provider)) => (key.clone(), provider.clone()),
            None => return Err(DiError::NotRegistered(key.to_string())),
        };

        let signature = CallSignature::new(key.clone(), &args);

        let construction = {
            let mut cache = self.state.cache.lock();
            if let Some(value) = cache.settled.get(&signature) {
                return Ok(value.clone());
            }
            match cache.inflight.get(&signature) {
                Some(construction) => construction.clone(),
                None => {
                    let construction = self.construct(key, provider, args);
                    cache
                        .inflight
                        .insert(signature.clone(), construction.clone());
                    construction
                }
            }
        };

        let result = construction.await;

        let mut cache = self.state.cache.lock();
        cache.inflight.remove(&signature);
        if let Ok(value) = &result {
            cache
                .settled
                .entry(signature)
                .or_insert_with(|| value.clone());
        }
        result
    }

    /// Builds the shared construction future for one cache miss. Observer
    /// events fire from here, so joined callers stay silent.
    fn construct(&self, key: Arc<str>, provider: Arc<dyn Provide>, args: CallArgs) -> Construction {
        let scope = self.enter(key.clone());
        let future: BoxFuture<'static, DiResult<ServiceValue>> = Box::pin(async move {
            let observers = scope.state.observers.clone();
            let started = Instant::now();
            observers.resolving(&key);

            let result = instantiate(&scope, Some(key.clone()), provider.as_ref(), args).await;
            match &result {
                Ok(_) => observers.resolved(&key, started.elapsed()),
                Err(error) => observers.failed(&key, error),
            }
            result
        });
        future.shared()
    }

    /// Resolves `key` and downcasts the value to `T`.
    pub async fn get<T: Send + Sync + 'static>(&self, key: &str) -> DiResult<Arc<T>> {
        self.get_with(key, CallArgs::new()).await
    }

    /// Resolves `key` with arguments and downcasts the value to `T`.
    pub async fn get_with<T: Send + Sync + 'static>(
        &self,
        key: &str,
        args: CallArgs,
    ) -> DiResult<Arc<T>> {
        self.resolve_with(key, args)
            .await?
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch {
                key: key.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Deferred method-style access to a member of the service under `key`;
    /// see [`MethodHandle`].
    pub fn method(&self, key: impl Into<Arc<str>>, member: impl Into<Arc<str>>) -> MethodHandle {
        MethodHandle::new(self.clone(), key.into(), member.into())
    }
}

/// Owns a scope and its cache; the root handle built by
/// [`Registry::build`](crate::Registry::build).
pub struct ScopeProvider {
    scope: Scope,
}

impl ScopeProvider {
    pub(crate) fn new(
        providers: Map<Arc<str>, Arc<dyn Provide>>,
        observers: Vec<Arc<dyn ScopeObserver>>,
    ) -> Self {
        Self {
            scope: Scope::new(Arc::new(ScopeState {
                providers,
                cache: Mutex::new(CacheState::default()),
                observers: Observers::new(observers),
            })),
        }
    }

    /// The shared scope. Instantiated once and reused between calls.
    pub fn scope(&self) -> Scope {
        self.scope.clone()
    }

    /// Runs the two-phase protocol for a one-off provider not registered
    /// under any key: its dependencies are discovered and resolved through
    /// the scope (hitting the scope's cache), but the result itself is not
    /// cached; there is no stable key to cache it under.
    ///
    /// Useful for composing several resolved services into a throwaway
    /// object without keying it into the registry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_di::{service, ProviderContext, Registry};
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let mut registry = Registry::new();
    /// registry.register("prefix", |_ctx: ProviderContext| async {
    ///     Ok(service("42".to_string()))
    /// });
    /// let provider = registry.build();
    ///
    /// let composed = provider
    ///     .resolve(|ctx: ProviderContext| async move {
    ///         let prefix = ctx.container.get("prefix");
    ///         ctx.decorator
    ///             .invoke(move |_args| {
    ///                 let prefix = prefix.clone();
    ///                 async move {
    ///                     Ok(service(format!("got {}", prefix.downcast::<String>()?)))
    ///                 }
    ///             })
    ///             .await
    ///     })
    ///     .await
    ///     .unwrap();
    ///
    /// assert_eq!(*composed.downcast::<String>().unwrap(), "got 42");
    /// # });
    /// ```
    pub async fn resolve<P: Provide>(&self, provider: P) -> DiResult<ServiceValue> {
        instantiate(&self.scope, None, &provider, CallArgs::new()).await
    }
}

/// The two-phase driver shared by keyed and ad-hoc resolution.
///
/// Discovery fully completes before the sub-container resolves, which fully
/// completes before the real pass begins. The discovery return value is
/// dropped unobserved.
pub(crate) async fn instantiate(
    scope: &Scope,
    key: Option<Arc<str>>,
    provider: &dyn Provide,
    args: CallArgs,
) -> DiResult<ServiceValue> {
    let snooper = Snooper::new();

    provider
        .provide(ProviderContext {
            key: key.clone(),
            container: snooper.container(),
            scope: scope.clone(),
            decorator: Decorator::Discovery,
        })
        .await?;

    let label = key.as_deref().unwrap_or(ANONYMOUS);
    scope
        .state
        .observers
        .discovered(label, &snooper.recorded());

    let container = snooper.resolve(scope).await?;

    provider
        .provide(ProviderContext {
            key,
            container,
            scope: scope.clone(),
            decorator: Decorator::Real(args),
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::service;
    use crate::registry::Registry;
    use std::time::Duration;

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<String>>,
    }

    impl ScopeObserver for Recording {
        fn resolving(&self, key: &str) {
            self.events.lock().push(format!("resolving {}", key));
        }
        fn discovered(&self, key: &str, dependencies: &[Arc<str>]) {
            let names: Vec<&str> = dependencies.iter().map(|key| &**key).collect();
            self.events
                .lock()
                .push(format!("discovered {} [{}]", key, names.join(",")));
        }
        fn resolved(&self, key: &str, _duration: Duration) {
            self.events.lock().push(format!("resolved {}", key));
        }
        fn failed(&self, key: &str, error: &DiError) {
            self.events.lock().push(format!("failed {} {}", key, error));
        }
    }

    fn wired(observer: Arc<Recording>) -> ScopeProvider {
        let mut registry = Registry::new();
        registry.add_observer(observer);
        registry.register("prefix", |_ctx: ProviderContext| async {
            Ok(service("42".to_string()))
        });
        registry.register("banner", |ctx: ProviderContext| async move {
            let prefix = ctx.container.get("prefix");
            ctx.decorator
                .invoke(move |_args| {
                    let prefix = prefix.clone();
                    async move {
                        Ok(service(format!("== {} ==", prefix.downcast::<String>()?)))
                    }
                })
                .await
        });
        registry.build()
    }

    #[tokio::test]
    async fn observers_fire_once_per_construction_and_never_on_hits() {
        let observer = Arc::new(Recording::default());
        let scope = wired(observer.clone()).scope();

        scope.resolve("banner").await.unwrap();
        scope.resolve("banner").await.unwrap(); // cache hit, silent

        let events = observer.events.lock().clone();
        assert_eq!(
            events,
            vec![
                "resolving banner".to_string(),
                "discovered banner [prefix]".to_string(),
                "resolving prefix".to_string(),
                "discovered prefix []".to_string(),
                "resolved prefix".to_string(),
                "resolved banner".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn failures_reach_observers() {
        let observer = Arc::new(Recording::default());
        let scope = wired(observer.clone()).scope();

        let _ = scope.resolve("missing").await;
        assert!(observer.events.lock().is_empty()); // rejected before construction

        let mut registry = Registry::new();
        registry.add_observer(observer.clone());
        registry.register("broken", |ctx: ProviderContext| async move {
            let ghost = ctx.container.get("ghost");
            ctx.decorator
                .invoke(move |_args| {
                    let ghost = ghost.clone();
                    async move { ghost.value() }
                })
                .await
        });
        let scope = registry.build().scope();
        let _ = scope.resolve("broken").await;

        let events = observer.events.lock().clone();
        assert!(events.iter().any(|event| event.starts_with("failed broken")));
    }

    #[tokio::test]
    async fn ad_hoc_resolution_reports_discovery_anonymously() {
        let observer = Arc::new(Recording::default());
        let provider = wired(observer.clone());

        provider
            .resolve(|ctx: ProviderContext| async move {
                let prefix = ctx.container.get("prefix");
                ctx.decorator
                    .invoke(move |_args| {
                        let prefix = prefix.clone();
                        async move { prefix.value() }
                    })
                    .await
            })
            .await
            .unwrap();

        let events = observer.events.lock().clone();
        assert!(events.contains(&"discovered (anonymous) [prefix]".to_string()));
    }
}
