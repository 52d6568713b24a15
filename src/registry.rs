//! Provider registration.
//!
//! A [`Registry`] maps service keys to providers. It is assembled once,
//! then frozen by [`Registry::build`] into a
//! [`ScopeProvider`](crate::ScopeProvider); the engine never mutates a
//! provider after registration.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::{ProviderContext, ServiceValue};
use crate::error::DiResult;
use crate::internal::Map;
use crate::observer::ScopeObserver;
use crate::scope::ScopeProvider;

/// A construction recipe for one service.
///
/// Providers read dependencies only through the context they receive:
/// statically via `ctx.container.get(key)` or dynamically via
/// `ctx.scope.resolve_with(key, args)`, never by capturing external
/// singletons. The final value is routed through `ctx.decorator.invoke`,
/// or returned directly by providers with no dependencies.
///
/// Implemented for any `Fn(ProviderContext) -> impl Future` closure, so
/// most registrations are plain async closures.
///
/// # Examples
///
/// ```rust
/// use lazy_di::{service, ProviderContext, Registry};
///
/// let mut registry = Registry::new();
/// registry.register("prefix", |_ctx: ProviderContext| async {
///     Ok(service("42".to_string()))
/// });
/// registry.register("banner", |ctx: ProviderContext| async move {
///     let prefix = ctx.container.get("prefix");
///     ctx.decorator
///         .invoke(move |_args| {
///             let prefix = prefix.clone();
///             async move { Ok(service(format!("== {} ==", prefix.downcast::<String>()?))) }
///         })
///         .await
/// });
/// ```
#[async_trait]
pub trait Provide: Send + Sync + 'static {
    /// Produces the service value for one invocation.
    ///
    /// Called twice per construction: once under the discovery decorator to
    /// learn which sibling keys it reads, once under the real decorator to
    /// build the value. Reads must therefore be deterministic across the
    /// two passes.
    async fn provide(&self, ctx: ProviderContext) -> DiResult<ServiceValue>;
}

#[async_trait]
impl<F, Fut> Provide for F
where
    F: Fn(ProviderContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DiResult<ServiceValue>> + Send + 'static,
{
    async fn provide(&self, ctx: ProviderContext) -> DiResult<ServiceValue> {
        self(ctx).await
    }
}

/// Immutable mapping from service key to provider, plus the observers to
/// attach to the scope built from it.
///
/// # Examples
///
/// ```rust
/// use lazy_di::{service, ProviderContext, Registry};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut registry = Registry::new();
/// registry.register("greeting", |_ctx: ProviderContext| async {
///     Ok(service("hello".to_string()))
/// });
///
/// let provider = registry.build();
/// let scope = provider.scope();
/// let greeting = scope.get::<String>("greeting").await.unwrap();
/// assert_eq!(*greeting, "hello");
/// # });
/// ```
pub struct Registry {
    providers: Map<Arc<str>, Arc<dyn Provide>>,
    observers: Vec<Arc<dyn ScopeObserver>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Map::default(),
            observers: Vec::new(),
        }
    }

    /// Registers `provider` under `key`. The last registration for a key
    /// wins.
    pub fn register<P: Provide>(&mut self, key: impl Into<Arc<str>>, provider: P) -> &mut Self {
        self.providers.insert(key.into(), Arc::new(provider));
        self
    }

    /// Attaches a diagnostic observer; see [`ScopeObserver`].
    pub fn add_observer(&mut self, observer: Arc<dyn ScopeObserver>) -> &mut Self {
        self.observers.push(observer);
        self
    }

    /// True if a provider is registered under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.providers.contains_key(key)
    }

    /// The registered keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(|key| &**key)
    }

    /// Freezes the registry into a [`ScopeProvider`]. The scope and its
    /// cache live as long as the returned provider.
    pub fn build(self) -> ScopeProvider {
        ScopeProvider::new(self.providers, self.observers)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
