//! Method-style service access.
//!
//! Services that want to expose callable members by name implement
//! [`Members`] and register themselves wrapped in [`Dynamic`]. A
//! [`MethodHandle`] then defers everything: the service resolves through
//! the scope (zero-argument, cached) only when the method is actually
//! called, and the member lookup happens against the live instance.
//!
//! Typed services do not need any of this; resolve and downcast instead.
//! This layer exists for registry-driven composition where member names
//! travel as data.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::context::ServiceValue;
use crate::error::{DiError, DiResult};
use crate::scope::Scope;
use crate::signature::CallArgs;

/// A callable member: positional JSON arguments in, service value out.
pub type MethodFn = Arc<dyn Fn(CallArgs) -> BoxFuture<'static, DiResult<ServiceValue>> + Send + Sync>;

/// One named member of a dynamic service.
pub enum Member {
    /// A plain value; invoking it is an error.
    Value(ServiceValue),
    /// A callable member.
    Method(MethodFn),
}

impl Member {
    /// Wraps an async closure as a callable member.
    pub fn method<F, Fut>(f: F) -> Self
    where
        F: Fn(CallArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<ServiceValue>> + Send + 'static,
    {
        Member::Method(Arc::new(
            move |args| -> BoxFuture<'static, DiResult<ServiceValue>> { Box::pin(f(args)) },
        ))
    }

    /// Wraps a plain value as a non-callable member.
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Member::Value(Arc::new(value))
    }
}

/// Member lookup for services addressed by method name.
pub trait Members: Send + Sync + 'static {
    /// The member registered under `name`, if any.
    fn member(&self, name: &str) -> Option<Member>;
}

/// Type-erasure wrapper that lets a [`Members`] implementation live in the
/// registry as an ordinary service value.
pub struct Dynamic(Arc<dyn Members>);

impl Dynamic {
    /// Boxes `members` as a [`ServiceValue`] ready to be returned from a
    /// provider.
    pub fn service(members: impl Members) -> ServiceValue {
        Arc::new(Dynamic(Arc::new(members)))
    }

    fn member(&self, name: &str) -> Option<Member> {
        self.0.member(name)
    }
}

/// Deferred invocation of one named member of one service.
///
/// Created by [`Scope::method`]. Nothing resolves until [`call`]; repeated
/// calls reuse the scope's cached service instance but never cache the
/// method result itself.
///
/// [`call`]: MethodHandle::call
///
/// # Examples
///
/// ```rust
/// use lazy_di::{args, service, Dynamic, Member, Members, ProviderContext, Registry};
///
/// struct Greeter;
///
/// impl Members for Greeter {
///     fn member(&self, name: &str) -> Option<Member> {
///         match name {
///             "greet" => Some(Member::method(|args| async move {
///                 let name = args[0].as_str().unwrap_or("world").to_string();
///                 Ok(service(format!("hello {}", name)))
///             })),
///             _ => None,
///         }
///     }
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut registry = Registry::new();
/// registry.register("greeter", |_ctx: ProviderContext| async {
///     Ok(Dynamic::service(Greeter))
/// });
/// let provider = registry.build();
///
/// let greet = provider.scope().method("greeter", "greet");
/// let greeting = greet.call(args!["di"]).await.unwrap();
/// assert_eq!(*greeting.downcast::<String>().unwrap(), "hello di");
/// # });
/// ```
pub struct MethodHandle {
    scope: Scope,
    key: Arc<str>,
    member: Arc<str>,
}

impl MethodHandle {
    pub(crate) fn new(scope: Scope, key: Arc<str>, member: Arc<str>) -> Self {
        Self { scope, key, member }
    }

    /// Resolves the service and invokes the member with `args`.
    ///
    /// Fails with [`DiError::NotCallable`] naming the member and its actual
    /// kind when the member is a plain value (`"value"`), absent
    /// (`"missing"`), or the service does not expose members at all
    /// (`"opaque"`).
    pub async fn call(&self, args: CallArgs) -> DiResult<ServiceValue> {
        let service = self.scope.resolve(&self.key).await?;
        let dynamic = service
            .downcast::<Dynamic>()
            .map_err(|_| DiError::NotCallable {
                member: self.member.to_string(),
                kind: "opaque",
            })?;

        match dynamic.member(&self.member) {
            Some(Member::Method(method)) => method(args).await,
            Some(Member::Value(_)) => Err(DiError::NotCallable {
                member: self.member.to_string(),
                kind: "value",
            }),
            None => Err(DiError::NotCallable {
                member: self.member.to_string(),
                kind: "missing",
            }),
        }
    }
}
