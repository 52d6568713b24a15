//! # lazy-di
//!
//! Lazy, self-describing dependency resolution for Rust.
//!
//! A [`Registry`] maps service names to async construction recipes
//! ("providers"). Building it yields a [`Scope`] whose members construct
//! and cache services on demand, and each provider is automatically
//! supplied with only the sibling services it actually reads, discovered
//! without triggering their construction.
//!
//! ## Features
//!
//! - **Two-phase resolution**: an inert discovery pass records which
//!   siblings a provider reads; only those are resolved before the provider
//!   runs for real
//! - **Per-signature memoization**: at most one construction per distinct
//!   (key, arguments) pair, with single-flight de-duplication of
//!   concurrent identical calls
//! - **Cycle detection**: circular registrations fail fast with the full
//!   dependency path
//! - **Runtime-agnostic async**: built on `futures` only; bring any
//!   executor
//! - **Method-style access**: optional dynamic member dispatch for
//!   registry-driven composition
//!
//! ## Quick Start
//!
//! ```rust
//! use lazy_di::{service, ProviderContext, Registry};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut registry = Registry::new();
//!
//! registry.register("prefix", |_ctx: ProviderContext| async {
//!     Ok(service("42".to_string()))
//! });
//!
//! registry.register("greeting", |ctx: ProviderContext| async move {
//!     // Reads are recorded during the discovery pass; construction only
//!     // happens inside the decorated factory, on the real pass.
//!     let prefix = ctx.container.get("prefix");
//!     ctx.decorator
//!         .invoke(move |_args| {
//!             let prefix = prefix.clone();
//!             async move {
//!                 Ok(service(format!("Hello {}", prefix.downcast::<String>()?)))
//!             }
//!         })
//!         .await
//! });
//!
//! let provider = registry.build();
//! let scope = provider.scope();
//!
//! let greeting = scope.get::<String>("greeting").await.unwrap();
//! assert_eq!(*greeting, "Hello 42");
//! # });
//! ```
//!
//! ## The two-phase protocol
//!
//! Resolving a key that misses the cache runs its provider twice:
//!
//! 1. **Discovery**: the provider runs with a snooping container and an
//!    inert decorator. Every `container.get(..)` records a key and returns
//!    an unresolved placeholder; `decorator.invoke` skips the factory
//!    entirely. The return value is discarded.
//! 2. **Sub-container**: exactly the recorded keys are resolved through
//!    the same scope (recursively, each with its own cache entry) and
//!    awaited concurrently.
//! 3. **Real pass**: the provider runs again with the resolved
//!    sub-container; this time `decorator.invoke` calls the factory with
//!    the call's arguments, and the result is cached under the
//!    [`CallSignature`].
//!
//! The ordering is strict, so a provider can never observe a partially
//! resolved sub-container. Dependencies a provider only needs with
//! arguments resolve dynamically through `ctx.scope` instead, in both
//! passes (cached like any other call).
//!
//! ## Dynamic calls
//!
//! ```rust
//! use lazy_di::{args, service, ProviderContext, Registry};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut registry = Registry::new();
//! registry.register("adder", |ctx: ProviderContext| async move {
//!     ctx.decorator
//!         .invoke(|args| async move {
//!             let sum: i64 = args.iter().filter_map(|v| v.as_i64()).sum();
//!             Ok(service(sum))
//!         })
//!         .await
//! });
//!
//! let scope = registry.build().scope();
//! assert_eq!(*scope.get_with::<i64>("adder", args![1, 2]).await.unwrap(), 3);
//! assert_eq!(*scope.get_with::<i64>("adder", args![1, 2]).await.unwrap(), 3); // cached
//! assert_eq!(*scope.get_with::<i64>("adder", args![5]).await.unwrap(), 5); // new signature
//! # });
//! ```

// Module declarations
pub mod context;
pub mod decorator;
pub mod error;
pub mod method;
pub mod observer;
pub mod registry;
pub mod scope;
pub mod signature;

// Internal modules
mod internal;
mod snoop;

// Re-export core types
pub use context::{service, Container, Dep, ProviderContext, ServiceValue};
pub use decorator::Decorator;
pub use error::{DiError, DiResult};
pub use method::{Dynamic, Member, Members, MethodFn, MethodHandle};
pub use observer::{LoggingObserver, ScopeObserver};
pub use registry::{Provide, Registry};
pub use scope::{Scope, ScopeProvider};
pub use signature::{CallArgs, CallSignature};

// The argument model is serde_json; re-exported so hosts and the `args!`
// macro need no direct dependency.
pub use serde_json::{json, Value};
