//! Invocation decorators for the two-phase protocol.

use std::future::Future;
use std::sync::Arc;

use crate::context::ServiceValue;
use crate::error::DiResult;
use crate::signature::CallArgs;

/// Placeholder produced by a discovery-pass `invoke`. Never observed by the
/// engine and never cached.
struct Inert;

/// Controls whether a provider's `invoke` step actually runs the factory.
///
/// The engine hands every provider one of two variants:
///
/// - [`Decorator::Discovery`] during the first pass, where `invoke`
///   short-circuits to an inert placeholder without calling the factory, so
///   the only observable effect of the pass is the set of container reads;
/// - [`Decorator::Real`] during the second pass, where `invoke` runs the
///   factory with the call's arguments and returns its outcome.
///
/// `invoke` is the sanctioned place for a provider to produce its value, but
/// it is a convenience, not a gate: a provider with no dependencies may
/// return a value directly, which behaves identically to invoking a
/// no-argument factory. Providers that extract typed values from their
/// [`Dep`](crate::Dep) handles must do so inside the decorated factory,
/// because the handles are placeholders while dependencies are still being
/// recorded.
///
/// # Examples
///
/// ```rust
/// use lazy_di::{service, DiResult, ProviderContext, ServiceValue};
///
/// async fn provide(ctx: ProviderContext) -> DiResult<ServiceValue> {
///     let prefix = ctx.container.get("prefix");
///     ctx.decorator
///         .invoke(move |_args| {
///             let prefix = prefix.clone();
///             async move { Ok(service(format!("{}!", prefix.downcast::<String>()?))) }
///         })
///         .await
/// }
/// ```
#[derive(Clone)]
pub enum Decorator {
    /// Discovery pass: ignore the factory, return an inert placeholder.
    Discovery,
    /// Real pass: run the factory with the call's arguments.
    Real(CallArgs),
}

impl Decorator {
    /// Runs `factory` under this decorator's policy.
    ///
    /// In discovery mode the factory is not called and the returned
    /// placeholder must not be used for anything; the engine discards it.
    /// In real mode the factory receives the canonical call arguments
    /// (empty for static, zero-argument resolution).
    pub async fn invoke<F, Fut>(&self, factory: F) -> DiResult<ServiceValue>
    where
        F: FnOnce(CallArgs) -> Fut + Send,
        Fut: Future<Output = DiResult<ServiceValue>> + Send,
    {
        match self {
            Decorator::Discovery => Ok(Arc::new(Inert) as ServiceValue),
            Decorator::Real(args) => factory(args.clone()).await,
        }
    }

    /// True while dependencies are being recorded.
    ///
    /// Providers normally do not need this; it exists for provider code
    /// that wants to skip side effects which are pointless to repeat, such
    /// as logging.
    pub fn is_discovery(&self) -> bool {
        matches!(self, Decorator::Discovery)
    }

    /// The call arguments carried by a real-pass decorator.
    pub fn arguments(&self) -> Option<&CallArgs> {
        match self {
            Decorator::Discovery => None,
            Decorator::Real(args) => Some(args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::service;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn discovery_never_calls_the_factory() {
        let calls = AtomicU32::new(0);
        let decorator = Decorator::Discovery;

        let result = decorator
            .invoke(|_args| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(service(7u32)) }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn real_passes_the_call_arguments() {
        let decorator = Decorator::Real(vec![json!("Hello"), json!(2)]);

        let value = decorator
            .invoke(|args| async move {
                assert_eq!(args, vec![json!("Hello"), json!(2)]);
                Ok(service("done".to_string()))
            })
            .await
            .unwrap();

        assert_eq!(*value.downcast::<String>().unwrap(), "done");
    }

    #[test]
    fn mode_queries() {
        assert!(Decorator::Discovery.is_discovery());
        assert!(Decorator::Discovery.arguments().is_none());
        let real = Decorator::Real(vec![json!(1)]);
        assert!(!real.is_discovery());
        assert_eq!(real.arguments().unwrap().len(), 1);
    }
}
