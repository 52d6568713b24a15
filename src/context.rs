//! Construction context handed to providers.
//!
//! A provider receives a [`ProviderContext`] on every invocation. During the
//! discovery pass the context's [`Container`] records every key the provider
//! reads and hands back unresolved placeholders; during the real pass the
//! same reads are served from the minimal sub-container built from exactly
//! the recorded keys.

use std::any::Any;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::decorator::Decorator;
use crate::error::{DiError, DiResult};
use crate::internal::Map;
use crate::scope::Scope;
use crate::snoop::Recorder;

/// Type-erased service value.
///
/// Services are shared, immutable and type-erased; typed access goes through
/// [`Dep::downcast`] or [`Scope::get`](crate::Scope::get). JSON-shaped
/// services (`serde_json::Value`) additionally support [`Dep::member`]
/// projection and [`Dep::parse`] extraction.
pub type ServiceValue = Arc<dyn Any + Send + Sync>;

/// Boxes a value as a [`ServiceValue`].
///
/// # Examples
///
/// ```rust
/// use lazy_di::{json, service};
///
/// let text = service("42".to_string());
/// let config = service(json!({ "database": { "host": "localhost" } }));
/// assert!(text.downcast_ref::<String>().is_some());
/// assert!(config.downcast_ref::<lazy_di::Value>().is_some());
/// ```
pub fn service<T: Send + Sync + 'static>(value: T) -> ServiceValue {
    Arc::new(value)
}

/// Everything a provider needs to construct its service.
///
/// The same provider runs twice per construction with two different
/// contexts: once with a snooping container and [`Decorator::Discovery`],
/// once with the resolved sub-container and [`Decorator::Real`].
pub struct ProviderContext {
    /// Key the provider is registered under; `None` for ad-hoc resolution
    /// through [`ScopeProvider::resolve`](crate::ScopeProvider::resolve).
    pub key: Option<Arc<str>>,
    /// Static dependency access: `container.get("sibling")` resolves the
    /// sibling with no arguments and is what the discovery pass records.
    pub container: Container,
    /// The live scope, for dynamic resolution with arguments. Reads through
    /// the scope construct for real in *both* passes (and hit the cache on
    /// the second), so static reads should go through the container.
    pub scope: Scope,
    /// Controls the invoke step; see [`Decorator`].
    pub decorator: Decorator,
}

/// Container-shaped dependency access for one provider invocation.
///
/// Snooping while dependencies are being discovered, resolved afterwards.
/// Call-local: the engine never retains a container past the invocation it
/// was built for, though providers may clone it into the services they
/// construct.
#[derive(Clone)]
pub struct Container {
    inner: ContainerInner,
}

#[derive(Clone)]
enum ContainerInner {
    /// Discovery pass: record every distinct key, resolve nothing.
    Snooping(Recorder),
    /// Real pass: serve exactly the keys recorded during discovery.
    Resolved(Arc<Map<Arc<str>, ServiceValue>>),
}

impl Container {
    pub(crate) fn snooping(recorder: Recorder) -> Self {
        Self {
            inner: ContainerInner::Snooping(recorder),
        }
    }

    pub(crate) fn resolved(entries: Map<Arc<str>, ServiceValue>) -> Self {
        Self {
            inner: ContainerInner::Resolved(Arc::new(entries)),
        }
    }

    /// Reads the sibling service registered under `key`.
    ///
    /// During the discovery pass this records `key` and returns an
    /// unresolved placeholder; during the real pass it returns the resolved
    /// value. Reads must be deterministic across the two passes: a key read
    /// only in the real pass was never resolved and yields a handle whose
    /// extraction fails with [`DiError::Unavailable`].
    pub fn get(&self, key: &str) -> Dep {
        match &self.inner {
            ContainerInner::Snooping(recorder) => Dep {
                key: recorder.record(key),
                state: DepState::Unresolved,
            },
            ContainerInner::Resolved(entries) => match entries.get_key_value(key) {
                Some((key, value)) => Dep {
                    key: key.clone(),
                    state: DepState::Resolved(value.clone()),
                },
                None => Dep {
                    key: Arc::from(key),
                    state: DepState::Unavailable(Arc::from(format!(
                        "'{}' was not read during the discovery pass",
                        key
                    ))),
                },
            },
        }
    }
}

/// Read handle for one dependency.
///
/// A `Dep` defers typing to the moment of extraction so the same provider
/// code can run under both passes: during discovery every handle is a
/// placeholder, and extraction belongs inside the decorated factory, which
/// only runs once the handle is resolved.
#[derive(Clone)]
pub struct Dep {
    key: Arc<str>,
    state: DepState,
}

#[derive(Clone)]
enum DepState {
    Unresolved,
    Resolved(ServiceValue),
    Unavailable(Arc<str>),
}

impl Dep {
    /// Top-level key this handle was read from.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// True once the handle carries a resolved value.
    pub fn is_resolved(&self) -> bool {
        matches!(self.state, DepState::Resolved(_))
    }

    /// Projects into a named member of a JSON-shaped service.
    ///
    /// Safe to chain during the discovery pass: projecting an unresolved
    /// handle yields another unresolved handle, and only the top-level key
    /// is recorded. On a resolved handle the value must be a JSON object
    /// containing the member.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # fn demo(config: lazy_di::Dep) -> lazy_di::DiResult<String> {
    /// let host: String = config.member("database").member("host").parse()?;
    /// # Ok(host)
    /// # }
    /// ```
    pub fn member(&self, name: &str) -> Dep {
        let state = match &self.state {
            DepState::Unresolved => DepState::Unresolved,
            DepState::Unavailable(reason) => DepState::Unavailable(reason.clone()),
            DepState::Resolved(value) => match value.downcast_ref::<Value>() {
                Some(Value::Object(fields)) => match fields.get(name) {
                    Some(field) => DepState::Resolved(Arc::new(field.clone())),
                    None => DepState::Unavailable(Arc::from(format!(
                        "no member '{}' on '{}'",
                        name, self.key
                    ))),
                },
                Some(_) => DepState::Unavailable(Arc::from(format!(
                    "member '{}' requested on non-object value of '{}'",
                    name, self.key
                ))),
                None => DepState::Unavailable(Arc::from(format!(
                    "member '{}' requested on non-JSON service '{}'",
                    name, self.key
                ))),
            },
        };
        Dep {
            key: self.key.clone(),
            state,
        }
    }

    /// The resolved value.
    pub fn value(&self) -> DiResult<ServiceValue> {
        match &self.state {
            DepState::Resolved(value) => Ok(value.clone()),
            DepState::Unresolved => Err(DiError::Unresolved(self.key.to_string())),
            DepState::Unavailable(reason) => Err(DiError::Unavailable(reason.to_string())),
        }
    }

    /// The resolved value, downcast to `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
        self.value()?
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch {
                key: self.key.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// The resolved value as a JSON value.
    pub fn json(&self) -> DiResult<Value> {
        Ok(self.downcast::<Value>()?.as_ref().clone())
    }

    /// Deserializes a JSON-shaped value (or projection) into `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> DiResult<T> {
        serde_json::from_value(self.json()?).map_err(|_| DiError::TypeMismatch {
            key: self.key.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }
}
