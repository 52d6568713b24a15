//! Call signatures for the resolution cache.
//!
//! A scope memoizes constructions per *(service key, call arguments)* pair.
//! Arguments are positional JSON values, which gives the cache a
//! canonicalization contract instead of an ad-hoc serialization: JSON
//! objects in `serde_json` are BTreeMap-backed, so object keys always
//! serialize sorted and the encoding of an argument list is deterministic
//! regardless of how the values were built.

use std::sync::Arc;

use serde_json::Value;

/// Positional call arguments for a dynamic service resolution.
///
/// Anything the host wants to pass must be representable as a JSON value;
/// handles, closures and cyclic structures are ruled out by construction,
/// which is what makes the call signature stable.
pub type CallArgs = Vec<Value>;

/// Cache key for one construction: service key plus the canonical encoding
/// of the argument list.
///
/// Identical calls always produce identical signatures, and the encoding is
/// order-preserving over the positional list.
///
/// # Examples
///
/// ```rust
/// use lazy_di::{args, CallSignature};
///
/// let a = CallSignature::new("joiner", &args!["Hello"]);
/// let b = CallSignature::new("joiner", &args!["Hello"]);
/// let c = CallSignature::new("joiner", &args!["World"]);
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSignature {
    key: Arc<str>,
    args: String,
}

impl CallSignature {
    /// Builds the signature for `key` called with `args`.
    pub fn new(key: impl Into<Arc<str>>, args: &CallArgs) -> Self {
        Self {
            key: key.into(),
            args: canonicalize(args),
        }
    }

    /// The service key this signature belongs to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The canonical JSON encoding of the argument list.
    pub fn canonical_args(&self) -> &str {
        &self.args
    }
}

/// Canonical JSON encoding of an argument list.
///
/// Infallible by the argument contract: a `Vec<Value>` has no non-string
/// map keys and no custom serializers, the only ways `serde_json`
/// serialization can fail.
pub(crate) fn canonicalize(args: &CallArgs) -> String {
    serde_json::to_string(args).expect("JSON argument lists always serialize")
}

/// Builds a [`CallArgs`] list from JSON-convertible expressions.
///
/// # Examples
///
/// ```rust
/// use lazy_di::args;
///
/// let empty = args![];
/// assert!(empty.is_empty());
///
/// let list = args!["Hello", 42, { "nested": true }];
/// assert_eq!(list.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => { $crate::CallArgs::new() };
    ($($value:tt),+ $(,)?) => {
        vec![$($crate::json!($value)),+]
    };
}
