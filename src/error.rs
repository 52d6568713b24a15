//! Error types for the resolution engine.

use std::fmt;

/// Resolution errors
///
/// Represents the error conditions that can occur while resolving services
/// through a scope: missing registrations, dependency cycles, reads that
/// escaped the discovery pass, and provider failures.
///
/// All variants are `Clone` so results can travel through shared in-flight
/// futures when concurrent calls collapse onto one construction.
///
/// # Examples
///
/// ```rust
/// use lazy_di::{DiError, Registry};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let provider = Registry::new().build();
/// match provider.scope().resolve("database").await {
///     Err(DiError::NotRegistered(key)) => assert_eq!(key, "database"),
///     _ => unreachable!(),
/// }
/// # });
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// Service key has no provider in the registry
    NotRegistered(String),
    /// Circular dependency detected (includes the full key path)
    Circular(Vec<String>),
    /// A dependency placeholder was read outside a decorated factory,
    /// i.e. during the discovery pass
    Unresolved(String),
    /// A sub-container read that cannot be served
    Unavailable(String),
    /// Resolved value had a different type than requested
    TypeMismatch {
        /// Service key the read was addressed to
        key: String,
        /// Type the caller asked for
        expected: &'static str,
    },
    /// Invoked a service member that is not callable
    NotCallable {
        /// Member name as requested
        member: String,
        /// What the member actually is: `"value"`, `"missing"` or `"opaque"`
        kind: &'static str,
    },
    /// Failure raised by provider or factory code
    Provider {
        /// Key of the failing provider, `(anonymous)` for ad-hoc resolution
        key: String,
        /// Human-readable cause
        message: String,
    },
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::NotRegistered(key) => write!(f, "Service not registered: {}", key),
            DiError::Circular(path) => {
                write!(f, "Circular dependency: {}", path.join(" -> "))
            }
            DiError::Unresolved(key) => {
                write!(
                    f,
                    "Dependency '{}' read before resolution; typed reads belong inside the decorated factory",
                    key
                )
            }
            DiError::Unavailable(reason) => write!(f, "Dependency unavailable: {}", reason),
            DiError::TypeMismatch { key, expected } => {
                write!(f, "Type mismatch for '{}': expected {}", key, expected)
            }
            DiError::NotCallable { member, kind } => {
                write!(f, "Member '{}' is not callable ({})", member, kind)
            }
            DiError::Provider { key, message } => {
                write!(f, "Provider '{}' failed: {}", key, message)
            }
        }
    }
}

impl std::error::Error for DiError {}

/// Result type for resolution operations
///
/// A convenience alias for `Result<T, DiError>` used throughout lazy-di.
pub type DiResult<T> = Result<T, DiError>;
