//! Error types for the dependency injection container.

use thiserror::Error;

/// Dependency injection errors
///
/// Every variant is terminal for the `resolve` call that produced it; the
/// container never retries or falls back on its own.
///
/// # Examples
///
/// ```rust
/// use scopewire::{DiError, ServiceCollection, Resolver};
///
/// let provider = ServiceCollection::new().build();
/// match provider.get::<String>() {
///     Err(DiError::NotFound(type_name)) => {
///         assert_eq!(type_name, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use scopewire::DiError;
///
/// let circular = DiError::Circular(vec!["ServiceA", "ServiceB", "ServiceA"]);
/// assert_eq!(circular.to_string(), "Circular dependency: ServiceA -> ServiceB -> ServiceA");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiError {
    /// The requested key, or one it transitively needs, has no registration.
    #[error("Service not found: {0}")]
    NotFound(&'static str),

    /// A key already under construction was requested again (includes path).
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),

    /// A scoped service was requested from the root provider.
    #[error("Cannot resolve scoped service {0} from the root provider; create a scope first")]
    ScopedFromRoot(&'static str),

    /// The value produced for a key could not be viewed as the requested type.
    #[error("Dependency type unresolvable for {name} (resolution stack: {})", .chain.join(" -> "))]
    DependencyTypeUnresolvable {
        name: &'static str,
        chain: Vec<&'static str>,
    },

    /// A lifetime tag could not be mapped to a known lifetime.
    #[error("Unknown lifetime: {0}")]
    UnknownLifetime(String),

    /// A decorator (or something it resolved) requested the service it wraps.
    #[error("Circular decorator chain detected: {}", .0.join(" -> "))]
    CircularDecorator(Vec<&'static str>),

    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),

    /// The scope was already disposed.
    #[error("Scope has already been disposed")]
    ScopeDisposed,

    /// A factory reported its own failure.
    #[error("Factory for {name} failed: {message}")]
    Factory {
        name: &'static str,
        message: String,
    },

    /// Configuration could not be bound to an options type.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DiError {
    /// Wraps an arbitrary error raised inside a factory for service `T`.
    pub fn factory<T: ?Sized + 'static>(err: impl std::fmt::Display) -> Self {
        DiError::Factory {
            name: std::any::type_name::<T>(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for DI operations
pub type DiResult<T> = Result<T, DiError>;
