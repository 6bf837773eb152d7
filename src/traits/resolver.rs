//! Resolver traits for service resolution.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::registration::AnyArc;

/// Core resolver trait for object-safe service resolution.
///
/// Implemented by [`ServiceProvider`](crate::ServiceProvider),
/// [`Scope`](crate::Scope) and the [`ResolverContext`](crate::ResolverContext)
/// handed to factories. Most users want the generic [`Resolver`] methods.
pub trait ResolverCore: Send + Sync {
    /// Resolves the service registered under `key`.
    ///
    /// The returned value is the type-erased cell holding an `Arc<T>`; use
    /// [`Resolver::get`] for a typed handle.
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc>;

    /// Keys currently under construction on this call chain, outermost first.
    ///
    /// Empty for a top-level resolver.
    fn resolution_chain(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

/// High-level resolver interface with generic methods for type-safe service resolution.
///
/// Blanket-implemented for every [`ResolverCore`], so providers, scopes and
/// factory contexts all share the same API.
///
/// # Examples
///
/// ```
/// use scopewire::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str) -> String;
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) -> String {
///         format!("LOG: {}", msg)
///     }
/// }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(42usize);
/// collection.add_singleton_trait::<dyn Logger>(Arc::new(ConsoleLogger));
///
/// let provider = collection.build();
///
/// let number = provider.get_required::<usize>();
/// assert_eq!(*number, 42);
///
/// let logger = provider.get_required::<dyn Logger>();
/// assert_eq!(logger.log("ready"), "LOG: ready");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a service (concrete type or trait object).
    ///
    /// # Examples
    ///
    /// ```
    /// use scopewire::{ServiceCollection, Resolver};
    ///
    /// let mut collection = ServiceCollection::new();
    /// collection.add_singleton("configuration".to_string());
    ///
    /// let provider = collection.build();
    /// let config = provider.get::<String>().unwrap();
    /// assert_eq!(&*config, "configuration");
    /// ```
    fn get<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let key = Key::of::<T>();
        let any = self.resolve_any(&key)?;
        any.downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| DiError::DependencyTypeUnresolvable {
                name: key.display_name(),
                chain: self.resolution_chain(),
            })
    }

    /// Resolves a service, returning `Ok(None)` when `T` itself is not registered.
    ///
    /// Missing *transitive* dependencies are still reported as errors.
    fn try_get<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        let name = std::any::type_name::<T>();
        match self.get::<T>() {
            Ok(service) => Ok(Some(service)),
            Err(DiError::NotFound(missing)) if missing == name => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resolves a service, panicking on failure.
    ///
    /// Use this outside factories when a missing registration is a programming
    /// error. Inside factories prefer `get` with `?` so cycles surface as
    /// [`DiError::Circular`] instead of a panic.
    ///
    /// # Panics
    ///
    /// Panics if the service cannot be resolved.
    fn get_required<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
