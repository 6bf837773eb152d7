//! Service collection module for dependency injection.
//!
//! This module contains the ServiceCollection type and related functionality
//! for registering services and building service providers.

use std::sync::Arc;

use crate::descriptors::{ServiceDescriptor, SourceKind};
use crate::error::{DiError, DiResult};
use crate::injectable::Injectable;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, Observers};
use crate::provider::{ResolverContext, ServiceProvider};
use crate::registration::{AnyArc, Decorator, Registration, Registry, Source};
use crate::traits::{Dispose, ResolverCore};

pub mod source;
pub use source::ServiceSource;

/// Mutable registry of service declarations.
///
/// Registration never validates dependencies; a missing or circular
/// dependency surfaces when the service is first resolved (or earlier, from
/// an explicit [`validate`](ServiceCollection::validate) call).
/// Registering the same key twice keeps the later declaration.
#[derive(Default)]
pub struct ServiceCollection {
    pub(crate) registry: Registry,
    observers: Observers,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            observers: Observers::new(),
        }
    }

    // ----- Core Registration -----

    /// Stores a declaration for `T`, replacing any earlier one.
    ///
    /// Decorators already attached to `T` carry over to the new declaration.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scopewire::{Lifetime, ServiceCollection, ServiceSource, Resolver};
    /// use std::sync::Arc;
    ///
    /// let mut services = ServiceCollection::new();
    /// services.register::<String>(Lifetime::Singleton, ServiceSource::instance(Arc::new("a".to_string())));
    /// services.register::<String>(
    ///     Lifetime::Transient,
    ///     ServiceSource::factory(|_| Ok(Arc::new("b".to_string()))),
    /// );
    ///
    /// assert_eq!(services.len(), 1);
    /// let provider = services.build();
    /// assert_eq!(&*provider.get_required::<String>(), "b");
    /// ```
    pub fn register<T>(&mut self, lifetime: Lifetime, source: ServiceSource<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = Key::of::<T>();
        let mut registration = Registration::new(&key, lifetime, source.source, source.teardown);

        if let Some(previous) = self.registry.get_mut(&key) {
            tracing::debug!(
                service = key.display_name(),
                previous = %previous.lifetime,
                lifetime = %registration.lifetime,
                "overwriting registration"
            );
            registration.decorators = std::mem::take(&mut previous.decorators);
        }

        self.registry.insert(key, registration);
        self
    }

    /// Registers `T` only if nothing is registered under its key yet.
    ///
    /// Returns `true` when the declaration was stored.
    pub fn try_add<T>(&mut self, lifetime: Lifetime, source: ServiceSource<T>) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        if self.contains::<T>() {
            return false;
        }
        self.register(lifetime, source);
        true
    }

    /// Registers a pre-built shared instance (concrete type or trait object).
    pub fn register_instance<T>(&mut self, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register(Lifetime::Singleton, ServiceSource::instance(value))
    }

    // ----- Concrete Type Registrations -----

    /// Registers a singleton instance that will be shared across the entire application.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use scopewire::ServiceCollection;
    /// struct Config {
    ///     database_url: String
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Config {
    ///     database_url: "postgres://localhost".to_string()
    /// });
    /// ```
    pub fn add_singleton<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.register_instance(Arc::new(value))
    }

    /// Registers a singleton factory that creates the instance on first request.
    ///
    /// The factory normally runs once per provider; concurrent first requests
    /// may each run it, and every caller gets the instance cached first. It always receives a root
    /// context, so it cannot depend on scoped services.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use scopewire::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// struct Database { url: String }
    /// struct UserService { db: Arc<Database> }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Database { url: "postgres://localhost".to_string() });
    /// services.add_singleton_factory::<UserService, _>(|resolver| {
    ///     Ok(UserService { db: resolver.get::<Database>()? })
    /// });
    /// ```
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Singleton, factory)
    }

    /// Registers a scoped factory that creates one instance per scope.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use scopewire::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// struct RequestContext { request_id: String }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_scoped_factory::<RequestContext, _>(|_| {
    ///     Ok(RequestContext { request_id: "req-123".to_string() })
    /// });
    ///
    /// let provider = services.build();
    /// assert!(provider.get::<RequestContext>().is_err());
    /// let scope = provider.create_scope();
    /// assert_eq!(scope.get_required::<RequestContext>().request_id, "req-123");
    /// ```
    pub fn add_scoped_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Scoped, factory)
    }

    /// Registers a transient factory that creates a new instance on every request.
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Transient, factory)
    }

    fn add_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register(lifetime, typed_factory(factory))
    }

    // ----- Injectable Registrations -----

    /// Registers `I` as a singleton built from its dependency manifest.
    pub fn add_singleton_impl<I: Injectable>(&mut self) -> &mut Self {
        self.register(Lifetime::Singleton, ServiceSource::<I>::implementation())
    }

    /// Registers `I` as a scoped service built from its dependency manifest.
    pub fn add_scoped_impl<I: Injectable>(&mut self) -> &mut Self {
        self.register(Lifetime::Scoped, ServiceSource::<I>::implementation())
    }

    /// Registers `I` as a transient service built from its dependency manifest.
    pub fn add_transient_impl<I: Injectable>(&mut self) -> &mut Self {
        self.register(Lifetime::Transient, ServiceSource::<I>::implementation())
    }

    /// Binds contract `T` (usually `dyn Trait`) to implementation `I` as a singleton.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scopewire::{Injectable, ServiceCollection, Resolver};
    /// use std::sync::Arc;
    ///
    /// trait Clock: Send + Sync { fn now(&self) -> u64; }
    ///
    /// struct FixedClock;
    /// impl Clock for FixedClock { fn now(&self) -> u64 { 1_700_000_000 } }
    /// impl Injectable for FixedClock {
    ///     type Deps = ();
    ///     fn inject(_: ()) -> Self { FixedClock }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_impl_as::<dyn Clock, FixedClock>(|c| c);
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<dyn Clock>().now(), 1_700_000_000);
    /// ```
    pub fn add_singleton_impl_as<T, I>(&mut self, cast: fn(Arc<I>) -> Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.register(Lifetime::Singleton, ServiceSource::implementation_as::<I>(cast))
    }

    /// Binds contract `T` to implementation `I`, one instance per scope.
    pub fn add_scoped_impl_as<T, I>(&mut self, cast: fn(Arc<I>) -> Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.register(Lifetime::Scoped, ServiceSource::implementation_as::<I>(cast))
    }

    /// Binds contract `T` to implementation `I`, a new instance per request.
    pub fn add_transient_impl_as<T, I>(&mut self, cast: fn(Arc<I>) -> Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.register(Lifetime::Transient, ServiceSource::implementation_as::<I>(cast))
    }

    // ----- Disposable Registrations -----

    /// Registers `I` as a scoped service torn down with its scope.
    pub fn add_scoped_disposable<I: Injectable + Dispose>(&mut self) -> &mut Self {
        self.register(Lifetime::Scoped, ServiceSource::<I>::implementation().disposable())
    }

    /// Registers a scoped factory whose instances are torn down with their scope.
    pub fn add_scoped_disposable_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Dispose,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register(Lifetime::Scoped, typed_factory(factory).disposable())
    }

    /// Registers a singleton factory whose instance is torn down by
    /// [`ServiceProvider::dispose`].
    pub fn add_singleton_disposable_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Dispose,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register(Lifetime::Singleton, typed_factory(factory).disposable())
    }

    // ----- Trait Registrations -----

    /// Registers a singleton trait implementation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use scopewire::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait Logger: Send + Sync {
    ///     fn log(&self, message: &str);
    /// }
    ///
    /// struct NullLogger;
    /// impl Logger for NullLogger {
    ///     fn log(&self, _message: &str) {}
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_trait::<dyn Logger>(Arc::new(NullLogger));
    /// ```
    pub fn add_singleton_trait<T>(&mut self, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register_instance(value)
    }

    /// Registers a singleton trait factory.
    pub fn add_singleton_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        self.register(Lifetime::Singleton, ServiceSource::factory(factory))
    }

    /// Registers a scoped trait factory.
    pub fn add_scoped_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        self.register(Lifetime::Scoped, ServiceSource::factory(factory))
    }

    /// Registers a transient trait factory.
    pub fn add_transient_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        self.register(Lifetime::Transient, ServiceSource::factory(factory))
    }

    // ----- Conditional Registration -----

    /// Register a singleton if not already registered.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use scopewire::ServiceCollection;
    /// let mut services = ServiceCollection::new();
    /// assert!(services.try_add_singleton(42usize));
    /// assert!(!services.try_add_singleton(100usize));
    /// ```
    pub fn try_add_singleton<T: Send + Sync + 'static>(&mut self, value: T) -> bool {
        self.try_add(Lifetime::Singleton, ServiceSource::instance(Arc::new(value)))
    }

    /// Register a singleton factory if not already registered.
    pub fn try_add_singleton_factory<T, F>(&mut self, factory: F) -> bool
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.try_add(Lifetime::Singleton, typed_factory(factory))
    }

    /// Register a scoped factory if not already registered.
    pub fn try_add_scoped_factory<T, F>(&mut self, factory: F) -> bool
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.try_add(Lifetime::Scoped, typed_factory(factory))
    }

    /// Register a transient factory if not already registered.
    pub fn try_add_transient_factory<T, F>(&mut self, factory: F) -> bool
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.try_add(Lifetime::Transient, typed_factory(factory))
    }

    /// Register a singleton trait implementation if not already registered.
    pub fn try_add_singleton_trait<T>(&mut self, value: Arc<T>) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.try_add(Lifetime::Singleton, ServiceSource::instance(value))
    }

    // ----- Decoration -----

    /// Wraps every instance of `T` produced by the provider.
    ///
    /// Decorators run after construction and before caching, within the
    /// resolution of `T` itself, so they may resolve other services through
    /// the context. With several decorators the first one registered ends up
    /// outermost.
    ///
    /// A decorator whose resolutions lead back to `T` fails with
    /// [`DiError::CircularDecorator`] rather than a plain
    /// [`DiError::Circular`].
    ///
    /// # Errors
    ///
    /// [`DiError::NotFound`] if `T` has not been registered yet.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scopewire::{ServiceCollection, Resolver};
    /// use std::sync::Arc;
    ///
    /// trait Greeter: Send + Sync { fn greet(&self) -> String; }
    ///
    /// struct Plain;
    /// impl Greeter for Plain { fn greet(&self) -> String { "hi".into() } }
    ///
    /// struct Loud(Arc<dyn Greeter>);
    /// impl Greeter for Loud { fn greet(&self) -> String { self.0.greet().to_uppercase() } }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_trait::<dyn Greeter>(Arc::new(Plain));
    /// services
    ///     .decorate::<dyn Greeter, _>(|_, inner| Ok(Arc::new(Loud(inner))))
    ///     .unwrap();
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<dyn Greeter>().greet(), "HI");
    /// ```
    pub fn decorate<T, F>(&mut self, wrap: F) -> DiResult<&mut Self>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>, Arc<T>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        let key = Key::of::<T>();
        let registration = self
            .registry
            .get_mut(&key)
            .ok_or(DiError::NotFound(key.display_name()))?;

        let name = key.display_name();
        let decorator: Decorator = Arc::new(
            move |ctx: &ResolverContext<'_>, instance: AnyArc| -> DiResult<AnyArc> {
                let inner = instance.downcast_ref::<Arc<T>>().cloned().ok_or_else(|| {
                    DiError::DependencyTypeUnresolvable {
                        name,
                        chain: ctx.resolution_chain(),
                    }
                })?;
                match wrap(ctx, inner) {
                    Ok(wrapped) => Ok(Arc::new(wrapped)),
                    // `T` is on the stack once, inside this decorator's frame
                    Err(DiError::Circular(path)) if path.last() == Some(&name) => {
                        Err(DiError::CircularDecorator(path))
                    }
                    Err(err) => Err(err),
                }
            },
        );
        registration.decorators.push(decorator);
        tracing::debug!(
            service = name,
            decorators = registration.decorators.len(),
            "decorator registered"
        );
        Ok(self)
    }

    // ----- Diagnostics -----

    /// Adds a diagnostic observer for resolution events.
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// True if a declaration exists for `T`.
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.registry.contains_key(&Key::of::<T>())
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    /// Snapshot of every declaration, in registration order.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.registry
            .iter()
            .map(|(key, reg)| ServiceDescriptor {
                key: *key,
                lifetime: reg.lifetime,
                kind: reg.source.kind(),
                implementation: match &reg.source {
                    Source::Implementation { type_name, .. } => Some(*type_name),
                    _ => None,
                },
                dependencies: reg.source.dependencies().to_vec(),
                disposable: reg.teardown.is_some(),
                decorators: reg.decorators.len(),
            })
            .collect()
    }

    fn count_by_kind(&self, kind: SourceKind) -> usize {
        self.registry.iter().filter(|(_, reg)| reg.source.kind() == kind).count()
    }

    /// Freezes the collection into a [`ServiceProvider`].
    pub fn build(self) -> ServiceProvider {
        tracing::debug!(
            implementations = self.count_by_kind(SourceKind::Implementation),
            factories = self.count_by_kind(SourceKind::Factory),
            instances = self.count_by_kind(SourceKind::Instance),
            "building service provider"
        );
        ServiceProvider::new(self.registry, self.observers)
    }
}

/// Adapts a factory returning `T` to one returning `Arc<T>`.
fn typed_factory<T, F>(factory: F) -> ServiceSource<T>
where
    T: Send + Sync + 'static,
    F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
{
    ServiceSource::factory(move |ctx: &ResolverContext<'_>| factory(ctx).map(Arc::new))
}
