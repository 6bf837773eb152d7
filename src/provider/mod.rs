//! Service provider module for dependency injection.
//!
//! This module contains the ServiceProvider type and related functionality
//! for resolving registered services from the DI container.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{DiError, DiResult};
use crate::internal::{DisposalReport, DisposeBag, Disposer, ResolutionStack};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::observer::Observers;
use crate::registration::{AnyArc, Registration, Registry};
use crate::traits::ResolverCore;

pub mod context;
pub mod scope;

pub use context::ResolverContext;
pub use scope::Scope;

/// Service provider for resolving dependencies from the DI container.
///
/// A provider is the frozen result of
/// [`ServiceCollection::build`](crate::ServiceCollection::build). It owns the
/// registry, one cache cell per singleton registration and the teardown list
/// for singleton disposables. Scoped services are only reachable through a
/// [`Scope`].
///
/// # Thread Safety
///
/// `ServiceProvider` is `Send + Sync` and cheap to clone (it uses `Arc`
/// internally). Threads racing on a singleton's first request may each build
/// one, but only the first finished instance is cached and returned to all of
/// them. No lock is held while a factory runs, so cycles that span threads
/// still fail with [`DiError::Circular`].
///
/// # Examples
///
/// ```
/// use scopewire::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(Database { url: "postgres://localhost".to_string() });
/// collection.add_transient_factory::<UserService, _>(|resolver| {
///     Ok(UserService { db: resolver.get::<Database>()? })
/// });
///
/// let provider = collection.build();
/// let user_service = provider.get_required::<UserService>();
/// assert_eq!(user_service.db.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    registry: Registry,
    root_disposers: Mutex<DisposeBag>,
    observers: Observers,
}

impl ServiceProvider {
    pub(crate) fn new(registry: Registry, observers: Observers) -> Self {
        tracing::debug!(
            services = registry.len(),
            observers = observers.len(),
            "service provider built"
        );
        Self {
            inner: Arc::new(ProviderInner {
                registry,
                root_disposers: Mutex::new(DisposeBag::default()),
                observers,
            }),
        }
    }

    /// Creates a new scope for resolving scoped services.
    ///
    /// Each scope keeps its own cache of scoped instances and its own list of
    /// disposables, while singletons are shared with the root provider.
    ///
    /// # Examples
    ///
    /// ```
    /// use scopewire::{ServiceCollection, Resolver};
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// #[derive(Debug)]
    /// struct RequestId(usize);
    ///
    /// let counter = Arc::new(AtomicUsize::new(0));
    /// let c = counter.clone();
    ///
    /// let mut collection = ServiceCollection::new();
    /// collection.add_scoped_factory::<RequestId, _>(move |_| {
    ///     Ok(RequestId(c.fetch_add(1, Ordering::SeqCst)))
    /// });
    ///
    /// let provider = collection.build();
    /// let scope1 = provider.create_scope();
    /// let scope2 = provider.create_scope();
    ///
    /// let req1a = scope1.get_required::<RequestId>();
    /// let req1b = scope1.get_required::<RequestId>();
    /// let req2 = scope2.get_required::<RequestId>();
    ///
    /// assert!(Arc::ptr_eq(&req1a, &req1b));
    /// assert!(!Arc::ptr_eq(&req1a, &req2));
    /// ```
    pub fn create_scope(&self) -> Scope {
        tracing::debug!("scope created");
        Scope::new(self.clone())
    }

    /// Runs `f` inside a fresh scope and disposes the scope afterwards.
    ///
    /// The scope is torn down on every exit path: normally here, or by
    /// `Drop` when `f` panics.
    ///
    /// # Examples
    ///
    /// ```
    /// use scopewire::{ServiceCollection, Resolver};
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_scoped_factory::<String, _>(|_| Ok("unit of work".to_string()));
    ///
    /// let provider = services.build();
    /// let len = provider.with_scope(|scope| scope.get_required::<String>().len());
    /// assert_eq!(len, 12);
    /// ```
    pub fn with_scope<R>(&self, f: impl FnOnce(&Scope) -> R) -> R {
        let scope = self.create_scope();
        let out = f(&scope);
        if let Ok(report) = scope.dispose() {
            if !report.is_clean() {
                tracing::warn!(failures = report.failures.len(), "scope teardown reported failures");
            }
        }
        out
    }

    /// Tears down singleton disposables in creation order.
    ///
    /// Each teardown runs at most once; a second call returns an empty
    /// report. Cached singletons stay cached, so call this at the very end of
    /// the provider's life.
    pub fn dispose(&self) -> DisposalReport {
        let bag = self.inner.root_disposers.lock().take();
        tracing::debug!(disposables = bag.len(), "disposing singletons");
        bag.run_all()
    }

    /// Returns true if a service is registered under `T`.
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.inner.registry.contains_key(&Key::of::<T>())
    }

    pub(crate) fn push_disposer(&self, disposer: Disposer) {
        self.inner.root_disposers.lock().push(disposer);
    }

    pub(crate) fn registration(&self, key: &Key) -> DiResult<&Registration> {
        self.inner
            .registry
            .get(key)
            .ok_or(DiError::NotFound(key.display_name()))
    }

    #[inline]
    pub(crate) fn observers(&self) -> &Observers {
        &self.inner.observers
    }

    /// Resolves `key` on the root provider as part of the call chain `stack`.
    pub(crate) fn resolve_in(&self, key: &Key, stack: &ResolutionStack) -> DiResult<AnyArc> {
        self.observers().observe(key, || {
            let _frame = stack.enter(key)?;
            let reg = self.registration(key)?;

            match reg.lifetime {
                Lifetime::Singleton => self.resolve_singleton(key, reg, stack),
                Lifetime::Scoped => Err(DiError::ScopedFromRoot(key.display_name())),
                Lifetime::Transient => {
                    tracing::trace!(service = key.display_name(), "constructing transient");
                    reg.construct(&ResolverContext::root(self, stack))
                }
            }
        })
    }

    /// Returns the cached singleton for `reg`, building it on first use.
    ///
    /// The caller has already pushed `key` onto `stack`. Construction always
    /// uses a root context, so a singleton never captures scoped state.
    pub(crate) fn resolve_singleton(
        &self,
        key: &Key,
        reg: &Registration,
        stack: &ResolutionStack,
    ) -> DiResult<AnyArc> {
        let ctx = ResolverContext::root(self, stack);

        let Some(cell) = &reg.singleton_cell else {
            return reg.construct(&ctx);
        };

        if let Some(value) = cell.lock().as_ref() {
            return Ok(value.clone());
        }

        // Built with the cell unlocked; the first completed write wins.
        tracing::debug!(service = key.display_name(), "constructing singleton");
        let value = reg.construct(&ctx)?;
        let disposer = reg.disposer_for(&value);

        let (winner, lost_race) = {
            let mut slot = cell.lock();
            match slot.as_ref() {
                Some(existing) => (existing.clone(), true),
                None => {
                    *slot = Some(value.clone());
                    (value, false)
                }
            }
        };

        if lost_race {
            tracing::debug!(service = key.display_name(), "singleton built concurrently; keeping first");
        }
        // a losing instance is torn down with the winner
        if let Some(disposer) = disposer {
            self.push_disposer(disposer);
        }
        Ok(winner)
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        let stack = ResolutionStack::new();
        self.resolve_in(key, &stack)
    }
}

impl Drop for ProviderInner {
    fn drop(&mut self) {
        let pending = self.root_disposers.get_mut().len();
        if pending > 0 {
            tracing::warn!(
                pending,
                "service provider dropped with undisposed singletons; call dispose() first"
            );
        }
    }
}
