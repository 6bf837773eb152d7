//! Scoped service resolution and lifecycle management.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::{ResolverContext, ServiceProvider};
use crate::error::{DiError, DiResult};
use crate::internal::{DisposalReport, DisposeBag, Disposer, ResolutionStack};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{AnyArc, Registration};
use crate::traits::ResolverCore;

/// A bounded unit of work with its own scoped instances.
///
/// A `Scope` shares the registry and singletons of the provider that created
/// it, and owns:
///
/// - a cache holding one instance per scoped registration
/// - the teardowns of disposal-capable scoped instances, in creation order
///
/// # Lifetime Behavior
///
/// - **Singleton**: Resolved and cached in the root provider (shared across all scopes)
/// - **Scoped**: Resolved and cached within this specific scope
/// - **Transient**: Created fresh on every resolution (no caching)
///
/// Once disposed, a scope refuses further resolution with
/// [`DiError::ScopeDisposed`]. A scope dropped without an explicit
/// [`dispose`](Scope::dispose) is disposed by its `Drop` impl.
///
/// # Examples
///
/// ```
/// use scopewire::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct DatabaseConnection(String);
/// struct UserService { db: Arc<DatabaseConnection> }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_scoped_factory::<DatabaseConnection, _>(|_| {
///     Ok(DatabaseConnection("connection-123".to_string()))
/// });
/// collection.add_transient_factory::<UserService, _>(|resolver| {
///     Ok(UserService { db: resolver.get::<DatabaseConnection>()? })
/// });
///
/// let provider = collection.build();
/// let scope = provider.create_scope();
///
/// let user1 = scope.get_required::<UserService>();
/// let user2 = scope.get_required::<UserService>();
/// assert!(Arc::ptr_eq(&user1.db, &user2.db));
/// ```
pub struct Scope {
    root: ServiceProvider,
    state: Mutex<ScopeState>,
}

#[derive(Default)]
struct ScopeState {
    cache: HashMap<Key, AnyArc>,
    disposables: DisposeBag,
    disposed: bool,
}

impl Scope {
    pub(crate) fn new(root: ServiceProvider) -> Self {
        Self {
            root,
            state: Mutex::new(ScopeState::default()),
        }
    }

    /// The provider this scope was created from.
    pub fn provider(&self) -> &ServiceProvider {
        &self.root
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    /// Tears down every recorded disposable exactly once, in creation order.
    ///
    /// Teardown errors and panics are logged and collected in the report;
    /// they never stop the remaining teardowns. The scoped cache is emptied.
    ///
    /// # Errors
    ///
    /// [`DiError::ScopeDisposed`] if the scope was already disposed.
    pub fn dispose(&self) -> DiResult<DisposalReport> {
        let (bag, cache) = {
            let mut state = self.state.lock();
            if state.disposed {
                return Err(DiError::ScopeDisposed);
            }
            state.disposed = true;
            (state.disposables.take(), std::mem::take(&mut state.cache))
        };

        tracing::debug!(
            disposables = bag.len(),
            cached = cache.len(),
            "disposing scope"
        );
        let report = bag.run_all();
        drop(cache);
        Ok(report)
    }

    pub(crate) fn push_disposer(&self, disposer: Disposer) {
        let mut state = self.state.lock();
        if state.disposed {
            drop(state);
            tracing::warn!(
                service = disposer.service,
                "disposer registered on a disposed scope; running it now"
            );
            let mut bag = DisposeBag::default();
            bag.push(disposer);
            bag.run_all();
            return;
        }
        state.disposables.push(disposer);
    }

    /// Resolves `key` inside this scope as part of the call chain `stack`.
    pub(crate) fn resolve_in(&self, key: &Key, stack: &ResolutionStack) -> DiResult<AnyArc> {
        self.root.observers().observe(key, || {
            if self.state.lock().disposed {
                return Err(DiError::ScopeDisposed);
            }

            let _frame = stack.enter(key)?;
            let reg = self.root.registration(key)?;

            match reg.lifetime {
                Lifetime::Singleton => self.root.resolve_singleton(key, reg, stack),
                Lifetime::Scoped => self.resolve_scoped(key, reg, stack),
                Lifetime::Transient => {
                    tracing::trace!(service = key.display_name(), "constructing transient");
                    reg.construct(&ResolverContext::scope(self, stack))
                }
            }
        })
    }

    fn resolve_scoped(&self, key: &Key, reg: &Registration, stack: &ResolutionStack) -> DiResult<AnyArc> {
        if let Some(cached) = self.state.lock().cache.get(key) {
            return Ok(cached.clone());
        }

        // Lock released: the factory may resolve other scoped services.
        tracing::trace!(service = key.display_name(), "constructing scoped");
        let value = reg.construct(&ResolverContext::scope(self, stack))?;
        let disposer = reg.disposer_for(&value);

        let mut state = self.state.lock();
        if state.disposed {
            drop(state);
            if let Some(disposer) = disposer {
                let mut bag = DisposeBag::default();
                bag.push(disposer);
                bag.run_all();
            }
            return Err(DiError::ScopeDisposed);
        }

        // Another thread may have won the race; keep its instance, but the
        // losing one still gets torn down with the scope.
        let winner = state.cache.entry(*key).or_insert_with(|| value.clone()).clone();
        if let Some(disposer) = disposer {
            state.disposables.push(disposer);
        }
        Ok(winner)
    }
}

impl ResolverCore for Scope {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        let stack = ResolutionStack::new();
        self.resolve_in(key, &stack)
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.disposed {
            return;
        }
        if !state.disposables.is_empty() {
            tracing::warn!(
                pending = state.disposables.len(),
                "scope dropped without dispose(); disposing now"
            );
        }
        // Only fails if already disposed, checked above.
        let _ = self.dispose();
    }
}
