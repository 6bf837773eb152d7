//! Resolver context for dependency injection.
//!
//! This module contains the ResolverContext type which provides
//! the interface for factory functions to resolve dependencies.

use std::any::type_name;
use std::sync::Arc;

use crate::error::DiResult;
use crate::internal::{Disposer, ResolutionStack};
use crate::key::Key;
use crate::registration::AnyArc;
use crate::traits::{Dispose, ResolverCore};

use super::{Scope, ServiceProvider};

#[derive(Clone, Copy)]
enum Target<'a> {
    Root(&'a ServiceProvider),
    Scope(&'a Scope),
}

/// Context passed to factories and decorators for resolving dependencies.
///
/// A context belongs to exactly one top-level resolution. Every nested
/// lookup made through it shares the same resolution stack, so cycles are
/// detected across factory boundaries. A context created on the root
/// provider cannot reach scoped services.
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
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database {
///     url: "postgres://localhost".to_string()
/// });
/// services.add_transient_factory::<UserService, _>(|resolver| {
///     Ok(UserService { db: resolver.get::<Database>()? })
/// });
///
/// let provider = services.build();
/// assert_eq!(provider.get_required::<UserService>().db.url, "postgres://localhost");
/// ```
pub struct ResolverContext<'a> {
    target: Target<'a>,
    stack: &'a ResolutionStack,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn root(provider: &'a ServiceProvider, stack: &'a ResolutionStack) -> Self {
        Self { target: Target::Root(provider), stack }
    }

    pub(crate) fn scope(scope: &'a Scope, stack: &'a ResolutionStack) -> Self {
        Self { target: Target::Scope(scope), stack }
    }

    /// True when resolving inside a scope rather than on the root provider.
    pub fn in_scope(&self) -> bool {
        matches!(self.target, Target::Scope(_))
    }

    /// Attaches a teardown for `service` to the current scope.
    ///
    /// On the root provider the teardown joins the singleton disposal list
    /// and runs on [`ServiceProvider::dispose`].
    pub fn register_disposer<T>(&self, service: Arc<T>)
    where
        T: Dispose + ?Sized,
    {
        let disposer = Disposer::new(type_name::<T>(), move || service.dispose());
        match self.target {
            Target::Root(provider) => provider.push_disposer(disposer),
            Target::Scope(scope) => scope.push_disposer(disposer),
        }
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        match self.target {
            Target::Root(provider) => provider.resolve_in(key, self.stack),
            Target::Scope(scope) => scope.resolve_in(key, self.stack),
        }
    }

    fn resolution_chain(&self) -> Vec<&'static str> {
        self.stack.chain()
    }
}
