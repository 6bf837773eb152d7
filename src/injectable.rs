//! Constructor injection through static dependency manifests.
//!
//! An [`Injectable`] type names its dependencies as a tuple of `Arc<_>`
//! handles. The container resolves them left to right through the active
//! resolver and hands the tuple to [`Injectable::inject`]. Because the
//! manifest is a type, a dependency whose type cannot be named is a compile
//! error rather than a resolution failure.

use std::sync::Arc;

use crate::error::DiResult;
use crate::key::Key;
use crate::provider::ResolverContext;
use crate::traits::Resolver;

/// A single constructor parameter that the container can supply.
pub trait Dependency: Sized + Send + Sync + 'static {
    /// Key this parameter is resolved under.
    fn key() -> Key;

    fn resolve(resolver: &ResolverContext<'_>) -> DiResult<Self>;
}

impl<T: ?Sized + Send + Sync + 'static> Dependency for Arc<T> {
    fn key() -> Key {
        Key::of::<T>()
    }

    fn resolve(resolver: &ResolverContext<'_>) -> DiResult<Self> {
        resolver.get::<T>()
    }
}

/// Ordered list of constructor parameters.
///
/// Implemented for `()` and for tuples of up to eight [`Dependency`] values.
pub trait Dependencies: Sized + Send + Sync + 'static {
    /// Keys in declaration order.
    fn keys() -> Vec<Key>;

    /// Resolves every parameter in declaration order.
    fn resolve_all(resolver: &ResolverContext<'_>) -> DiResult<Self>;
}

impl Dependencies for () {
    fn keys() -> Vec<Key> {
        Vec::new()
    }

    fn resolve_all(_: &ResolverContext<'_>) -> DiResult<Self> {
        Ok(())
    }
}

macro_rules! impl_dependencies {
    ($($dep:ident),+) => {
        impl<$($dep: Dependency),+> Dependencies for ($($dep,)+) {
            fn keys() -> Vec<Key> {
                vec![$($dep::key()),+]
            }

            fn resolve_all(resolver: &ResolverContext<'_>) -> DiResult<Self> {
                // tuple fields evaluate left to right
                Ok(($($dep::resolve(resolver)?,)+))
            }
        }
    };
}

impl_dependencies!(A);
impl_dependencies!(A, B);
impl_dependencies!(A, B, C);
impl_dependencies!(A, B, C, D);
impl_dependencies!(A, B, C, D, E);
impl_dependencies!(A, B, C, D, E, F);
impl_dependencies!(A, B, C, D, E, F, G);
impl_dependencies!(A, B, C, D, E, F, G, H);

/// A concrete type the container can construct itself.
///
/// # Examples
///
/// ```
/// use scopewire::{Injectable, ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Clock;
/// impl Injectable for Clock {
///     type Deps = ();
///     fn inject(_: ()) -> Self { Clock }
/// }
///
/// struct Repository { clock: Arc<Clock> }
/// impl Injectable for Repository {
///     type Deps = (Arc<Clock>,);
///     fn inject((clock,): Self::Deps) -> Self { Repository { clock } }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton_impl::<Clock>();
/// services.add_scoped_impl::<Repository>();
///
/// let provider = services.build();
/// let scope = provider.create_scope();
/// let repo = scope.get_required::<Repository>();
/// assert!(Arc::ptr_eq(&repo.clock, &provider.get_required::<Clock>()));
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Constructor parameters, in order.
    type Deps: Dependencies;

    fn inject(deps: Self::Deps) -> Self;

    /// The dependency manifest as keys.
    fn dependency_keys() -> Vec<Key> {
        <Self::Deps as Dependencies>::keys()
    }
}
