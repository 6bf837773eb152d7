//! # scopewire
//!
//! An object-graph construction engine: register services with a sharing
//! policy, then let the container build them on demand, resolving each
//! declared dependency recursively.
//!
//! ## Features
//!
//! - **Three lifetimes**: Singleton (once per provider), Scoped (once per
//!   scope), Transient (every request)
//! - **Constructor injection**: [`Injectable`] types declare their
//!   dependencies as a tuple of `Arc<_>` handles
//! - **Trait contracts**: register `dyn Trait` keys backed by any implementation
//! - **Circular dependency detection** with the full resolution path
//! - **Scopes with disposal**: [`Dispose`]/[`Close`] teardowns run in creation
//!   order when the scope ends
//!
//! ## Quick Start
//!
//! ```rust
//! use scopewire::{Injectable, ServiceCollection, Resolver};
//! use std::sync::Arc;
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! struct SystemClock;
//! impl Clock for SystemClock {
//!     fn now(&self) -> u64 { 42 }
//! }
//! impl Injectable for SystemClock {
//!     type Deps = ();
//!     fn inject(_: ()) -> Self { SystemClock }
//! }
//!
//! struct Repository {
//!     clock: Arc<dyn Clock>,
//! }
//! impl Injectable for Repository {
//!     type Deps = (Arc<dyn Clock>,);
//!     fn inject((clock,): Self::Deps) -> Self { Repository { clock } }
//! }
//!
//! struct Controller {
//!     repo: Arc<Repository>,
//! }
//! impl Injectable for Controller {
//!     type Deps = (Arc<Repository>,);
//!     fn inject((repo,): Self::Deps) -> Self { Controller { repo } }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton_impl_as::<dyn Clock, SystemClock>(|c| c);
//! services.add_scoped_impl::<Repository>();
//! services.add_transient_impl::<Controller>();
//!
//! let provider = services.build();
//! let scope = provider.create_scope();
//!
//! let first = scope.get_required::<Controller>();
//! let second = scope.get_required::<Controller>();
//! assert!(!Arc::ptr_eq(&first, &second));
//! assert!(Arc::ptr_eq(&first.repo, &second.repo));
//! assert_eq!(first.repo.clock.now(), 42);
//!
//! scope.dispose().unwrap();
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: Created once and shared across the entire provider. Always
//!   built from the root, so it cannot depend on scoped services.
//! - **Scoped**: Created once per scope. Resolving one from the provider fails
//!   with [`DiError::ScopedFromRoot`].
//! - **Transient**: Created fresh on every resolution.
//!
//! ## Circular Dependencies
//!
//! ```rust
//! use scopewire::{DiError, ServiceCollection, Resolver};
//!
//! struct A;
//! struct B;
//!
//! let mut services = ServiceCollection::new();
//! services.add_transient_factory::<A, _>(|r| { r.get::<B>()?; Ok(A) });
//! services.add_transient_factory::<B, _>(|r| { r.get::<A>()?; Ok(B) });
//!
//! let provider = services.build();
//! match provider.get::<A>() {
//!     Err(DiError::Circular(path)) => assert_eq!(path.len(), 3),
//!     _ => unreachable!(),
//! }
//! ```

// Module declarations
pub mod collection;
pub mod descriptors;
pub mod error;
pub mod injectable;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod provider;
pub mod traits;
pub mod validation;

#[cfg(feature = "config")]
pub mod config;

// Internal modules
mod internal;
mod registration;

// Re-export core types
pub use collection::{ServiceCollection, ServiceSource};
pub use descriptors::{ServiceDescriptor, SourceKind};
pub use error::{DiError, DiResult};
pub use injectable::{Dependencies, Dependency, Injectable};
pub use internal::{DisposalReport, TeardownFailure};
pub use key::{key_of, Key};
pub use lifetime::Lifetime;
pub use observer::{DiObserver, LoggingObserver};
pub use provider::{ResolverContext, Scope, ServiceProvider};
pub use registration::AnyArc;
pub use traits::{Close, Dispose, Resolver, ResolverCore, TeardownError, TeardownResult};
pub use validation::{ValidationError, ValidationResult, ValidationWarning};

#[cfg(feature = "config")]
pub use config::{Configuration, ConfigurationBuilder, Options};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_singleton_resolution() {
        let mut sc = ServiceCollection::new();
        sc.add_singleton(42usize);

        let sp = sc.build();
        let a = sp.get_required::<usize>();
        let b = sp.get_required::<usize>();

        assert_eq!(*a, 42);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_transient_resolution() {
        let mut sc = ServiceCollection::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();

        sc.add_transient_factory::<String, _>(move |_| {
            Ok(format!("instance-{}", c.fetch_add(1, Ordering::SeqCst) + 1))
        });

        let sp = sc.build();
        let a = sp.get_required::<String>();
        let b = sp.get_required::<String>();

        assert_eq!(a.as_str(), "instance-1");
        assert_eq!(b.as_str(), "instance-2");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_scoped_from_root_fails_before_construction() {
        let mut sc = ServiceCollection::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        sc.add_scoped_factory::<String, _>(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok("scoped".to_string())
        });

        let sp = sc.build();
        assert_eq!(
            sp.get::<String>().unwrap_err(),
            DiError::ScopedFromRoot("alloc::string::String")
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_trait_resolution() {
        trait TestTrait: Send + Sync {
            fn get_value(&self) -> i32;
        }

        struct TestImpl {
            value: i32,
        }

        impl TestTrait for TestImpl {
            fn get_value(&self) -> i32 {
                self.value
            }
        }

        let mut sc = ServiceCollection::new();
        sc.add_singleton_trait::<dyn TestTrait>(Arc::new(TestImpl { value: 42 }));

        let sp = sc.build();
        assert_eq!(sp.get_required::<dyn TestTrait>().get_value(), 42);
    }

    #[test]
    fn test_try_get_distinguishes_missing_service_from_missing_dependency() {
        struct Outer;
        struct Inner;

        let mut sc = ServiceCollection::new();
        sc.add_transient_factory::<Outer, _>(|r| {
            r.get::<Inner>()?;
            Ok(Outer)
        });
        let sp = sc.build();

        assert!(sp.try_get::<u64>().unwrap().is_none());
        assert!(matches!(sp.try_get::<Outer>(), Err(DiError::NotFound(_))));
    }
}
