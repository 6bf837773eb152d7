//! Construction sources for registrations.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::descriptors::SourceKind;
use crate::error::DiResult;
use crate::injectable::{Dependencies, Injectable};
use crate::internal::Disposer;
use crate::provider::ResolverContext;
use crate::registration::{AnyArc, Ctor, Source, TeardownHook};
use crate::traits::{Close, Dispose, TeardownResult};

/// How instances of `T` are produced: exactly one of an implementation,
/// a factory or a pre-built instance.
///
/// `T` may be a concrete type or a trait object (`dyn Trait`).
///
/// # Examples
///
/// ```
/// use scopewire::{Injectable, Lifetime, ServiceCollection, ServiceSource, Resolver};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
/// impl Injectable for English {
///     type Deps = ();
///     fn inject(_: ()) -> Self { English }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.register::<dyn Greeter>(
///     Lifetime::Transient,
///     ServiceSource::implementation_as::<English>(|e| e),
/// );
///
/// let provider = services.build();
/// assert_eq!(provider.get_required::<dyn Greeter>().greet(), "hello");
/// ```
pub struct ServiceSource<T: ?Sized> {
    pub(crate) source: Source,
    pub(crate) teardown: Option<TeardownHook>,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> ServiceSource<T> {
    fn new(source: Source) -> Self {
        Self {
            source,
            teardown: None,
            _marker: PhantomData,
        }
    }

    /// Built by `factory` on each construction.
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        let ctor: Ctor = Arc::new(move |ctx: &ResolverContext<'_>| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(ctx)?))
        });
        Self::new(Source::Factory(ctor))
    }

    /// A pre-built value. Always shared as a singleton.
    pub fn instance(value: Arc<T>) -> Self {
        Self::new(Source::Instance(Arc::new(value)))
    }

    /// Built by the container from `I`'s dependency manifest and exposed as
    /// `T` through `cast` (usually `|i| i`, an unsizing coercion).
    pub fn implementation_as<I: Injectable>(cast: fn(Arc<I>) -> Arc<T>) -> Self {
        let ctor: Ctor = Arc::new(move |ctx: &ResolverContext<'_>| -> DiResult<AnyArc> {
            let deps = <I::Deps as Dependencies>::resolve_all(ctx)?;
            Ok(Arc::new(cast(Arc::new(I::inject(deps)))))
        });
        Self::new(Source::Implementation {
            type_name: type_name::<I>(),
            dependencies: I::dependency_keys(),
            ctor,
        })
    }

    /// Marks the service as disposal-capable through [`Dispose`].
    pub fn disposable(mut self) -> Self
    where
        T: Dispose,
    {
        self.teardown = Some(teardown_hook::<T>(<T as Dispose>::dispose));
        self
    }

    /// Marks the service as disposal-capable through [`Close`].
    pub fn closeable(mut self) -> Self
    where
        T: Close,
    {
        self.teardown = Some(teardown_hook::<T>(<T as Close>::close));
        self
    }

    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }
}

impl<I: Injectable> ServiceSource<I> {
    /// Built by the container from `I`'s dependency manifest.
    pub fn implementation() -> Self {
        Self::implementation_as::<I>(|instance| instance)
    }
}

impl<T: ?Sized> fmt::Debug for ServiceSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceSource")
            .field("service", &type_name::<T>())
            .field("kind", &self.source.kind())
            .field("disposable", &self.teardown.is_some())
            .finish()
    }
}

fn teardown_hook<T>(run: fn(&T) -> TeardownResult) -> TeardownHook
where
    T: ?Sized + Send + Sync + 'static,
{
    let service = type_name::<T>();
    Arc::new(move |instance: &AnyArc| {
        let instance = instance.downcast_ref::<Arc<T>>()?.clone();
        Some(Disposer::new(service, move || run(&instance)))
    })
}
