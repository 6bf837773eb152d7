//! Disposal traits for resource cleanup.
//!
//! The container recognises exactly two teardown capabilities: [`Dispose`]
//! and [`Close`]. A registration states which one applies to its service;
//! there is no runtime probing of arbitrary methods.

/// Error returned by a failing teardown.
pub type TeardownError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a single teardown call.
pub type TeardownResult = Result<(), TeardownError>;

/// Trait for synchronous resource disposal.
///
/// Implement this for services that need structured teardown (flushing
/// buffers, returning connections). Scoped disposables are torn down in
/// creation order when their scope is disposed.
///
/// # Examples
///
/// ```
/// use scopewire::{Dispose, TeardownResult, ServiceCollection, Resolver};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// #[derive(Default)]
/// struct UnitOfWork {
///     committed: AtomicBool,
/// }
///
/// impl Dispose for UnitOfWork {
///     fn dispose(&self) -> TeardownResult {
///         self.committed.store(true, Ordering::SeqCst);
///         Ok(())
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_scoped_disposable_factory::<UnitOfWork, _>(|_| Ok(UnitOfWork::default()));
///
/// let provider = services.build();
/// let scope = provider.create_scope();
/// let uow = scope.get_required::<UnitOfWork>();
/// scope.dispose().unwrap();
/// assert!(uow.committed.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self) -> TeardownResult;
}

/// Alternate teardown capability for services whose natural verb is `close`
/// (files, sockets, sessions).
pub trait Close: Send + Sync + 'static {
    /// Release the underlying resource.
    fn close(&self) -> TeardownResult;
}
