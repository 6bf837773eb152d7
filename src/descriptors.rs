//! Service descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::lifetime::Lifetime;

/// Which construction source a registration uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Built by the container from a dependency manifest.
    Implementation,
    /// Built by a user factory.
    Factory,
    /// Pre-built value supplied at registration.
    Instance,
}

/// Read-only view of one registration.
///
/// Returned by [`ServiceCollection::descriptors`](crate::ServiceCollection::descriptors)
/// in registration order.
///
/// # Examples
///
/// ```rust
/// use scopewire::{ServiceCollection, Lifetime, SourceKind};
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(42u32);
/// services.add_scoped_factory::<String, _>(|_| Ok("scoped".to_string()));
///
/// let descriptors = services.descriptors();
/// assert_eq!(descriptors.len(), 2);
/// assert_eq!(descriptors[0].lifetime, Lifetime::Singleton);
/// assert_eq!(descriptors[0].kind, SourceKind::Instance);
/// assert_eq!(descriptors[1].type_name(), "alloc::string::String");
/// assert!(!descriptors[1].disposable);
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    pub key: Key,
    pub lifetime: Lifetime,
    pub kind: SourceKind,
    /// Concrete type for implementation registrations.
    pub implementation: Option<&'static str>,
    /// Dependency manifest for implementation registrations, in order.
    pub dependencies: Vec<Key>,
    pub disposable: bool,
    pub decorators: usize,
}

impl ServiceDescriptor {
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }
}
