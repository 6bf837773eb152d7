//! Service registration types.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::descriptors::SourceKind;
use crate::error::DiResult;
use crate::internal::Disposer;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::provider::ResolverContext;

// Type-erased cell; always holds an `Arc<T>` for the registered `T`.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type Ctor = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;
pub(crate) type Decorator =
    Arc<dyn for<'a> Fn(&ResolverContext<'a>, AnyArc) -> DiResult<AnyArc> + Send + Sync>;
pub(crate) type TeardownHook = Arc<dyn Fn(&AnyArc) -> Option<Disposer> + Send + Sync>;

/// Where instances of a registration come from.
pub(crate) enum Source {
    /// Constructor injection with a static dependency manifest.
    Implementation {
        type_name: &'static str,
        dependencies: Vec<Key>,
        ctor: Ctor,
    },
    Factory(Ctor),
    Instance(AnyArc),
}

impl Source {
    pub(crate) fn kind(&self) -> SourceKind {
        match self {
            Source::Implementation { .. } => SourceKind::Implementation,
            Source::Factory(_) => SourceKind::Factory,
            Source::Instance(_) => SourceKind::Instance,
        }
    }

    pub(crate) fn dependencies(&self) -> &[Key] {
        match self {
            Source::Implementation { dependencies, .. } => dependencies,
            _ => &[],
        }
    }
}

/// Service registration with lifetime and construction source
pub(crate) struct Registration {
    pub(crate) lifetime: Lifetime,
    pub(crate) source: Source,
    /// Applied in reverse registration order, so the first one ends up outermost.
    pub(crate) decorators: Vec<Decorator>,
    /// Present when the service exposes a recognised teardown capability.
    pub(crate) teardown: Option<TeardownHook>,
    /// Singleton cache cell; the first completed construction is stored.
    pub(crate) singleton_cell: Option<Mutex<Option<AnyArc>>>,
}

impl Registration {
    pub(crate) fn new(key: &Key, lifetime: Lifetime, source: Source, teardown: Option<TeardownHook>) -> Self {
        let lifetime = match (&source, lifetime) {
            (Source::Instance(_), Lifetime::Singleton) => Lifetime::Singleton,
            (Source::Instance(_), declared) => {
                tracing::debug!(
                    service = key.display_name(),
                    declared = %declared,
                    "pre-built instance registered; treating as singleton"
                );
                Lifetime::Singleton
            }
            (_, declared) => declared,
        };

        let singleton_cell = match lifetime {
            Lifetime::Singleton => Some(Mutex::new(None)),
            _ => None,
        };

        Self {
            lifetime,
            source,
            decorators: Vec::new(),
            teardown,
            singleton_cell,
        }
    }

    /// Builds a fresh instance (no caching) and applies decorators.
    pub(crate) fn construct(&self, ctx: &ResolverContext<'_>) -> DiResult<AnyArc> {
        let mut instance = match &self.source {
            Source::Implementation { ctor, .. } | Source::Factory(ctor) => ctor(ctx)?,
            Source::Instance(value) => value.clone(),
        };

        for decorator in self.decorators.iter().rev() {
            instance = decorator(ctx, instance)?;
        }

        Ok(instance)
    }

    /// Teardown hook bound to `instance`, if this service is disposal-capable.
    pub(crate) fn disposer_for(&self, instance: &AnyArc) -> Option<Disposer> {
        self.teardown.as_ref().and_then(|hook| hook(instance))
    }
}

/// Service registry holding all registrations in insertion order.
#[derive(Default)]
pub(crate) struct Registry {
    entries: Vec<(Key, Registration)>,
    index: HashMap<Key, usize>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts a registration; an existing key is overwritten in place.
    ///
    /// Returns `true` when a previous registration was replaced.
    pub(crate) fn insert(&mut self, key: Key, registration: Registration) -> bool {
        match self.index.get(&key) {
            Some(&pos) => {
                self.entries[pos] = (key, registration);
                true
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((key, registration));
                false
            }
        }
    }

    #[inline]
    pub(crate) fn get(&self, key: &Key) -> Option<&Registration> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub(crate) fn get_mut(&mut self, key: &Key) -> Option<&mut Registration> {
        match self.index.get(key) {
            Some(&pos) => Some(&mut self.entries[pos].1),
            None => None,
        }
    }

    #[inline]
    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterator over all key-registration pairs, in insertion order
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &Registration)> {
        self.entries.iter().map(|(k, r)| (k, r))
    }
}
