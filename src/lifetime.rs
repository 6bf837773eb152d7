//! Service lifetime definitions.

use std::fmt;
use std::str::FromStr;

use crate::error::DiError;

/// Service lifetimes controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use scopewire::{ServiceCollection, Resolver, Lifetime};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { db_url: String }
/// struct RequestModel { id: u32 }
///
/// let mut services = ServiceCollection::new();
///
/// // Singleton: One instance for entire application
/// services.add_singleton(Database {
///     url: "postgres://localhost".to_string()
/// });
///
/// // Scoped: One instance per scope
/// services.add_scoped_factory::<Repository, _>(|r| {
///     let db = r.get::<Database>()?;
///     Ok(Repository { db_url: db.url.clone() })
/// });
///
/// // Transient: New instance every time
/// services.add_transient_factory::<RequestModel, _>(|_| Ok(RequestModel { id: 12345 }));
///
/// let provider = services.build();
///
/// let db1 = provider.get_required::<Database>();
/// let scope1 = provider.create_scope();
/// let db2 = scope1.get_required::<Database>();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// let repo1a = scope1.get_required::<Repository>();
/// let repo1b = scope1.get_required::<Repository>();
/// assert!(Arc::ptr_eq(&repo1a, &repo1b));
///
/// let scope2 = provider.create_scope();
/// let repo2 = scope2.get_required::<Repository>();
/// assert!(!Arc::ptr_eq(&repo1a, &repo2));
///
/// let model1 = scope1.get_required::<RequestModel>();
/// let model2 = scope1.get_required::<RequestModel>();
/// assert!(!Arc::ptr_eq(&model1, &model2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// New instance per resolution, never cached.
    Transient,
    /// Single instance per root provider, shared by every scope.
    Singleton,
    /// Single instance per scope; unavailable from the root provider.
    Scoped,
}

impl Lifetime {
    /// Lower-case tag used in configuration and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Transient => "transient",
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lifetime {
    type Err = DiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transient" => Ok(Lifetime::Transient),
            "singleton" => Ok(Lifetime::Singleton),
            "scoped" => Ok(Lifetime::Scoped),
            _ => Err(DiError::UnknownLifetime(s.to_string())),
        }
    }
}

/// Numeric lifetime codes: 1 transient, 2 singleton, 3 scoped.
impl TryFrom<u8> for Lifetime {
    type Error = DiError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Lifetime::Transient),
            2 => Ok(Lifetime::Singleton),
            3 => Ok(Lifetime::Scoped),
            other => Err(DiError::UnknownLifetime(other.to_string())),
        }
    }
}
