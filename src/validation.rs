//! Opt-in validation of a service collection's dependency graph.
//!
//! Only implementation registrations carry a dependency manifest, so factory
//! dependencies are invisible here and still fail at resolution time.
//!
//! # Validation Rules
//!
//! - **Missing Dependencies**: Error - a manifest names an unregistered service
//! - **Circular Dependencies**: Error - manifests form a cycle
//! - **Singleton → Scoped**: Error - the singleton would fail with `ScopedFromRoot`
//! - **Singleton → Transient**: Warning - the singleton keeps one transient forever

use std::collections::HashSet;

use thiserror::Error;

use crate::collection::ServiceCollection;
use crate::key::Key;
use crate::lifetime::Lifetime;

/// A problem that makes some resolution fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Service '{service}' depends on unregistered service '{dependency}'")]
    MissingDependency {
        service: &'static str,
        dependency: &'static str,
    },

    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<&'static str> },

    #[error("Singleton service '{singleton}' cannot depend on scoped service '{scoped}'")]
    SingletonDependsOnScoped {
        singleton: &'static str,
        scoped: &'static str,
    },
}

/// A configuration that works but is probably not what was meant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationWarning {
    #[error("Singleton '{singleton}' depends on transient '{transient}' - will always get same instance")]
    SingletonDependsOnTransient {
        singleton: &'static str,
        transient: &'static str,
    },
}

/// Result of [`ServiceCollection::validate`].
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Returns true if validation passed without errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if there are warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Formats errors and warnings for display.
    pub fn format_issues(&self) -> String {
        let mut output = String::new();

        if !self.errors.is_empty() {
            output.push_str("Validation Errors:\n");
            for error in &self.errors {
                output.push_str(&format!("  - {}\n", error));
            }
        }

        if !self.warnings.is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str("Validation Warnings:\n");
            for warning in &self.warnings {
                output.push_str(&format!("  - {}\n", warning));
            }
        }

        output
    }
}

impl ServiceCollection {
    /// Scans implementation manifests for problems resolution would hit.
    ///
    /// Never called implicitly; [`build`](ServiceCollection::build) accepts
    /// any collection.
    ///
    /// # Examples
    ///
    /// ```
    /// use scopewire::{Injectable, ServiceCollection, ValidationError};
    /// use std::sync::Arc;
    ///
    /// struct Session;
    /// struct Cache { _session: Arc<Session> }
    /// impl Injectable for Cache {
    ///     type Deps = (Arc<Session>,);
    ///     fn inject((session,): Self::Deps) -> Self { Cache { _session: session } }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_scoped_factory::<Session, _>(|_| Ok(Session));
    /// services.add_singleton_impl::<Cache>();
    ///
    /// let result = services.validate();
    /// assert!(!result.is_valid());
    /// assert!(matches!(result.errors[0], ValidationError::SingletonDependsOnScoped { .. }));
    /// ```
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        for (key, reg) in self.registry.iter() {
            for dep in reg.source.dependencies() {
                let Some(dep_reg) = self.registry.get(dep) else {
                    result.errors.push(ValidationError::MissingDependency {
                        service: key.display_name(),
                        dependency: dep.display_name(),
                    });
                    continue;
                };

                match (reg.lifetime, dep_reg.lifetime) {
                    (Lifetime::Singleton, Lifetime::Scoped) => {
                        result.errors.push(ValidationError::SingletonDependsOnScoped {
                            singleton: key.display_name(),
                            scoped: dep.display_name(),
                        })
                    }
                    (Lifetime::Singleton, Lifetime::Transient) => {
                        result.warnings.push(ValidationWarning::SingletonDependsOnTransient {
                            singleton: key.display_name(),
                            transient: dep.display_name(),
                        })
                    }
                    _ => {}
                }
            }
        }

        for cycle in self.detect_cycles() {
            result.errors.push(ValidationError::CircularDependency { cycle });
        }

        if !result.is_valid() {
            tracing::debug!(
                errors = result.errors.len(),
                warnings = result.warnings.len(),
                "service collection failed validation"
            );
        }
        result
    }

    /// Detects manifest cycles using DFS, in registration order.
    fn detect_cycles(&self) -> Vec<Vec<&'static str>> {
        let mut visited = HashSet::new();
        let mut path = Vec::new();
        let mut cycles = Vec::new();

        for (key, _) in self.registry.iter() {
            if !visited.contains(key) {
                self.dfs_cycles(*key, &mut visited, &mut path, &mut cycles);
            }
        }

        cycles
    }

    fn dfs_cycles(
        &self,
        current: Key,
        visited: &mut HashSet<Key>,
        path: &mut Vec<Key>,
        cycles: &mut Vec<Vec<&'static str>>,
    ) {
        if let Some(cycle_start) = path.iter().position(|k| *k == current) {
            let cycle = path[cycle_start..]
                .iter()
                .chain(std::iter::once(&current))
                .map(Key::display_name)
                .collect();
            cycles.push(cycle);
            return;
        }

        if !visited.insert(current) {
            return;
        }

        path.push(current);
        if let Some(reg) = self.registry.get(&current) {
            for dep in reg.source.dependencies() {
                self.dfs_cycles(*dep, visited, path, cycles);
            }
        }
        path.pop();
    }
}
