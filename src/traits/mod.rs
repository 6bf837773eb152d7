//! Core traits for the dependency injection container.

mod dispose;
mod resolver;

pub use dispose::{Close, Dispose, TeardownError, TeardownResult};
pub use resolver::{Resolver, ResolverCore};
