//! Diagnostic observers for resolution events.
//!
//! Observers are registered on the [`ServiceCollection`](crate::ServiceCollection)
//! and called synchronously around every resolution. With no observers
//! registered the hooks cost a single branch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{DiError, DiResult};
use crate::key::Key;

/// Observer trait for dependency injection resolution events.
///
/// Calls happen on the resolving thread, nested resolutions included, so
/// keep implementations cheap.
///
/// # Examples
///
/// ```
/// use scopewire::{DiObserver, DiError, Key, ServiceCollection, Resolver};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<String>>);
///
/// impl DiObserver for Recorder {
///     fn resolving(&self, key: &Key) {
///         self.0.lock().unwrap().push(format!("-> {}", key.display_name()));
///     }
///
///     fn resolved(&self, key: &Key, _duration: Duration) {
///         self.0.lock().unwrap().push(format!("<- {}", key.display_name()));
///     }
///
///     fn failed(&self, key: &Key, error: &DiError) {
///         self.0.lock().unwrap().push(format!("!! {}: {}", key.display_name(), error));
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let mut services = ServiceCollection::new();
/// services.add_singleton(7u8);
/// services.add_observer(recorder.clone());
///
/// let provider = services.build();
/// provider.get_required::<u8>();
/// assert!(provider.get::<u16>().is_err());
///
/// let events = recorder.0.lock().unwrap();
/// assert_eq!(events[0], "-> u8");
/// assert_eq!(events[1], "<- u8");
/// assert!(events[3].starts_with("!! u16"));
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a service is looked up or constructed.
    fn resolving(&self, key: &Key);

    /// Called after a service resolved successfully.
    ///
    /// `duration` covers the whole resolution, dependencies included.
    fn resolved(&self, key: &Key, duration: Duration);

    /// Called when resolution of `key` failed.
    fn failed(&self, key: &Key, error: &DiError) {
        let _ = (key, error);
    }
}

#[derive(Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self { observers: Vec::new() }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    /// Runs `resolve`, reporting the outcome to every observer.
    #[inline]
    pub(crate) fn observe<T>(&self, key: &Key, resolve: impl FnOnce() -> DiResult<T>) -> DiResult<T> {
        if !self.has_observers() {
            return resolve();
        }

        let start = Instant::now();
        for observer in &self.observers {
            observer.resolving(key);
        }

        let result = resolve();

        match &result {
            Ok(_) => {
                let duration = start.elapsed();
                for observer in &self.observers {
                    observer.resolved(key, duration);
                }
            }
            Err(err) => {
                for observer in &self.observers {
                    observer.failed(key, err);
                }
            }
        }
        result
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// Successful resolutions are emitted at `TRACE`, failures at `DEBUG`
/// (the error itself still reaches the caller).
///
/// # Examples
///
/// ```
/// use scopewire::{ServiceCollection, LoggingObserver};
/// use std::sync::Arc;
///
/// let mut services = ServiceCollection::new();
/// services.add_observer(Arc::new(LoggingObserver::new()));
/// let provider = services.build();
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self {
            prefix: "scopewire".to_string(),
        }
    }

    /// Tags every event with `prefix` (e.g. an application or request name).
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, key: &Key) {
        tracing::trace!(prefix = %self.prefix, service = key.display_name(), "resolving");
    }

    fn resolved(&self, key: &Key, duration: Duration) {
        tracing::trace!(
            prefix = %self.prefix,
            service = key.display_name(),
            elapsed_us = duration.as_micros() as u64,
            "resolved"
        );
    }

    fn failed(&self, key: &Key, error: &DiError) {
        tracing::debug!(prefix = %self.prefix, service = key.display_name(), %error, "resolution failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Counter {
        events: Mutex<Vec<&'static str>>,
    }

    impl DiObserver for Counter {
        fn resolving(&self, _: &Key) {
            self.events.lock().unwrap().push("resolving");
        }
        fn resolved(&self, _: &Key, _: Duration) {
            self.events.lock().unwrap().push("resolved");
        }
        fn failed(&self, _: &Key, _: &DiError) {
            self.events.lock().unwrap().push("failed");
        }
    }

    #[test]
    fn observe_reports_success_and_failure() {
        let counter = Arc::new(Counter::default());
        let mut observers = Observers::new();
        observers.add(counter.clone());

        let key = Key::of::<u32>();
        assert_eq!(observers.observe(&key, || Ok(1)).unwrap(), 1);
        let err: DiResult<()> = observers.observe(&key, || Err(DiError::NotFound("u32")));
        assert!(err.is_err());

        assert_eq!(
            *counter.events.lock().unwrap(),
            vec!["resolving", "resolved", "resolving", "failed"]
        );
    }

    #[test]
    fn no_observers_is_passthrough() {
        let observers = Observers::default();
        assert!(!observers.has_observers());
        assert_eq!(observers.observe(&Key::of::<u8>(), || Ok(5u8)).unwrap(), 5);
    }
}
