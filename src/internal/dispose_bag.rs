//! Internal disposal bag for managing cleanup hooks.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::traits::TeardownResult;

/// One recorded teardown, run at most once.
pub(crate) struct Disposer {
    pub(crate) service: &'static str,
    run: Box<dyn FnOnce() -> TeardownResult + Send>,
}

impl Disposer {
    pub(crate) fn new<F>(service: &'static str, run: F) -> Self
    where
        F: FnOnce() -> TeardownResult + Send + 'static,
    {
        Self { service, run: Box::new(run) }
    }
}

/// Container for disposal hooks, executed in creation (FIFO) order.
#[derive(Default)]
pub(crate) struct DisposeBag {
    entries: Vec<Disposer>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, disposer: Disposer) {
        self.entries.push(disposer);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empties the bag, handing the hooks to the caller.
    pub(crate) fn take(&mut self) -> DisposeBag {
        std::mem::take(self)
    }

    /// Runs every hook once, in creation order.
    ///
    /// A hook that errors or panics is logged and recorded; the remaining
    /// hooks still run.
    pub(crate) fn run_all(self) -> DisposalReport {
        let mut report = DisposalReport::default();

        for Disposer { service, run } in self.entries {
            report.attempted += 1;
            let outcome = match catch_unwind(AssertUnwindSafe(run)) {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(err.to_string()),
                Err(payload) => Some(panic_message(payload.as_ref())),
            };

            match outcome {
                None => tracing::trace!(service, "disposed"),
                Some(message) => {
                    tracing::warn!(service, error = %message, "teardown failed; continuing");
                    report.failures.push(TeardownFailure { service, message });
                }
            }
        }

        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        format!("panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {}", msg)
    } else {
        "panicked".to_string()
    }
}

/// Outcome of tearing down a scope (or the provider's singletons).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DisposalReport {
    /// Number of teardown hooks invoked.
    pub attempted: usize,
    /// Teardowns that returned an error or panicked.
    pub failures: Vec<TeardownFailure>,
}

impl DisposalReport {
    /// True when every teardown succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A single failed teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownFailure {
    /// Type name of the service whose teardown failed.
    pub service: &'static str,
    pub message: String,
}
