//! Circular dependency detection infrastructure.
//!
//! Each top-level `resolve` call owns one [`ResolutionStack`]; nested
//! resolutions borrow it through the `ResolverContext`, so concurrent call
//! chains never observe each other's frames.

use parking_lot::Mutex;

use crate::error::{DiError, DiResult};
use crate::key::Key;

pub(crate) const MAX_DEPTH: usize = 1024;

/// Ordered set of keys currently under construction on one call chain.
#[derive(Default)]
pub(crate) struct ResolutionStack {
    frames: Mutex<Vec<Key>>,
}

impl ResolutionStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Pushes `key`, failing if it is already being constructed.
    ///
    /// The returned guard pops the frame when dropped, on every exit path.
    pub(crate) fn enter(&self, key: &Key) -> DiResult<StackGuard<'_>> {
        let mut frames = self.frames.lock();

        // Circular detection BEFORE pushing the new key
        if frames.iter().any(|k| k == key) {
            let mut path: Vec<&'static str> = frames.iter().map(Key::display_name).collect();
            path.push(key.display_name());
            return Err(DiError::Circular(path));
        }

        if frames.len() >= MAX_DEPTH {
            return Err(DiError::DepthExceeded(frames.len()));
        }

        frames.push(*key);
        Ok(StackGuard { stack: self, key: *key })
    }

    pub(crate) fn chain(&self) -> Vec<&'static str> {
        self.frames.lock().iter().map(Key::display_name).collect()
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.frames.lock().len()
    }
}

/// Pops its frame from the owning stack on drop.
pub(crate) struct StackGuard<'a> {
    stack: &'a ResolutionStack,
    key: Key,
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        let last = self.stack.frames.lock().pop();
        debug_assert_eq!(last, Some(self.key));
    }
}
