use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Cancellation marks for in-flight operations, keyed by operation key
/// (usually the content id). Clones share the same marks, so a handle can be
/// given to whatever delivers the user's "cancel".
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<Mutex<HashSet<String>>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        CancelHandle::default()
    }

    fn marks(&self) -> MutexGuard<'_, HashSet<String>> {
        // A panic while holding the lock cannot leave the set half-updated.
        self.cancelled.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Request cancellation of the operation running under `key`
    pub fn cancel(&self, key: &str) {
        self.marks().insert(key.to_string());
    }

    pub fn is_cancelled(&self, key: &str) -> bool {
        self.marks().contains(key)
    }

    /// Start an operation: drop any stale mark left for `key`
    pub fn begin(&self, key: &str) {
        self.marks().remove(key);
    }

    /// Check whether `key` was cancelled since `begin`, and clear the mark
    pub fn take(&self, key: &str) -> bool {
        self.marks().remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_marks() {
        let handle = CancelHandle::new();
        let remote_side = handle.clone();
        handle.begin("5");
        remote_side.cancel("5");
        assert!(handle.is_cancelled("5"));
        assert!(handle.take("5"));
        assert!(!handle.take("5"));
    }

    #[test]
    fn begin_clears_stale_mark() {
        let handle = CancelHandle::new();
        handle.cancel("5");
        handle.begin("5");
        assert!(!handle.is_cancelled("5"));
    }
}
