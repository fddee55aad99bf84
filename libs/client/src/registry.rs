use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::pending::PendingCall;

/// In-flight calls by correlation key
///
/// Shared by caller threads (register/remove) and the link tasks (lookup).
#[derive(Debug, Default)]
pub struct Registry {
    calls: Mutex<HashMap<String, Arc<PendingCall>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and store a call under `key`
    ///
    /// Fails if `key` is already present.
    pub fn register(&self, key: &str) -> Result<Arc<PendingCall>> {
        let mut calls = self.calls.lock();
        if calls.contains_key(key) {
            return Err(Error::DuplicateKey(key.to_string()));
        }

        let call = Arc::new(PendingCall::new(key));
        calls.insert(key.to_string(), Arc::clone(&call));
        tracing::trace!(key, pending = calls.len(), "registered pending call");
        Ok(call)
    }

    pub fn lookup(&self, key: &str) -> Option<Arc<PendingCall>> {
        self.calls.lock().get(key).cloned()
    }

    /// Remove `key`; removing an absent key is a no-op
    pub fn remove(&self, key: &str) -> Option<Arc<PendingCall>> {
        self.calls.lock().remove(key)
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }
}
