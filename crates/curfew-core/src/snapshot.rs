//! Shared configuration snapshot

use curfew_config::PolicyConfiguration;
use std::sync::{Arc, PoisonError, RwLock};

/// Handle to the active configuration snapshot.
///
/// Readers clone the inner `Arc` and always see a whole snapshot; writers
/// replace it wholesale. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct PolicyHandle {
    slot: Arc<RwLock<Option<Arc<PolicyConfiguration>>>>,
}

impl PolicyHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, or `None` if nothing has been loaded yet
    pub fn snapshot(&self) -> Option<Arc<PolicyConfiguration>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a new snapshot, returning the previous one
    pub fn replace(&self, config: PolicyConfiguration) -> Option<Arc<PolicyConfiguration>> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.replace(Arc::new(config))
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_some()
    }
}
