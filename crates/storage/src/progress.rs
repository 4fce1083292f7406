use std::sync::Arc;

use practice_core::SetId;
use tracing::debug;

use crate::session::SessionStore;

const KEY_PREFIX: &str = "practice_idx:";

/// Per-set problem-index progress persisted through a [`SessionStore`].
///
/// Progress is advisory. A failed or garbled read falls back to the first
/// problem and a failed write is logged and dropped, so a broken store
/// never blocks navigation.
#[derive(Clone)]
pub struct SessionProgressStore {
    store: Arc<dyn SessionStore>,
}

impl SessionProgressStore {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    fn key(set: &SetId) -> String {
        format!("{KEY_PREFIX}{}", set.as_str())
    }

    /// Last saved problem index for `set`, or zero when nothing usable is
    /// stored. Callers still have to bounds-check against the loaded set.
    pub async fn load(&self, set: &SetId) -> usize {
        match self.store.get(&Self::key(set)).await {
            Ok(Some(raw)) => match raw.trim().parse::<usize>() {
                Ok(practice_idx) => practice_idx,
                Err(_) => {
                    debug!(target: "progress", %set, value = %raw, "Ignoring unparsable saved progress");
                    0
                }
            },
            Ok(None) => 0,
            Err(e) => {
                debug!(target: "progress", %set, error = %e, "Progress read failed; starting at zero");
                0
            }
        }
    }

    /// Persists the current problem index for `set`. Failures are logged
    /// and otherwise ignored.
    pub async fn save(&self, set: &SetId, practice_idx: usize) {
        if let Err(e) = self.store.set(&Self::key(set), &practice_idx.to_string()).await {
            debug!(target: "progress", %set, practice_idx, error = %e, "Progress write failed; continuing");
        }
    }
}
