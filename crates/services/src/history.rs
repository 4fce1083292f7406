use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use practice_core::{NavigationState, SetId};
use serde::Serialize;

/// Browser-history seam. The navigator mirrors navigation state into the
/// host's history stack through this trait; in a browser that is
/// `pushState`/`replaceState`, elsewhere it is whatever the host records.
pub trait HistorySink: Send + Sync {
    /// Add a new entry for `state` on top of the stack.
    fn push(&self, state: &NavigationState);
    /// Rewrite the current entry to `state` without growing the stack.
    fn replace(&self, state: &NavigationState);
}

/// One history entry: the query string plus the small JSON state object
/// mirrored alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub query: String,
    pub entry: String,
}

impl HistoryRecord {
    fn of(state: &NavigationState) -> Self {
        Self {
            query: state.to_query(),
            entry: encode_entry(state),
        }
    }
}

/// Encodes the state object a history entry carries: `{"set":"<id>"}`
/// inside a set, `{}` at the menu.
#[must_use]
pub fn encode_entry(state: &NavigationState) -> String {
    #[derive(Serialize)]
    struct Entry<'a> {
        #[serde(skip_serializing_if = "Option::is_none")]
        set: Option<&'a str>,
    }

    serde_json::to_string(&Entry {
        set: state.set().map(SetId::as_str),
    })
    .unwrap_or_else(|_| "{}".to_owned())
}

/// History stack held in memory, for tests and non-browser hosts.
///
/// Models the browser's back/forward cursor: stepping back leaves the
/// entries ahead in place, and pushing from there drops them, exactly as
/// a real history stack would.
#[derive(Clone, Default)]
pub struct InMemoryHistory {
    stack: Arc<Mutex<Stack>>,
}

#[derive(Default)]
struct Stack {
    records: Vec<HistoryRecord>,
    cursor: usize,
}

impl InMemoryHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stack, oldest entry first.
    #[must_use]
    pub fn records(&self) -> Vec<HistoryRecord> {
        self.lock().records.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Steps back one entry and returns its query, ready to hand to a
    /// popstate handler. `None` when already at the oldest entry.
    pub fn back(&self) -> Option<String> {
        let mut stack = self.lock();
        if stack.cursor == 0 {
            return None;
        }
        stack.cursor -= 1;
        Some(stack.records[stack.cursor].query.clone())
    }

    /// Steps forward one entry and returns its query. `None` when already
    /// at the newest entry.
    pub fn forward(&self) -> Option<String> {
        let mut stack = self.lock();
        if stack.cursor + 1 >= stack.records.len() {
            return None;
        }
        stack.cursor += 1;
        Some(stack.records[stack.cursor].query.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Stack> {
        self.stack.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HistorySink for InMemoryHistory {
    fn push(&self, state: &NavigationState) {
        let mut stack = self.lock();
        let keep = if stack.records.is_empty() {
            0
        } else {
            stack.cursor + 1
        };
        stack.records.truncate(keep);
        stack.records.push(HistoryRecord::of(state));
        let top = stack.records.len() - 1;
        stack.cursor = top;
    }

    fn replace(&self, state: &NavigationState) {
        let mut stack = self.lock();
        let record = HistoryRecord::of(state);
        let cursor = stack.cursor;
        match stack.records.get_mut(cursor) {
            Some(slot) => *slot = record,
            None => {
                stack.records.push(record);
                stack.cursor = 0;
            }
        }
    }
}
