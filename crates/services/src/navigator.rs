use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use practice_core::{CategoryId, DifficultyFilter, NavigationState, ProblemSet, SetId};
use storage::SessionProgressStore;
use tracing::{debug, info, warn};

use crate::dataset::DatasetService;
use crate::discovery::{SetDescriptor, SetDiscovery};
use crate::history::HistorySink;
use crate::selection::SelectionEngine;
use crate::view::ViewSink;

/// What the user is currently looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    SetOpen,
    SingleProblem,
}

/// How a navigation call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// The action ran to completion and the view was updated.
    Completed,
    /// A later action took over while this one was awaiting; its result
    /// was discarded without touching state or view.
    Superseded,
    /// The action was not valid in the current state and did nothing.
    Rejected,
    /// The action failed; a status message was shown instead of a result.
    Failed,
}

// Sequence number for navigation actions. Actions hold the token they were
// issued and re-check it after every await; only the holder of the latest
// token may commit state or render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NavToken(u64);

struct Inner {
    initialized: bool,
    next_token: u64,
    current: NavToken,
    screen: Screen,
    state: NavigationState,
    current_set: Option<Arc<ProblemSet>>,
    descriptors: Vec<SetDescriptor>,
    opened_from_menu: HashSet<SetId>,
}

impl Inner {
    fn issue(&mut self) -> NavToken {
        self.next_token += 1;
        self.current = NavToken(self.next_token);
        self.current
    }
}

/// The facade UI code talks to: open a set, switch problems inside it,
/// pick a random problem, go back to the menu, react to history traversal.
///
/// Every action is tagged with a sequence token when it starts. Awaited
/// loads re-check that token before committing, so when actions overlap
/// the most recently started one always wins and slower, earlier ones are
/// dropped on the floor.
pub struct Navigator {
    dataset: Arc<DatasetService>,
    selection: Arc<SelectionEngine>,
    discovery: Arc<dyn SetDiscovery>,
    progress: SessionProgressStore,
    history: Arc<dyn HistorySink>,
    view: Arc<dyn ViewSink>,
    inner: Mutex<Inner>,
}

impl Navigator {
    #[must_use]
    pub fn new(
        dataset: Arc<DatasetService>,
        selection: Arc<SelectionEngine>,
        discovery: Arc<dyn SetDiscovery>,
        progress: SessionProgressStore,
        history: Arc<dyn HistorySink>,
        view: Arc<dyn ViewSink>,
    ) -> Self {
        Self {
            dataset,
            selection,
            discovery,
            progress,
            history,
            view,
            inner: Mutex::new(Inner {
                initialized: false,
                next_token: 0,
                current: NavToken(0),
                screen: Screen::Menu,
                state: NavigationState::menu(),
                current_set: None,
                descriptors: Vec::new(),
                opened_from_menu: HashSet::new(),
            }),
        }
    }

    /// One-time initialization from the URL the page started on.
    ///
    /// Discovers the available sets, normalizes the history entry for the
    /// starting location, and renders either the menu or the deep-linked
    /// problem. A second call is rejected.
    pub async fn init(&self, query: &str) -> NavOutcome {
        let token = {
            let mut inner = self.lock();
            if inner.initialized {
                warn!(target: "navigation", "Ignoring repeated init call");
                return NavOutcome::Rejected;
            }
            inner.initialized = true;
            inner.issue()
        };

        let descriptors = self.discovery.discover().await;
        info!(target: "navigation", sets = descriptors.len(), "Discovered problem sets");
        {
            let mut inner = self.lock();
            inner.descriptors = descriptors.clone();
        }

        let target = NavigationState::from_query(query);
        match target.set().cloned() {
            None => {
                let state = NavigationState::menu();
                {
                    let mut inner = self.lock();
                    if inner.current != token {
                        return NavOutcome::Superseded;
                    }
                    inner.state = state.clone();
                    inner.screen = Screen::Menu;
                }
                self.history.replace(&state);
                self.view.show_menu(&descriptors);
                NavOutcome::Completed
            }
            Some(id) => self.open_deep_link(token, id).await,
        }
    }

    async fn open_deep_link(&self, token: NavToken, id: SetId) -> NavOutcome {
        let Some(descriptor) = self.descriptor(&id) else {
            // Unknown deep link: land on the menu and say so.
            let state = NavigationState::menu();
            let descriptors = {
                let mut inner = self.lock();
                if inner.current != token {
                    return NavOutcome::Superseded;
                }
                inner.state = state.clone();
                inner.screen = Screen::Menu;
                inner.descriptors.clone()
            };
            self.history.replace(&state);
            self.view.show_menu(&descriptors);
            self.view
                .show_status(&format!("Unknown problem set '{id}'"));
            return NavOutcome::Failed;
        };

        let mut state = NavigationState::in_set(id.clone());
        self.history.replace(&state);

        let set = match self.dataset.load(&descriptor).await {
            Ok(set) => set,
            Err(e) => return self.fail_if_current(token, &e.to_string()),
        };
        let practice_idx = self.restore_index(&id, &set).await;
        state.set_practice_idx(practice_idx);

        {
            let mut inner = self.lock();
            if inner.current != token {
                return NavOutcome::Superseded;
            }
            inner.state = state;
            inner.screen = Screen::SingleProblem;
            inner.current_set = Some(Arc::clone(&set));
        }
        info!(target: "navigation", set = %id, practice_idx, "Opened deep link");
        self.view.show_single_problem(&set, practice_idx, false);
        NavOutcome::Completed
    }

    /// Opens a set from the menu: pushes a history entry, loads the
    /// document through the cache, restores the last-viewed index, and
    /// shows the problem list.
    pub async fn enter_set(&self, id: &SetId) -> NavOutcome {
        let (token, descriptor) = {
            let mut inner = self.lock();
            if !inner.initialized {
                warn!(target: "navigation", "enter_set before init");
                return NavOutcome::Rejected;
            }
            let token = inner.issue();
            let descriptor = inner.descriptors.iter().find(|d| d.id() == id).cloned();
            (token, descriptor)
        };
        let Some(descriptor) = descriptor else {
            self.view
                .show_status(&format!("Unknown problem set '{id}'"));
            return NavOutcome::Failed;
        };

        let mut state = NavigationState::in_set(id.clone());
        {
            let mut inner = self.lock();
            if inner.current != token {
                return NavOutcome::Superseded;
            }
            inner.state = state.clone();
        }
        self.history.push(&state);

        let set = match self.dataset.load(&descriptor).await {
            Ok(set) => set,
            Err(e) => return self.fail_if_current(token, &e.to_string()),
        };
        let practice_idx = self.restore_index(id, &set).await;
        state.set_practice_idx(practice_idx);

        {
            let mut inner = self.lock();
            if inner.current != token {
                return NavOutcome::Superseded;
            }
            inner.state = state;
            inner.screen = Screen::SetOpen;
            inner.current_set = Some(Arc::clone(&set));
            inner.opened_from_menu.insert(id.clone());
        }
        info!(target: "navigation", set = %id, practice_idx, "Opened set");
        self.view.show_problem_list(&set, practice_idx);
        NavOutcome::Completed
    }

    /// Moves to another problem inside the currently open set and saves
    /// the new position. Intra-set movement never creates a history entry;
    /// only set-level navigation does.
    pub async fn switch_problem(&self, id: &SetId, practice_idx: usize) -> NavOutcome {
        let (token, set) = {
            let mut inner = self.lock();
            if !inner.initialized || inner.screen != Screen::SetOpen {
                debug!(target: "navigation", "switch_problem outside an open set");
                return NavOutcome::Rejected;
            }
            if inner.state.set() != Some(id) {
                debug!(target: "navigation", set = %id, "switch_problem for a set that is not open");
                return NavOutcome::Rejected;
            }
            let Some(set) = inner.current_set.clone() else {
                return NavOutcome::Rejected;
            };
            if practice_idx >= set.problem_count() {
                debug!(target: "navigation", practice_idx, "switch_problem index out of range");
                return NavOutcome::Rejected;
            }
            let token = inner.issue();
            inner.state.set_practice_idx(practice_idx);
            (token, set)
        };

        self.progress.save(id, practice_idx).await;
        {
            let inner = self.lock();
            if inner.current != token {
                return NavOutcome::Superseded;
            }
        }
        debug!(target: "navigation", set = %id, practice_idx, "Switched problem");
        self.view.show_problem_list(&set, practice_idx);
        NavOutcome::Completed
    }

    /// Returns to the menu, pushing a history entry for it.
    pub fn back_to_menu(&self) -> NavOutcome {
        let descriptors = {
            let mut inner = self.lock();
            if !inner.initialized || inner.screen == Screen::Menu {
                return NavOutcome::Rejected;
            }
            inner.issue();
            inner.state = NavigationState::menu();
            inner.screen = Screen::Menu;
            inner.current_set = None;
            inner.descriptors.clone()
        };
        self.history.push(&NavigationState::menu());
        self.view.show_menu(&descriptors);
        info!(target: "navigation", "Returned to menu");
        NavOutcome::Completed
    }

    /// Picks a random problem under the given filters and opens it the
    /// same way a direct link to it would: as a single problem. Also
    /// refreshes the difficulty selector with the choices present in
    /// `category`.
    pub async fn pick_random(
        &self,
        category: CategoryId,
        difficulty: DifficultyFilter,
    ) -> NavOutcome {
        let token = {
            let mut inner = self.lock();
            if !inner.initialized {
                return NavOutcome::Rejected;
            }
            inner.issue()
        };

        let options = self.selection.difficulty_options(category).await;
        {
            let inner = self.lock();
            if inner.current != token {
                return NavOutcome::Superseded;
            }
        }
        self.view.show_difficulty_options(&options);

        let picked = match self.selection.pick(category, difficulty).await {
            Ok(picked) => picked,
            Err(_) => {
                return self.fail_if_current(token, "No problems match the chosen filters");
            }
        };
        let Some(descriptor) = self.descriptor(&picked.set_id) else {
            return self.fail_if_current(
                token,
                &format!("Unknown problem set '{}'", picked.set_id),
            );
        };

        let mut state = NavigationState::in_set(picked.set_id.clone());
        state.set_practice_idx(picked.index);
        {
            let mut inner = self.lock();
            if inner.current != token {
                return NavOutcome::Superseded;
            }
            inner.state = state.clone();
        }
        self.history.push(&state);

        let set = match self.dataset.load(&descriptor).await {
            Ok(set) => set,
            Err(e) => return self.fail_if_current(token, &e.to_string()),
        };
        self.progress.save(&picked.set_id, picked.index).await;

        let from_menu = {
            let mut inner = self.lock();
            if inner.current != token {
                return NavOutcome::Superseded;
            }
            inner.screen = Screen::SingleProblem;
            inner.current_set = Some(Arc::clone(&set));
            inner.opened_from_menu.contains(&picked.set_id)
        };
        info!(target: "navigation", set = %picked.set_id, index = picked.index, "Opened random pick");
        self.view.show_single_problem(&set, picked.index, from_menu);
        NavOutcome::Completed
    }

    /// Reacts to a history traversal (back/forward). Reads the target out
    /// of the query string, restores the set at its last known index, and
    /// never writes history itself. Safe to call repeatedly for the same
    /// location.
    pub async fn handle_popstate(&self, query: &str) -> NavOutcome {
        let token = {
            let mut inner = self.lock();
            if !inner.initialized {
                return NavOutcome::Rejected;
            }
            inner.issue()
        };

        let target = NavigationState::from_query(query);
        let Some(id) = target.set().cloned() else {
            let descriptors = {
                let mut inner = self.lock();
                if inner.current != token {
                    return NavOutcome::Superseded;
                }
                inner.state = NavigationState::menu();
                inner.screen = Screen::Menu;
                inner.current_set = None;
                inner.descriptors.clone()
            };
            debug!(target: "navigation", "History returned to menu");
            self.view.show_menu(&descriptors);
            return NavOutcome::Completed;
        };

        let Some(descriptor) = self.descriptor(&id) else {
            return self.fail_if_current(token, &format!("Unknown problem set '{id}'"));
        };

        let set = match self.dataset.load(&descriptor).await {
            Ok(set) => set,
            Err(e) => return self.fail_if_current(token, &e.to_string()),
        };
        let practice_idx = self.restore_index(&id, &set).await;

        let from_menu = {
            let mut inner = self.lock();
            if inner.current != token {
                return NavOutcome::Superseded;
            }
            let from_menu = inner.opened_from_menu.contains(&id);
            let mut state = NavigationState::in_set(id.clone());
            state.set_practice_idx(practice_idx);
            inner.state = state;
            inner.screen = if from_menu {
                Screen::SetOpen
            } else {
                Screen::SingleProblem
            };
            inner.current_set = Some(Arc::clone(&set));
            from_menu
        };
        debug!(target: "navigation", set = %id, practice_idx, "History returned to set");
        if from_menu {
            self.view.show_problem_list(&set, practice_idx);
        } else {
            self.view.show_single_problem(&set, practice_idx, false);
        }
        NavOutcome::Completed
    }

    /// Snapshot of the current navigation state.
    #[must_use]
    pub fn state(&self) -> NavigationState {
        self.lock().state.clone()
    }

    /// The screen currently shown.
    #[must_use]
    pub fn screen(&self) -> Screen {
        self.lock().screen
    }

    // A poisoned lock means a panic elsewhere while holding it; the
    // navigation fields are only ever written in one piece, so recovering
    // the guard is safe and beats wedging every later action.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn descriptor(&self, id: &SetId) -> Option<SetDescriptor> {
        self.lock().descriptors.iter().find(|d| d.id() == id).cloned()
    }

    fn fail_if_current(&self, token: NavToken, message: &str) -> NavOutcome {
        {
            let inner = self.lock();
            if inner.current != token {
                return NavOutcome::Superseded;
            }
        }
        warn!(target: "navigation", status = message, "Navigation failed");
        self.view.show_status(message);
        NavOutcome::Failed
    }

    // Saved progress can outlive the document that produced it; an index
    // past the end falls back to the first problem and overwrites the
    // stale value.
    async fn restore_index(&self, id: &SetId, set: &ProblemSet) -> usize {
        let saved = self.progress.load(id).await;
        if saved < set.problem_count() {
            saved
        } else {
            debug!(target: "navigation", set = %id, saved, "Saved index out of range; resetting");
            self.progress.save(id, 0).await;
            0
        }
    }
}
