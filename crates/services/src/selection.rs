use std::collections::BTreeSet;
use std::sync::Arc;

use practice_core::{CategoryId, DifficultyFilter, Problem, ProblemSet, SetId};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::dataset::DatasetService;
use crate::discovery::SetDiscovery;
use crate::error::PickError;

/// Outcome of a random pick: which set, which index, and the entry itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedProblem {
    pub set_id: SetId,
    pub index: usize,
    pub entry: Problem,
}

/// Builds filtered candidate pools across every discovered set and picks
/// uniformly at random.
///
/// Sets that fail to load are skipped rather than failing the pick; the
/// pool is simply whatever could be loaded.
pub struct SelectionEngine {
    dataset: Arc<DatasetService>,
    discovery: Arc<dyn SetDiscovery>,
}

impl SelectionEngine {
    #[must_use]
    pub fn new(dataset: Arc<DatasetService>, discovery: Arc<dyn SetDiscovery>) -> Self {
        Self { dataset, discovery }
    }

    /// Difficulty choices worth offering for `category`, derived from the
    /// grades actually present in its problems.
    ///
    /// With two or more distinct grades the list starts with the
    /// unconstrained choice; with fewer than two, it collapses to just the
    /// present grade (an "any difficulty" choice would be meaningless).
    pub async fn difficulty_options(&self, category: CategoryId) -> Vec<DifficultyFilter> {
        let sets = self.load_available().await;
        let mut present = BTreeSet::new();
        for set in &sets {
            for problem in set.problems() {
                if problem.category() == category {
                    present.insert(problem.difficulty());
                }
            }
        }

        if present.len() >= 2 {
            let mut options = vec![DifficultyFilter::Any];
            options.extend(present.into_iter().map(DifficultyFilter::Only));
            options
        } else {
            present.into_iter().map(DifficultyFilter::Only).collect()
        }
    }

    /// Picks one problem uniformly at random from `category` under the
    /// given difficulty constraint.
    ///
    /// An empty pool relaxes the difficulty constraint once and rescans;
    /// only when the category itself has nothing to offer does the pick
    /// fail.
    ///
    /// # Errors
    ///
    /// Returns `PickError::NoCandidates` when no loadable set contains a
    /// matching problem even after relaxation.
    pub async fn pick(
        &self,
        category: CategoryId,
        difficulty: DifficultyFilter,
    ) -> Result<PickedProblem, PickError> {
        let sets = self.load_available().await;

        let mut pool = scan(&sets, category, difficulty);
        if pool.is_empty() {
            debug!(
                target: "selection",
                category = category.value(),
                "Empty pool; relaxing difficulty filter"
            );
            pool = scan(&sets, category, DifficultyFilter::Any);
        }
        if pool.is_empty() {
            return Err(PickError::NoCandidates);
        }

        let index = rand::rng().random_range(0..pool.len());
        let picked = pool.swap_remove(index);
        info!(
            target: "selection",
            set = %picked.set_id,
            index = picked.index,
            pool = pool.len() + 1,
            "Picked random problem"
        );
        Ok(picked)
    }

    async fn load_available(&self) -> Vec<Arc<ProblemSet>> {
        let descriptors = self.discovery.discover().await;
        let loads = descriptors.iter().map(|d| self.dataset.load(d));
        let results = futures::future::join_all(loads).await;

        let mut sets = Vec::with_capacity(descriptors.len());
        for (descriptor, result) in descriptors.iter().zip(results) {
            match result {
                Ok(set) => sets.push(set),
                Err(e) => {
                    warn!(
                        target: "selection",
                        set = %descriptor.id(),
                        error = %e,
                        "Skipping set that failed to load"
                    );
                }
            }
        }
        sets
    }
}

fn scan(
    sets: &[Arc<ProblemSet>],
    category: CategoryId,
    filter: DifficultyFilter,
) -> Vec<PickedProblem> {
    let mut pool = Vec::new();
    for set in sets {
        for (index, problem) in set.problems().iter().enumerate() {
            if problem.category() == category && filter.matches(problem.difficulty()) {
                pool.push(PickedProblem {
                    set_id: set.id().clone(),
                    index,
                    entry: problem.clone(),
                });
            }
        }
    }
    pool
}
