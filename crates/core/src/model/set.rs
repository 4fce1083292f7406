use thiserror::Error;

use crate::model::ids::SetId;
use crate::model::problem::Problem;

/// Validation failures when assembling a [`ProblemSet`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SetError {
    #[error("problem set '{id}' contains no problems")]
    EmptyItems { id: SetId },
}

/// A named, ordered collection of practice problems.
///
/// Sets are immutable once built; progress through a set is tracked
/// separately so the same loaded set can be shared freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemSet {
    id: SetId,
    title: Option<String>,
    items: Vec<Problem>,
}

impl ProblemSet {
    /// Builds a set from its parsed problems.
    ///
    /// A blank title is treated as absent. The problem list must be
    /// non-empty; an empty set has nothing to navigate.
    ///
    /// # Errors
    ///
    /// Returns [`SetError::EmptyItems`] when `items` is empty.
    pub fn new(id: SetId, title: Option<String>, items: Vec<Problem>) -> Result<Self, SetError> {
        if items.is_empty() {
            return Err(SetError::EmptyItems { id });
        }
        let title = title
            .map(|raw| raw.trim().to_owned())
            .filter(|trimmed| !trimmed.is_empty());
        Ok(Self { id, title, items })
    }

    #[must_use]
    pub fn id(&self) -> &SetId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn problems(&self) -> &[Problem] {
        &self.items
    }

    #[must_use]
    pub fn problem_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the problem at `index`, or `None` when the index is out of
    /// range for this set.
    #[must_use]
    pub fn problem(&self, index: usize) -> Option<&Problem> {
        self.items.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::difficulty::Difficulty;

    fn build_problem(title: &str) -> Problem {
        Problem::new(title, "description", 100, Difficulty::Easy)
    }

    fn build_id(slug: &str) -> SetId {
        SetId::new(slug).unwrap()
    }

    #[test]
    fn new_set_keeps_problem_order() {
        let set = ProblemSet::new(
            build_id("algo1"),
            Some("Algorithms I".to_owned()),
            vec![build_problem("a"), build_problem("b"), build_problem("c")],
        )
        .unwrap();

        assert_eq!(set.problem_count(), 3);
        assert_eq!(set.problem(0).unwrap().title(), "a");
        assert_eq!(set.problem(2).unwrap().title(), "c");
        assert!(set.problem(3).is_none());
    }

    #[test]
    fn empty_items_are_rejected() {
        let result = ProblemSet::new(build_id("algo1"), None, Vec::new());
        assert_eq!(
            result.unwrap_err(),
            SetError::EmptyItems {
                id: build_id("algo1")
            }
        );
    }

    #[test]
    fn blank_title_becomes_none() {
        let set = ProblemSet::new(
            build_id("algo1"),
            Some("   ".to_owned()),
            vec![build_problem("a")],
        )
        .unwrap();
        assert!(set.title().is_none());

        let set = ProblemSet::new(
            build_id("algo1"),
            Some("  Algorithms I ".to_owned()),
            vec![build_problem("a")],
        )
        .unwrap();
        assert_eq!(set.title(), Some("Algorithms I"));
    }
}
