use practice_core::{DifficultyFilter, ProblemSet};

use crate::discovery::SetDescriptor;

/// Rendering seam. The navigator decides what should be on screen and
/// hands it over; how it gets drawn is entirely the sink's business.
pub trait ViewSink: Send + Sync {
    /// Show the set menu.
    fn show_menu(&self, sets: &[SetDescriptor]);

    /// Show a set's full problem list with the problem at `practice_idx`
    /// active.
    fn show_problem_list(&self, set: &ProblemSet, practice_idx: usize);

    /// Show a single problem on its own. `from_menu` says whether this
    /// set's list was explicitly opened earlier in the session, which is
    /// what decides if a way back to the list is offered.
    fn show_single_problem(&self, set: &ProblemSet, practice_idx: usize, from_menu: bool);

    /// Update the difficulty selector with the choices worth offering for
    /// the category a random pick runs against.
    fn show_difficulty_options(&self, options: &[DifficultyFilter]);

    /// Surface a status message (failed loads, empty picks).
    fn show_status(&self, message: &str);
}
