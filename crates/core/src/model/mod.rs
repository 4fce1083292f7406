mod difficulty;
mod ids;
mod problem;
mod set;

pub use difficulty::{Difficulty, DifficultyFilter};
pub use ids::{CategoryId, ParseIdError, SetId};
pub use problem::{Example, Problem};
pub use set::{ProblemSet, SetError};
