#![forbid(unsafe_code)]

pub mod model;
pub mod nav;

pub use model::{
    CategoryId, Difficulty, DifficultyFilter, Example, ParseIdError, Problem, ProblemSet,
    SetError, SetId,
};
pub use nav::NavigationState;
