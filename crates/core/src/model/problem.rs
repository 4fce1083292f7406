use crate::model::difficulty::Difficulty;
use crate::model::ids::CategoryId;

/// Worked example attached to a problem: one input and the output the
/// solution should produce for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    input: String,
    output: String,
}

impl Example {
    #[must_use]
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }
}

/// A single practice problem.
///
/// The category is not stored directly; it derives from the numeric tag,
/// so problems tagged 512 and 599 both land in category 500.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    title: String,
    description: String,
    constraints: Option<String>,
    examples: Vec<Example>,
    category_tag: u32,
    difficulty: Difficulty,
}

impl Problem {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category_tag: u32,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            constraints: None,
            examples: Vec::new(),
            category_tag,
            difficulty,
        }
    }

    #[must_use]
    pub fn with_constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = Some(constraints.into());
        self
    }

    #[must_use]
    pub fn with_examples(mut self, examples: Vec<Example>) -> Self {
        self.examples = examples;
        self
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn constraints(&self) -> Option<&str> {
        self.constraints.as_deref()
    }

    #[must_use]
    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    #[must_use]
    pub fn category(&self) -> CategoryId {
        CategoryId::from_tag(self.category_tag)
    }

    #[must_use]
    pub fn category_tag(&self) -> u32 {
        self.category_tag
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_derives_from_tag() {
        let problem = Problem::new("Two Sum", "find two numbers", 512, Difficulty::Easy);
        assert_eq!(problem.category(), CategoryId::new(500));
        assert_eq!(problem.category_tag(), 512);
    }

    #[test]
    fn builders_attach_optional_fields() {
        let problem = Problem::new("Two Sum", "find two numbers", 100, Difficulty::Easy)
            .with_constraints("2 <= n <= 10^4")
            .with_examples(vec![Example::new("[2,7,11,15], 9", "[0,1]")]);

        assert_eq!(problem.constraints(), Some("2 <= n <= 10^4"));
        assert_eq!(problem.examples().len(), 1);
        assert_eq!(problem.examples()[0].input(), "[2,7,11,15], 9");
        assert_eq!(problem.examples()[0].output(), "[0,1]");
    }

    #[test]
    fn new_problem_has_no_extras() {
        let problem = Problem::new("t", "d", 0, Difficulty::Unknown);
        assert!(problem.constraints().is_none());
        assert!(problem.examples().is_empty());
        assert_eq!(problem.difficulty(), Difficulty::Unknown);
    }
}
