use std::fmt;

/// Difficulty grade attached to a problem.
///
/// Dataset labels are free-form text; anything that is not a recognized
/// grade becomes `Unknown` so it can still be grouped and filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Unknown,
}

impl Difficulty {
    /// Parses a dataset label leniently. A missing or unrecognized label
    /// maps to `Unknown`.
    #[must_use]
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|raw| raw.trim().to_ascii_lowercase()).as_deref() {
            Some("easy") => Self::Easy,
            Some("medium") => Self::Medium,
            Some("hard") => Self::Hard,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Difficulty constraint for random selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyFilter {
    /// Any difficulty matches.
    Any,
    /// Only the given difficulty matches.
    Only(Difficulty),
}

impl DifficultyFilter {
    /// Parses a user-facing label. `"any"` or an empty label means no
    /// constraint; everything else narrows to the (leniently parsed) grade.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("any") {
            Self::Any
        } else {
            Self::Only(Difficulty::from_label(Some(trimmed)))
        }
    }

    #[must_use]
    pub fn matches(&self, difficulty: Difficulty) -> bool {
        match self {
            Self::Any => true,
            Self::Only(wanted) => *wanted == difficulty,
        }
    }
}

impl fmt::Display for DifficultyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Only(difficulty) => difficulty.fmt(f),
        }
    }
}
