//! Navigation state and its URL query projection.
//!
//! The address bar is the single persistent record of where the user is:
//! either the menu (no query) or inside a set (`?set=<id>`). The problem
//! index inside a set is deliberately not part of the URL; it is restored
//! from per-set progress storage instead.

use url::form_urlencoded;

use crate::model::SetId;

/// Query parameter naming the open set.
pub const SET_PARAM: &str = "set";

/// Where the user currently is, as far as navigation is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavigationState {
    set: Option<SetId>,
    practice_idx: usize,
}

impl NavigationState {
    /// State for the set menu.
    #[must_use]
    pub fn menu() -> Self {
        Self::default()
    }

    /// State for an open set, positioned at its first problem.
    #[must_use]
    pub fn in_set(set: SetId) -> Self {
        Self {
            set: Some(set),
            practice_idx: 0,
        }
    }

    #[must_use]
    pub fn set(&self) -> Option<&SetId> {
        self.set.as_ref()
    }

    #[must_use]
    pub fn practice_idx(&self) -> usize {
        self.practice_idx
    }

    pub fn set_practice_idx(&mut self, practice_idx: usize) {
        self.practice_idx = practice_idx;
    }

    /// Renders the query string for this state, without the leading `?`.
    ///
    /// The menu renders as an empty string so the URL carries no stale
    /// parameters after leaving a set.
    #[must_use]
    pub fn to_query(&self) -> String {
        match &self.set {
            Some(set) => form_urlencoded::Serializer::new(String::new())
                .append_pair(SET_PARAM, set.as_str())
                .finish(),
            None => String::new(),
        }
    }

    /// Parses a query string, with or without the leading `?`.
    ///
    /// An absent, empty, or unparsable `set` parameter falls back to the
    /// menu rather than erroring; a bad URL is not worth breaking the app
    /// over. The problem index always starts at zero here and is adjusted
    /// later from stored progress.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let set = form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == SET_PARAM)
            .and_then(|(_, value)| SetId::new(value.into_owned()).ok());
        match set {
            Some(set) => Self::in_set(set),
            None => Self::menu(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_renders_empty_query() {
        assert_eq!(NavigationState::menu().to_query(), "");
    }

    #[test]
    fn open_set_renders_set_param() {
        let state = NavigationState::in_set(SetId::new("algo1").unwrap());
        assert_eq!(state.to_query(), "set=algo1");
    }

    #[test]
    fn query_round_trip_preserves_set() {
        let state = NavigationState::in_set(SetId::new("algo1").unwrap());
        assert_eq!(NavigationState::from_query(&state.to_query()), state);
        assert_eq!(
            NavigationState::from_query(&NavigationState::menu().to_query()),
            NavigationState::menu()
        );
    }

    #[test]
    fn round_trip_survives_percent_encoding() {
        let state = NavigationState::in_set(SetId::new("sets/2024 fall").unwrap());
        let query = state.to_query();
        assert!(query.contains('%'));
        assert_eq!(NavigationState::from_query(&query), state);
    }

    #[test]
    fn leading_question_mark_is_accepted() {
        let state = NavigationState::from_query("?set=algo1");
        assert_eq!(state.set().map(SetId::as_str), Some("algo1"));
        assert_eq!(state.practice_idx(), 0);
    }

    #[test]
    fn blank_or_missing_set_falls_back_to_menu() {
        assert_eq!(NavigationState::from_query(""), NavigationState::menu());
        assert_eq!(NavigationState::from_query("set="), NavigationState::menu());
        assert_eq!(
            NavigationState::from_query("set=%20%20"),
            NavigationState::menu()
        );
        assert_eq!(
            NavigationState::from_query("other=algo1"),
            NavigationState::menu()
        );
    }

    #[test]
    fn first_set_param_wins() {
        let state = NavigationState::from_query("set=algo1&set=algo2");
        assert_eq!(state.set().map(SetId::as_str), Some("algo1"));
    }

    #[test]
    fn index_is_mutable_but_not_serialized() {
        let mut state = NavigationState::in_set(SetId::new("algo1").unwrap());
        state.set_practice_idx(4);
        assert_eq!(state.practice_idx(), 4);
        assert_eq!(state.to_query(), "set=algo1");
    }
}
