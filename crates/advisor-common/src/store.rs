use crate::model::{PreferencesUpdate, Recommendation, SearchState, UserPreferences};

pub const MAX_SEARCH_HISTORY: usize = 10;

/// Owned search-state container.
///
/// Every setter is total and may be called in any order. The store does no business
/// logic beyond bookkeeping; callers share it behind a lock.
#[derive(Debug, Clone, Default)]
pub struct SearchStore {
    state: SearchState,
    preferences: UserPreferences,
}

impl SearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.state.query = query.into();
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.state.is_loading = loading;
    }

    /// Also clears the loading flag.
    pub fn set_error(&mut self, error: Option<String>) {
        self.state.error = error;
        self.state.is_loading = false;
    }

    /// Also clears any previous error.
    pub fn set_recommendations(&mut self, recommendations: Vec<Recommendation>) {
        self.state.recommendations = recommendations;
        self.state.error = None;
    }

    pub fn add_to_search_history(&mut self, query: &str) {
        let history = &mut self.state.search_history;
        history.retain(|item| item != query);
        history.insert(0, query.to_string());
        history.truncate(MAX_SEARCH_HISTORY);
    }

    pub fn clear_search_history(&mut self) {
        self.state.search_history.clear();
    }

    pub fn update_user_preferences(&mut self, update: PreferencesUpdate) {
        if let Some(budget_range) = update.budget_range {
            self.preferences.budget_range = budget_range;
        }
        if let Some(categories) = update.preferred_categories {
            self.preferences.preferred_categories = categories;
        }
    }

    /// Restore the initial search state, keeping the search history.
    pub fn reset_search(&mut self) {
        let history = std::mem::take(&mut self.state.search_history);
        self.state = SearchState {
            search_history: history,
            ..SearchState::default()
        };
    }
}
