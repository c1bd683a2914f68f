use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A purchasable catalog entry. Identity is `(brand, product_name, price)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Product {
    pub brand: String,
    pub product_name: String,
    /// Non-negative price in the catalog's currency.
    pub price: f64,
    /// One of [`crate::catalog::CATEGORIES`].
    pub category: String,
    pub description: String,
}

impl Product {
    pub fn same_identity(&self, brand: &str, product_name: &str, price: f64) -> bool {
        self.brand == brand && self.product_name == product_name && self.price == price
    }
}

/// A catalog product plus the model's rationale for recommending it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Copy of the matching catalog entry.
    pub product: Product,
    pub reasoning: String,
    /// Integer score in `0..=10`.
    pub match_score: u8,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}

/// Validated outcome of one model reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    /// Surviving recommendations in the model's rank order.
    pub recommendations: Vec<Recommendation>,
    pub user_query: String,
    pub summary: String,
    /// Always `recommendations.len()`.
    pub total_matches: usize,
}

/// Search state observed by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchState {
    pub query: String,
    pub is_loading: bool,
    pub recommendations: Vec<Recommendation>,
    pub error: Option<String>,
    /// Most recent first, at most [`crate::store::MAX_SEARCH_HISTORY`] entries.
    pub search_history: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    /// Inclusive `(min, max)` budget.
    pub budget_range: Option<(f64, f64)>,
    pub preferred_categories: Vec<String>,
}

impl UserPreferences {
    pub fn is_empty(&self) -> bool {
        self.budget_range.is_none() && self.preferred_categories.is_empty()
    }
}

/// Partial update for [`UserPreferences`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PreferencesUpdate {
    pub budget_range: Option<Option<(f64, f64)>>,
    pub preferred_categories: Option<Vec<String>>,
}
