use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{PreferencesUpdate, Product};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchProductsParams {
    /// Free-text description of what the customer is looking for.
    pub query: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetQueryParams {
    /// Current contents of the search box.
    pub query: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListCatalogParams {
    /// Optional category filter such as "Laptops" or "Smart Home".
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct UpdatePreferencesParams {
    /// Lower bound of the budget. Must be given together with `budget_max`.
    pub budget_min: Option<f64>,
    /// Upper bound of the budget. Must be given together with `budget_min`.
    pub budget_max: Option<f64>,
    /// Set to true to remove the budget range.
    pub clear_budget: Option<bool>,
    /// Replaces the preferred categories when present.
    pub preferred_categories: Option<Vec<String>>,
}

impl UpdatePreferencesParams {
    pub fn into_update(self) -> Result<PreferencesUpdate, String> {
        let budget_range = match (self.clear_budget.unwrap_or(false), self.budget_min, self.budget_max) {
            (true, None, None) => Some(None),
            (true, _, _) => {
                return Err("clear_budget cannot be combined with budget_min/budget_max".to_string())
            }
            (false, Some(min), Some(max)) => {
                if !(min.is_finite() && max.is_finite()) || min < 0.0 || min > max {
                    return Err(format!("invalid budget range: {min} to {max}"));
                }
                Some(Some((min, max)))
            }
            (false, None, None) => None,
            (false, _, _) => {
                return Err("budget_min and budget_max must be given together".to_string())
            }
        };

        Ok(PreferencesUpdate {
            budget_range,
            preferred_categories: self.preferred_categories,
        })
    }
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CatalogResponse {
    pub products: Vec<Product>,
}
