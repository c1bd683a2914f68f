use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};

use advisor_common::advisor::ProductAdvisor;
use advisor_common::catalog::CATEGORIES;
use advisor_common::error::AdvisorError;
use advisor_common::mcp_api::{
    CatalogResponse, ListCatalogParams, SearchProductsParams, SetQueryParams,
    UpdatePreferencesParams,
};
use advisor_common::model::{Product, RecommendationResult, SearchState, UserPreferences};

#[derive(Clone)]
pub struct ProductAdvisorServer {
    advisor: Arc<ProductAdvisor>,
    tool_router: ToolRouter<ProductAdvisorServer>,
}

impl ProductAdvisorServer {
    pub fn new(advisor: Arc<ProductAdvisor>) -> Self {
        Self {
            advisor,
            tool_router: Self::tool_router(),
        }
    }
}

fn check_category(category: &str) -> Result<(), String> {
    if CATEGORIES.contains(&category) {
        Ok(())
    } else {
        Err(format!(
            "unknown category: {category} (expected one of: {})",
            CATEGORIES.join(", ")
        ))
    }
}

#[tool_router]
impl ProductAdvisorServer {
    #[tool(description = "Recommend 3-5 catalog products for a free-text shopping query. Only products that exist in the catalog are returned, ranked best match first.")]
    async fn search_products(
        &self,
        Parameters(params): Parameters<SearchProductsParams>,
    ) -> Result<Json<RecommendationResult>, String> {
        match self.advisor.search(&params.query).await {
            Ok(result) => Ok(Json(result)),
            Err(e @ AdvisorError::Superseded) => Err(e.to_string()),
            Err(e) => Err(e.user_message().to_string()),
        }
    }

    #[tool(description = "Get the current search state: query, loading flag, last recommendations, last error and recent search history.")]
    async fn get_search_state(&self) -> Result<Json<SearchState>, String> {
        Ok(Json(self.advisor.snapshot().await))
    }

    #[tool(description = "Set the current query text without running a search.")]
    async fn set_query(
        &self,
        Parameters(params): Parameters<SetQueryParams>,
    ) -> Result<Json<SearchState>, String> {
        Ok(Json(self.advisor.set_query(&params.query).await))
    }

    #[tool(description = "Clear the query, recommendations and error. Search history is kept.")]
    async fn reset_search(&self) -> Result<Json<SearchState>, String> {
        Ok(Json(self.advisor.reset_search().await))
    }

    #[tool(description = "Forget the recent search history.")]
    async fn clear_search_history(&self) -> Result<Json<SearchState>, String> {
        Ok(Json(self.advisor.clear_search_history().await))
    }

    #[tool(description = "List catalog products, optionally filtered by category.")]
    async fn list_catalog(
        &self,
        Parameters(params): Parameters<ListCatalogParams>,
    ) -> Result<Json<CatalogResponse>, String> {
        let catalog = self.advisor.catalog();
        let products: Vec<Product> = match params.category.as_deref().map(str::trim) {
            Some(category) if !category.is_empty() => {
                check_category(category)?;
                catalog.in_category(category).cloned().collect()
            }
            _ => catalog.products().to_vec(),
        };
        Ok(Json(CatalogResponse { products }))
    }

    #[tool(description = "Get the customer's budget range and preferred categories.")]
    async fn get_preferences(&self) -> Result<Json<UserPreferences>, String> {
        Ok(Json(self.advisor.preferences().await))
    }

    #[tool(description = "Update the customer's budget range and/or preferred categories. Omitted fields are left unchanged. Preferences are included in later search prompts.")]
    async fn update_preferences(
        &self,
        Parameters(params): Parameters<UpdatePreferencesParams>,
    ) -> Result<Json<UserPreferences>, String> {
        if let Some(categories) = &params.preferred_categories {
            for category in categories {
                check_category(category)?;
            }
        }
        let update = params.into_update()?;
        Ok(Json(self.advisor.update_preferences(update).await))
    }
}

#[tool_handler]
impl ServerHandler for ProductAdvisorServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "product-advisor".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Product advisor MCP server. Call search_products with a natural-language \
description of what the customer needs; results only ever contain catalog products. \
get_search_state returns the latest results, error and search history. Use list_catalog to \
browse products and update_preferences to set a budget or preferred categories."
                    .to_string(),
            ),
        }
    }
}
