//! Search orchestration over the catalog, the text generator and the store.
//!
//! Overlapping searches are resolved with generation tokens. Each search takes the next
//! generation before calling the model, and its outcome is written to the store only if
//! no newer search or reset has happened since. A stale caller gets [`AdvisorError::Superseded`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::error::AdvisorError;
use crate::model::{PreferencesUpdate, RecommendationResult, SearchState, UserPreferences};
use crate::openai::TextGenerator;
use crate::prompt::build_prompt_with_preferences;
use crate::response::parse_response;
use crate::store::SearchStore;

pub struct ProductAdvisor {
    catalog: Arc<Catalog>,
    generator: Arc<dyn TextGenerator>,
    store: Arc<RwLock<SearchStore>>,
    generation: AtomicU64,
}

impl ProductAdvisor {
    pub fn new(
        catalog: Arc<Catalog>,
        generator: Arc<dyn TextGenerator>,
        store: Arc<RwLock<SearchStore>>,
    ) -> Self {
        Self {
            catalog,
            generator,
            store,
            generation: AtomicU64::new(0),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn snapshot(&self) -> SearchState {
        self.store.read().await.state().clone()
    }

    pub async fn preferences(&self) -> UserPreferences {
        self.store.read().await.preferences().clone()
    }

    pub async fn set_query(&self, query: &str) -> SearchState {
        let mut store = self.store.write().await;
        store.set_query(query);
        store.state().clone()
    }

    pub async fn clear_search_history(&self) -> SearchState {
        let mut store = self.store.write().await;
        store.clear_search_history();
        store.state().clone()
    }

    /// Reset the visible search. Any search still in flight will be discarded.
    pub async fn reset_search(&self) -> SearchState {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut store = self.store.write().await;
        store.reset_search();
        store.state().clone()
    }

    pub async fn update_preferences(&self, update: PreferencesUpdate) -> UserPreferences {
        let mut store = self.store.write().await;
        store.update_user_preferences(update);
        store.preferences().clone()
    }

    /// Prompt, call the model once, and validate the reply. Does not touch the store.
    pub async fn get_product_recommendations(
        &self,
        query: &str,
        preferences: &UserPreferences,
    ) -> Result<RecommendationResult, AdvisorError> {
        let prompt = build_prompt_with_preferences(query, &self.catalog, preferences);
        let raw = self.generator.complete(&prompt).await?;
        parse_response(&raw, query, &self.catalog)
    }

    /// Run a user search and record its outcome in the store.
    pub async fn search(&self, query: &str) -> Result<RecommendationResult, AdvisorError> {
        let query = query.trim();
        if query.is_empty() {
            let mut store = self.store.write().await;
            store.set_error(Some(AdvisorError::EmptyQuery.user_message().to_string()));
            return Err(AdvisorError::EmptyQuery);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let preferences = {
            let mut store = self.store.write().await;
            store.set_query(query);
            store.add_to_search_history(query);
            store.set_error(None);
            store.set_loading(true);
            store.preferences().clone()
        };
        info!(query, generation, "search started");

        let outcome = self.get_product_recommendations(query, &preferences).await;

        let mut store = self.store.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            info!(query, generation, "discarding stale search result");
            return Err(AdvisorError::Superseded);
        }

        match outcome {
            Ok(result) => {
                store.set_recommendations(result.recommendations.clone());
                store.set_loading(false);
                info!(query, matches = result.total_matches, "search settled");
                Ok(result)
            }
            Err(e) => {
                warn!(query, error = %e, "search failed");
                store.set_error(Some(e.user_message().to_string()));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::error::{EMPTY_QUERY_MESSAGE, SEARCH_FAILED_MESSAGE};
    use crate::openai::CompletionError;

    const SONY_REPLY: &str = r#"Here you go:
    {"recommendations": [
        {"product": {"brand": "Sony", "product_name": "WH-1000XM5", "price": 399.99},
         "reasoning": "quiet", "matchScore": 9, "pros": ["ANC"], "cons": ["price"]},
        {"product": {"brand": "Nobody", "product_name": "Vaporphones", "price": 5}}
    ], "summary": "Headphones for travel", "totalMatches": 7}"#;

    const PIXEL_REPLY: &str = r#"{"recommendations": [
        {"product": {"brand": "Google", "product_name": "Pixel 8a", "price": 499}}
    ]}"#;

    /// Replies with canned text and records every prompt it sees.
    struct ScriptedGenerator {
        replies: Mutex<Vec<Result<String, CompletionError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(replies: Vec<Result<String, CompletionError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn build_advisor(generator: Arc<dyn TextGenerator>) -> ProductAdvisor {
        let store = Arc::new(RwLock::new(SearchStore::new()));
        let catalog = Arc::new(Catalog::builtin().unwrap());
        ProductAdvisor::new(catalog, generator, store)
    }

    #[tokio::test]
    async fn successful_search_settles_with_recommendations() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(SONY_REPLY.to_string())]));
        let advisor = build_advisor(generator.clone());

        let result = advisor.search("  travel headphones ").await.unwrap();
        assert_eq!(result.total_matches, 1);
        assert_eq!(result.user_query, "travel headphones");

        let state = advisor.snapshot().await;
        assert_eq!(state.query, "travel headphones");
        assert!(!state.is_loading);
        assert!(state.error.is_none());
        assert_eq!(state.recommendations.len(), 1);
        assert_eq!(state.recommendations[0].product.product_name, "WH-1000XM5");
        assert_eq!(state.search_history, vec!["travel headphones"]);

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("\"travel headphones\""));
    }

    #[tokio::test]
    async fn empty_query_never_calls_the_model() {
        let generator = Arc::new(ScriptedGenerator::new(vec![]));
        let advisor = build_advisor(generator.clone());

        let err = advisor.search("   ").await.unwrap_err();
        assert!(matches!(err, AdvisorError::EmptyQuery));

        let state = advisor.snapshot().await;
        assert_eq!(state.error.as_deref(), Some(EMPTY_QUERY_MESSAGE));
        assert!(state.search_history.is_empty());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failures_keep_previous_recommendations() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok(SONY_REPLY.to_string()),
            Err(CompletionError::EmptyCompletion),
            Ok("no json here".to_string()),
        ]));
        let advisor = build_advisor(generator);

        advisor.search("headphones").await.unwrap();

        let err = advisor.search("phones").await.unwrap_err();
        assert!(matches!(err, AdvisorError::Upstream(_)));
        let state = advisor.snapshot().await;
        assert_eq!(state.error.as_deref(), Some(SEARCH_FAILED_MESSAGE));
        assert!(!state.is_loading);
        assert_eq!(state.recommendations.len(), 1);

        let err = advisor.search("tablets").await.unwrap_err();
        assert!(matches!(err, AdvisorError::MalformedResponse(_)));
        let state = advisor.snapshot().await;
        assert_eq!(state.error.as_deref(), Some(SEARCH_FAILED_MESSAGE));
        assert_eq!(state.recommendations.len(), 1);
        assert_eq!(state.search_history, vec!["tablets", "phones", "headphones"]);
    }

    #[tokio::test]
    async fn preferences_flow_into_the_prompt() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(PIXEL_REPLY.to_string())]));
        let advisor = build_advisor(generator.clone());

        advisor
            .update_preferences(PreferencesUpdate {
                budget_range: Some(Some((200.0, 600.0))),
                preferred_categories: Some(vec!["Smartphones".to_string()]),
            })
            .await;
        advisor.search("a phone with a good camera").await.unwrap();

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("- Budget range: 200 to 600"));
        assert!(prompts[0].contains("- Preferred categories: Smartphones"));
    }

    #[tokio::test]
    async fn reset_keeps_history() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(PIXEL_REPLY.to_string())]));
        let advisor = build_advisor(generator);

        advisor.search("cheap phone").await.unwrap();
        let state = advisor.reset_search().await;
        assert_eq!(state.query, "");
        assert!(state.recommendations.is_empty());
        assert_eq!(state.search_history, vec!["cheap phone"]);
    }

    /// Holds the first call until released; later calls answer immediately.
    struct GatedGenerator {
        calls: AtomicUsize,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl TextGenerator for GatedGenerator {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.entered.notify_one();
                self.release.notified().await;
                return Ok(SONY_REPLY.to_string());
            }
            Ok(PIXEL_REPLY.to_string())
        }
    }

    #[tokio::test]
    async fn stale_reply_does_not_overwrite_newer_search() {
        let generator = Arc::new(GatedGenerator {
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let advisor = build_advisor(generator.clone());
        let advisor = Arc::new(advisor);

        let first = tokio::spawn({
            let advisor = Arc::clone(&advisor);
            async move { advisor.search("headphones").await }
        });
        generator.entered.notified().await;

        let second = advisor.search("phone").await.unwrap();
        assert_eq!(second.recommendations[0].product.product_name, "Pixel 8a");

        generator.release.notify_one();
        let first = first.await.unwrap();
        assert!(matches!(first, Err(AdvisorError::Superseded)));

        let state = advisor.snapshot().await;
        assert_eq!(state.query, "phone");
        assert_eq!(state.recommendations.len(), 1);
        assert_eq!(state.recommendations[0].product.product_name, "Pixel 8a");
        assert!(state.error.is_none());
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn empty_query_keeps_existing_recommendations() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(SONY_REPLY.to_string())]));
        let advisor = build_advisor(generator.clone());

        advisor.search("headphones").await.unwrap();
        let err = advisor.search("").await.unwrap_err();
        assert!(matches!(err, AdvisorError::EmptyQuery));

        let state = advisor.snapshot().await;
        assert_eq!(state.recommendations.len(), 1);
        assert_eq!(state.query, "headphones");
        assert_eq!(state.error.as_deref(), Some(EMPTY_QUERY_MESSAGE));
        assert!(!state.is_loading);
        assert_eq!(state.search_history, vec!["headphones"]);
        assert_eq!(generator.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reset_during_search_discards_the_reply() {
        let generator = Arc::new(GatedGenerator {
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let advisor = Arc::new(build_advisor(generator.clone()));

        let pending = tokio::spawn({
            let advisor = Arc::clone(&advisor);
            async move { advisor.search("headphones").await }
        });
        generator.entered.notified().await;

        let state = advisor.reset_search().await;
        assert_eq!(state.query, "");

        generator.release.notify_one();
        let outcome = pending.await.unwrap();
        assert!(matches!(outcome, Err(AdvisorError::Superseded)));

        let state = advisor.snapshot().await;
        assert_eq!(state.query, "");
        assert!(state.recommendations.is_empty());
        assert!(state.error.is_none());
        assert!(!state.is_loading);
        assert_eq!(state.search_history, vec!["headphones"]);
    }
}
