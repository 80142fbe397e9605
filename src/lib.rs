pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod recommendation;
pub mod store;
pub mod survey;

use std::sync::Arc;

pub use recommendation::{AdaptationPlan, Priority, RecommendationEngine, SettingValue};
pub use survey::SurveyResponse;

/// Wire the services from configuration. Called once at startup.
pub fn build_state(config: config::Config) -> error::Result<http::AppState> {
    let store = store::SqliteProfileStore::open(&config.database.path)?;
    let verifier = auth::StaticTokenVerifier::new(config.auth.tokens.clone());
    Ok(http::AppState {
        config: Arc::new(config),
        engine: Arc::new(RecommendationEngine::new()),
        store: Arc::new(store),
        verifier: Arc::new(verifier),
    })
}

/// Accept either a bare responses object or a `{ "responses": {...} }` submission.
pub fn extract_responses(document: &serde_json::Value) -> &serde_json::Value {
    document.get("responses").unwrap_or(document)
}
