//! HTTP transport module for access-hub
//!
//! Axum router for the survey and profile API. Services are built once at
//! startup and handed to every handler through [`AppState`].

use crate::auth::{AuthenticatedUser, TokenVerifier};
use crate::config::Config;
use crate::error::{AccessHubError, Result};
use crate::recommendation::RecommendationEngine;
use crate::store::{ProfileStore, ProfileUpdate, UserProfile};
use crate::survey::{self, SurveyResponse};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRef, Path, Query, State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

const SERVICE_NAME: &str = "Accessibility Learning Hub API";
pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const MAX_LIST_LIMIT: usize = 500;

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<RecommendationEngine>,
    pub store: Arc<dyn ProfileStore>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl FromRef<AppState> for Arc<dyn TokenVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.verifier.clone()
    }
}

/// Build the full API router
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);
    let body_limit = state.config.server.max_body_bytes;

    Router::new()
        .route("/", get(index_handler))
        .route("/api/health", get(health_handler))
        .route("/api/auth/verify", post(verify_token_handler))
        .route("/api/auth/user/:uid", get(get_user_handler))
        .route("/api/survey/questions", get(questions_handler))
        .route("/api/survey/submit", post(submit_survey_handler))
        .route("/api/survey/responses", get(survey_responses_handler))
        .route("/api/survey/recommendations", get(recommendations_handler))
        .route(
            "/api/user/profile",
            get(get_profile_handler).put(update_profile_handler),
        )
        .route(
            "/api/user/preferences",
            get(get_preferences_handler).put(update_preferences_handler),
        )
        .route(
            "/api/user/accessibility-needs",
            get(get_needs_handler).put(update_needs_handler),
        )
        .route(
            "/api/user/history",
            get(get_history_handler).post(add_history_handler),
        )
        .route(
            "/api/user/saved-content",
            get(get_saved_content_handler).post(save_content_handler),
        )
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Start the HTTP server and run until ctrl-c
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let bind = state.config.server.bind;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP listener on {}: {}", bind, e))?;

    tracing::info!("Starting HTTP server on {}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}

/// Unwrap a JSON body, turning extractor rejections into the API envelope
fn json_body(body: std::result::Result<Json<Value>, JsonRejection>) -> Result<Value> {
    body.map(|Json(v)| v)
        .map_err(|rejection| AccessHubError::validation(rejection.body_text()))
}

fn json_object(body: std::result::Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>> {
    match json_body(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(AccessHubError::validation("Request body must be a JSON object")),
    }
}

async fn require_profile(state: &AppState, uid: &str) -> Result<UserProfile> {
    state
        .store
        .get_profile(uid)
        .await?
        .ok_or_else(|| AccessHubError::not_found("Profile not found"))
}

async fn index_handler() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to Accessibility Learning Hub API",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/api/health"
    }))
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn not_found_handler() -> AccessHubError {
    AccessHubError::not_found("Resource not found")
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    #[serde(default)]
    token: Option<String>,
}

async fn verify_token_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let req: VerifyRequest = serde_json::from_value(json_body(body)?)
        .map_err(|_| AccessHubError::validation("Token is required"))?;
    let token = req
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AccessHubError::validation("Token is required"))?;
    let user = state
        .verifier
        .verify(&token)
        .await
        .map_err(|_| AccessHubError::unauthorized("Invalid token"))?;
    let profile = state.store.get_profile(&user.uid).await?;
    Ok(Json(json!({
        "success": true,
        "user": user_record(&user, profile.as_ref())
    })))
}

/// Identity fields merged with what the profile knows about the user
fn user_record(user: &AuthenticatedUser, profile: Option<&UserProfile>) -> Value {
    let email = user
        .email
        .clone()
        .or_else(|| profile.and_then(|p| p.email.clone()));
    json!({
        "uid": user.uid,
        "email": email,
        "display_name": profile.and_then(|p| p.display_name.clone()),
    })
}

async fn get_user_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(uid): Path<String>,
) -> Result<impl IntoResponse> {
    if user.uid != uid {
        tracing::warn!("{} attempted to read user {}", user.uid, uid);
        return Err(AccessHubError::forbidden("Unauthorized access"));
    }
    let profile = state.store.get_profile(&uid).await?;
    Ok(Json(json!({
        "success": true,
        "user": user_record(&user, profile.as_ref()),
        "profile": profile
    })))
}

async fn questions_handler() -> impl IntoResponse {
    Json(json!({ "success": true, "questions": survey::questions() }))
}

async fn submit_survey_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let body = json_body(body)?;
    let responses = body
        .get("responses")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));

    let plan = state
        .engine
        .generate(&SurveyResponse::from_value(&responses));
    state.store.save_survey(&user.uid, responses, &plan).await?;

    tracing::info!(
        "Survey submitted for {} (priority {}, {} adaptations)",
        user.uid,
        plan.priority.as_str(),
        plan.adaptations.len()
    );

    Ok(Json(json!({
        "success": true,
        "message": "Survey submitted successfully",
        "recommendations": plan
    })))
}

async fn survey_responses_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse> {
    let profile = require_profile(&state, &user.uid).await?;
    let recommendations = match profile.recommendations {
        Some(plan) => serde_json::to_value(plan)?,
        None => Value::Object(Map::new()),
    };
    Ok(Json(json!({
        "success": true,
        "responses": profile.survey_responses,
        "completed": profile.survey_completed,
        "recommendations": recommendations
    })))
}

async fn recommendations_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse> {
    let profile = require_profile(&state, &user.uid).await?;
    let plan = state
        .engine
        .generate(&SurveyResponse::from_value(&profile.survey_responses));
    Ok(Json(json!({ "success": true, "recommendations": plan })))
}

async fn get_profile_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse> {
    let profile = require_profile(&state, &user.uid).await?;
    Ok(Json(json!({ "success": true, "profile": profile })))
}

async fn update_profile_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let update: ProfileUpdate = serde_json::from_value(Value::Object(json_object(body)?))
        .map_err(|e| AccessHubError::validation(format!("Invalid profile update: {}", e)))?;
    let update = ProfileUpdate {
        email: update.email.or_else(|| user.email.clone()),
        ..update
    };
    let profile = state.store.update_profile(&user.uid, update).await?;
    tracing::info!("Profile updated for {}", user.uid);
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "profile": profile
    })))
}

async fn get_preferences_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse> {
    let profile = require_profile(&state, &user.uid).await?;
    Ok(Json(json!({ "success": true, "preferences": profile.preferences })))
}

async fn update_preferences_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let preferences = json_object(body)?;
    state
        .store
        .update_preferences(&user.uid, preferences.clone())
        .await?;
    tracing::info!("Preferences updated for {}", user.uid);
    Ok(Json(json!({
        "success": true,
        "message": "Preferences updated successfully",
        "preferences": preferences
    })))
}

async fn get_needs_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse> {
    let profile = require_profile(&state, &user.uid).await?;
    Ok(Json(json!({
        "success": true,
        "accessibility_needs": profile.accessibility_needs
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NeedsRequest {
    accessibility_needs: Vec<String>,
}

async fn update_needs_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let req: NeedsRequest = serde_json::from_value(Value::Object(json_object(body)?))
        .map_err(|_| AccessHubError::validation("accessibility_needs must be a list of strings"))?;
    state
        .store
        .update_accessibility_needs(&user.uid, req.accessibility_needs.clone())
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Accessibility needs updated successfully",
        "accessibility_needs": req.accessibility_needs
    })))
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<String>,
}

/// Parse `?limit=`, defaulting to 50 and clamping into 1..=500
pub fn list_limit(raw: Option<&str>) -> Result<usize> {
    match raw {
        None => Ok(DEFAULT_LIST_LIMIT),
        Some(s) => s
            .trim()
            .parse::<usize>()
            .map(|n| n.clamp(1, MAX_LIST_LIMIT))
            .map_err(|_| AccessHubError::validation(format!("Invalid limit '{}'", s))),
    }
}

async fn get_history_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse> {
    let limit = list_limit(query.limit.as_deref())?;
    let history = state.store.history(&user.uid, limit).await?;
    Ok(Json(json!({
        "success": true,
        "count": history.len(),
        "history": history
    })))
}

async fn add_history_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let item = json_object(body)?;
    state.store.add_history(&user.uid, item).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "History item added successfully"
        })),
    ))
}

async fn get_saved_content_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse> {
    let limit = list_limit(query.limit.as_deref())?;
    let saved = state.store.saved_content(&user.uid, limit).await?;
    Ok(Json(json!({
        "success": true,
        "count": saved.len(),
        "saved_content": saved
    })))
}

async fn save_content_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let item = json_object(body)?;
    let content_id = state.store.save_content(&user.uid, item).await?;
    tracing::info!("Content {} saved for {}", content_id, user.uid);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Content saved successfully",
            "content_id": content_id
        })),
    ))
}
