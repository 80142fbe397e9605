//! Integration tests for the survey and profile HTTP API.
//!
//! Requests go straight into the axum router via `oneshot`, backed by an
//! in-memory SQLite profile store.

use access_hub::{
    RecommendationEngine,
    auth::StaticTokenVerifier,
    config::Config,
    http::{AppState, router},
    store::SqliteProfileStore,
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const TOKEN: &str = "test-token";
const OTHER_TOKEN: &str = "other-token";

fn app() -> Router {
    let verifier = StaticTokenVerifier::default()
        .with_token(TOKEN, "user-1", Some("one@example.com"))
        .with_token(OTHER_TOKEN, "user-2", None);
    router(AppState {
        config: Arc::new(Config::default()),
        engine: Arc::new(RecommendationEngine::new()),
        store: Arc::new(SqliteProfileStore::open_in_memory().unwrap()),
        verifier: Arc::new(verifier),
    })
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    match body {
        Some(b) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_health_and_index_are_public() {
    let app = app();
    let (status, body) = send(&app, request("GET", "/api/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, request("GET", "/", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["health"], "/api/health");
}

#[tokio::test]
async fn test_questions_catalog() {
    let app = app();
    let (status, body) = send(&app, request("GET", "/api/survey/questions", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 8);
    assert_eq!(questions[0]["id"], "q1");
    assert_eq!(questions[0]["type"], "multiple_choice");
    assert_eq!(questions[7]["options"][1], "Spanish");
}

#[tokio::test]
async fn test_missing_and_invalid_tokens_are_rejected() {
    let app = app();
    let submit = json!({"responses": {}});

    let (status, body) = send(
        &app,
        request("POST", "/api/survey/submit", None, Some(submit.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token is missing");

    let (status, body) = send(
        &app,
        request("POST", "/api/survey/submit", Some("forged"), Some(submit)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn test_submit_then_read_back() {
    let app = app();
    let responses = json!({
        "q1": ["Dyslexia support", "Visual impairment", "Cognitive disability"],
        "q3": "High School (Grade 9-12)",
        "q4": "Yes",
        "q7": "All of the above",
        "q8": "Spanish"
    });

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/survey/submit",
            Some(TOKEN),
            Some(json!({ "responses": responses })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let plan = &body["recommendations"];
    assert_eq!(plan["priority"], "high");
    assert_eq!(plan["settings"]["target_grade"], 10);
    assert_eq!(plan["settings"]["language"], "es-ES");
    assert_eq!(plan["settings"]["alt_text_generation"], true);
    let adaptations = plan["adaptations"].as_array().unwrap();
    for tag in ["dyslexia_font", "screen_reader_optimized", "diagram_to_text"] {
        assert!(adaptations.contains(&json!(tag)), "missing {tag}");
    }

    let (status, stored) = send(
        &app,
        request("GET", "/api/survey/responses", Some(TOKEN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["responses"], responses);
    assert_eq!(stored["completed"], true);
    assert_eq!(&stored["recommendations"], plan);

    let (status, regenerated) = send(
        &app,
        request("GET", "/api/survey/recommendations", Some(TOKEN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&regenerated["recommendations"], plan);
}

#[tokio::test]
async fn test_submit_without_responses_key_uses_empty_survey() {
    let app = app();
    let (status, body) = send(
        &app,
        request("POST", "/api/survey/submit", Some(TOKEN), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let plan = &body["recommendations"];
    assert_eq!(plan["priority"], "low");
    assert_eq!(plan["settings"]["target_grade"], 12);
    assert_eq!(plan["settings"]["language"], "en-US");
    assert_eq!(plan["adaptations"], json!([]));
    assert_eq!(plan["features"], json!([]));
}

#[tokio::test]
async fn test_submit_rejects_malformed_json() {
    let app = app();
    let req = Request::builder()
        .method("POST")
        .uri("/api/survey/submit")
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_reads_without_profile_are_not_found() {
    let app = app();
    for uri in [
        "/api/survey/responses",
        "/api/survey/recommendations",
        "/api/user/profile",
        "/api/user/preferences",
        "/api/user/accessibility-needs",
    ] {
        let (status, body) = send(&app, request("GET", uri, Some(TOKEN), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"], "Profile not found");
    }
}

#[tokio::test]
async fn test_profiles_are_isolated_per_user() {
    let app = app();
    send(
        &app,
        request(
            "POST",
            "/api/survey/submit",
            Some(TOKEN),
            Some(json!({"responses": {"q8": "German"}})),
        ),
    )
    .await;
    let (status, _) = send(
        &app,
        request("GET", "/api/survey/responses", Some(OTHER_TOKEN), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_and_preferences_updates() {
    let app = app();
    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/api/user/profile",
            Some(TOKEN),
            Some(json!({"display_name": "Ada"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["display_name"], "Ada");
    assert_eq!(body["profile"]["email"], "one@example.com");
    assert_eq!(body["profile"]["preferences"]["theme"], "light");
    assert_eq!(body["profile"]["survey_completed"], false);

    let prefs = json!({"theme": "dark", "tts_speed": 1.2});
    let (status, body) = send(
        &app,
        request("PUT", "/api/user/preferences", Some(TOKEN), Some(prefs.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["preferences"], prefs);

    let (_, body) = send(&app, request("GET", "/api/user/preferences", Some(TOKEN), None)).await;
    assert_eq!(body["preferences"], prefs);

    let (status, _) = send(
        &app,
        request("PUT", "/api/user/preferences", Some(TOKEN), Some(json!(["dark"]))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_accessibility_needs_round_trip() {
    let app = app();
    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/api/user/accessibility-needs",
            Some(TOKEN),
            Some(json!({"accessibility_needs": ["dyslexia", "low_vision"]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accessibility_needs"], json!(["dyslexia", "low_vision"]));

    let (_, body) = send(
        &app,
        request("GET", "/api/user/accessibility-needs", Some(TOKEN), None),
    )
    .await;
    assert_eq!(body["accessibility_needs"], json!(["dyslexia", "low_vision"]));
}

#[tokio::test]
async fn test_history_add_and_list() {
    let app = app();
    for name in ["a.pdf", "b.pdf"] {
        let (status, _) = send(
            &app,
            request(
                "POST",
                "/api/user/history",
                Some(TOKEN),
                Some(json!({"action": "document_processed", "file_name": name})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        request("GET", "/api/user/history?limit=1", Some(TOKEN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["history"][0]["file_name"], "b.pdf");
    assert!(body["history"][0]["timestamp"].is_string());

    let (status, _) = send(
        &app,
        request("GET", "/api/user/history?limit=lots", Some(TOKEN), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_server_fields_override_client_fields() {
    let app = app();
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/user/history",
            Some(TOKEN),
            Some(json!({"action": "x", "timestamp": "x", "id": "y"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let resp = app
        .clone()
        .oneshot(request("GET", "/api/user/history", Some(TOKEN), None))
        .await
        .unwrap();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let raw = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(raw.matches("\"timestamp\"").count(), 1, "{raw}");
    assert_eq!(raw.matches("\"id\"").count(), 1, "{raw}");

    let body: Value = serde_json::from_str(&raw).unwrap();
    let entry = &body["history"][0];
    assert!(entry["id"].is_i64());
    assert_ne!(entry["timestamp"], "x");
    assert_eq!(entry["action"], "x");
}

#[tokio::test]
async fn test_saved_content_save_and_list() {
    let app = app();
    let mut ids = Vec::new();
    for title in ["Simplified Research Article", "Lecture audio"] {
        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/user/saved-content",
                Some(TOKEN),
                Some(json!({
                    "title": title,
                    "content_type": "simplified_text",
                    "adaptations": ["simplify", "tts"]
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Content saved successfully");
        ids.push(body["content_id"].as_i64().unwrap());
    }

    let (status, body) = send(
        &app,
        request("GET", "/api/user/saved-content", Some(TOKEN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    let saved = body["saved_content"].as_array().unwrap();
    assert_eq!(saved[0]["id"], ids[1]);
    assert_eq!(saved[0]["title"], "Lecture audio");
    assert_eq!(saved[1]["adaptations"], json!(["simplify", "tts"]));
    assert!(saved[1]["saved_at"].is_string());

    let (_, body) = send(
        &app,
        request("GET", "/api/user/saved-content?limit=1", Some(TOKEN), None),
    )
    .await;
    assert_eq!(body["count"], 1);

    let (_, body) = send(
        &app,
        request("GET", "/api/user/saved-content", Some(OTHER_TOKEN), None),
    )
    .await;
    assert_eq!(body["count"], 0);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/user/saved-content",
            Some(TOKEN),
            Some(json!("just text")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_lookup_is_owner_only() {
    let app = app();
    let (status, body) = send(
        &app,
        request("GET", "/api/auth/user/user-2", Some(TOKEN), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Unauthorized access");

    let (status, _) = send(&app, request("GET", "/api/auth/user/user-1", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        request("GET", "/api/auth/user/user-1", Some(TOKEN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["uid"], "user-1");
    assert_eq!(body["user"]["email"], "one@example.com");
    assert!(body["profile"].is_null());

    send(
        &app,
        request(
            "PUT",
            "/api/user/profile",
            Some(TOKEN),
            Some(json!({"display_name": "Ada"})),
        ),
    )
    .await;
    let (_, body) = send(
        &app,
        request("GET", "/api/auth/user/user-1", Some(TOKEN), None),
    )
    .await;
    assert_eq!(body["user"]["display_name"], "Ada");
    assert_eq!(body["profile"]["display_name"], "Ada");
}

#[tokio::test]
async fn test_verify_endpoint() {
    let app = app();
    let (status, body) = send(
        &app,
        request("POST", "/api/auth/verify", None, Some(json!({"token": TOKEN}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["uid"], "user-1");
    assert!(body["user"]["display_name"].is_null());

    send(
        &app,
        request(
            "PUT",
            "/api/user/profile",
            Some(TOKEN),
            Some(json!({"display_name": "Ada"})),
        ),
    )
    .await;
    let (_, body) = send(
        &app,
        request("POST", "/api/auth/verify", None, Some(json!({"token": TOKEN}))),
    )
    .await;
    assert_eq!(body["user"]["display_name"], "Ada");
    assert_eq!(body["user"]["email"], "one@example.com");

    let (status, body) = send(&app, request("POST", "/api/auth/verify", None, Some(json!({})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Token is required");

    let (status, _) = send(
        &app,
        request("POST", "/api/auth/verify", None, Some(json!({"token": "nope"}))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_route_uses_envelope() {
    let app = app();
    let (status, body) = send(&app, request("GET", "/api/nowhere", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Resource not found");
}
