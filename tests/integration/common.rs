//! Shared helpers for integration tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use almanac::{create_router, ApiState, Authenticator, CalendarStore, Config, EmbeddedStore, RestApiConfig};

/// Build a router over a fresh in-memory store, returning the store handle
/// so tests can observe persisted state directly.
pub fn test_app() -> (Router, Arc<EmbeddedStore>) {
    let mut config = Config::default();
    config.auth.jwt_secret = "integration-test-secret".to_string();

    let store = Arc::new(EmbeddedStore::new());
    let authenticator =
        Arc::new(Authenticator::new(&config.auth).expect("secret is set in test config"));

    let state = ApiState::new(
        store.clone() as Arc<dyn CalendarStore>,
        authenticator,
        &config,
    );
    let router = create_router(state, &RestApiConfig::default());

    (router, store)
}

/// Send a JSON request and return (status, parsed body).
pub async fn send_json(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

/// Register a user and log them in, returning the bearer token.
pub async fn register_and_login(router: &Router, email: &str, timezone: &str) -> String {
    let (status, _) = send_json(
        router,
        "POST",
        "/auth/register",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": "hunter42",
            "timezone": timezone,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(
        router,
        "POST",
        "/auth/login",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": "hunter42",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    body["token"].as_str().expect("login returns a token").to_string()
}

/// Create an event via the API and return its response body.
pub async fn create_event(
    router: &Router,
    token: &str,
    title: &str,
    start: &str,
    end: &str,
    reminder_minutes: Option<i64>,
) -> (StatusCode, Value) {
    let mut body = serde_json::json!({
        "title": title,
        "startTime": start,
        "endTime": end,
    });
    if let Some(minutes) = reminder_minutes {
        body["reminderMinutes"] = minutes.into();
    }

    send_json(router, "POST", "/events", Some(token), Some(body)).await
}
