//! REST API router and configuration.

use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{
    create_event_handler, delete_event_handler, health_handler, list_events_handler,
    login_handler, register_handler, update_event_handler, ApiState,
};
use crate::auth::AuthLayer;

/// REST API configuration.
#[derive(Debug, Clone)]
pub struct RestApiConfig {
    /// Enable CORS.
    pub enable_cors: bool,
}

impl Default for RestApiConfig {
    fn default() -> Self {
        Self { enable_cors: true }
    }
}

/// Create the REST API router.
///
/// Endpoints:
/// - POST   /auth/register   - Register a user (+ their calendar)
/// - POST   /auth/login      - Obtain a bearer token
/// - POST   /events          - Create an event
/// - GET    /events          - List events in a UTC window
/// - PUT    /events/:id      - Update an event
/// - PATCH  /events/:id      - Update an event (same semantics as PUT)
/// - DELETE /events/:id      - Delete an event
/// - GET    /health          - Liveness probe
///
/// Everything outside `/auth/*`, `/health` and `/` requires a bearer token,
/// enforced by [`AuthLayer`] before any handler runs.
pub fn create_router(state: ApiState, config: &RestApiConfig) -> Router {
    let auth_layer = AuthLayer::new(state.authenticator.clone());
    let state = Arc::new(state);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route(
            "/events",
            post(create_event_handler).get(list_events_handler),
        )
        .route(
            "/events/:id",
            axum::routing::put(update_event_handler)
                .patch(update_event_handler)
                .delete(delete_event_handler),
        )
        .layer(auth_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_origin(Any);

        router.layer(cors)
    } else {
        router
    }
}
