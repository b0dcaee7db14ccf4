//! REST API request handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

use crate::auth::{self, AuthContext, Authenticator};
use crate::config::Config;
use crate::error::{SchedulingError, StorageError, TimeError};
use crate::scheduling::{EventManager, NewEvent, ReminderPatch, UpdateEvent};
use crate::store::{Calendar, CalendarStore, Event, User};
use crate::time;

/// Application state shared across handlers.
pub struct ApiState {
    pub store: Arc<dyn CalendarStore>,
    pub events: EventManager,
    pub authenticator: Arc<Authenticator>,
    min_password_length: usize,
}

impl ApiState {
    /// Create new API state.
    pub fn new(
        store: Arc<dyn CalendarStore>,
        authenticator: Arc<Authenticator>,
        config: &Config,
    ) -> Self {
        Self {
            events: EventManager::new(store.clone()),
            store,
            authenticator,
            min_password_length: config.auth.min_password_length,
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Registration request.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub timezone: Option<String>,
}

/// Login request.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Event creation request. Times are local wall-clock strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub reminder_minutes: Option<i64>,
}

/// Event update request.
///
/// `reminderMinutes` is tri-state: omitted leaves the reminder untouched,
/// an explicit `null` or `0` clears it, a positive value reschedules.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub reminder_minutes: Option<Option<i64>>,
}

/// Distinguish an omitted field (outer None) from an explicit null (inner None).
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

/// Query window for listing events, RFC 3339 UTC instants.
#[derive(Debug, Clone, Deserialize)]
pub struct WindowQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// User summary, safe to return (never includes the credential).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            timezone: user.timezone.clone(),
            created_at: user.created_at,
        }
    }
}

/// Registration response.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub user: UserResponse,
}

/// Login response, including the caller's calendar ids.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub id: String,
    pub email: String,
    pub timezone: String,
    pub calendar_id: Option<String>,
    pub calendar_ids: Vec<String>,
}

/// Event representation on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: String,
    pub calendar_id: String,
    pub title: String,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            calendar_id: event.calendar_id,
            title: event.title,
            start_utc: event.start_utc,
            end_utc: event.end_utc,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

/// Delete response.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

fn error_response(status: StatusCode, error: impl Into<String>, code: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
        .into_response()
}

/// Map a scheduling failure to its HTTP representation.
fn scheduling_error_response(err: SchedulingError) -> Response {
    match err {
        SchedulingError::TimeConflict => {
            error_response(StatusCode::BAD_REQUEST, "Time conflict", "time_conflict")
        }
        SchedulingError::Forbidden => {
            error_response(StatusCode::FORBIDDEN, "Forbidden", "forbidden")
        }
        SchedulingError::EventNotFound(_) => {
            error_response(StatusCode::NOT_FOUND, "Event not found", "not_found")
        }
        SchedulingError::UserNotFound(_) => {
            error_response(StatusCode::UNAUTHORIZED, "Unauthorized", "unauthorized")
        }
        SchedulingError::EmptyTitle | SchedulingError::InvalidRange => {
            error_response(StatusCode::BAD_REQUEST, err.to_string(), "validation_failed")
        }
        SchedulingError::Time(e) => {
            let code = match e {
                TimeError::UnknownTimezone(_) => "unknown_timezone",
                _ => "invalid_time",
            };
            error_response(StatusCode::BAD_REQUEST, e.to_string(), code)
        }
        SchedulingError::CalendarMissing(_) | SchedulingError::Storage(_) => {
            tracing::error!("Event operation failed: {}", err);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                "internal",
            )
        }
    }
}

fn internal_error(context: &str, err: impl std::fmt::Display) -> Response {
    tracing::error!("{}: {}", context, err);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
        "internal",
    )
}

// ============================================================================
// Auth Handlers
// ============================================================================

/// POST /auth/register - Create a user and their calendar.
pub async fn register_handler(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<RegisterRequest>,
) -> Response {
    let (email, password, timezone) = match (&request.email, &request.password, &request.timezone) {
        (Some(e), Some(p), Some(t)) if !e.is_empty() && !p.is_empty() && !t.is_empty() => {
            (e.clone(), p.clone(), t.clone())
        }
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Email, password and timezone are required",
                "missing_fields",
            );
        }
    };

    if password.len() < state.min_password_length {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!(
                "Password must be at least {} characters long",
                state.min_password_length
            ),
            "weak_password",
        );
    }

    if !time::is_valid_zone(&timezone) {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Unknown timezone: {}", timezone),
            "unknown_timezone",
        );
    }

    let password_hash = match auth::hash_password(&password).await {
        Ok(hash) => hash,
        Err(e) => return internal_error("Password hashing failed", e),
    };

    let user = match state
        .store
        .create_user(User::new(&email, password_hash, &timezone))
        .await
    {
        Ok(user) => user,
        Err(StorageError::Duplicate(_)) => {
            return error_response(StatusCode::CONFLICT, "User already exists", "duplicate_email");
        }
        Err(e) => return internal_error("User creation failed", e),
    };

    // One calendar per new user, provisioned alongside registration
    if let Err(e) = state.store.create_calendar(Calendar::new(&user.id)).await {
        return internal_error("Calendar creation failed", e);
    }

    (
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            user: UserResponse::from(&user),
        }),
    )
        .into_response()
}

/// POST /auth/login - Verify credentials and issue a bearer token.
pub async fn login_handler(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<LoginRequest>,
) -> Response {
    let (email, password) = match (&request.email, &request.password) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e.clone(), p.clone()),
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Email and password are required",
                "missing_fields",
            );
        }
    };

    let user = match state.store.find_user_by_email(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "Invalid email or password",
                "invalid_credentials",
            );
        }
        Err(e) => return internal_error("User lookup failed", e),
    };

    match auth::verify_password(&password, &user.password_hash).await {
        Ok(true) => {}
        Ok(false) => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "Invalid email or password",
                "invalid_credentials",
            );
        }
        Err(e) => return internal_error("Password verification failed", e),
    }

    let token = match state.authenticator.generate_token(&user.id, &user.email) {
        Ok(token) => token,
        Err(e) => return internal_error("Token generation failed", e),
    };

    let calendar_ids: Vec<String> = match state.store.calendars_for_owner(&user.id).await {
        Ok(calendars) => calendars.into_iter().map(|c| c.id).collect(),
        Err(e) => return internal_error("Calendar lookup failed", e),
    };

    (
        StatusCode::OK,
        Json(LoginResponse {
            success: true,
            token,
            user: LoginUser {
                id: user.id,
                email: user.email,
                timezone: user.timezone,
                calendar_id: calendar_ids.first().cloned(),
                calendar_ids,
            },
        }),
    )
        .into_response()
}

// ============================================================================
// Event Handlers
// ============================================================================

/// POST /events - Create an event in the caller's calendar.
pub async fn create_event_handler(
    State(state): State<Arc<ApiState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<CreateEventRequest>,
) -> Response {
    let (title, start_time, end_time) =
        match (&request.title, &request.start_time, &request.end_time) {
            (Some(t), Some(s), Some(e)) => (t.clone(), s.clone(), e.clone()),
            _ => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "title, startTime and endTime are required",
                    "missing_fields",
                );
            }
        };

    let input = NewEvent {
        title,
        start_time,
        end_time,
        reminder_minutes: request.reminder_minutes,
    };

    match state.events.create(&ctx.user_id, input).await {
        Ok(event) => (StatusCode::OK, Json(EventResponse::from(event))).into_response(),
        Err(e) => scheduling_error_response(e),
    }
}

/// GET /events?start&end - Events in the caller's calendar within the window.
pub async fn list_events_handler(
    State(state): State<Arc<ApiState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(window): Query<WindowQuery>,
) -> Response {
    let (Some(start), Some(end)) = (&window.start, &window.end) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "start and end query parameters are required",
            "missing_fields",
        );
    };

    let (Ok(start), Ok(end)) = (
        DateTime::parse_from_rfc3339(start),
        DateTime::parse_from_rfc3339(end),
    ) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "start and end must be RFC 3339 instants",
            "invalid_time",
        );
    };

    match state
        .events
        .events_in_window(&ctx.user_id, start.with_timezone(&Utc), end.with_timezone(&Utc))
        .await
    {
        Ok(events) => {
            let events: Vec<EventResponse> = events.into_iter().map(EventResponse::from).collect();
            (StatusCode::OK, Json(events)).into_response()
        }
        Err(e) => scheduling_error_response(e),
    }
}

/// PUT/PATCH /events/:id - Update an event.
pub async fn update_event_handler(
    State(state): State<Arc<ApiState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(event_id): Path<String>,
    Json(request): Json<UpdateEventRequest>,
) -> Response {
    let input = UpdateEvent {
        title: request.title,
        start_time: request.start_time,
        end_time: request.end_time,
        reminder: ReminderPatch::from_minutes(request.reminder_minutes),
    };

    match state.events.update(&ctx.user_id, &event_id, input).await {
        Ok(event) => (StatusCode::OK, Json(EventResponse::from(event))).into_response(),
        Err(e) => scheduling_error_response(e),
    }
}

/// DELETE /events/:id - Delete an event and its reminder.
pub async fn delete_event_handler(
    State(state): State<Arc<ApiState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(event_id): Path<String>,
) -> Response {
    match state.events.delete(&ctx.user_id, &event_id).await {
        Ok(()) => (StatusCode::OK, Json(DeleteResponse { success: true })).into_response(),
        Err(e) => scheduling_error_response(e),
    }
}

/// GET /health - Liveness probe.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
