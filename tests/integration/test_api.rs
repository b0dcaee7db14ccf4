//! End-to-end tests for the REST API.

use axum::http::StatusCode;
use serde_json::json;

use almanac::CalendarStore;

use crate::common::{create_event, register_and_login, send_json, test_app};

// ============================================================================
// Registration & Login
// ============================================================================

#[tokio::test]
async fn test_register_returns_user_without_credential() {
    let (router, _store) = test_app();

    let (status, body) = send_json(
        &router,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": "ada@example.com",
            "password": "lovelace",
            "timezone": "Europe/London",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["timezone"], "Europe/London");
    // The credential never leaves the server
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_short_password_rejected() {
    let (router, _store) = test_app();

    let (status, body) = send_json(
        &router,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": "ada@example.com",
            "password": "abc",
            "timezone": "UTC",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Password must be at least 6 characters long"
    );
}

#[tokio::test]
async fn test_register_missing_fields_rejected() {
    let (router, _store) = test_app();

    let (status, _body) = send_json(
        &router,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "ada@example.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_unknown_timezone_rejected() {
    let (router, _store) = test_app();

    let (status, body) = send_json(
        &router,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": "ada@example.com",
            "password": "lovelace",
            "timezone": "Atlantis/Capital",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "unknown_timezone");
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let (router, _store) = test_app();

    let payload = json!({
        "email": "ada@example.com",
        "password": "lovelace",
        "timezone": "UTC",
    });

    let (status, _) = send_json(&router, "POST", "/auth/register", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(&router, "POST", "/auth/register", None, Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User already exists");
}

#[tokio::test]
async fn test_login_returns_token_and_calendar_ids() {
    let (router, _store) = test_app();

    send_json(
        &router,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": "ada@example.com",
            "password": "lovelace",
            "timezone": "UTC",
        })),
    )
    .await;

    let (status, body) = send_json(
        &router,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "lovelace" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().is_some());
    // Registration provisioned exactly one calendar
    assert_eq!(body["user"]["calendarIds"].as_array().unwrap().len(), 1);
    assert_eq!(body["user"]["calendarId"], body["user"]["calendarIds"][0]);
}

#[tokio::test]
async fn test_login_wrong_password_unauthorized() {
    let (router, _store) = test_app();

    send_json(
        &router,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": "ada@example.com",
            "password": "lovelace",
            "timezone": "UTC",
        })),
    )
    .await;

    let (status, body) = send_json(
        &router,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_login_unknown_email_unauthorized() {
    let (router, _store) = test_app();

    let (status, _) = send_json(
        &router,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "whatever" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Authentication boundary
// ============================================================================

#[tokio::test]
async fn test_events_require_bearer_token() {
    let (router, _store) = test_app();

    let (status, _) = send_json(
        &router,
        "POST",
        "/events",
        None,
        Some(json!({
            "title": "sneaky",
            "startTime": "2025-01-10T10:00",
            "endTime": "2025-01-10T11:00",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(
        &router,
        "GET",
        "/events?start=2025-01-01T00:00:00Z&end=2025-02-01T00:00:00Z",
        Some("not-a-real-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let (router, _store) = test_app();

    let (status, body) = send_json(&router, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// ============================================================================
// Event lifecycle
// ============================================================================

#[tokio::test]
async fn test_create_normalizes_owner_timezone() {
    let (router, _store) = test_app();
    let token = register_and_login(&router, "ny@example.com", "America/New_York").await;

    let (status, body) = create_event(
        &router,
        &token,
        "standup",
        "2025-01-10T10:00",
        "2025-01-10T11:00",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    // EST is UTC-5
    assert_eq!(body["startUtc"], "2025-01-10T15:00:00Z");
    assert_eq!(body["endUtc"], "2025-01-10T16:00:00Z");
}

#[tokio::test]
async fn test_conflict_scenario_overlap_rejected_adjacent_accepted() {
    let (router, _store) = test_app();
    let token = register_and_login(&router, "ada@example.com", "UTC").await;

    // A: 10:00-11:00
    let (status, _) = create_event(
        &router, &token, "a", "2025-01-10T10:00", "2025-01-10T11:00", None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // B: 10:30-10:45 conflicts
    let (status, body) = create_event(
        &router, &token, "b", "2025-01-10T10:30", "2025-01-10T10:45", None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Time conflict");

    // D: 11:00-12:00 is back-to-back and succeeds
    let (status, _) = create_event(
        &router, &token, "d", "2025-01-10T11:00", "2025-01-10T12:00", None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_end_before_start_rejected() {
    let (router, _store) = test_app();
    let token = register_and_login(&router, "ada@example.com", "UTC").await;

    let (status, _) = create_event(
        &router, &token, "bad", "2025-01-10T11:00", "2025-01-10T10:00", None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_window_query_returns_contained_events_only() {
    let (router, _store) = test_app();
    let token = register_and_login(&router, "ada@example.com", "UTC").await;

    create_event(&router, &token, "jan", "2025-01-10T10:00", "2025-01-10T11:00", None).await;
    create_event(&router, &token, "feb", "2025-02-10T10:00", "2025-02-10T11:00", None).await;

    let (status, body) = send_json(
        &router,
        "GET",
        "/events?start=2025-01-01T00:00:00Z&end=2025-02-01T00:00:00Z",
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let events = body.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["title"], "jan");
}

#[tokio::test]
async fn test_title_only_patch_preserves_times_and_reminder() {
    let (router, store) = test_app();
    let token = register_and_login(&router, "ada@example.com", "UTC").await;

    let (_, created) = create_event(
        &router, &token, "standup", "2030-01-10T10:00", "2030-01-10T11:00", Some(15),
    )
    .await;
    let event_id = created["id"].as_str().unwrap().to_string();
    let reminder_before = store
        .reminder_for_event(&event_id)
        .await
        .unwrap()
        .expect("reminder was scheduled");

    let (status, updated) = send_json(
        &router,
        "PATCH",
        &format!("/events/{}", event_id),
        Some(&token),
        Some(json!({ "title": "retro" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "retro");
    assert_eq!(updated["startUtc"], created["startUtc"]);
    assert_eq!(updated["endUtc"], created["endUtc"]);

    let reminder_after = store.reminder_for_event(&event_id).await.unwrap().unwrap();
    assert_eq!(reminder_after.remind_at, reminder_before.remind_at);
}

#[tokio::test]
async fn test_put_with_times_conflict_checks_excluding_self() {
    let (router, _store) = test_app();
    let token = register_and_login(&router, "ada@example.com", "UTC").await;

    let (_, created) = create_event(
        &router, &token, "a", "2025-01-10T10:00", "2025-01-10T11:00", None,
    )
    .await;
    let event_id = created["id"].as_str().unwrap();

    // Shrinking within its own slot succeeds
    let (status, updated) = send_json(
        &router,
        "PUT",
        &format!("/events/{}", event_id),
        Some(&token),
        Some(json!({
            "startTime": "2025-01-10T10:15",
            "endTime": "2025-01-10T10:45",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["startUtc"], "2025-01-10T10:15:00Z");
}

#[tokio::test]
async fn test_update_conflict_rejected_and_event_unchanged() {
    let (router, store) = test_app();
    let token = register_and_login(&router, "ada@example.com", "UTC").await;

    create_event(&router, &token, "a", "2025-01-10T10:00", "2025-01-10T11:00", None).await;
    let (_, created) = create_event(
        &router, &token, "b", "2025-01-10T12:00", "2025-01-10T13:00", None,
    )
    .await;
    let event_id = created["id"].as_str().unwrap();

    let (status, body) = send_json(
        &router,
        "PUT",
        &format!("/events/{}", event_id),
        Some(&token),
        Some(json!({
            "startTime": "2025-01-10T10:30",
            "endTime": "2025-01-10T10:45",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Time conflict");

    let stored = store.get_event(event_id).await.unwrap().unwrap();
    assert_eq!(stored.start_utc.to_rfc3339(), "2025-01-10T12:00:00+00:00");
}

#[tokio::test]
async fn test_clearing_reminder_minutes_deletes_reminder() {
    let (router, store) = test_app();
    let token = register_and_login(&router, "ada@example.com", "UTC").await;

    let (_, created) = create_event(
        &router, &token, "standup", "2030-01-10T10:00", "2030-01-10T11:00", Some(15),
    )
    .await;
    let event_id = created["id"].as_str().unwrap().to_string();
    assert!(store.reminder_for_event(&event_id).await.unwrap().is_some());

    let (status, _) = send_json(
        &router,
        "PATCH",
        &format!("/events/{}", event_id),
        Some(&token),
        Some(json!({ "reminderMinutes": 0 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(store.reminder_for_event(&event_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_null_reminder_minutes_also_clears() {
    let (router, store) = test_app();
    let token = register_and_login(&router, "ada@example.com", "UTC").await;

    let (_, created) = create_event(
        &router, &token, "standup", "2030-01-10T10:00", "2030-01-10T11:00", Some(15),
    )
    .await;
    let event_id = created["id"].as_str().unwrap().to_string();

    let (status, _) = send_json(
        &router,
        "PATCH",
        &format!("/events/{}", event_id),
        Some(&token),
        Some(json!({ "reminderMinutes": null })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(store.reminder_for_event(&event_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_removes_event_and_cascades_reminder() {
    let (router, store) = test_app();
    let token = register_and_login(&router, "ada@example.com", "UTC").await;

    let (_, created) = create_event(
        &router, &token, "standup", "2030-01-10T10:00", "2030-01-10T11:00", Some(15),
    )
    .await;
    let event_id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send_json(
        &router,
        "DELETE",
        &format!("/events/{}", event_id),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(store.get_event(&event_id).await.unwrap().is_none());
    assert!(store.reminder_for_event(&event_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_missing_event_not_found() {
    let (router, _store) = test_app();
    let token = register_and_login(&router, "ada@example.com", "UTC").await;

    let (status, _) = send_json(&router, "DELETE", "/events/no-such-id", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cross_user_delete_forbidden() {
    let (router, store) = test_app();
    let owner_token = register_and_login(&router, "owner@example.com", "UTC").await;
    let intruder_token = register_and_login(&router, "intruder@example.com", "UTC").await;

    let (_, created) = create_event(
        &router, &owner_token, "private", "2025-01-10T10:00", "2025-01-10T11:00", None,
    )
    .await;
    let event_id = created["id"].as_str().unwrap().to_string();

    let (status, _) = send_json(
        &router,
        "DELETE",
        &format!("/events/{}", event_id),
        Some(&intruder_token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    // The event is untouched
    assert!(store.get_event(&event_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_cross_user_update_forbidden() {
    let (router, _store) = test_app();
    let owner_token = register_and_login(&router, "owner@example.com", "UTC").await;
    let intruder_token = register_and_login(&router, "intruder@example.com", "UTC").await;

    let (_, created) = create_event(
        &router, &owner_token, "private", "2025-01-10T10:00", "2025-01-10T11:00", None,
    )
    .await;
    let event_id = created["id"].as_str().unwrap();

    let (status, _) = send_json(
        &router,
        "PATCH",
        &format!("/events/{}", event_id),
        Some(&intruder_token),
        Some(json!({ "title": "hijacked" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_users_calendars_are_isolated() {
    let (router, _store) = test_app();
    let ada_token = register_and_login(&router, "ada@example.com", "UTC").await;
    let bob_token = register_and_login(&router, "bob@example.com", "UTC").await;

    create_event(&router, &ada_token, "ada's", "2025-01-10T10:00", "2025-01-10T11:00", None).await;

    // Bob can book the same slot: conflicts are per-calendar
    let (status, _) = create_event(
        &router, &bob_token, "bob's", "2025-01-10T10:00", "2025-01-10T11:00", None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // And Bob's window only contains his own event
    let (_, body) = send_json(
        &router,
        "GET",
        "/events?start=2025-01-01T00:00:00Z&end=2025-02-01T00:00:00Z",
        Some(&bob_token),
        None,
    )
    .await;
    let events = body.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["title"], "bob's");
}
