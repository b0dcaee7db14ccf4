//! End-to-end tests for the reminder dispatch worker.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};

use almanac::{CalendarStore, ReminderWorker};

use crate::common::{create_event, register_and_login, test_app};

#[tokio::test]
async fn test_api_created_reminder_is_dispatched_once_due() {
    let (router, store) = test_app();
    let token = register_and_login(&router, "ada@example.com", "UTC").await;

    // Event two hours out with a one-hour lead: due in about an hour
    let start = Utc::now() + ChronoDuration::hours(2);
    let end = start + ChronoDuration::hours(1);
    let (_, created) = create_event(
        &router,
        &token,
        "launch",
        &start.format("%Y-%m-%dT%H:%M:%S").to_string(),
        &end.format("%Y-%m-%dT%H:%M:%S").to_string(),
        Some(60),
    )
    .await;
    let event_id = created["id"].as_str().unwrap().to_string();

    let reminder = store
        .reminder_for_event(&event_id)
        .await
        .unwrap()
        .expect("reminder scheduled at creation");
    assert!(!reminder.sent);

    let worker = ReminderWorker::new(
        store.clone() as Arc<dyn CalendarStore>,
        Duration::from_secs(60),
    );

    // Not yet due: the tick must not touch it
    worker.tick(Utc::now()).await;
    let untouched = store.reminder_for_event(&event_id).await.unwrap().unwrap();
    assert!(!untouched.sent);

    // A tick after the fire time delivers and marks it sent
    worker.tick(reminder.remind_at + ChronoDuration::seconds(1)).await;
    let delivered = store.reminder_for_event(&event_id).await.unwrap().unwrap();
    assert!(delivered.sent);
}

#[tokio::test]
async fn test_past_lead_marks_sent_without_dispatch() {
    let (router, store) = test_app();
    let token = register_and_login(&router, "ada@example.com", "UTC").await;

    // Event 30 minutes out with a 2-hour lead: the fire time is already past
    let start = Utc::now() + ChronoDuration::minutes(30);
    let end = start + ChronoDuration::hours(1);
    let (_, created) = create_event(
        &router,
        &token,
        "retro",
        &start.format("%Y-%m-%dT%H:%M:%S").to_string(),
        &end.format("%Y-%m-%dT%H:%M:%S").to_string(),
        Some(120),
    )
    .await;
    let event_id = created["id"].as_str().unwrap().to_string();

    let reminder = store.reminder_for_event(&event_id).await.unwrap().unwrap();
    assert!(reminder.sent, "a reminder already in the past is marked sent at scheduling");

    // Nothing is due for the worker
    let due = store.due_reminders(Utc::now()).await.unwrap();
    assert!(due.is_empty());
}

#[tokio::test]
async fn test_worker_survives_broken_records() {
    let (router, store) = test_app();
    let token = register_and_login(&router, "ada@example.com", "UTC").await;

    // A reminder whose event vanished (inserted behind the API's back)
    store
        .upsert_reminder(almanac::Reminder::new(
            "ghost-event",
            Utc::now() - ChronoDuration::minutes(5),
            false,
        ))
        .await
        .unwrap();

    let start = Utc::now() + ChronoDuration::hours(2);
    let end = start + ChronoDuration::hours(1);
    let (_, created) = create_event(
        &router,
        &token,
        "healthy",
        &start.format("%Y-%m-%dT%H:%M:%S").to_string(),
        &end.format("%Y-%m-%dT%H:%M:%S").to_string(),
        Some(60),
    )
    .await;
    let event_id = created["id"].as_str().unwrap().to_string();
    let remind_at = store
        .reminder_for_event(&event_id)
        .await
        .unwrap()
        .unwrap()
        .remind_at;

    let worker = ReminderWorker::new(
        store.clone() as Arc<dyn CalendarStore>,
        Duration::from_secs(60),
    );
    worker.tick(remind_at + ChronoDuration::seconds(1)).await;

    // The healthy reminder was delivered despite the broken record,
    // which stays unsent for the next tick (at-least-once)
    assert!(store.reminder_for_event(&event_id).await.unwrap().unwrap().sent);
    assert!(!store.reminder_for_event("ghost-event").await.unwrap().unwrap().sent);
}
