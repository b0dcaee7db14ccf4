//! Stored entity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique id.
    pub id: String,
    /// Unique email address.
    pub email: String,
    /// Bcrypt hash of the password. Never exposed through the API.
    pub password_hash: String,
    /// IANA timezone name, used to interpret the user's wall-clock input.
    pub timezone: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh id.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>, timezone: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            email: email.into(),
            password_hash: password_hash.into(),
            timezone: timezone.into(),
            created_at: Utc::now(),
        }
    }
}

/// A calendar owned by exactly one user.
///
/// Registration provisions one calendar per user; the lifecycle layer
/// resolves "the caller's calendar" as the first one owned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

impl Calendar {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            owner_id: owner_id.into(),
            created_at: Utc::now(),
        }
    }
}

/// A scheduled event within a calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub calendar_id: String,
    /// Non-empty title.
    pub title: String,
    /// Absolute start instant.
    pub start_utc: DateTime<Utc>,
    /// Absolute end instant, strictly after `start_utc`.
    pub end_utc: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(
        calendar_id: impl Into<String>,
        title: impl Into<String>,
        start_utc: DateTime<Utc>,
        end_utc: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            calendar_id: calendar_id.into(),
            title: title.into(),
            start_utc,
            end_utc,
            created_at: now,
            updated_at: now,
        }
    }

    /// Half-open interval overlap: `[start, end)` against `[self.start, self.end)`.
    /// Back-to-back events do not overlap.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_utc < end && self.end_utc > start
    }
}

/// Partial update applied to a stored event.
#[derive(Debug, Clone, Default)]
pub struct EventChanges {
    pub title: Option<String>,
    pub start_utc: Option<DateTime<Utc>>,
    pub end_utc: Option<DateTime<Utc>>,
}

impl EventChanges {
    /// Apply the changes to an event, bumping `updated_at`.
    pub fn apply_to(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(start) = self.start_utc {
            event.start_utc = start;
        }
        if let Some(end) = self.end_utc {
            event.end_utc = end;
        }
        event.updated_at = Utc::now();
    }
}

/// A reminder attached to exactly one event (at most one per event).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub event_id: String,
    /// Absolute instant the reminder becomes due.
    pub remind_at: DateTime<Utc>,
    /// Delivery flag, monotonic false -> true.
    pub sent: bool,
}

impl Reminder {
    pub fn new(event_id: impl Into<String>, remind_at: DateTime<Utc>, sent: bool) -> Self {
        Self {
            id: new_id(),
            event_id: event_id.into(),
            remind_at,
            sent,
        }
    }
}
