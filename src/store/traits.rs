//! Store trait definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StorageError;
use crate::store::types::{Calendar, Event, EventChanges, Reminder, User};

/// Trait for calendar storage backends.
///
/// All reads reflect the latest committed state at call time; nothing is
/// cached above this seam. The overlap check and a subsequent event write
/// are two separate calls and are not atomic against concurrent writers;
/// see DESIGN.md for the planned storage-level exclusion.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    // ========================================================================
    // Users
    // ========================================================================

    /// Create a user. Fails with [`StorageError::Duplicate`] when the email
    /// is already registered.
    async fn create_user(&self, user: User) -> Result<User, StorageError>;

    /// Get a user by id.
    async fn get_user(&self, id: &str) -> Result<Option<User>, StorageError>;

    /// Find a user by exact email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    // ========================================================================
    // Calendars
    // ========================================================================

    /// Create a calendar.
    async fn create_calendar(&self, calendar: Calendar) -> Result<Calendar, StorageError>;

    /// Get a calendar by id.
    async fn get_calendar(&self, id: &str) -> Result<Option<Calendar>, StorageError>;

    /// List a user's calendars in creation order.
    async fn calendars_for_owner(&self, owner_id: &str) -> Result<Vec<Calendar>, StorageError>;

    // ========================================================================
    // Events
    // ========================================================================

    /// Create an event.
    async fn create_event(&self, event: Event) -> Result<Event, StorageError>;

    /// Get an event by id.
    async fn get_event(&self, id: &str) -> Result<Option<Event>, StorageError>;

    /// Apply partial changes to an event. Fails with
    /// [`StorageError::NotFound`] when the event does not exist.
    async fn update_event(&self, id: &str, changes: EventChanges) -> Result<Event, StorageError>;

    /// Delete an event and, by cascade, its reminder. Returns false when the
    /// event did not exist.
    async fn delete_event(&self, id: &str) -> Result<bool, StorageError>;

    /// Events in a calendar whose interval lies fully within
    /// `[start, end]`, inclusive on both bounds, ordered by start.
    async fn events_in_range(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>, StorageError>;

    /// First event in the calendar, other than `exclude`, whose `[start, end)`
    /// interval intersects the given one. Half-open: back-to-back events do
    /// not match.
    async fn find_overlapping(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<&str>,
    ) -> Result<Option<Event>, StorageError>;

    // ========================================================================
    // Reminders
    // ========================================================================

    /// Get the reminder attached to an event, if any.
    async fn reminder_for_event(&self, event_id: &str) -> Result<Option<Reminder>, StorageError>;

    /// Insert or replace the reminder for `reminder.event_id`, keeping at
    /// most one reminder per event. Replacing updates `remind_at` and `sent`
    /// in place; the stored reminder keeps its original id.
    async fn upsert_reminder(&self, reminder: Reminder) -> Result<Reminder, StorageError>;

    /// Delete the reminder for an event. Returns false when none existed.
    async fn delete_reminder_for_event(&self, event_id: &str) -> Result<bool, StorageError>;

    /// All reminders with `sent = false` and `remind_at <= now`, ordered by
    /// `remind_at`.
    async fn due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>, StorageError>;

    /// Mark a reminder delivered. Fails with [`StorageError::NotFound`] when
    /// the reminder does not exist.
    async fn mark_reminder_sent(&self, id: &str) -> Result<(), StorageError>;
}
