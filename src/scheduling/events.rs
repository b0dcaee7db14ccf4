//! Event lifecycle management.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::SchedulingError;
use crate::scheduling::reminders::{ReminderPatch, ReminderScheduler};
use crate::store::{CalendarStore, Event, EventChanges};
use crate::time::to_utc;

/// Input for creating an event. Times are wall-clock strings interpreted in
/// the owner's stored timezone.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    /// Positive lead minutes schedule a reminder; anything else is ignored.
    pub reminder_minutes: Option<i64>,
}

/// Input for a full or partial event update.
///
/// Start and end only take effect when both are supplied; a lone bound is
/// ignored, matching the wire contract.
#[derive(Debug, Clone, Default)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub reminder: ReminderPatch,
}

/// Manager for event lifecycle operations over a user's calendar.
///
/// Coordinates time normalization, conflict detection and reminder
/// scheduling around the store. The conflict check and the subsequent write
/// are not atomic against concurrent writers; see DESIGN.md.
#[derive(Clone)]
pub struct EventManager {
    store: Arc<dyn CalendarStore>,
    reminders: ReminderScheduler,
}

impl EventManager {
    pub fn new(store: Arc<dyn CalendarStore>) -> Self {
        let reminders = ReminderScheduler::new(store.clone());
        Self { store, reminders }
    }

    /// True iff an event other than `exclude` occupies part of
    /// `[start, end)` in the calendar. Reads the latest committed state.
    pub async fn has_conflict(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<&str>,
    ) -> Result<bool, SchedulingError> {
        let hit = self
            .store
            .find_overlapping(calendar_id, start, end, exclude)
            .await?;
        Ok(hit.is_some())
    }

    /// Create an event in the caller's calendar.
    ///
    /// Validation and the conflict check run before any write. A requested
    /// reminder is scheduled after the event persists; scheduling failure is
    /// logged and does not fail the creation.
    pub async fn create(&self, user_id: &str, input: NewEvent) -> Result<Event, SchedulingError> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| SchedulingError::UserNotFound(user_id.to_string()))?;
        let calendar = self.first_calendar(user_id).await?;

        if input.title.trim().is_empty() {
            return Err(SchedulingError::EmptyTitle);
        }

        let start_utc = to_utc(&input.start_time, &user.timezone)?;
        let end_utc = to_utc(&input.end_time, &user.timezone)?;
        if end_utc <= start_utc {
            return Err(SchedulingError::InvalidRange);
        }

        if self.has_conflict(&calendar.id, start_utc, end_utc, None).await? {
            return Err(SchedulingError::TimeConflict);
        }

        let event = self
            .store
            .create_event(Event::new(&calendar.id, &input.title, start_utc, end_utc))
            .await?;

        if let Some(minutes) = input.reminder_minutes {
            if minutes > 0 {
                if let Err(e) = self.reminders.schedule(&event.id, event.start_utc, minutes).await {
                    warn!("Failed to schedule reminder for event {}: {}", event.id, e);
                }
            }
        }

        Ok(event)
    }

    /// Update an event. The caller must own the event's calendar.
    ///
    /// Times are re-normalized and conflict-checked (excluding the event
    /// itself) only when both bounds are supplied; a detected conflict
    /// leaves the event unmodified. The reminder patch is applied against
    /// the final start time after the update persists.
    pub async fn update(
        &self,
        user_id: &str,
        event_id: &str,
        input: UpdateEvent,
    ) -> Result<Event, SchedulingError> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| SchedulingError::UserNotFound(user_id.to_string()))?;

        let event = self.owned_event(user_id, event_id).await?;

        if let Some(title) = &input.title {
            if title.trim().is_empty() {
                return Err(SchedulingError::EmptyTitle);
            }
        }

        let mut changes = EventChanges {
            title: input.title.clone(),
            ..Default::default()
        };
        let mut final_start = event.start_utc;

        if let (Some(start), Some(end)) = (&input.start_time, &input.end_time) {
            let start_utc = to_utc(start, &user.timezone)?;
            let end_utc = to_utc(end, &user.timezone)?;
            if end_utc <= start_utc {
                return Err(SchedulingError::InvalidRange);
            }

            if self
                .has_conflict(&event.calendar_id, start_utc, end_utc, Some(event_id))
                .await?
            {
                return Err(SchedulingError::TimeConflict);
            }

            changes.start_utc = Some(start_utc);
            changes.end_utc = Some(end_utc);
            final_start = start_utc;
        }

        let updated = self.store.update_event(event_id, changes).await?;

        match input.reminder {
            ReminderPatch::Set(minutes) => {
                if let Err(e) = self.reminders.schedule(&updated.id, final_start, minutes).await {
                    warn!("Failed to reschedule reminder for event {}: {}", updated.id, e);
                }
            }
            ReminderPatch::Clear => {
                if let Err(e) = self.reminders.cancel(&updated.id).await {
                    warn!("Failed to clear reminder for event {}: {}", updated.id, e);
                }
            }
            ReminderPatch::Unchanged => {}
        }

        Ok(updated)
    }

    /// Delete an event and, by cascade, its reminder. The caller must own
    /// the event's calendar.
    pub async fn delete(&self, user_id: &str, event_id: &str) -> Result<(), SchedulingError> {
        self.owned_event(user_id, event_id).await?;
        self.store.delete_event(event_id).await?;
        Ok(())
    }

    /// Events in the caller's calendar lying fully within `[start, end]`,
    /// inclusive on both bounds.
    pub async fn events_in_window(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>, SchedulingError> {
        let calendar = self.first_calendar(user_id).await?;
        Ok(self.store.events_in_range(&calendar.id, start, end).await?)
    }

    /// Resolve the caller's calendar: the first one owned. Registration
    /// provisions exactly one per user.
    async fn first_calendar(&self, user_id: &str) -> Result<crate::store::Calendar, SchedulingError> {
        self.store
            .calendars_for_owner(user_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SchedulingError::CalendarMissing(user_id.to_string()))
    }

    /// Fetch an event and check the caller owns its calendar.
    async fn owned_event(&self, user_id: &str, event_id: &str) -> Result<Event, SchedulingError> {
        let event = self
            .store
            .get_event(event_id)
            .await?
            .ok_or_else(|| SchedulingError::EventNotFound(event_id.to_string()))?;

        let calendar = self
            .store
            .get_calendar(&event.calendar_id)
            .await?
            .ok_or_else(|| SchedulingError::CalendarMissing(event.calendar_id.clone()))?;

        if calendar.owner_id != user_id {
            return Err(SchedulingError::Forbidden);
        }

        Ok(event)
    }
}
