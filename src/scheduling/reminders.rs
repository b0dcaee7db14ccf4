//! Reminder scheduling.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::error::SchedulingError;
use crate::store::{CalendarStore, Reminder};

/// Reminder change requested alongside an event update.
///
/// The wire format distinguishes three cases: a positive lead reschedules,
/// an explicit `0`/`null` clears, and an omitted field leaves any existing
/// reminder alone. Non-positive leads other than zero are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReminderPatch {
    /// Leave any existing reminder untouched.
    #[default]
    Unchanged,
    /// Delete the reminder if one exists.
    Clear,
    /// Upsert a reminder with this lead time in minutes.
    Set(i64),
}

impl ReminderPatch {
    /// Map a deserialized `reminderMinutes` field: outer `None` means the
    /// field was omitted, inner `None` means an explicit `null`.
    pub fn from_minutes(minutes: Option<Option<i64>>) -> Self {
        match minutes {
            None => Self::Unchanged,
            Some(None) | Some(Some(0)) => Self::Clear,
            Some(Some(m)) if m > 0 => Self::Set(m),
            // Negative leads have never cleared or scheduled anything
            Some(Some(_)) => Self::Unchanged,
        }
    }
}

/// Derives reminder records from event start times.
#[derive(Clone)]
pub struct ReminderScheduler {
    store: Arc<dyn CalendarStore>,
}

impl ReminderScheduler {
    pub fn new(store: Arc<dyn CalendarStore>) -> Self {
        Self { store }
    }

    /// Schedule (or re-schedule) the reminder for an event.
    ///
    /// `remind_at = event_start - lead_minutes`. A fire time already in the
    /// past marks the reminder sent immediately instead of dispatching it
    /// retroactively. At most one reminder exists per event; re-scheduling
    /// replaces `remind_at` and recomputes `sent` in place.
    pub async fn schedule(
        &self,
        event_id: &str,
        event_start: DateTime<Utc>,
        lead_minutes: i64,
    ) -> Result<Reminder, SchedulingError> {
        let remind_at = event_start - Duration::minutes(lead_minutes);
        let sent = remind_at <= Utc::now();

        let reminder = self
            .store
            .upsert_reminder(Reminder::new(event_id, remind_at, sent))
            .await?;

        tracing::debug!(
            "Scheduled reminder for event {} at {} (sent: {})",
            event_id,
            reminder.remind_at,
            reminder.sent
        );
        Ok(reminder)
    }

    /// Delete the reminder for an event if present; no-op otherwise.
    pub async fn cancel(&self, event_id: &str) -> Result<(), SchedulingError> {
        self.store.delete_reminder_for_event(event_id).await?;
        Ok(())
    }
}
