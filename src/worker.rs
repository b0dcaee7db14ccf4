//! Reminder dispatch worker.
//!
//! A single long-lived task polls the store on a fixed cadence for due,
//! unsent reminders and marks them delivered. Delivery itself is a
//! structured log event; this is the seam where a mail or push transport
//! would plug in.
//!
//! Failure handling is deliberately layered: a failed batch query skips the
//! whole tick, a failed per-reminder dispatch leaves that reminder unsent
//! and eligible again next tick (at-least-once), and nothing propagates out
//! of the loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::error::StorageError;
use crate::store::{CalendarStore, Event, Reminder};

/// Periodic reminder dispatcher.
pub struct ReminderWorker {
    store: Arc<dyn CalendarStore>,
    poll_interval: Duration,
}

impl ReminderWorker {
    pub fn new(store: Arc<dyn CalendarStore>, poll_interval: Duration) -> Self {
        Self {
            store,
            poll_interval,
        }
    }

    /// Run the dispatch loop until the task is dropped.
    ///
    /// Ticks never overlap: a slow tick delays the next one rather than
    /// stacking up.
    pub async fn run(self) {
        info!(
            "Reminder worker started (cadence: {}s)",
            self.poll_interval.as_secs()
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.tick(Utc::now()).await;
        }
    }

    /// Process one polling cycle: everything due at `now`.
    pub async fn tick(&self, now: DateTime<Utc>) {
        let due = match self.store.due_reminders(now).await {
            Ok(due) => due,
            Err(e) => {
                error!("Reminder query failed, skipping tick: {}", e);
                return;
            }
        };

        if due.is_empty() {
            return;
        }
        debug!("{} reminders due", due.len());

        for reminder in due {
            if let Err(e) = self.dispatch(&reminder).await {
                error!("Failed to dispatch reminder {}: {}", reminder.id, e);
            }
        }
    }

    /// Deliver a single reminder and mark it sent.
    async fn dispatch(&self, reminder: &Reminder) -> Result<(), StorageError> {
        let event = self
            .store
            .get_event(&reminder.event_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("event {}", reminder.event_id)))?;

        let recipient = self.recipient_for(&event).await;
        info!("Reminder triggered: {} for {}", event.title, recipient);

        self.store.mark_reminder_sent(&reminder.id).await?;
        Ok(())
    }

    /// Resolve the owning user's email through the event's calendar.
    async fn recipient_for(&self, event: &Event) -> String {
        let owner = match self.store.get_calendar(&event.calendar_id).await {
            Ok(Some(calendar)) => self.store.get_user(&calendar.owner_id).await.ok().flatten(),
            _ => None,
        };
        owner.map(|u| u.email).unwrap_or_else(|| "(unknown)".to_string())
    }
}
