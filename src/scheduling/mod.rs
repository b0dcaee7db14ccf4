//! Event scheduling and reminder derivation.
//!
//! This module owns the temporal logic of the server:
//!
//! - **Event lifecycle**: create, update, delete and window queries over a
//!   user's calendar, with ownership enforcement
//! - **Conflict detection**: half-open interval overlap within a calendar
//! - **Reminder scheduling**: deriving a reminder's fire time from an
//!   event's start and a lead interval
//!
//! Dispatching due reminders is a separate concern, handled by
//! [`crate::worker::ReminderWorker`].

mod events;
mod reminders;

pub use events::{EventManager, NewEvent, UpdateEvent};
pub use reminders::{ReminderPatch, ReminderScheduler};
