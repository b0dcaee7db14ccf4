//! Almanac: Personal Calendar Server
//!
//! A calendar service with conflict-aware event scheduling and background
//! reminder dispatch. Users register with an IANA timezone, manage events
//! through a bearer-authenticated REST API, and a periodic worker delivers
//! due reminders with at-least-once semantics.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod scheduling;
pub mod store;
pub mod time;
pub mod worker;

pub use api::{create_router, ApiState, RestApiConfig};
pub use auth::{AuthContext, AuthLayer, Authenticator};
pub use config::Config;
pub use error::{
    AlmanacError, AuthError, ConfigError, Result, SchedulingError, StorageError, TimeError,
};
pub use scheduling::{EventManager, NewEvent, ReminderPatch, ReminderScheduler, UpdateEvent};
pub use store::{
    create_store, Calendar, CalendarStore, EmbeddedStore, Event, EventChanges, Reminder, User,
};
pub use worker::ReminderWorker;
