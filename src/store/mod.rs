//! Persistent store for users, calendars, events and reminders.
//!
//! The [`CalendarStore`] trait is the persistence seam: the rest of the
//! server only sees trait methods, so the embedded backend can be swapped
//! for a SQL one without touching the scheduling or API layers. Overlap
//! and due-reminder queries live here because a database backend would
//! express them as queries rather than application-side scans.

mod embedded;
mod traits;
mod types;

pub use embedded::EmbeddedStore;
pub use traits::CalendarStore;
pub use types::{Calendar, Event, EventChanges, Reminder, User};

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;

/// Create a store backend from configuration.
pub async fn create_store(config: &Config) -> Result<Arc<dyn CalendarStore>> {
    if config.storage.persist {
        let store = EmbeddedStore::with_persistence(&config.data_dir()).await?;
        Ok(Arc::new(store))
    } else {
        Ok(Arc::new(EmbeddedStore::new()))
    }
}
