//! In-memory store with optional JSON file persistence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, RwLock};

use crate::error::StorageError;
use crate::store::traits::CalendarStore;
use crate::store::types::{Calendar, Event, EventChanges, Reminder, User};

/// All data protected by a single lock for consistent access.
#[derive(Default)]
struct StoreData {
    users: HashMap<String, User>,
    /// email -> user id
    user_by_email: HashMap<String, String>,
    calendars: HashMap<String, Calendar>,
    /// owner id -> calendar ids in creation order
    calendars_by_owner: HashMap<String, Vec<String>>,
    events: HashMap<String, Event>,
    /// calendar id -> event ids
    events_by_calendar: HashMap<String, Vec<String>>,
    reminders: HashMap<String, Reminder>,
    /// event id -> reminder id (at most one reminder per event)
    reminder_by_event: HashMap<String, String>,
}

impl StoreData {
    fn unindex_event(&mut self, event: &Event) {
        if let Some(ids) = self.events_by_calendar.get_mut(&event.calendar_id) {
            ids.retain(|id| id != &event.id);
        }
    }

    fn remove_reminder_for_event(&mut self, event_id: &str) -> Option<Reminder> {
        let reminder_id = self.reminder_by_event.remove(event_id)?;
        self.reminders.remove(&reminder_id)
    }
}

/// On-disk snapshot shape.
#[derive(Serialize, Deserialize)]
struct PersistenceData {
    version: u32,
    users: Vec<User>,
    calendars: Vec<Calendar>,
    events: Vec<Event>,
    reminders: Vec<Reminder>,
}

/// In-memory calendar store with optional persistence.
///
/// Entities live in HashMaps behind a single RwLock, with secondary indexes
/// for email, ownership, and reminder attachment. When persistence is
/// enabled every mutation snapshots the whole store to a JSON file (temp
/// file + rename for atomicity).
pub struct EmbeddedStore {
    data: RwLock<StoreData>,
    persistence_path: Option<PathBuf>,
    persist_lock: AsyncMutex<()>,
}

impl EmbeddedStore {
    /// Create a new in-memory store without persistence.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(StoreData::default()),
            persistence_path: None,
            persist_lock: AsyncMutex::new(()),
        }
    }

    /// Create a store with file persistence under `data_dir`.
    pub async fn with_persistence(data_dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(data_dir)?;

        let persistence_path = data_dir.join("almanac.json");
        let store = Self {
            data: RwLock::new(StoreData::default()),
            persistence_path: Some(persistence_path.clone()),
            persist_lock: AsyncMutex::new(()),
        };

        if persistence_path.exists() {
            store.load_from_file(&persistence_path).await?;
        }

        Ok(store)
    }

    async fn load_from_file(&self, path: &Path) -> Result<(), StorageError> {
        let content = tokio::fs::read_to_string(path).await?;

        let persisted: PersistenceData =
            serde_json::from_str(&content).map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut data = self.data.write().await;

        for user in persisted.users {
            data.user_by_email.insert(user.email.clone(), user.id.clone());
            data.users.insert(user.id.clone(), user);
        }
        for calendar in persisted.calendars {
            data.calendars_by_owner
                .entry(calendar.owner_id.clone())
                .or_default()
                .push(calendar.id.clone());
            data.calendars.insert(calendar.id.clone(), calendar);
        }
        for event in persisted.events {
            data.events_by_calendar
                .entry(event.calendar_id.clone())
                .or_default()
                .push(event.id.clone());
            data.events.insert(event.id.clone(), event);
        }
        for reminder in persisted.reminders {
            data.reminder_by_event
                .insert(reminder.event_id.clone(), reminder.id.clone());
            data.reminders.insert(reminder.id.clone(), reminder);
        }

        tracing::info!(
            "Loaded {} users, {} events, {} reminders from {}",
            data.users.len(),
            data.events.len(),
            data.reminders.len(),
            path.display()
        );

        Ok(())
    }

    /// Persist data to file if persistence is enabled.
    async fn persist(&self) -> Result<(), StorageError> {
        let Some(ref path) = self.persistence_path else {
            return Ok(());
        };

        let _lock = self.persist_lock.lock().await;

        let data = self.data.read().await;
        let persisted = PersistenceData {
            version: 1,
            users: data.users.values().cloned().collect(),
            calendars: data.calendars.values().cloned().collect(),
            events: data.events.values().cloned().collect(),
            reminders: data.reminders.values().cloned().collect(),
        };
        drop(data);

        let content = serde_json::to_string_pretty(&persisted)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, content).await?;
        tokio::fs::rename(&temp_path, path).await?;

        Ok(())
    }
}

impl Default for EmbeddedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CalendarStore for EmbeddedStore {
    // ========================================================================
    // Users
    // ========================================================================

    async fn create_user(&self, user: User) -> Result<User, StorageError> {
        let mut data = self.data.write().await;

        if data.user_by_email.contains_key(&user.email) {
            return Err(StorageError::Duplicate(format!(
                "user with email {}",
                user.email
            )));
        }

        data.user_by_email.insert(user.email.clone(), user.id.clone());
        data.users.insert(user.id.clone(), user.clone());

        drop(data);
        self.persist().await?;
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StorageError> {
        let data = self.data.read().await;
        Ok(data.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .user_by_email
            .get(email)
            .and_then(|id| data.users.get(id))
            .cloned())
    }

    // ========================================================================
    // Calendars
    // ========================================================================

    async fn create_calendar(&self, calendar: Calendar) -> Result<Calendar, StorageError> {
        let mut data = self.data.write().await;

        data.calendars_by_owner
            .entry(calendar.owner_id.clone())
            .or_default()
            .push(calendar.id.clone());
        data.calendars.insert(calendar.id.clone(), calendar.clone());

        drop(data);
        self.persist().await?;
        Ok(calendar)
    }

    async fn get_calendar(&self, id: &str) -> Result<Option<Calendar>, StorageError> {
        let data = self.data.read().await;
        Ok(data.calendars.get(id).cloned())
    }

    async fn calendars_for_owner(&self, owner_id: &str) -> Result<Vec<Calendar>, StorageError> {
        let data = self.data.read().await;
        let ids = data.calendars_by_owner.get(owner_id).cloned().unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| data.calendars.get(id))
            .cloned()
            .collect())
    }

    // ========================================================================
    // Events
    // ========================================================================

    async fn create_event(&self, event: Event) -> Result<Event, StorageError> {
        let mut data = self.data.write().await;

        data.events_by_calendar
            .entry(event.calendar_id.clone())
            .or_default()
            .push(event.id.clone());
        data.events.insert(event.id.clone(), event.clone());

        drop(data);
        self.persist().await?;
        Ok(event)
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>, StorageError> {
        let data = self.data.read().await;
        Ok(data.events.get(id).cloned())
    }

    async fn update_event(&self, id: &str, changes: EventChanges) -> Result<Event, StorageError> {
        let mut data = self.data.write().await;

        let event = data
            .events
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("event {}", id)))?;

        changes.apply_to(event);
        let updated = event.clone();

        drop(data);
        self.persist().await?;
        Ok(updated)
    }

    async fn delete_event(&self, id: &str) -> Result<bool, StorageError> {
        let mut data = self.data.write().await;

        let event = match data.events.remove(id) {
            Some(e) => e,
            None => return Ok(false),
        };

        data.unindex_event(&event);
        data.remove_reminder_for_event(id);

        drop(data);
        self.persist().await?;
        Ok(true)
    }

    async fn events_in_range(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>, StorageError> {
        let data = self.data.read().await;

        let ids = data.events_by_calendar.get(calendar_id).cloned().unwrap_or_default();
        let mut events: Vec<Event> = ids
            .iter()
            .filter_map(|id| data.events.get(id))
            .filter(|e| e.start_utc >= start && e.end_utc <= end)
            .cloned()
            .collect();

        events.sort_by(|a, b| a.start_utc.cmp(&b.start_utc));
        Ok(events)
    }

    async fn find_overlapping(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<&str>,
    ) -> Result<Option<Event>, StorageError> {
        let data = self.data.read().await;

        let ids = data.events_by_calendar.get(calendar_id).cloned().unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| data.events.get(id))
            .filter(|e| exclude != Some(e.id.as_str()))
            .find(|e| e.overlaps(start, end))
            .cloned())
    }

    // ========================================================================
    // Reminders
    // ========================================================================

    async fn reminder_for_event(&self, event_id: &str) -> Result<Option<Reminder>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .reminder_by_event
            .get(event_id)
            .and_then(|id| data.reminders.get(id))
            .cloned())
    }

    async fn upsert_reminder(&self, reminder: Reminder) -> Result<Reminder, StorageError> {
        let mut data = self.data.write().await;

        let stored = match data.reminder_by_event.get(&reminder.event_id).cloned() {
            Some(existing_id) => {
                let existing = data
                    .reminders
                    .get_mut(&existing_id)
                    .ok_or_else(|| StorageError::NotFound(format!("reminder {}", existing_id)))?;
                existing.remind_at = reminder.remind_at;
                existing.sent = reminder.sent;
                existing.clone()
            }
            None => {
                data.reminder_by_event
                    .insert(reminder.event_id.clone(), reminder.id.clone());
                data.reminders.insert(reminder.id.clone(), reminder.clone());
                reminder
            }
        };

        drop(data);
        self.persist().await?;
        Ok(stored)
    }

    async fn delete_reminder_for_event(&self, event_id: &str) -> Result<bool, StorageError> {
        let mut data = self.data.write().await;
        let removed = data.remove_reminder_for_event(event_id).is_some();

        drop(data);
        self.persist().await?;
        Ok(removed)
    }

    async fn due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>, StorageError> {
        let data = self.data.read().await;

        let mut due: Vec<Reminder> = data
            .reminders
            .values()
            .filter(|r| !r.sent && r.remind_at <= now)
            .cloned()
            .collect();

        due.sort_by(|a, b| a.remind_at.cmp(&b.remind_at));
        Ok(due)
    }

    async fn mark_reminder_sent(&self, id: &str) -> Result<(), StorageError> {
        let mut data = self.data.write().await;

        let reminder = data
            .reminders
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("reminder {}", id)))?;
        reminder.sent = true;

        drop(data);
        self.persist().await?;
        Ok(())
    }
}
