//! In-memory reminder store.
//!
//! Holds every reminder in insertion order. All data is lost on restart.
//! Each operation takes the lock once for its whole body, so concurrent
//! requests observe the same sequential behavior a single-threaded server
//! would give them.

pub mod types;

pub use types::{parse_body, Reminder, ReminderEvent, ReminderPatch};

use crate::config::Timezone;
use crate::error::{CoreError, Result};
use serde_json::Value;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Ordered, process-local collection of reminders
#[derive(Debug, Default)]
pub struct ReminderStore {
    reminders: RwLock<Vec<Reminder>>,
}

impl ReminderStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    // Plain data: a poisoned lock still holds a usable vector.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Reminder>> {
        self.reminders.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Reminder>> {
        self.reminders.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate and append a new reminder. Ids are not checked for uniqueness.
    pub fn create(&self, candidate: Value) -> Result<Reminder> {
        let reminder = Reminder::from_candidate(candidate)?;
        tracing::debug!("Creating reminder {}", reminder.id().unwrap_or_default());
        self.write().push(reminder.clone());
        Ok(reminder)
    }

    /// All reminders in insertion order. An empty store is `NotFound`.
    pub fn list_all(&self) -> Result<Vec<Reminder>> {
        let reminders = self.read();
        if reminders.is_empty() {
            return Err(CoreError::NotFound("Reminders", "store is empty".to_string()));
        }
        Ok(reminders.clone())
    }

    /// Completed reminders (`isCompleted` exactly `true`) or incomplete ones
    /// (`isCompleted` falsy). A truthy non-boolean flag lands in neither.
    pub fn list_by_completion(&self, is_completed: bool) -> Result<Vec<Reminder>> {
        let matching: Vec<Reminder> = self
            .read()
            .iter()
            .filter(|r| {
                if is_completed {
                    r.is_completed()
                } else {
                    r.is_incomplete()
                }
            })
            .cloned()
            .collect();

        if matching.is_empty() {
            let which = if is_completed { "completed" } else { "incomplete" };
            return Err(CoreError::NotFound("Reminders", which.to_string()));
        }
        Ok(matching)
    }

    /// Reminders whose `dueDate` is exactly `date`
    pub fn list_due_on(&self, date: &str) -> Result<Vec<Reminder>> {
        let matching: Vec<Reminder> = self
            .read()
            .iter()
            .filter(|r| r.due_date() == Some(date))
            .cloned()
            .collect();

        if matching.is_empty() {
            return Err(CoreError::NotFound("Reminders due on", date.to_string()));
        }
        Ok(matching)
    }

    /// Reminders due on today's date in the given timezone
    pub fn list_due_today(&self, timezone: Timezone) -> Result<Vec<Reminder>> {
        self.list_due_on(&timezone.today())
    }

    /// First reminder with a matching id
    pub fn get_by_id(&self, id: &str) -> Result<Reminder> {
        self.read()
            .iter()
            .find(|r| r.has_id(id))
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Overlay a partial update onto the first reminder with a matching id
    pub fn update_by_id(&self, id: &str, patch: ReminderPatch) -> Result<Reminder> {
        let mut reminders = self.write();
        let reminder = reminders
            .iter_mut()
            .find(|r| r.has_id(id))
            .ok_or_else(|| not_found(id))?;

        reminder.apply(patch);
        tracing::debug!("Updated reminder {}", id);
        Ok(reminder.clone())
    }

    /// Remove the first reminder with a matching id, keeping the order of the rest
    pub fn delete_by_id(&self, id: &str) -> Result<Reminder> {
        let mut reminders = self.write();
        let index = reminders
            .iter()
            .position(|r| r.has_id(id))
            .ok_or_else(|| not_found(id))?;

        tracing::debug!("Deleting reminder {}", id);
        Ok(reminders.remove(index))
    }

    /// Set the completion flag on the first reminder with a matching id
    pub fn set_completion(&self, id: &str, is_completed: bool) -> Result<Reminder> {
        let mut reminders = self.write();
        let reminder = reminders
            .iter_mut()
            .find(|r| r.has_id(id))
            .ok_or_else(|| not_found(id))?;

        reminder.set_completed(is_completed);
        tracing::debug!("Reminder {} is_completed = {}", id, is_completed);
        Ok(reminder.clone())
    }

    /// Number of stored reminders
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

fn not_found(id: &str) -> CoreError {
    CoreError::NotFound("Reminder", id.to_string())
}
