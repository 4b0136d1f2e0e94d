//! Reminder record, partial update payload, and change events

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single reminder as stored and served.
///
/// The record is the caller's JSON object kept as-is: `id`, `title`,
/// `description`, `dueDate` and `isCompleted` are checked on create, but a
/// later partial update may overwrite any member with any JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reminder {
    fields: Map<String, Value>,
}

impl Reminder {
    /// Validate a create payload and turn it into a reminder.
    ///
    /// The four string fields must be non-empty strings and `isCompleted`
    /// must be a JSON boolean. Any other members are carried over untouched.
    pub fn from_candidate(candidate: Value) -> Result<Self> {
        let Value::Object(fields) = candidate else {
            return Err(CoreError::InvalidInput(
                "body must be a JSON object".to_string(),
            ));
        };

        for key in ["id", "title", "description", "dueDate"] {
            match fields.get(key) {
                Some(Value::String(s)) if !s.is_empty() => {}
                _ => {
                    return Err(CoreError::InvalidInput(format!(
                        "{} must be a non-empty string",
                        key
                    )))
                }
            }
        }
        if !matches!(fields.get("isCompleted"), Some(Value::Bool(_))) {
            return Err(CoreError::InvalidInput(
                "isCompleted must be a boolean".to_string(),
            ));
        }

        Ok(Reminder { fields })
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// The id, if it is still a string
    pub fn id(&self) -> Option<&str> {
        self.str_field("id")
    }

    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    pub fn description(&self) -> Option<&str> {
        self.str_field("description")
    }

    pub fn due_date(&self) -> Option<&str> {
        self.str_field("dueDate")
    }

    /// Raw member lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Path ids are strings, so only a string `id` can match
    pub fn has_id(&self, id: &str) -> bool {
        self.id() == Some(id)
    }

    /// `isCompleted` is exactly `true`
    pub fn is_completed(&self) -> bool {
        self.fields.get("isCompleted") == Some(&Value::Bool(true))
    }

    /// `isCompleted` is falsy: `false`, `null`, `0`, `""` or missing.
    /// A truthy non-boolean (e.g. `"yes"`) is neither completed nor incomplete.
    pub fn is_incomplete(&self) -> bool {
        !self.fields.get("isCompleted").is_some_and(is_truthy)
    }

    pub fn set_completed(&mut self, is_completed: bool) {
        self.fields
            .insert("isCompleted".to_string(), Value::Bool(is_completed));
    }

    /// Overlay every member of `patch`, leaving the rest untouched.
    /// Values are not revalidated.
    pub fn apply(&mut self, patch: ReminderPatch) {
        self.fields.extend(patch.fields);
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Parse a request body as JSON regardless of its content type
pub fn parse_body(bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice(bytes)
        .map_err(|e| CoreError::InvalidInput(format!("malformed JSON body: {}", e)))
}

/// Partial update payload for `PATCH /reminders/:id`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReminderPatch {
    fields: Map<String, Value>,
}

impl ReminderPatch {
    /// Every member of an object body is an override, `null` included.
    /// Any other JSON value carries no members and changes nothing.
    pub fn from_value(body: Value) -> Self {
        match body {
            Value::Object(fields) => ReminderPatch { fields },
            _ => ReminderPatch::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Store mutations broadcast to SSE subscribers
#[derive(Debug, Clone)]
pub enum ReminderEvent {
    Created { reminder: Reminder },
    Updated { reminder: Reminder },
    Deleted { id: String },
    CompletionChanged { id: String, is_completed: bool },
}
