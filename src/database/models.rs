//! Database models
//!
//! Rust structs representing persisted entities, plus the request types
//! used by the repository layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A plain note
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A reminder: the unit of schedulable work.
///
/// `scheduled_alert_count` records how many additional-alert triggers the
/// most recent schedule pass registered, so a later cancellation can sweep
/// exactly that many handles instead of guessing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub due_at: DateTime<Utc>,
    pub additional_alerts: Vec<DateTime<Utc>>,
    pub completed: bool,
    pub scheduled_alert_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Raw reminder row. `additional_alerts` is stored as a JSON array of
/// timestamps in a TEXT column.
#[derive(Debug, FromRow)]
pub(crate) struct ReminderRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub due_at: DateTime<Utc>,
    pub additional_alerts: String,
    pub completed: bool,
    pub scheduled_alert_count: i64,
    pub created_at: DateTime<Utc>,
}

impl ReminderRow {
    pub(crate) fn into_reminder(self) -> crate::error::Result<Reminder> {
        let additional_alerts = serde_json::from_str(&self.additional_alerts)?;
        Ok(Reminder {
            id: self.id,
            title: self.title,
            description: self.description,
            due_at: self.due_at,
            additional_alerts,
            completed: self.completed,
            scheduled_alert_count: self.scheduled_alert_count,
            created_at: self.created_at,
        })
    }
}

/// Create note request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    pub body: String,
}

/// Update note request
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateNoteRequest {
    pub id: i64,
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Create reminder request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReminderRequest {
    pub title: String,
    pub description: String,
    pub due_at: DateTime<Utc>,
    pub additional_alerts: Vec<DateTime<Utc>>,
}

/// File attachment linked to a note or a reminder
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attachment {
    pub id: String,
    pub note_id: Option<i64>,
    pub reminder_id: Option<i64>,
    /// Opaque URI, e.g. `media://pictures/<sha256>` or an external path
    pub uri: String,
    pub description: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

/// What an attachment is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentOwner {
    Note(i64),
    Reminder(i64),
}

/// A note or a reminder, for the combined chronological feed. Shared
/// accessors resolve at compile time instead of branching on runtime type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    Note(Note),
    Reminder(Reminder),
}

impl Entry {
    pub fn title(&self) -> &str {
        match self {
            Entry::Note(note) => &note.title,
            Entry::Reminder(reminder) => &reminder.title,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Entry::Note(note) => &note.body,
            Entry::Reminder(reminder) => &reminder.description,
        }
    }

    /// Due time, for entries that have one.
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Entry::Note(_) => None,
            Entry::Reminder(reminder) => Some(reminder.due_at),
        }
    }

    /// The instant the feed sorts by: due time for reminders, creation
    /// time for notes.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Entry::Note(note) => note.created_at,
            Entry::Reminder(reminder) => reminder.due_at,
        }
    }
}
