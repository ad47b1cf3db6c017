//! Note and note-list records.

use serde::{Deserialize, Serialize};

/// Store-assigned note identifier.
pub type NoteId = i64;

/// Store-assigned list identifier.
pub type ListId = i64;

/// Completion state mirrored from the task-sync integration.
///
/// Persisted with the remote service's wire names (`needsAction`,
/// `completed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    NeedsAction,
    Completed,
}

impl TaskStatus {
    /// Returns the persisted wire name.
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::NeedsAction => "needsAction",
            Self::Completed => "completed",
        }
    }

    /// Parses a persisted wire name.
    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "needsAction" => Some(Self::NeedsAction),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// One visible note as read from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRow {
    pub id: NoteId,
    /// May be empty.
    pub title: String,
    /// Note body text.
    pub note: String,
    pub list_id: ListId,
    /// Raw due date as stored (`YYYY-MM-DD` or RFC 3339); `None` when unset.
    pub due_date: Option<String>,
    /// `None` for notes never touched by the sync integration.
    pub status: Option<TaskStatus>,
}

/// Write model for inserting or replacing a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub note: String,
    pub list_id: ListId,
    pub due_date: Option<String>,
    pub status: TaskStatus,
}

impl NewNote {
    /// Creates an uncompleted note without a due date.
    pub fn new(list_id: ListId, title: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            note: note.into(),
            list_id,
            due_date: None,
            status: TaskStatus::NeedsAction,
        }
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }
}
