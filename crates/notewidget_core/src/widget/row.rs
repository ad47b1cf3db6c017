//! Row descriptors handed to the host renderer.

use crate::model::note::{ListId, NoteId, NoteRow};
use crate::widget::due_date::format_due_date;
use serde::{Deserialize, Serialize};

/// Payload delivered to the activation handler when a row is tapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowAction {
    pub note_id: NoteId,
    pub list_id: ListId,
}

impl Default for RowAction {
    fn default() -> Self {
        Self {
            note_id: -1,
            list_id: -1,
        }
    }
}

/// Rendering-ready representation of one note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowDescriptor {
    pub title: String,
    pub note: String,
    /// Empty when the note has no valid due date.
    pub due_label: String,
    pub action: RowAction,
}

impl From<&NoteRow> for RowDescriptor {
    fn from(row: &NoteRow) -> Self {
        Self {
            title: row.title.clone(),
            note: row.note.clone(),
            due_label: format_due_date(row.due_date.as_deref()),
            action: RowAction {
                note_id: row.id,
                list_id: row.list_id,
            },
        }
    }
}
