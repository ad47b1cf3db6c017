//! Notes store abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the query/notify contract the widget layer consumes.
//! - Isolate SQLite query details from widget orchestration.
//!
//! # Invariants
//! - Store APIs return semantic errors (`NoteNotFound`, `ListNotFound`) in
//!   addition to DB transport errors.
//! - Every successful mutation notifies all observers.

pub mod note_store;
pub mod notify;
