//! Domain model for notes and per-widget list configuration.
//!
//! # Responsibility
//! - Define the note row shape read by the widget adapter.
//! - Define the persisted widget configuration and its string encoding.
//!
//! # Invariants
//! - Note rows are owned by the store; the widget layer never mutates them.
//! - Widget configuration parsing never fails; bad values fall back per key.

pub mod note;
pub mod widget;
