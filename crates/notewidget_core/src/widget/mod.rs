//! List widget adapter.
//!
//! # Responsibility
//! - Turn one widget's config plus the notes store into renderable rows.
//! - Bridge store change notifications to the host's "widget is stale" signal.
//!
//! # Invariants
//! - Nothing in this module returns an error to the host; failures degrade to
//!   empty rows or empty labels.
//! - Rows are read from immutable snapshots swapped in whole on refresh.

pub mod due_date;
pub mod factory;
pub mod observer;
pub mod row;
