//! Flutter-facing bindings for the notes list widget core.

pub mod api;
