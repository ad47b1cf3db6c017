//! Host-facing widget services.
//!
//! # Responsibility
//! - Own the factories of every placed widget instance.
//! - Turn store change signals into one refresh per stale widget per cycle.
//! - Keep FFI/CLI layers decoupled from factory and storage details.

pub mod widget_service;
