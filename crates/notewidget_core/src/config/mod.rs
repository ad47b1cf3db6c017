//! Per-widget configuration persistence.
//!
//! # Responsibility
//! - Define the key/value prefs contract scoped by widget instance id.
//! - Decode stored prefs into an effective [`WidgetConfig`].
//!
//! # Invariants
//! - The widget factory only reads prefs; writes come from configuration
//!   surfaces (FFI, CLI).
//!
//! [`WidgetConfig`]: crate::model::widget::WidgetConfig

pub mod widget_prefs;
