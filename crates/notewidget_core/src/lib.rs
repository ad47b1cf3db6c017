//! Core logic for the notes list home-screen widget.
//! This crate is the single source of truth for widget rows and refresh rules.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod widget;

pub use config::widget_prefs::{
    load_widget_config, save_widget_config, ConfigError, ConfigResult, InMemoryConfigStore,
    SqliteConfigStore, WidgetConfigStore,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{ListId, NewNote, NoteId, NoteRow, TaskStatus};
pub use model::widget::{
    ListSelection, SortDirection, SortField, WidgetConfig, WidgetId, ALL_LISTS_ID,
    INVALID_WIDGET_ID,
};
pub use repo::note_store::{NoteQuery, NoteStore, SqliteNoteStore, StoreError, StoreResult};
pub use repo::notify::{ChangeNotifier, ChangeObserver, SubscriptionId};
pub use service::widget_service::{
    ListWidgetService, PendingRefreshHost, ServiceError, ServiceResult,
};
pub use widget::due_date::format_due_date;
pub use widget::factory::{NoteListWidgetFactory, RemoteViewsFactory, RowSnapshot};
pub use widget::observer::{WidgetChangeObserver, WidgetHost};
pub use widget::row::{RowAction, RowDescriptor};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
