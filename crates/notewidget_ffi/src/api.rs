//! FFI use-case API for the home-screen widget host.
//!
//! # Responsibility
//! - Expose widget lifecycle, row rendering and note edits to Dart via FRB.
//! - Own the process-wide widget service bound to one notes database.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Failures come back as strings or envelopes, never as errors.

use log::error;
use notewidget_core::db::{open_db, share};
use notewidget_core::{
    core_version as core_version_inner, default_log_level, init_logging as init_logging_inner,
    ping as ping_inner,
    ListSelection, ListWidgetService, NewNote, NoteStore, RemoteViewsFactory, RowDescriptor,
    SortDirection, SortField, SqliteConfigStore, SqliteNoteStore, TaskStatus, WidgetConfig,
};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

const WIDGET_DB_FILE_NAME: &str = "notewidget.sqlite3";
const WIDGET_DB_PATH_ENV: &str = "NOTEWIDGET_DB_PATH";
static WIDGET_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static WIDGET_SERVICE: OnceLock<ListWidgetService> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive);
///   blank selects the build default (`debug` or `info`).
/// - `log_dir`: absolute directory for rolling logs.
/// - Returns empty string on success and the error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let level = match level.trim() {
        "" => default_log_level(),
        explicit => explicit,
    };
    match init_logging_inner(level, log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Row rendered by the widget host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetRowItem {
    pub title: String,
    pub note: String,
    /// Empty when no valid due date is set.
    pub due_label: String,
    /// Activation payload; `-1` for placeholder rows.
    pub note_id: i64,
    pub list_id: i64,
}

impl From<RowDescriptor> for WidgetRowItem {
    fn from(row: RowDescriptor) -> Self {
        Self {
            title: row.title,
            note: row.note,
            due_label: row.due_label,
            note_id: row.action.note_id,
            list_id: row.action.list_id,
        }
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetActionResponse {
    pub ok: bool,
    /// Created or affected row id.
    pub id: Option<i64>,
    pub message: String,
}

impl WidgetActionResponse {
    fn success(message: impl Into<String>, id: i64) -> Self {
        Self {
            ok: true,
            id: Some(id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Creates a note list.
#[flutter_rust_bridge::frb(sync)]
pub fn widget_create_list(title: String) -> WidgetActionResponse {
    match with_service(|service| {
        service
            .store()
            .create_list(title.trim())
            .map_err(|err| err.to_string())
    }) {
        Ok(id) => WidgetActionResponse::success("List created.", id),
        Err(err) => WidgetActionResponse::failure(format!("widget_create_list failed: {err}")),
    }
}

/// Adds an uncompleted note; `due_date` is `YYYY-MM-DD` or RFC 3339.
#[flutter_rust_bridge::frb(sync)]
pub fn widget_add_note(
    list_id: i64,
    title: String,
    note: String,
    due_date: Option<String>,
) -> WidgetActionResponse {
    let mut new_note = NewNote::new(list_id, title.trim(), note);
    new_note.due_date = due_date
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    match with_service(|service| {
        service
            .store()
            .insert_note(&new_note)
            .map_err(|err| err.to_string())
    }) {
        Ok(id) => WidgetActionResponse::success("Note created.", id),
        Err(err) => WidgetActionResponse::failure(format!("widget_add_note failed: {err}")),
    }
}

/// Marks a note completed or not completed.
#[flutter_rust_bridge::frb(sync)]
pub fn widget_set_note_completed(note_id: i64, completed: bool) -> WidgetActionResponse {
    let status = if completed {
        TaskStatus::Completed
    } else {
        TaskStatus::NeedsAction
    };
    match with_service(|service| {
        service
            .store()
            .set_note_status(note_id, status)
            .map_err(|err| err.to_string())
    }) {
        Ok(()) => WidgetActionResponse::success("Note updated.", note_id),
        Err(err) => {
            WidgetActionResponse::failure(format!("widget_set_note_completed failed: {err}"))
        }
    }
}

/// Saves the settings chosen in the widget configuration screen.
///
/// `list_id < 0` selects all lists. Unknown `sort_type`/`sort_order`
/// values fall back to due date / ascending. Returns empty string on
/// success.
#[flutter_rust_bridge::frb(sync)]
pub fn widget_configure(
    widget_id: i32,
    list_id: i64,
    sort_type: String,
    sort_order: String,
) -> String {
    let config = WidgetConfig {
        list: ListSelection::from_list_id(list_id),
        sort: SortField::parse_pref(&sort_type).unwrap_or_default(),
        direction: SortDirection::parse_pref(&sort_order).unwrap_or_default(),
    };
    match with_service(|service| {
        service
            .configure_widget(widget_id, &config)
            .map_err(|err| err.to_string())
    }) {
        Ok(()) => String::new(),
        Err(err) => format!("widget_configure failed: {err}"),
    }
}

/// Binds a placed widget; returns its initial row count.
#[flutter_rust_bridge::frb(sync)]
pub fn widget_open(widget_id: i32) -> WidgetActionResponse {
    match with_service(|service| {
        service
            .open_widget(widget_id)
            .map(|factory| factory.count())
            .map_err(|err| err.to_string())
    }) {
        Ok(count) => WidgetActionResponse::success(
            format!("Widget opened with {count} row(s)."),
            i64::from(widget_id),
        ),
        Err(err) => WidgetActionResponse::failure(format!("widget_open failed: {err}")),
    }
}

/// Unbinds a widget; `false` when it was not open.
#[flutter_rust_bridge::frb(sync)]
pub fn widget_close(widget_id: i32) -> bool {
    with_service(|service| Ok(service.close_widget(widget_id))).unwrap_or(false)
}

/// Unbinds a widget removed from the home screen and forgets its settings.
///
/// Returns empty string on success.
#[flutter_rust_bridge::frb(sync)]
pub fn widget_delete(widget_id: i32) -> String {
    match with_service(|service| {
        service
            .delete_widget(widget_id)
            .map_err(|err| err.to_string())
    }) {
        Ok(()) => String::new(),
        Err(err) => format!("widget_delete failed: {err}"),
    }
}

/// Row count of an open widget; 0 when not open.
#[flutter_rust_bridge::frb(sync)]
pub fn widget_count(widget_id: i32) -> u32 {
    with_service(|service| {
        Ok(service
            .factory(widget_id)
            .map_or(0, |factory| factory.count()))
    })
    .map(|count| u32::try_from(count).unwrap_or(u32::MAX))
    .unwrap_or(0)
}

/// One rendered row; placeholder row for unknown widgets or positions.
#[flutter_rust_bridge::frb(sync)]
pub fn widget_row(widget_id: i32, position: u32) -> WidgetRowItem {
    let row = with_service(|service| {
        Ok(service
            .factory(widget_id)
            .map(|factory| factory.view_at(position as usize))
            .unwrap_or_default())
    })
    .unwrap_or_default();
    WidgetRowItem::from(row)
}

/// Refreshes every widget marked stale since the last call.
///
/// Returns the refreshed widget ids; the host redraws exactly those.
#[flutter_rust_bridge::frb(sync)]
pub fn widget_redraw() -> Vec<i32> {
    with_service(|service| Ok(service.run_redraw_cycle())).unwrap_or_default()
}

fn resolve_widget_db_path() -> PathBuf {
    WIDGET_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(WIDGET_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(WIDGET_DB_FILE_NAME)
        })
        .clone()
}

fn widget_service() -> Result<&'static ListWidgetService, String> {
    if let Some(service) = WIDGET_SERVICE.get() {
        return Ok(service);
    }

    let db_path = resolve_widget_db_path();
    let conn = open_db(&db_path).map_err(|err| {
        error!("event=ffi_service_init module=ffi status=error error={err}");
        format!("widget DB open failed: {err}")
    })?;
    let conn = share(conn);
    let service = ListWidgetService::new(
        Arc::new(SqliteNoteStore::new(conn.clone())),
        Arc::new(SqliteConfigStore::new(conn)),
    );
    // A racing caller may have installed its own service; that one wins.
    Ok(WIDGET_SERVICE.get_or_init(|| service))
}

fn with_service<T>(
    f: impl FnOnce(&ListWidgetService) -> Result<T, String>,
) -> Result<T, String> {
    let service = widget_service()?;
    f(service)
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, ping, widget_add_note, widget_close, widget_configure,
        widget_count, widget_create_list, widget_delete, widget_open, widget_redraw, widget_row,
        widget_set_note_completed,
    };
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::{Mutex, MutexGuard, PoisonError};
    use std::time::{SystemTime, UNIX_EPOCH};

    static NEXT_WIDGET: AtomicI32 = AtomicI32::new(0);
    // Tests share one process-wide service; a redraw in one test must not
    // consume another test's stale marks.
    static SERVICE_GUARD: Mutex<()> = Mutex::new(());

    fn serial() -> MutexGuard<'static, ()> {
        SERVICE_GUARD.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Widget ids must not collide with earlier runs sharing the same DB file.
    fn unique_widget_id() -> i32 {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_secs();
        let base = i32::try_from(seconds % 1_000_000).expect("fits in i32") * 1_000;
        base + NEXT_WIDGET.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn new_list() -> i64 {
        let created = widget_create_list("ffi test list".to_string());
        assert!(created.ok, "{}", created.message);
        created.id.expect("list id")
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_blank_level_uses_build_default() {
        let error = init_logging("  ".to_string(), String::new());
        assert!(error.contains("log_dir"), "{error}");
    }

    #[test]
    fn deleted_widget_reopens_with_default_settings() {
        let _guard = serial();
        let list_id = new_list();
        let other_list = new_list();
        let widget_id = unique_widget_id();
        assert!(widget_add_note(list_id, "mine".to_string(), String::new(), None).ok);
        assert!(widget_add_note(other_list, "theirs".to_string(), String::new(), None).ok);

        widget_configure(widget_id, list_id, "duedate".to_string(), "ASC".to_string());
        assert!(widget_open(widget_id).ok);
        assert_eq!(widget_count(widget_id), 1);

        assert_eq!(widget_delete(widget_id), "");
        assert_eq!(widget_count(widget_id), 0);
        assert!(!widget_close(widget_id));

        // Without saved settings the widget shows every list again.
        assert!(widget_open(widget_id).ok);
        assert!(widget_count(widget_id) >= 2);
        assert!(widget_close(widget_id));
    }

    #[test]
    fn configured_widget_renders_only_its_list() {
        let _guard = serial();
        let list_id = new_list();
        let other_list = new_list();
        let widget_id = unique_widget_id();

        let added = widget_add_note(
            list_id,
            "Pay rent".to_string(),
            "before noon".to_string(),
            Some("2024-01-01".to_string()),
        );
        assert!(added.ok, "{}", added.message);
        assert!(widget_add_note(other_list, "elsewhere".to_string(), String::new(), None).ok);

        assert_eq!(
            widget_configure(
                widget_id,
                list_id,
                "alphabetic".to_string(),
                "ASC".to_string()
            ),
            ""
        );
        let opened = widget_open(widget_id);
        assert!(opened.ok, "{}", opened.message);

        assert_eq!(widget_count(widget_id), 1);
        let row = widget_row(widget_id, 0);
        assert_eq!(row.title, "Pay rent");
        assert_eq!(row.due_label, "Mon, Jan 1, 2024");
        assert_eq!(row.note_id, added.id.expect("note id"));
        assert_eq!(row.list_id, list_id);

        assert!(widget_close(widget_id));
    }

    #[test]
    fn completing_a_note_updates_widget_after_redraw() {
        let _guard = serial();
        let list_id = new_list();
        let widget_id = unique_widget_id();
        let added = widget_add_note(list_id, "finish".to_string(), String::new(), None);
        assert!(added.ok, "{}", added.message);
        widget_configure(widget_id, list_id, "duedate".to_string(), "ASC".to_string());
        assert!(widget_open(widget_id).ok);
        assert_eq!(widget_count(widget_id), 1);

        let done = widget_set_note_completed(added.id.expect("note id"), true);
        assert!(done.ok, "{}", done.message);
        assert!(widget_redraw().contains(&widget_id));
        assert_eq!(widget_count(widget_id), 0);

        assert!(widget_close(widget_id));
    }

    #[test]
    fn unknown_widget_renders_placeholder_row() {
        let _guard = serial();
        let widget_id = unique_widget_id();
        assert_eq!(widget_count(widget_id), 0);
        let row = widget_row(widget_id, 3);
        assert!(row.title.is_empty());
        assert_eq!(row.note_id, -1);
        assert_eq!(row.list_id, -1);
        assert!(!widget_close(widget_id));
    }

    #[test]
    fn open_rejects_invalid_widget_id() {
        let _guard = serial();
        let response = widget_open(0);
        assert!(!response.ok);
        assert!(response.message.contains("invalid widget id"));
    }
}
