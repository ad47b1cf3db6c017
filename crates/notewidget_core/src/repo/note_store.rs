//! Notes store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide list/note persistence plus the filtered, sorted read used by
//!   list widgets.
//! - Emit change notifications after every successful mutation.
//!
//! # Invariants
//! - Reads never return tombstoned notes (`deleted = 1`).
//! - Sort clauses are built from enums only; user text is always bound.
//! - Due-date sort puts notes without a due date last in both directions;
//!   blank and whitespace-only values count as missing.
//! - Ties are broken by `id ASC` so identical inputs yield identical order.
//! - Observers are notified after the connection lock is released.

use crate::db::{self, DbError, SharedConnection};
use crate::model::note::{ListId, NewNote, NoteId, NoteRow, TaskStatus};
use crate::model::widget::{ListSelection, SortDirection, SortField, WidgetConfig};
use crate::repo::notify::{ChangeNotifier, ChangeObserver, SubscriptionId};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    note,
    list_id,
    due_date,
    gtask_status
FROM notes
WHERE deleted = 0";

pub type StoreResult<T> = Result<T, StoreError>;

/// Notes store error for persistence and query operations.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    NoteNotFound(NoteId),
    ListNotFound(ListId),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::ListNotFound(id) => write!(f, "list not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filter and ordering for one notes read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteQuery {
    pub list: ListSelection,
    /// `None` matches every status, including notes with no status.
    pub status: Option<TaskStatus>,
    pub sort: SortField,
    pub direction: SortDirection,
}

impl NoteQuery {
    /// Query a list widget runs: uncompleted notes of the selected list(s).
    pub fn for_widget(config: &WidgetConfig) -> Self {
        Self {
            list: config.list,
            status: Some(TaskStatus::NeedsAction),
            sort: config.sort,
            direction: config.direction,
        }
    }

    fn order_by_clause(&self) -> String {
        let direction = self.direction.as_pref_str();
        match self.sort {
            SortField::DueDate => format!(
                "NULLIF(TRIM(due_date), '') IS NULL ASC, NULLIF(TRIM(due_date), '') {direction}, id ASC"
            ),
            SortField::Title => format!("title COLLATE NOCASE {direction}, id ASC"),
        }
    }
}

/// Queryable, observable notes store.
pub trait NoteStore: Send + Sync {
    /// Creates one note list and returns its id.
    fn create_list(&self, title: &str) -> StoreResult<ListId>;
    /// Inserts one note into an existing list.
    fn insert_note(&self, note: &NewNote) -> StoreResult<NoteId>;
    /// Replaces every mutable field of a visible note.
    fn update_note(&self, id: NoteId, note: &NewNote) -> StoreResult<()>;
    /// Sets the sync completion status of a visible note.
    fn set_note_status(&self, id: NoteId, status: TaskStatus) -> StoreResult<()>;
    /// Tombstones a visible note.
    fn delete_note(&self, id: NoteId) -> StoreResult<()>;
    /// Gets one visible note by id.
    fn get_note(&self, id: NoteId) -> StoreResult<Option<NoteRow>>;
    /// Runs a filtered, sorted read over visible notes.
    fn query_notes(&self, query: &NoteQuery) -> StoreResult<Vec<NoteRow>>;
    /// Registers an observer for every future mutation.
    fn subscribe(&self, observer: Arc<dyn ChangeObserver>) -> SubscriptionId;
    /// Returns `false` when `id` was not registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// SQLite-backed notes store.
pub struct SqliteNoteStore {
    conn: SharedConnection,
    notifier: ChangeNotifier,
}

impl SqliteNoteStore {
    /// Constructs a store over a migrated connection.
    pub fn new(conn: SharedConnection) -> Self {
        Self {
            conn,
            notifier: ChangeNotifier::new(),
        }
    }

    /// Number of registered observers.
    pub fn subscriber_count(&self) -> usize {
        self.notifier.len()
    }

    fn mutate<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let result = {
            let conn = db::lock(&self.conn);
            f(&conn)
        };
        if result.is_ok() {
            debug!("event=store_mutation module=store status=ok op={op}");
            self.notifier.notify_all();
        }
        result
    }
}

impl NoteStore for SqliteNoteStore {
    fn create_list(&self, title: &str) -> StoreResult<ListId> {
        self.mutate("create_list", |conn| {
            conn.execute("INSERT INTO lists (title) VALUES (?1);", [title])?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn insert_note(&self, note: &NewNote) -> StoreResult<NoteId> {
        self.mutate("insert_note", |conn| {
            ensure_list_exists(conn, note.list_id)?;
            conn.execute(
                "INSERT INTO notes (title, note, list_id, due_date, gtask_status)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    note.title.as_str(),
                    note.note.as_str(),
                    note.list_id,
                    note.due_date.as_deref(),
                    note.status.as_db_str(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn update_note(&self, id: NoteId, note: &NewNote) -> StoreResult<()> {
        self.mutate("update_note", |conn| {
            ensure_list_exists(conn, note.list_id)?;
            let changed = conn.execute(
                "UPDATE notes
                 SET
                    title = ?2,
                    note = ?3,
                    list_id = ?4,
                    due_date = ?5,
                    gtask_status = ?6,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1
                   AND deleted = 0;",
                params![
                    id,
                    note.title.as_str(),
                    note.note.as_str(),
                    note.list_id,
                    note.due_date.as_deref(),
                    note.status.as_db_str(),
                ],
            )?;
            require_changed(changed, id)
        })
    }

    fn set_note_status(&self, id: NoteId, status: TaskStatus) -> StoreResult<()> {
        self.mutate("set_note_status", |conn| {
            let changed = conn.execute(
                "UPDATE notes
                 SET
                    gtask_status = ?2,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1
                   AND deleted = 0;",
                params![id, status.as_db_str()],
            )?;
            require_changed(changed, id)
        })
    }

    fn delete_note(&self, id: NoteId) -> StoreResult<()> {
        self.mutate("delete_note", |conn| {
            let changed = conn.execute(
                "UPDATE notes
                 SET
                    deleted = 1,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1
                   AND deleted = 0;",
                [id],
            )?;
            require_changed(changed, id)
        })
    }

    fn get_note(&self, id: NoteId) -> StoreResult<Option<NoteRow>> {
        let conn = db::lock(&self.conn);
        let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} AND id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }
        Ok(None)
    }

    fn query_notes(&self, query: &NoteQuery) -> StoreResult<Vec<NoteRow>> {
        let started_at = Instant::now();
        let mut sql = String::from(NOTE_SELECT_SQL);
        let mut bind_values: Vec<Value> = Vec::new();

        if let ListSelection::List(list_id) = query.list {
            sql.push_str(" AND list_id = ?");
            bind_values.push(Value::Integer(list_id));
        }

        if let Some(status) = query.status {
            sql.push_str(" AND gtask_status = ?");
            bind_values.push(Value::Text(status.as_db_str().to_string()));
        }

        sql.push_str(" ORDER BY ");
        sql.push_str(&query.order_by_clause());

        let conn = db::lock(&self.conn);
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }

        info!(
            "event=notes_query module=store status=ok sort={} direction={} all_lists={} rows={} duration_ms={}",
            query.sort.as_pref_str(),
            query.direction.as_pref_str(),
            query.list == ListSelection::All,
            notes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(notes)
    }

    fn subscribe(&self, observer: Arc<dyn ChangeObserver>) -> SubscriptionId {
        self.notifier.subscribe(observer)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }
}

fn parse_note_row(row: &Row<'_>) -> StoreResult<NoteRow> {
    let status = match row.get::<_, Option<String>>("gtask_status")? {
        Some(value) => Some(TaskStatus::from_db_str(&value).ok_or_else(|| {
            StoreError::InvalidData(format!("invalid status `{value}` in notes.gtask_status"))
        })?),
        None => None,
    };

    Ok(NoteRow {
        id: row.get("id")?,
        title: row.get("title")?,
        note: row.get("note")?,
        list_id: row.get("list_id")?,
        due_date: row.get("due_date")?,
        status,
    })
}

fn ensure_list_exists(conn: &Connection, list_id: ListId) -> StoreResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM lists WHERE id = ?1);",
        [list_id],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(StoreError::ListNotFound(list_id))
    }
}

fn require_changed(changed: usize, id: NoteId) -> StoreResult<()> {
    if changed == 0 {
        return Err(StoreError::NoteNotFound(id));
    }
    Ok(())
}
