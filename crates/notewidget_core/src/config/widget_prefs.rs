//! Widget prefs stores and config decoding.

use crate::db::{self, DbError, SharedConnection};
use crate::model::widget::{
    WidgetConfig, WidgetId, KEY_LIST, KEY_SORT_ORDER, KEY_SORT_TYPE,
};
use log::{info, warn};
use rusqlite::{params, OptionalExtension};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Prefs store error.
#[derive(Debug)]
pub enum ConfigError {
    Db(DbError),
    /// The backing store cannot serve reads right now.
    Unavailable(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "widget prefs unavailable: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for ConfigError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ConfigError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key/value prefs scoped by widget instance.
pub trait WidgetConfigStore: Send + Sync {
    fn get(&self, widget_id: WidgetId, key: &str) -> ConfigResult<Option<String>>;
    fn set(&self, widget_id: WidgetId, key: &str, value: &str) -> ConfigResult<()>;
    /// Drops every key of one widget instance.
    fn remove_widget(&self, widget_id: WidgetId) -> ConfigResult<()>;
}

/// Reads the effective config for one widget.
///
/// Missing or unparsable values decode to their defaults. Only a store read
/// failure is returned as an error.
pub fn load_widget_config(
    store: &dyn WidgetConfigStore,
    widget_id: WidgetId,
) -> ConfigResult<WidgetConfig> {
    let list = store.get(widget_id, KEY_LIST)?;
    let sort = store.get(widget_id, KEY_SORT_TYPE)?;
    let direction = store.get(widget_id, KEY_SORT_ORDER)?;

    let config = WidgetConfig::from_prefs(list.as_deref(), sort.as_deref(), direction.as_deref());
    if list.is_none() || sort.is_none() || direction.is_none() {
        info!("event=widget_config_load module=config status=defaulted widget_id={widget_id}");
    }
    Ok(config)
}

/// Persists all three keys for one widget.
pub fn save_widget_config(
    store: &dyn WidgetConfigStore,
    widget_id: WidgetId,
    config: &WidgetConfig,
) -> ConfigResult<()> {
    let result = store
        .set(widget_id, KEY_LIST, &config.list.to_pref_value())
        .and_then(|()| store.set(widget_id, KEY_SORT_TYPE, config.sort.as_pref_str()))
        .and_then(|()| store.set(widget_id, KEY_SORT_ORDER, config.direction.as_pref_str()));

    match &result {
        Ok(()) => info!(
            "event=widget_config_save module=config status=ok widget_id={widget_id} sort={} direction={}",
            config.sort.as_pref_str(),
            config.direction.as_pref_str()
        ),
        Err(err) => warn!(
            "event=widget_config_save module=config status=error widget_id={widget_id} error={err}"
        ),
    }
    result
}

/// Process-local prefs, used when no database is available and in tests.
#[derive(Default)]
pub struct InMemoryConfigStore {
    values: Mutex<BTreeMap<(WidgetId, String), String>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WidgetConfigStore for InMemoryConfigStore {
    fn get(&self, widget_id: WidgetId, key: &str) -> ConfigResult<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(&(widget_id, key.to_string())).cloned())
    }

    fn set(&self, widget_id: WidgetId, key: &str, value: &str) -> ConfigResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert((widget_id, key.to_string()), value.to_string());
        Ok(())
    }

    fn remove_widget(&self, widget_id: WidgetId) -> ConfigResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.retain(|(id, _), _| *id != widget_id);
        Ok(())
    }
}

/// Prefs kept in the `widget_prefs` table next to the notes.
pub struct SqliteConfigStore {
    conn: SharedConnection,
}

impl SqliteConfigStore {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

impl WidgetConfigStore for SqliteConfigStore {
    fn get(&self, widget_id: WidgetId, key: &str) -> ConfigResult<Option<String>> {
        let conn = db::lock(&self.conn);
        let value = conn
            .query_row(
                "SELECT value FROM widget_prefs WHERE widget_id = ?1 AND key = ?2;",
                params![widget_id, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, widget_id: WidgetId, key: &str, value: &str) -> ConfigResult<()> {
        let conn = db::lock(&self.conn);
        conn.execute(
            "INSERT INTO widget_prefs (widget_id, key, value)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (widget_id, key) DO UPDATE SET value = excluded.value;",
            params![widget_id, key, value],
        )?;
        Ok(())
    }

    fn remove_widget(&self, widget_id: WidgetId) -> ConfigResult<()> {
        let conn = db::lock(&self.conn);
        conn.execute("DELETE FROM widget_prefs WHERE widget_id = ?1;", [widget_id])?;
        Ok(())
    }
}
