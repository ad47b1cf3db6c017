//! Widget registry and redraw cycle.
//!
//! # Invariants
//! - At most one factory exists per widget id.
//! - A factory is registered only after it has subscribed and loaded rows.
//! - A widget marked stale any number of times between two redraw cycles is
//!   refreshed exactly once by the next cycle.
//! - Stale marks for widgets closed in the meantime are dropped.

use crate::config::widget_prefs::{save_widget_config, ConfigError, WidgetConfigStore};
use crate::model::widget::{WidgetConfig, WidgetId, INVALID_WIDGET_ID};
use crate::repo::note_store::NoteStore;
use crate::widget::factory::{NoteListWidgetFactory, RemoteViewsFactory};
use crate::widget::observer::WidgetHost;
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    InvalidWidgetId(WidgetId),
    Config(ConfigError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidWidgetId(id) => write!(f, "invalid widget id: {id}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidWidgetId(_) => None,
            Self::Config(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ServiceError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Host that queues stale widget ids until the next redraw cycle.
#[derive(Default)]
pub struct PendingRefreshHost {
    pending: Mutex<BTreeSet<WidgetId>>,
}

impl PendingRefreshHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, widget_id: WidgetId) -> bool {
        self.pending().contains(&widget_id)
    }

    /// Drains the stale set in ascending widget id order.
    pub fn take_pending(&self) -> Vec<WidgetId> {
        std::mem::take(&mut *self.pending()).into_iter().collect()
    }

    fn pending(&self) -> MutexGuard<'_, BTreeSet<WidgetId>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WidgetHost for PendingRefreshHost {
    fn notify_widget_data_changed(&self, widget_id: WidgetId) {
        self.pending().insert(widget_id);
    }
}

/// Registry of notes list widgets placed by the host.
pub struct ListWidgetService {
    store: Arc<dyn NoteStore>,
    config_store: Arc<dyn WidgetConfigStore>,
    host: Arc<PendingRefreshHost>,
    factories: Mutex<BTreeMap<WidgetId, Arc<NoteListWidgetFactory>>>,
}

impl ListWidgetService {
    pub fn new(store: Arc<dyn NoteStore>, config_store: Arc<dyn WidgetConfigStore>) -> Self {
        Self {
            store,
            config_store,
            host: Arc::new(PendingRefreshHost::new()),
            factories: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn NoteStore> {
        &self.store
    }

    pub fn host(&self) -> &Arc<PendingRefreshHost> {
        &self.host
    }

    /// Returns the factory of `widget_id`, creating and loading it on first use.
    pub fn open_widget(&self, widget_id: WidgetId) -> ServiceResult<Arc<NoteListWidgetFactory>> {
        if widget_id == INVALID_WIDGET_ID {
            return Err(ServiceError::InvalidWidgetId(widget_id));
        }

        // Held until the first refresh lands so no caller sees an unloaded factory.
        let mut factories = self.factories();
        if let Some(existing) = factories.get(&widget_id) {
            return Ok(existing.clone());
        }
        let host: Arc<dyn WidgetHost> = self.host.clone();
        let factory = Arc::new(NoteListWidgetFactory::new(
            widget_id,
            self.store.clone(),
            self.config_store.clone(),
            host,
        ));
        factory.on_create();
        factory.on_data_set_changed();
        factories.insert(widget_id, factory.clone());
        drop(factories);

        info!(
            "event=widget_open module=service status=ok widget_id={widget_id} rows={}",
            factory.count()
        );
        Ok(factory)
    }

    /// Tears down the factory of `widget_id`; `false` when none was open.
    pub fn close_widget(&self, widget_id: WidgetId) -> bool {
        let removed = self.factories().remove(&widget_id);
        match removed {
            Some(factory) => {
                factory.on_destroy();
                info!("event=widget_close module=service status=ok widget_id={widget_id}");
                true
            }
            None => false,
        }
    }

    /// Closes the widget and forgets its prefs (widget removed from screen).
    pub fn delete_widget(&self, widget_id: WidgetId) -> ServiceResult<()> {
        self.close_widget(widget_id);
        self.config_store.remove_widget(widget_id)?;
        Ok(())
    }

    /// Persists new settings and marks the widget stale.
    pub fn configure_widget(&self, widget_id: WidgetId, config: &WidgetConfig) -> ServiceResult<()> {
        if widget_id == INVALID_WIDGET_ID {
            return Err(ServiceError::InvalidWidgetId(widget_id));
        }
        save_widget_config(self.config_store.as_ref(), widget_id, config)?;
        self.host.notify_widget_data_changed(widget_id);
        Ok(())
    }

    pub fn factory(&self, widget_id: WidgetId) -> Option<Arc<NoteListWidgetFactory>> {
        self.factories().get(&widget_id).cloned()
    }

    pub fn widget_ids(&self) -> Vec<WidgetId> {
        self.factories().keys().copied().collect()
    }

    /// Refreshes every stale open widget once and returns their ids.
    pub fn run_redraw_cycle(&self) -> Vec<WidgetId> {
        let stale = self.host.take_pending();
        let targets = {
            let factories = self.factories();
            stale
                .iter()
                .filter_map(|widget_id| factories.get(widget_id).cloned())
                .collect::<Vec<_>>()
        };

        if targets.len() < stale.len() {
            warn!(
                "event=widget_redraw module=service status=partial stale={} open={}",
                stale.len(),
                targets.len()
            );
        }

        targets
            .into_iter()
            .map(|factory| {
                factory.on_data_set_changed();
                factory.widget_id()
            })
            .collect()
    }

    fn factories(&self) -> MutexGuard<'_, BTreeMap<WidgetId, Arc<NoteListWidgetFactory>>> {
        self.factories.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ListWidgetService {
    fn drop(&mut self) {
        let factories = std::mem::take(&mut *self.factories());
        for factory in factories.into_values() {
            factory.on_destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PendingRefreshHost;
    use crate::widget::observer::WidgetHost;

    #[test]
    fn repeated_marks_collapse_into_one_pending_entry() {
        let host = PendingRefreshHost::new();
        host.notify_widget_data_changed(3);
        host.notify_widget_data_changed(3);
        host.notify_widget_data_changed(1);

        assert!(host.is_pending(3));
        assert_eq!(host.take_pending(), vec![1, 3]);
        assert!(host.take_pending().is_empty());
    }
}
