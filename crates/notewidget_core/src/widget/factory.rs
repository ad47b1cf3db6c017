//! Widget view factory.
//!
//! # Responsibility
//! - Implement the host's collection-widget callback surface for one widget.
//! - Re-read the widget config and re-run its notes query on every refresh.
//!
//! # Invariants
//! - A refresh installs a fully built snapshot in one swap; readers never see
//!   a partial result.
//! - After a refresh that reached the store, rows always match the config
//!   read by that refresh, even when the query failed (empty rows).
//! - When the config cannot be read, the previous snapshot is kept.
//! - Row identity is the row position, not the note id.

use crate::config::widget_prefs::{load_widget_config, WidgetConfigStore};
use crate::model::note::NoteRow;
use crate::model::widget::{WidgetConfig, WidgetId};
use crate::repo::note_store::{NoteQuery, NoteStore};
use crate::repo::notify::SubscriptionId;
use crate::widget::observer::{WidgetChangeObserver, WidgetHost};
use crate::widget::row::RowDescriptor;
use log::{error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Instant;

/// Number of distinct row layouts a notes widget uses.
const VIEW_TYPE_COUNT: usize = 1;

/// Callback surface a collection-widget host drives.
///
/// The host never overlaps `on_data_set_changed` with `count`/`view_at` for
/// the same instance; implementations must still tolerate store notifications
/// arriving from another thread.
pub trait RemoteViewsFactory: Send + Sync {
    /// Registers for data-change notifications.
    fn on_create(&self);
    /// Unregisters and releases the active result. Safe to call at any time.
    fn on_destroy(&self);
    /// Rebuilds the active result from the current config and store.
    fn on_data_set_changed(&self);
    fn count(&self) -> usize;
    /// Out-of-range positions yield `RowDescriptor::default()`.
    fn view_at(&self, position: usize) -> RowDescriptor;
    /// `None` lets the host show its default loading row.
    fn loading_view(&self) -> Option<RowDescriptor>;
    fn view_type_count(&self) -> usize;
    fn item_id(&self, position: usize) -> i64;
    fn has_stable_ids(&self) -> bool;
}

/// Immutable result of one refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSnapshot {
    pub config: WidgetConfig,
    pub rows: Vec<NoteRow>,
}

/// Factory backing one notes list widget.
pub struct NoteListWidgetFactory {
    widget_id: WidgetId,
    store: Arc<dyn NoteStore>,
    config_store: Arc<dyn WidgetConfigStore>,
    host: Arc<dyn WidgetHost>,
    subscription: Mutex<Option<SubscriptionId>>,
    snapshot: RwLock<Option<Arc<RowSnapshot>>>,
}

impl std::fmt::Debug for NoteListWidgetFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteListWidgetFactory")
            .field("widget_id", &self.widget_id)
            .finish_non_exhaustive()
    }
}

impl NoteListWidgetFactory {
    pub fn new(
        widget_id: WidgetId,
        store: Arc<dyn NoteStore>,
        config_store: Arc<dyn WidgetConfigStore>,
        host: Arc<dyn WidgetHost>,
    ) -> Self {
        Self {
            widget_id,
            store,
            config_store,
            host,
            subscription: Mutex::new(None),
            snapshot: RwLock::new(None),
        }
    }

    pub fn widget_id(&self) -> WidgetId {
        self.widget_id
    }

    /// Whether the factory currently holds a store subscription.
    pub fn is_subscribed(&self) -> bool {
        self.subscription().is_some()
    }

    /// Returns the active snapshot, if any refresh has installed one.
    pub fn snapshot(&self) -> Option<Arc<RowSnapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn install(&self, snapshot: Option<Arc<RowSnapshot>>) {
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    fn subscription(&self) -> MutexGuard<'_, Option<SubscriptionId>> {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl RemoteViewsFactory for NoteListWidgetFactory {
    fn on_create(&self) {
        let mut subscription = self.subscription();
        if subscription.is_some() {
            return;
        }
        let observer = WidgetChangeObserver::new(self.widget_id, self.host.clone());
        *subscription = Some(self.store.subscribe(Arc::new(observer)));
        info!(
            "event=widget_create module=widget status=ok widget_id={}",
            self.widget_id
        );
    }

    fn on_destroy(&self) {
        let subscription = self.subscription().take();
        if let Some(id) = subscription {
            self.store.unsubscribe(id);
        }
        self.install(None);
        info!(
            "event=widget_destroy module=widget status=ok widget_id={}",
            self.widget_id
        );
    }

    fn on_data_set_changed(&self) {
        let started_at = Instant::now();
        let config = match load_widget_config(self.config_store.as_ref(), self.widget_id) {
            Ok(config) => config,
            Err(err) => {
                warn!(
                    "event=widget_refresh module=widget status=skipped widget_id={} error_code=config_unreadable error={}",
                    self.widget_id, err
                );
                return;
            }
        };

        let rows = match self.store.query_notes(&NoteQuery::for_widget(&config)) {
            Ok(rows) => rows,
            Err(err) => {
                error!(
                    "event=widget_refresh module=widget status=error widget_id={} error_code=query_failed error={}",
                    self.widget_id, err
                );
                Vec::new()
            }
        };

        let row_count = rows.len();
        self.install(Some(Arc::new(RowSnapshot { config, rows })));
        info!(
            "event=widget_refresh module=widget status=ok widget_id={} rows={} duration_ms={}",
            self.widget_id,
            row_count,
            started_at.elapsed().as_millis()
        );
    }

    fn count(&self) -> usize {
        self.snapshot().map_or(0, |snapshot| snapshot.rows.len())
    }

    fn view_at(&self, position: usize) -> RowDescriptor {
        self.snapshot()
            .and_then(|snapshot| snapshot.rows.get(position).map(RowDescriptor::from))
            .unwrap_or_default()
    }

    fn loading_view(&self) -> Option<RowDescriptor> {
        None
    }

    fn view_type_count(&self) -> usize {
        VIEW_TYPE_COUNT
    }

    // Position identity: a row's id may point at another note after a reorder.
    fn item_id(&self, position: usize) -> i64 {
        i64::try_from(position).unwrap_or(i64::MAX)
    }

    fn has_stable_ids(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteListWidgetFactory, RemoteViewsFactory};
    use crate::config::widget_prefs::{ConfigError, ConfigResult, InMemoryConfigStore, WidgetConfigStore};
    use crate::model::note::{ListId, NewNote, NoteId, NoteRow, TaskStatus};
    use crate::model::widget::WidgetId;
    use crate::repo::note_store::{NoteQuery, NoteStore, StoreError, StoreResult};
    use crate::repo::notify::{ChangeNotifier, ChangeObserver, SubscriptionId};
    use crate::widget::observer::WidgetHost;
    use crate::widget::row::RowDescriptor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct NullHost;

    impl WidgetHost for NullHost {
        fn notify_widget_data_changed(&self, _widget_id: WidgetId) {}
    }

    /// Store serving fixed rows, optionally failing every query.
    struct FixedStore {
        rows: Vec<NoteRow>,
        fail: AtomicBool,
        notifier: ChangeNotifier,
    }

    impl FixedStore {
        fn new(rows: Vec<NoteRow>) -> Self {
            Self {
                rows,
                fail: AtomicBool::new(false),
                notifier: ChangeNotifier::new(),
            }
        }
    }

    impl NoteStore for FixedStore {
        fn create_list(&self, _title: &str) -> StoreResult<ListId> {
            Ok(1)
        }
        fn insert_note(&self, _note: &NewNote) -> StoreResult<NoteId> {
            Ok(1)
        }
        fn update_note(&self, id: NoteId, _note: &NewNote) -> StoreResult<()> {
            Err(StoreError::NoteNotFound(id))
        }
        fn set_note_status(&self, id: NoteId, _status: TaskStatus) -> StoreResult<()> {
            Err(StoreError::NoteNotFound(id))
        }
        fn delete_note(&self, id: NoteId) -> StoreResult<()> {
            Err(StoreError::NoteNotFound(id))
        }
        fn get_note(&self, _id: NoteId) -> StoreResult<Option<NoteRow>> {
            Ok(None)
        }
        fn query_notes(&self, _query: &NoteQuery) -> StoreResult<Vec<NoteRow>> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StoreError::InvalidData("store offline".to_string()));
            }
            Ok(self.rows.clone())
        }
        fn subscribe(&self, observer: Arc<dyn ChangeObserver>) -> SubscriptionId {
            self.notifier.subscribe(observer)
        }
        fn unsubscribe(&self, id: SubscriptionId) -> bool {
            self.notifier.unsubscribe(id)
        }
    }

    /// Prefs store that can be switched into a failing state.
    #[derive(Default)]
    struct FlakyConfigStore {
        broken: AtomicBool,
        inner: InMemoryConfigStore,
    }

    impl FlakyConfigStore {
        fn check(&self) -> ConfigResult<()> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(ConfigError::Unavailable("prefs file locked".to_string()));
            }
            Ok(())
        }
    }

    impl WidgetConfigStore for FlakyConfigStore {
        fn get(&self, widget_id: WidgetId, key: &str) -> ConfigResult<Option<String>> {
            self.check()?;
            self.inner.get(widget_id, key)
        }
        fn set(&self, widget_id: WidgetId, key: &str, value: &str) -> ConfigResult<()> {
            self.check()?;
            self.inner.set(widget_id, key, value)
        }
        fn remove_widget(&self, widget_id: WidgetId) -> ConfigResult<()> {
            self.inner.remove_widget(widget_id)
        }
    }

    fn note(id: NoteId) -> NoteRow {
        NoteRow {
            id,
            title: format!("note {id}"),
            note: String::new(),
            list_id: 1,
            due_date: None,
            status: Some(TaskStatus::NeedsAction),
        }
    }

    fn factory_with(store: Arc<FixedStore>) -> NoteListWidgetFactory {
        NoteListWidgetFactory::new(
            7,
            store,
            Arc::new(InMemoryConfigStore::new()),
            Arc::new(NullHost),
        )
    }

    #[test]
    fn count_is_zero_before_first_refresh() {
        let factory = factory_with(Arc::new(FixedStore::new(vec![note(1)])));
        assert_eq!(factory.count(), 0);
        assert_eq!(factory.view_at(0), RowDescriptor::default());
    }

    #[test]
    fn destroy_without_create_or_refresh_is_safe() {
        let factory = factory_with(Arc::new(FixedStore::new(Vec::new())));
        factory.on_destroy();
        factory.on_destroy();
        assert!(!factory.is_subscribed());
    }

    #[test]
    fn create_subscribes_once() {
        let store = Arc::new(FixedStore::new(Vec::new()));
        let factory = factory_with(store.clone());
        factory.on_create();
        factory.on_create();
        assert_eq!(store.notifier.len(), 1);

        factory.on_destroy();
        assert!(store.notifier.is_empty());
    }

    #[test]
    fn failed_query_replaces_rows_with_empty_result() {
        let store = Arc::new(FixedStore::new(vec![note(1), note(2)]));
        let factory = factory_with(store.clone());
        factory.on_data_set_changed();
        assert_eq!(factory.count(), 2);

        store.fail.store(true, Ordering::SeqCst);
        factory.on_data_set_changed();
        assert_eq!(factory.count(), 0);
    }

    #[test]
    fn unreadable_config_keeps_previous_rows() {
        let store = Arc::new(FixedStore::new(vec![note(1)]));
        let config_store = Arc::new(FlakyConfigStore::default());
        let factory =
            NoteListWidgetFactory::new(7, store, config_store.clone(), Arc::new(NullHost));
        factory.on_data_set_changed();
        let before = factory.snapshot().expect("first refresh installs a snapshot");

        config_store.broken.store(true, Ordering::SeqCst);
        factory.on_data_set_changed();

        let after = factory.snapshot().expect("snapshot is retained");
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(factory.count(), 1);
    }

    #[test]
    fn identity_is_position_and_layout_is_single() {
        let factory = factory_with(Arc::new(FixedStore::new(vec![note(10), note(20)])));
        factory.on_data_set_changed();
        assert_eq!(factory.item_id(0), 0);
        assert_eq!(factory.item_id(1), 1);
        assert!(factory.has_stable_ids());
        assert_eq!(factory.view_type_count(), 1);
        assert!(factory.loading_view().is_none());
    }
}
