//! Store-to-host change bridge for one widget instance.

use crate::model::widget::WidgetId;
use crate::repo::notify::ChangeObserver;
use log::debug;
use std::sync::Arc;

/// Host rendering platform, as seen by the widget adapter.
pub trait WidgetHost: Send + Sync {
    /// Marks the list view of `widget_id` as stale.
    ///
    /// The host later calls `on_data_set_changed` on that widget's factory and
    /// redraws it.
    fn notify_widget_data_changed(&self, widget_id: WidgetId);
}

/// Forwards every store mutation as a stale signal for one widget.
///
/// Stateless; redundant notifications cause redundant refreshes.
pub struct WidgetChangeObserver {
    widget_id: WidgetId,
    host: Arc<dyn WidgetHost>,
}

impl WidgetChangeObserver {
    pub fn new(widget_id: WidgetId, host: Arc<dyn WidgetHost>) -> Self {
        Self { widget_id, host }
    }

    pub fn widget_id(&self) -> WidgetId {
        self.widget_id
    }
}

impl ChangeObserver for WidgetChangeObserver {
    fn on_change(&self) {
        debug!(
            "event=widget_data_changed module=widget status=ok widget_id={}",
            self.widget_id
        );
        self.host.notify_widget_data_changed(self.widget_id);
    }
}
