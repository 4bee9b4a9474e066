//! Linked session: the record store, the coordinator and every registered view

use std::sync::Arc;
use tracing::{info, warn};

use lv_core::events::events::{DatasetRejected, DatasetReloaded, ViewClosed, ViewRegistered};
use lv_core::{EventBus, Selection, SelectionCoordinator, ViewId};
use lv_data::{DataError, RawRow, RecordSet, RecordStore, Schema};

use crate::linked::LinkedView;

/// Owns one dataset and the views linked over it
pub struct LinkedSession {
    store: RecordStore,
    coordinator: Arc<SelectionCoordinator>,
    event_bus: Arc<EventBus>,
    views: Vec<Box<dyn LinkedView>>,
}

impl LinkedSession {
    pub fn new(schema: Schema) -> Self {
        let event_bus = Arc::new(EventBus::new());
        Self {
            store: RecordStore::new(schema),
            coordinator: Arc::new(SelectionCoordinator::new(event_bus.clone())),
            event_bus,
            views: Vec::new(),
        }
    }

    /// Coordinator handle views are constructed with
    pub fn coordinator(&self) -> &Arc<SelectionCoordinator> {
        &self.coordinator
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn schema(&self) -> &Arc<Schema> {
        self.store.schema()
    }

    /// Current dataset snapshot
    pub fn records(&self) -> Arc<RecordSet> {
        self.store.current()
    }

    /// Attach a view. It is reset to the current dataset and immediately
    /// shows the current selection.
    pub fn register_view(&mut self, mut view: Box<dyn LinkedView>) -> ViewId {
        let view_id = view.id();
        view.reset(self.store.current());
        self.coordinator.register_view(view_id, view.projector());

        info!("Registered {} '{}' ({})", view.view_type(), view.title(), view_id);
        self.event_bus.publish(ViewRegistered {
            view_id,
            view_type: view.view_type().to_string(),
        });
        self.views.push(view);
        view_id
    }

    /// Detach a view. The canonical selection and the other views are untouched.
    pub fn unregister_view(&mut self, view_id: ViewId) -> Option<Box<dyn LinkedView>> {
        let pos = self.views.iter().position(|v| v.id() == view_id)?;
        let view = self.views.remove(pos);
        self.coordinator.unregister_view(view_id);

        info!("Closed {} ({})", view.view_type(), view_id);
        self.event_bus.publish(ViewClosed { view_id });
        Some(view)
    }

    /// Replace the dataset, all or nothing.
    ///
    /// On success every view resets first, then the selection resets to no
    /// constraint for the new generation. On failure nothing changes.
    pub fn reload(&mut self, rows: impl IntoIterator<Item = RawRow>) -> Result<Arc<RecordSet>, DataError> {
        let records = match self.store.reload(rows) {
            Ok(records) => records,
            Err(e) => {
                warn!("Dataset rejected: {}", e);
                self.event_bus.publish(DatasetRejected { error: e.to_string() });
                return Err(e);
            }
        };

        for view in self.views.iter_mut() {
            view.reset(records.clone());
        }
        self.coordinator.reset_for_reload(records.generation());

        self.event_bus.publish(DatasetReloaded {
            generation: records.generation(),
            row_count: records.len(),
            dimension_count: records.dimensions().len(),
        });
        Ok(records)
    }

    /// Current canonical selection
    pub fn selection(&self) -> Selection {
        self.coordinator.selection()
    }

    /// Host hook run after every broadcast. Display only.
    pub fn on_selection_changed<F>(&self, handler: F)
    where
        F: FnMut(&Selection) + Send + Sync + 'static,
    {
        self.coordinator.on_selection_changed(handler);
    }

    pub fn views(&self) -> &[Box<dyn LinkedView>] {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut [Box<dyn LinkedView>] {
        &mut self.views
    }

    pub fn view(&self, view_id: ViewId) -> Option<&dyn LinkedView> {
        self.views.iter().find(|v| v.id() == view_id).map(|v| &**v)
    }

    /// Concrete view by id
    pub fn view_as<T: 'static>(&self, view_id: ViewId) -> Option<&T> {
        self.view(view_id)?.as_any().downcast_ref::<T>()
    }

    pub fn view_as_mut<T: 'static>(&mut self, view_id: ViewId) -> Option<&mut T> {
        self.views
            .iter_mut()
            .find(|v| v.id() == view_id)?
            .as_any_mut()
            .downcast_mut::<T>()
    }
}
