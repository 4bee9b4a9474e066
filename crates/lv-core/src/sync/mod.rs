use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::events::{events::SelectionChanged, EventBus};
use crate::ids::{Generation, ViewId};
use crate::selection::{CandidateSelection, Selection};

/// Receiver of canonical selection broadcasts (one per registered view)
pub trait SelectionSubscriber: Send + Sync {
    /// Called synchronously on every broadcast, including for the view that
    /// originated the selection
    fn on_selection_change(&self, selection: &Selection);
}

/// Single source of truth for the canonical selection.
///
/// The coordinator never evaluates membership itself: it takes the latest
/// candidate verbatim and relays it to every registered view.
pub struct SelectionCoordinator {
    /// Canonical selection
    selection: Arc<RwLock<Selection>>,

    /// Registered views in registration order
    views: Arc<RwLock<Vec<(ViewId, Weak<dyn SelectionSubscriber>)>>>,

    /// Set while a broadcast is being delivered
    broadcasting: AtomicBool,

    /// Host-facing notifications
    event_bus: Arc<EventBus>,
}

/// Clears the broadcasting flag when the broadcast scope ends
struct BroadcastGuard<'a>(&'a AtomicBool);

impl Drop for BroadcastGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SelectionCoordinator {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            selection: Arc::new(RwLock::new(Selection::default())),
            views: Arc::new(RwLock::new(Vec::new())),
            broadcasting: AtomicBool::new(false),
            event_bus,
        }
    }

    /// Copy of the current canonical selection
    pub fn selection(&self) -> Selection {
        self.selection.read().clone()
    }

    /// Dataset generation candidates must be computed against
    pub fn generation(&self) -> Generation {
        self.selection.read().generation
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Replace the canonical selection with `candidate` and broadcast it.
    ///
    /// Returns the new selection, or `None` when the candidate was dropped:
    /// either it was computed against another dataset generation, or it was
    /// submitted from inside a broadcast.
    pub fn submit(&self, candidate: CandidateSelection, origin: ViewId) -> Option<Selection> {
        if self.broadcasting.load(Ordering::Acquire) {
            warn!("Ignoring selection submitted by view {} during a broadcast", origin);
            return None;
        }

        let selection = {
            let mut current = self.selection.write();
            if candidate.generation != current.generation {
                warn!(
                    "Ignoring stale candidate from view {} ({} != current {})",
                    origin, candidate.generation, current.generation
                );
                return None;
            }
            let next = Selection {
                membership: candidate.membership,
                origin: Some(origin),
                generation: current.generation,
                revision: current.revision + 1,
            };
            *current = next.clone();
            next
        };

        debug!(
            "Selection r{} from view {}: {}",
            selection.revision,
            origin,
            match selection.len() {
                Some(n) => format!("{} records", n),
                None => "no constraint".to_string(),
            }
        );

        self.broadcast(&selection);
        Some(selection)
    }

    /// Explicitly clear the selection back to the no-constraint state
    pub fn clear(&self, origin: ViewId) -> Option<Selection> {
        let generation = self.generation();
        self.submit(CandidateSelection::cleared(generation), origin)
    }

    /// Adopt a new dataset generation and reset to no constraint.
    ///
    /// Must run before any view redraws against the new dataset.
    pub fn reset_for_reload(&self, generation: Generation) -> Selection {
        let selection = {
            let mut current = self.selection.write();
            let next = Selection {
                revision: current.revision + 1,
                ..Selection::unconstrained(generation)
            };
            *current = next.clone();
            next
        };

        info!("Selection reset for dataset {}", generation);
        self.broadcast(&selection);
        selection
    }

    /// Register a view. It immediately receives the current selection.
    pub fn register_view<S>(&self, view_id: ViewId, subscriber: &Arc<S>)
    where
        S: SelectionSubscriber + 'static,
    {
        let weak: Weak<dyn SelectionSubscriber> = Arc::downgrade(subscriber) as Weak<dyn SelectionSubscriber>;
        {
            let mut views = self.views.write();
            views.retain(|(id, _)| *id != view_id);
            views.push((view_id, weak));
        }
        debug!("Registered view {}", view_id);

        let current = self.selection();
        subscriber.on_selection_change(&current);
    }

    /// Unregister a view. Other views and the canonical selection are untouched.
    pub fn unregister_view(&self, view_id: ViewId) -> bool {
        let mut views = self.views.write();
        let before = views.len();
        views.retain(|(id, _)| *id != view_id);
        let removed = views.len() != before;
        if removed {
            debug!("Unregistered view {}", view_id);
        }
        removed
    }

    /// Number of registered views that are still alive
    pub fn view_count(&self) -> usize {
        self.views
            .read()
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    /// Host hook invoked after every broadcast. For display only: feeding the
    /// selection back into `submit` from here is rejected.
    pub fn on_selection_changed<F>(&self, mut handler: F)
    where
        F: FnMut(&Selection) + Send + Sync + 'static,
    {
        self.event_bus
            .subscribe_fn(move |event: &SelectionChanged| handler(&event.selection));
    }

    fn broadcast(&self, selection: &Selection) {
        self.broadcasting.store(true, Ordering::Release);
        let _guard = BroadcastGuard(&self.broadcasting);

        // Collect live subscribers first so they can read the coordinator
        let live: Vec<Arc<dyn SelectionSubscriber>> = {
            let mut views = self.views.write();
            views.retain(|(_, weak)| weak.strong_count() > 0);
            views.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
        };

        for subscriber in &live {
            subscriber.on_selection_change(selection);
        }

        self.event_bus.publish(SelectionChanged {
            selection: selection.clone(),
        });
    }
}

impl Default for SelectionCoordinator {
    fn default() -> Self {
        Self::new(Arc::new(EventBus::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RecordId;
    use crate::selection::Membership;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Selection>>,
    }

    impl SelectionSubscriber for Recorder {
        fn on_selection_change(&self, selection: &Selection) {
            self.seen.lock().push(selection.clone());
        }
    }

    impl Recorder {
        fn last(&self) -> Selection {
            self.seen.lock().last().cloned().unwrap()
        }
    }

    fn candidate(ids: &[u64]) -> CandidateSelection {
        CandidateSelection::new(
            Membership::only(ids.iter().map(|&i| RecordId(i))),
            Generation::default(),
        )
    }

    #[test]
    fn test_submit_replaces_instead_of_merging() {
        let coordinator = SelectionCoordinator::default();
        let view_a = uuid::Uuid::new_v4();
        let view_b = uuid::Uuid::new_v4();

        coordinator.submit(candidate(&[0, 1]), view_a);
        coordinator.submit(candidate(&[1, 2]), view_b);

        let selection = coordinator.selection();
        assert_eq!(selection.ids(), vec![RecordId(1), RecordId(2)]);
        assert_eq!(selection.origin, Some(view_b));
        assert_eq!(selection.revision, 2);
    }

    #[test]
    fn test_broadcast_reaches_origin_and_others() {
        let coordinator = SelectionCoordinator::default();
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        let id_a = uuid::Uuid::new_v4();
        let id_b = uuid::Uuid::new_v4();
        coordinator.register_view(id_a, &a);
        coordinator.register_view(id_b, &b);

        coordinator.submit(candidate(&[1]), id_a);

        assert_eq!(a.last(), b.last());
        assert_eq!(a.last().ids(), vec![RecordId(1)]);
        // registration delivery + one broadcast
        assert_eq!(a.seen.lock().len(), 2);
    }

    #[test]
    fn test_clear_yields_no_constraint() {
        let coordinator = SelectionCoordinator::default();
        let view = uuid::Uuid::new_v4();
        coordinator.submit(candidate(&[]), view);
        assert_eq!(coordinator.selection().len(), Some(0));

        coordinator.clear(view);
        assert!(coordinator.selection().is_unconstrained());
    }

    #[test]
    fn test_stale_candidate_is_dropped() {
        let coordinator = SelectionCoordinator::default();
        let view = uuid::Uuid::new_v4();
        coordinator.reset_for_reload(Generation(1));

        assert!(coordinator.submit(candidate(&[0]), view).is_none());
        assert!(coordinator.selection().is_unconstrained());
        assert_eq!(coordinator.selection().generation, Generation(1));
    }

    #[test]
    fn test_unregister_and_dropped_views_stop_receiving() {
        let coordinator = SelectionCoordinator::default();
        let kept = Arc::new(Recorder::default());
        let removed = Arc::new(Recorder::default());
        let kept_id = uuid::Uuid::new_v4();
        let removed_id = uuid::Uuid::new_v4();
        coordinator.register_view(kept_id, &kept);
        coordinator.register_view(removed_id, &removed);

        coordinator.submit(candidate(&[3]), kept_id);
        assert!(coordinator.unregister_view(removed_id));
        coordinator.submit(candidate(&[4]), kept_id);

        assert_eq!(removed.last().ids(), vec![RecordId(3)]);
        assert_eq!(kept.last().ids(), vec![RecordId(4)]);
        assert_eq!(coordinator.selection().ids(), vec![RecordId(4)]);

        {
            let dropped = Arc::new(Recorder::default());
            coordinator.register_view(uuid::Uuid::new_v4(), &dropped);
            assert_eq!(coordinator.view_count(), 2);
        }
        coordinator.submit(candidate(&[5]), kept_id);
        assert_eq!(coordinator.view_count(), 1);
    }

    #[test]
    fn test_feedback_submit_from_host_hook_is_rejected() {
        let coordinator = Arc::new(SelectionCoordinator::default());
        let view = uuid::Uuid::new_v4();
        let looped = coordinator.clone();
        let rejected = Arc::new(Mutex::new(Vec::new()));
        let sink = rejected.clone();
        coordinator.on_selection_changed(move |selection| {
            let fed_back = CandidateSelection::new(selection.membership.clone(), selection.generation);
            sink.lock().push(looped.submit(fed_back, view).is_none());
        });

        coordinator.submit(candidate(&[1]), view);

        assert_eq!(*rejected.lock(), vec![true]);
        assert_eq!(coordinator.selection().revision, 1);
    }

    #[test]
    fn test_host_event_handler_can_clear_selection() {
        use crate::events::events::DatasetReloaded;

        let bus = Arc::new(EventBus::new());
        let coordinator = Arc::new(SelectionCoordinator::new(bus.clone()));
        let view = uuid::Uuid::new_v4();
        coordinator.submit(candidate(&[2]), view);

        let hook_calls = Arc::new(Mutex::new(0));
        let calls = hook_calls.clone();
        coordinator.on_selection_changed(move |_| *calls.lock() += 1);

        let handle = coordinator.clone();
        bus.subscribe_fn(move |_: &DatasetReloaded| {
            handle.clear(view);
        });

        bus.publish(DatasetReloaded {
            generation: Generation::default(),
            row_count: 3,
            dimension_count: 2,
        });

        assert!(coordinator.selection().is_unconstrained());
        assert_eq!(*hook_calls.lock(), 1);
    }
}
