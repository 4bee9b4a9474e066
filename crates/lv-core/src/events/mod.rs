use std::sync::Arc;
use parking_lot::Mutex;
use ahash::AHashMap;

/// Publish/subscribe bus for notifications aimed at the host UI.
///
/// Handlers run synchronously on `publish`, outside the bus lock, so a handler
/// may subscribe or publish other event types. A nested publish of the event
/// type currently being delivered reaches only handlers added since.
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<std::any::TypeId, Vec<Box<dyn EventHandler>>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Events published by the coordinator and the linked session
pub mod events {
    use super::Event;
    use crate::ids::{Generation, ViewId};
    use crate::selection::Selection;

    /// The canonical selection was replaced and broadcast
    #[derive(Debug, Clone)]
    pub struct SelectionChanged {
        pub selection: Selection,
    }

    /// A new dataset snapshot became current
    #[derive(Debug, Clone)]
    pub struct DatasetReloaded {
        pub generation: Generation,
        pub row_count: usize,
        pub dimension_count: usize,
    }

    /// A reload failed; the previous dataset is still current
    #[derive(Debug, Clone)]
    pub struct DatasetRejected {
        pub error: String,
    }

    #[derive(Debug, Clone)]
    pub struct ViewRegistered {
        pub view_id: ViewId,
        pub view_type: String,
    }

    #[derive(Debug, Clone)]
    pub struct ViewClosed {
        pub view_id: ViewId,
    }

    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(
                impl Event for $t {
                    fn as_any(&self) -> &dyn std::any::Any {
                        self
                    }
                }
            )*
        }
    }

    impl_event!(
        SelectionChanged,
        DatasetReloaded,
        DatasetRejected,
        ViewRegistered,
        ViewClosed
    );
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers.entry(type_id).or_insert_with(Vec::new).push(handler);
    }

    /// Subscribe with a closure that receives the concrete event type
    pub fn subscribe_fn<E, F>(&self, mut f: F)
    where
        E: Event,
        F: FnMut(&E) + Send + Sync + 'static,
    {
        self.subscribe::<E>(handler_from_fn(move |event: &dyn Event| {
            if let Some(event) = event.as_any().downcast_ref::<E>() {
                f(event);
            }
        }));
    }

    /// Publish an event
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = std::any::TypeId::of::<E>();
        let Some(mut event_handlers) = self.handlers.lock().remove(&type_id) else {
            return;
        };

        for handler in event_handlers.iter_mut() {
            handler.handle(&event);
        }

        // Handlers subscribed while delivering go after the existing ones
        let mut handlers = self.handlers.lock();
        if let Some(added) = handlers.remove(&type_id) {
            event_handlers.extend(added);
        }
        handlers.insert(type_id, event_handlers);
    }

    pub fn handler_count<E: Event>(&self) -> usize {
        self.handlers
            .lock()
            .get(&std::any::TypeId::of::<E>())
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for creating event handlers from closures
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}

#[cfg(test)]
mod tests {
    use super::events::{DatasetRejected, DatasetReloaded, ViewClosed};
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_publish_reaches_only_matching_type() {
        let bus = EventBus::new();
        let closed = Arc::new(AtomicUsize::new(0));
        let counter = closed.clone();
        bus.subscribe_fn(move |_: &ViewClosed| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(ViewClosed { view_id: uuid::Uuid::new_v4() });
        bus.publish(DatasetRejected { error: "bad".to_string() });

        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert_eq!(bus.handler_count::<ViewClosed>(), 1);
        assert_eq!(bus.handler_count::<DatasetRejected>(), 0);
    }

    #[test]
    fn test_handler_may_publish_and_subscribe() {
        let bus = Arc::new(EventBus::new());
        let rejected = Arc::new(AtomicUsize::new(0));
        let counter = rejected.clone();
        bus.subscribe_fn(move |_: &DatasetRejected| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let inner = bus.clone();
        bus.subscribe_fn(move |_: &DatasetReloaded| {
            inner.publish(DatasetRejected { error: "nested".to_string() });
            inner.subscribe_fn(|_: &DatasetReloaded| {});
        });

        bus.publish(DatasetReloaded {
            generation: crate::ids::Generation(1),
            row_count: 0,
            dimension_count: 0,
        });

        assert_eq!(rejected.load(Ordering::SeqCst), 1);
        assert_eq!(bus.handler_count::<DatasetReloaded>(), 2);
    }
}
