use std::sync::{Arc, Mutex, PoisonError};

use crate::events::{Event, EventBus, downcast_ref};

/// Where the router sends its outbound events.
pub trait Publisher {
    fn publish(&self, event: Arc<dyn Event>);
}

impl Publisher for EventBus {
    fn publish(&self, event: Arc<dyn Event>) {
        EventBus::publish(self, event);
    }
}

impl<P: Publisher + ?Sized> Publisher for Arc<P> {
    fn publish(&self, event: Arc<dyn Event>) {
        (**self).publish(event);
    }
}

/// Keeps every published event in memory, in order.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<Arc<dyn Event>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.lock().iter().map(|e| e.event_type()).collect()
    }

    /// Every recorded event of type `T`, cloned out.
    pub fn of_type<T: Clone + 'static>(&self) -> Vec<T> {
        self.lock()
            .iter()
            .filter_map(|e| downcast_ref::<T>(e).cloned())
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<dyn Event>>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, event: Arc<dyn Event>) {
        self.lock().push(event);
    }
}
