use std::{
    collections::HashMap,
    sync::{Arc, atomic::AtomicU64},
};

use crate::{
    events::EnrichedEvent,
    queues::{FifoDropOldestQueue, IsolatedForwarder, Latest1Queue},
};

pub struct Routes {
    pub table: HashMap<&'static str, Vec<Route>>,
}

pub struct Route {
    pub subscriber_id: &'static str,
    pub inbox: RouteInbox,
    pub drops_total: Arc<AtomicU64>,
}

pub enum RouteInbox {
    Latest1(Arc<Latest1Queue<Arc<EnrichedEvent>>>),
    FifoDropOldest(Arc<FifoDropOldestQueue<Arc<EnrichedEvent>>>),
    Isolated(IsolatedForwarder<Arc<EnrichedEvent>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Delivered, but an older undelivered event was discarded to make room.
    Evicted,
    /// The inbox was full; this event was discarded.
    Rejected,
}

impl RouteInbox {
    pub fn try_deliver(&self, event: Arc<EnrichedEvent>) -> Delivery {
        match self {
            // Overwriting a stale snapshot is the point of Latest1, not a drop.
            RouteInbox::Latest1(q) => {
                q.set(event);
                Delivery::Delivered
            }
            RouteInbox::FifoDropOldest(q) => {
                if q.push_overwrite(event) {
                    Delivery::Evicted
                } else {
                    Delivery::Delivered
                }
            }
            RouteInbox::Isolated(fwd) => match fwd.try_send(event) {
                Ok(()) => Delivery::Delivered,
                Err(_) => Delivery::Rejected,
            },
        }
    }
}
