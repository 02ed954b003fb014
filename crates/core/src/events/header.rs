use std::time::SystemTime;

use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
pub struct EventHeader {
    pub event_id: Uuid,
    pub parent_ids: Vec<Uuid>,
    pub timestamp: SystemTime,
}

impl EventHeader {
    pub fn new() -> Self {
        Self::caused_by(Vec::new())
    }

    pub fn caused_by(parent_ids: Vec<Uuid>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            parent_ids,
            timestamp: SystemTime::now(),
        }
    }
}

impl Default for EventHeader {
    fn default() -> Self {
        Self::new()
    }
}
