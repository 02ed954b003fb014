use std::sync::Arc;

use serde::Serialize;

use crate::events::{Event, EventHeader};

#[derive(Clone, Debug, Serialize)]
pub struct WorkerFailed {
    pub header: EventHeader,
    pub stage: &'static str,
    pub message: String,
}

impl WorkerFailed {
    pub const EVENT_TYPE: &'static str = "worker.failed";

    pub fn new(cause: &Arc<dyn Event>, stage: &'static str, message: String) -> Self {
        Self {
            header: EventHeader::caused_by(vec![cause.event_id()]),
            stage,
            message,
        }
    }
}

crate::impl_event!(WorkerFailed);
