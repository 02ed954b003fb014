use std::{future::Future, sync::Arc};

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::{
    events::{EnrichedEvent, EventBus},
    workers::{SubscriptionSpec, WorkerBatch, WorkerFailed, WorkerInputs},
};

pub trait Worker: Send + Sized + 'static {
    const SUBSCRIBER_ID: &'static str;

    fn subscription() -> SubscriptionSpec;

    fn handle(
        &mut self,
        event: Arc<EnrichedEvent>,
        bus: &EventBus,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Consume inputs until shutdown. Handler errors are published as
    /// [`WorkerFailed`] and the loop keeps going.
    fn run(
        mut self,
        mut inputs: WorkerInputs,
        bus: Arc<EventBus>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            debug!(worker = Self::SUBSCRIBER_ID, "Worker started");
            loop {
                let batch = tokio::select! {
                    _ = shutdown.recv() => {
                        debug!(worker = Self::SUBSCRIBER_ID, "Worker stopped");
                        return Ok(());
                    }
                    batch = inputs.next() => batch,
                };

                let events = match batch {
                    WorkerBatch::Snapshots(updates) => {
                        updates.into_iter().map(|update| update.event).collect()
                    }
                    WorkerBatch::FifoItem { event, .. } => vec![event],
                };

                for event in events {
                    let cause = Arc::clone(&event.event);
                    if let Err(e) = self.handle(event, &bus).await {
                        warn!(worker = Self::SUBSCRIBER_ID, error = %e, "Worker failed");
                        bus.publish(Arc::new(WorkerFailed::new(
                            &cause,
                            Self::SUBSCRIBER_ID,
                            format!("{e:#}"),
                        )));
                    }
                }
            }
        }
    }
}
