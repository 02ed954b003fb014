use std::sync::Arc;

use anyhow::Context;
use socrates_core::{
    events::{EnrichedEvent, EventBus, expect},
    queues::QueueKind,
    router::ResponseSubmitted,
    workers::{InputSpec, SubscriptionSpec, Worker},
};
use tracing::debug;

/// POSTs each response to a collection endpoint. Failures surface as
/// `worker.failed` and never hold up playback.
pub struct ResponseTransportWorker {
    client: reqwest::Client,
    url: String,
}

impl ResponseTransportWorker {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

impl Worker for ResponseTransportWorker {
    const SUBSCRIBER_ID: &'static str = "cli.response_transport";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![InputSpec {
                event_type: ResponseSubmitted::EVENT_TYPE,
                queue_kind: QueueKind::FifoDropOldest { capacity: 32 },
            }],
        }
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, _bus: &EventBus) -> anyhow::Result<()> {
        let req = expect::<ResponseSubmitted>(&event.event, ResponseSubmitted::EVENT_TYPE)?;

        let status = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&req.response)
            .send()
            .await
            .with_context(|| format!("posting response to {}", self.url))?
            .status();

        if !status.is_success() {
            anyhow::bail!("response endpoint returned {status}");
        }

        debug!(question = %req.response.id, %status, "Response delivered");
        Ok(())
    }
}
