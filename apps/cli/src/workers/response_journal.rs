use std::{path::PathBuf, sync::Arc};

use socrates_core::{
    events::{EnrichedEvent, EventBus, expect},
    queues::QueueKind,
    router::ResponseSubmitted,
    workers::{InputSpec, SubscriptionSpec, Worker},
};
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;

/// Appends every submitted response to a JSON-lines file.
pub struct ResponseJournalWorker {
    path: PathBuf,
}

impl ResponseJournalWorker {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Worker for ResponseJournalWorker {
    const SUBSCRIBER_ID: &'static str = "cli.response_journal";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![InputSpec {
                event_type: ResponseSubmitted::EVENT_TYPE,
                queue_kind: QueueKind::Isolated { output_buffer: 64 },
            }],
        }
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, _bus: &EventBus) -> anyhow::Result<()> {
        let req = expect::<ResponseSubmitted>(&event.event, ResponseSubmitted::EVENT_TYPE)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut line = serde_json::to_string(&req.response)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(question = %req.response.id, path = %self.path.display(), "Response journaled");
        Ok(())
    }
}
