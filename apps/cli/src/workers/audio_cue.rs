use std::sync::Arc;

use console::Term;
use socrates_core::{
    events::{EnrichedEvent, EventBus, expect},
    queues::QueueKind,
    router::AudioCueRequested,
    workers::{InputSpec, SubscriptionSpec, Worker},
};

/// Rings the terminal bell when a question pops.
pub struct AudioCueWorker {
    term: Term,
}

impl AudioCueWorker {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Worker for AudioCueWorker {
    const SUBSCRIBER_ID: &'static str = "cli.audio_cue";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![InputSpec {
                // A late cue is useless, only the newest matters.
                event_type: AudioCueRequested::EVENT_TYPE,
                queue_kind: QueueKind::Latest1,
            }],
        }
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, _bus: &EventBus) -> anyhow::Result<()> {
        expect::<AudioCueRequested>(&event.event, AudioCueRequested::EVENT_TYPE)?;
        if self.term.is_term() {
            self.term.write_str("\x07")?;
        }
        Ok(())
    }
}
