use std::sync::Arc;

use socrates_core::{
    events::{EnrichedEvent, EventBus, downcast_ref},
    queues::QueueKind,
    router::{PlaybackFinished, QuestionSkipped, ResponseSubmitted},
    workers::{InputSpec, SubscriptionSpec, Worker, WorkerFailed},
};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub completed: Vec<String>,
    pub total_questions: usize,
    pub responses: usize,
    pub correct: usize,
    pub skipped: usize,
    pub failures: Vec<String>,
}

/// Tallies the session and hands the result back once playback ends.
pub struct SessionSummaryWorker {
    summary: SessionSummary,
    done: Option<oneshot::Sender<SessionSummary>>,
}

impl SessionSummaryWorker {
    pub fn new(done: oneshot::Sender<SessionSummary>) -> Self {
        Self {
            summary: SessionSummary::default(),
            done: Some(done),
        }
    }
}

impl Worker for SessionSummaryWorker {
    const SUBSCRIBER_ID: &'static str = "cli.session_summary";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![
                InputSpec {
                    event_type: ResponseSubmitted::EVENT_TYPE,
                    queue_kind: QueueKind::Isolated { output_buffer: 64 },
                },
                InputSpec {
                    event_type: QuestionSkipped::EVENT_TYPE,
                    queue_kind: QueueKind::Isolated { output_buffer: 16 },
                },
                InputSpec {
                    event_type: WorkerFailed::EVENT_TYPE,
                    queue_kind: QueueKind::FifoDropOldest { capacity: 16 },
                },
                InputSpec {
                    event_type: PlaybackFinished::EVENT_TYPE,
                    queue_kind: QueueKind::Isolated { output_buffer: 1 },
                },
            ],
        }
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, _bus: &EventBus) -> anyhow::Result<()> {
        if let Some(req) = downcast_ref::<ResponseSubmitted>(&event.event) {
            self.summary.responses += 1;
            if req.response.correct {
                self.summary.correct += 1;
            }
        }

        if downcast_ref::<QuestionSkipped>(&event.event).is_some() {
            self.summary.skipped += 1;
        }

        if let Some(req) = downcast_ref::<WorkerFailed>(&event.event) {
            self.summary
                .failures
                .push(format!("{}: {}", req.stage, req.message));
        }

        if let Some(req) = downcast_ref::<PlaybackFinished>(&event.event) {
            self.summary.completed = req.completed.clone();
            self.summary.total_questions = req.total_questions;
            if let Some(done) = self.done.take() {
                // The receiver may have given up waiting.
                let _ = done.send(self.summary.clone());
            }
        }
        Ok(())
    }
}
