use std::sync::Arc;

use tokio::sync::{Notify, mpsc};

use crate::{
    events::EnrichedEvent,
    queues::{FifoDropOldestReceiver, Latest1Queue},
};

pub struct Latest1Input {
    pub event_type: &'static str,
    pub queue: Arc<Latest1Queue<Arc<EnrichedEvent>>>,
}

pub enum FifoReceiver {
    FifoDropOldest(FifoDropOldestReceiver<Arc<EnrichedEvent>>),
    Isolated(mpsc::Receiver<Arc<EnrichedEvent>>),
}

impl FifoReceiver {
    fn try_recv(&mut self) -> Option<Arc<EnrichedEvent>> {
        match self {
            FifoReceiver::FifoDropOldest(r) => r.try_recv(),
            FifoReceiver::Isolated(r) => r.try_recv().ok(),
        }
    }
}

pub struct FifoInput {
    pub event_type: &'static str,
    pub receiver: FifoReceiver,
}

pub struct WorkerInputs {
    pub latest: Vec<Latest1Input>,
    pub fifos: Vec<FifoInput>,
    pub notify_any: Arc<Notify>,
    pub fifo_index: usize,
}

pub enum WorkerBatch {
    Snapshots(Vec<SnapshotUpdate>),
    FifoItem {
        event_type: &'static str,
        event: Arc<EnrichedEvent>,
    },
}

pub struct SnapshotUpdate {
    pub event_type: &'static str,
    pub event: Arc<EnrichedEvent>,
}

impl WorkerInputs {
    /// Wait for the next batch. Pending snapshots win over FIFO items; FIFO
    /// inputs are polled round-robin so one busy input cannot starve others.
    pub async fn next(&mut self) -> WorkerBatch {
        loop {
            let snaps: Vec<_> = self
                .latest
                .iter()
                .filter_map(|l| {
                    l.queue.try_recv().map(|event| SnapshotUpdate {
                        event_type: l.event_type,
                        event,
                    })
                })
                .collect();

            if !snaps.is_empty() {
                return WorkerBatch::Snapshots(snaps);
            }

            for _ in 0..self.fifos.len() {
                let i = self.fifo_index;
                self.fifo_index = (self.fifo_index + 1) % self.fifos.len();
                let fifo = &mut self.fifos[i];

                if let Some(event) = fifo.receiver.try_recv() {
                    return WorkerBatch::FifoItem {
                        event_type: fifo.event_type,
                        event,
                    };
                }
            }

            self.notify_any.notified().await;
        }
    }
}
