use std::{path::PathBuf, sync::Arc};

use socrates_core::{
    events::{BusConfig, EventBus, EventBusBuilder},
    workers::Worker,
};
use tokio::sync::{broadcast, oneshot};
use tracing::info;

use crate::workers::{
    audio_cue::AudioCueWorker,
    response_journal::ResponseJournalWorker,
    response_transport::ResponseTransportWorker,
    session_summary::{SessionSummary, SessionSummaryWorker},
};

pub struct PipelineOptions {
    pub journal_path: PathBuf,
    pub report_url: Option<String>,
    pub audio_cue: bool,
}

pub struct PipelineHandle {
    pub bus: Arc<EventBus>,
    pub shutdown_tx: broadcast::Sender<()>,
    pub done_rx: oneshot::Receiver<SessionSummary>,
}

pub fn start_pipeline(
    bus_config: BusConfig,
    options: PipelineOptions,
) -> anyhow::Result<PipelineHandle> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let (done_tx, done_rx) = oneshot::channel::<SessionSummary>();

    let mut builder = EventBusBuilder::new(bus_config)
        .subscribe(ResponseJournalWorker::subscription())
        .subscribe(SessionSummaryWorker::subscription());
    if options.report_url.is_some() {
        builder = builder.subscribe(ResponseTransportWorker::subscription());
    }
    if options.audio_cue {
        builder = builder.subscribe(AudioCueWorker::subscription());
    }

    let (bus, mut wiring, tasks) = builder.build()?;
    let bus = Arc::new(bus);
    info!(session_id = %bus.session_id(), "Event bus is ready");

    // start isolated drain tasks BEFORE the router publishes anything
    for t in tasks.tokio {
        tokio::spawn(t);
    }

    tokio::spawn(ResponseJournalWorker::new(options.journal_path).run(
        wiring.take(ResponseJournalWorker::SUBSCRIBER_ID)?,
        Arc::clone(&bus),
        shutdown_rx.resubscribe(),
    ));
    tokio::spawn(SessionSummaryWorker::new(done_tx).run(
        wiring.take(SessionSummaryWorker::SUBSCRIBER_ID)?,
        Arc::clone(&bus),
        shutdown_rx.resubscribe(),
    ));
    if let Some(url) = options.report_url {
        tokio::spawn(ResponseTransportWorker::new(url).run(
            wiring.take(ResponseTransportWorker::SUBSCRIBER_ID)?,
            Arc::clone(&bus),
            shutdown_rx.resubscribe(),
        ));
    }
    if options.audio_cue {
        tokio::spawn(AudioCueWorker::new().run(
            wiring.take(AudioCueWorker::SUBSCRIBER_ID)?,
            Arc::clone(&bus),
            shutdown_rx.resubscribe(),
        ));
    }
    info!("Workers are started");

    Ok(PipelineHandle {
        bus,
        shutdown_tx,
        done_rx,
    })
}
