use std::{sync::Arc, time::Duration};

use anyhow::Result;
use socrates_core::{
    events::{BusConfig, EnrichedEvent, EventBus, EventBusBuilder, EventHeader, downcast_ref},
    queues::QueueKind,
    router::{FragmentChanged, QuestionShown},
    types::TemplateKey,
    workers::{InputSpec, SubscriptionSpec, Worker, WorkerFailed},
};
use tokio::sync::{broadcast, mpsc};

struct FragmentCollector {
    tx: mpsc::UnboundedSender<String>,
}

impl Worker for FragmentCollector {
    const SUBSCRIBER_ID: &'static str = "test.fragment_collector";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![InputSpec {
                event_type: FragmentChanged::EVENT_TYPE,
                queue_kind: QueueKind::FifoDropOldest { capacity: 16 },
            }],
        }
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, _bus: &EventBus) -> Result<()> {
        if let Some(changed) = downcast_ref::<FragmentChanged>(&event.event) {
            self.tx.send(changed.fragment.clone())?;
        }
        Ok(())
    }
}

/// Rejects everything, so the bus reports a failure for each event.
struct Grumpy;

impl Worker for Grumpy {
    const SUBSCRIBER_ID: &'static str = "test.grumpy";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![InputSpec {
                event_type: QuestionShown::EVENT_TYPE,
                queue_kind: QueueKind::Isolated { output_buffer: 4 },
            }],
        }
    }

    async fn handle(&mut self, _event: Arc<EnrichedEvent>, _bus: &EventBus) -> Result<()> {
        anyhow::bail!("template missing")
    }
}

struct FailureCollector {
    tx: mpsc::UnboundedSender<(String, String)>,
}

impl Worker for FailureCollector {
    const SUBSCRIBER_ID: &'static str = "test.failure_collector";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![InputSpec {
                event_type: WorkerFailed::EVENT_TYPE,
                queue_kind: QueueKind::FifoDropOldest { capacity: 4 },
            }],
        }
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, _bus: &EventBus) -> Result<()> {
        if let Some(failed) = downcast_ref::<WorkerFailed>(&event.event) {
            self.tx
                .send((failed.stage.to_string(), failed.message.clone()))?;
        }
        Ok(())
    }
}

fn fragment(value: &str) -> Arc<FragmentChanged> {
    Arc::new(FragmentChanged {
        header: EventHeader::new(),
        fragment: value.to_string(),
    })
}

#[tokio::test]
async fn worker_receives_events_in_order() {
    let (bus, mut wiring, tasks) = EventBusBuilder::new(BusConfig::default())
        .subscribe(FragmentCollector::subscription())
        .build()
        .unwrap();
    for task in tasks.tokio {
        tokio::spawn(task);
    }

    let bus = Arc::new(bus);
    let (shutdown_tx, _) = broadcast::channel(1);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let inputs = wiring.take(FragmentCollector::SUBSCRIBER_ID).unwrap();
    let handle = tokio::spawn(FragmentCollector { tx }.run(
        inputs,
        Arc::clone(&bus),
        shutdown_tx.subscribe(),
    ));

    for value in ["intro", "what-is-2-2/q", "what-is-2-2"] {
        bus.publish(fragment(value));
    }

    let mut seen = Vec::new();
    for _ in 0..3 {
        let value = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        seen.push(value);
    }
    assert_eq!(seen, vec!["intro", "what-is-2-2/q", "what-is-2-2"]);

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn handler_errors_surface_as_worker_failed() {
    let (bus, mut wiring, tasks) = EventBusBuilder::new(BusConfig::default())
        .subscribe(Grumpy::subscription())
        .subscribe(FailureCollector::subscription())
        .build()
        .unwrap();
    for task in tasks.tokio {
        tokio::spawn(task);
    }

    let bus = Arc::new(bus);
    let (shutdown_tx, _) = broadcast::channel(1);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let grumpy = tokio::spawn(Grumpy.run(
        wiring.take(Grumpy::SUBSCRIBER_ID).unwrap(),
        Arc::clone(&bus),
        shutdown_tx.subscribe(),
    ));
    let collector = tokio::spawn(FailureCollector { tx }.run(
        wiring.take(FailureCollector::SUBSCRIBER_ID).unwrap(),
        Arc::clone(&bus),
        shutdown_tx.subscribe(),
    ));

    bus.publish(Arc::new(QuestionShown {
        header: EventHeader::new(),
        question_id: "q1".into(),
        title: "What is 2 + 2?".into(),
        seconds: 30.0,
        template: TemplateKey {
            youtube_id: "vid".into(),
            slug: "what-is-2-2".into(),
        },
    }));

    let (stage, message) = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stage, Grumpy::SUBSCRIBER_ID);
    assert!(message.contains("template missing"));

    shutdown_tx.send(()).unwrap();
    grumpy.await.unwrap().unwrap();
    collector.await.unwrap().unwrap();
}

#[test]
fn full_fifo_evicts_and_counts_drops() {
    let (bus, _wiring, _tasks) = EventBusBuilder::new(BusConfig::default())
        .subscribe(SubscriptionSpec {
            subscriber_id: "test.slow",
            inputs: vec![InputSpec {
                event_type: FragmentChanged::EVENT_TYPE,
                queue_kind: QueueKind::FifoDropOldest { capacity: 1 },
            }],
        })
        .build()
        .unwrap();

    for value in ["a", "b", "c"] {
        bus.publish(fragment(value));
    }
    assert_eq!(bus.drops_for("test.slow"), 2);
    assert_eq!(bus.drops_for("test.unknown"), 0);
}

#[test]
fn unrouted_events_are_counted() {
    let (bus, _wiring, _tasks) = EventBusBuilder::new(BusConfig {
        strict_routing: true,
        ..BusConfig::default()
    })
    .build()
    .unwrap();

    bus.publish(fragment("intro"));
    assert_eq!(bus.metrics().unrouted(), 1);
}

#[test]
fn builder_rejects_bad_subscriptions() {
    let duplicate = EventBusBuilder::new(BusConfig::default())
        .subscribe(FragmentCollector::subscription())
        .subscribe(FragmentCollector::subscription())
        .build();
    assert!(duplicate.is_err());

    let empty = EventBusBuilder::new(BusConfig::default())
        .subscribe(SubscriptionSpec {
            subscriber_id: "test.empty",
            inputs: Vec::new(),
        })
        .build();
    assert!(empty.is_err());

    let zero_capacity = EventBusBuilder::new(BusConfig::default())
        .subscribe(SubscriptionSpec {
            subscriber_id: "test.zero",
            inputs: vec![InputSpec {
                event_type: FragmentChanged::EVENT_TYPE,
                queue_kind: QueueKind::FifoDropOldest { capacity: 0 },
            }],
        })
        .build();
    assert!(zero_capacity.is_err());
}

#[test]
fn events_serialize_through_the_trait_object() {
    let event: Arc<dyn socrates_core::events::Event> = fragment("intro");
    let value = serde_json::to_value(&*event).unwrap();
    assert_eq!(value["fragment"], "intro");
}
