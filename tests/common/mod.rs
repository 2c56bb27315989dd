//! Local-output stand-in shared by the integration tests.

#![allow(dead_code)]

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_client_log::transport::ForwarderStats;
use tracing_subscriber::layer::{Context, Layer};

#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    /// Every field, `name=value`, in recording order.
    pub fields: Vec<String>,
    /// Records enqueued by the forwarder when this event was printed.
    pub enqueued_before: u64,
}

/// Records every event it sees, the way a console would print it.
#[derive(Clone)]
pub struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    stats: Option<Arc<ForwarderStats>>,
}

impl CaptureLayer {
    pub fn new() -> Self {
        Self {
            events: Arc::default(),
            stats: None,
        }
    }

    pub fn observing(stats: Arc<ForwarderStats>) -> Self {
        Self {
            events: Arc::default(),
            stats: Some(stats),
        }
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn events_for(&self, target: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.target == target)
            .collect()
    }
}

struct FieldCollector(Vec<String>);

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.push(format!("{}={}", field.name(), value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.push(format!("{}={:?}", field.name(), value));
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut collector = FieldCollector(Vec::new());
        event.record(&mut collector);

        let enqueued_before = self
            .stats
            .as_ref()
            .map(|s| s.enqueued_events.load(Ordering::Relaxed))
            .unwrap_or(0);

        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: collector.0,
            enqueued_before,
        });
    }
}
