use crate::config::default_ignored_targets;
use crate::record::Severity;
use crate::transport::Forwarder;
use std::fmt;
use std::sync::atomic::Ordering;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns every event into a client log
/// record and hands it to a [`Forwarder`].
///
/// Register it after the local output layer: layers run in registration
/// order, so the event is printed in full first and forwarded second. Only
/// the event's message (its first argument) is forwarded; other fields stay
/// local.
pub struct ForwardLayer {
    forwarder: Forwarder,
    ignored_targets: Vec<String>,
}

impl ForwardLayer {
    /// Create a layer forwarding through `forwarder`, ignoring the
    /// [default targets](crate::config::default_ignored_targets).
    pub fn new(forwarder: Forwarder) -> Self {
        Self {
            forwarder,
            ignored_targets: default_ignored_targets(),
        }
    }

    /// Replace the list of ignored target prefixes.
    ///
    /// This crate's own targets are always ignored; forwarding the
    /// transport's failure warnings would feed back into the transport.
    pub fn with_ignored_targets<I, T>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.ignored_targets = targets.into_iter().map(Into::into).collect();
        let own = env!("CARGO_CRATE_NAME").to_string();
        if !self.ignored_targets.contains(&own) {
            self.ignored_targets.push(own);
        }
        self
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    fn is_ignored(&self, target: &str) -> bool {
        self.ignored_targets
            .iter()
            .any(|prefix| match target.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with("::"),
                None => false,
            })
    }
}

impl<S> Layer<S> for ForwardLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.forwarder
            .stats()
            .total_events
            .fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        if self.is_ignored(meta.target()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.forwarder
            .log_client_message(visitor.into_message(), Severity::from(*meta.level()));
    }
}

/// Extracts the text that stands for an event's first argument: the
/// `message` field if present, otherwise the first field recorded.
#[derive(Debug, Default)]
pub struct MessageVisitor {
    message: Option<String>,
    first_field: Option<String>,
}

impl MessageVisitor {
    pub fn into_message(self) -> String {
        self.message.or(self.first_field).unwrap_or_default()
    }

    fn record_text(&mut self, field: &Field, text: String) {
        if field.name() == "message" {
            self.message = Some(text);
        } else if self.first_field.is_none() {
            self.first_field = Some(text);
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_text(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_text(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_text(field, format!("{:?}", value));
    }
}
