use crate::config::MIN_CHANNEL_BUFFER;
use crate::record::{LogRecord, RecordBuilder, Severity};
use crate::sink::LogSink;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tracing::warn;

/// Target of the warnings the worker emits when a send fails. The forwarding
/// layer never forwards events from this crate's targets, so these only
/// reach local output.
pub const TRANSPORT_TARGET: &str = "tracing_client_log::transport";

/// Counters shared by the layer, the forwarder and its worker.
#[derive(Debug, Default)]
pub struct ForwarderStats {
    /// Total events seen by the layer (before target filtering).
    pub total_events: AtomicU64,
    /// Successfully enqueued into the channel.
    pub enqueued_events: AtomicU64,
    /// Dropped because the channel was full or the worker had stopped.
    pub dropped_events: AtomicU64,
    /// Accepted by the sink.
    pub sent_records: AtomicU64,
    /// Rejected by the sink; each one produced a single local warning.
    pub failed_sends: AtomicU64,
}

impl ForwarderStats {
    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}

/// A queued record, plus an acknowledgement channel when the sender waits
/// for the delivery attempt.
struct Envelope {
    record: LogRecord,
    ack: Option<std_mpsc::SyncSender<()>>,
}

/// Fire-and-forget handle onto the background delivery task.
///
/// Cheap to clone; every clone feeds the same bounded queue. Only
/// [`Forwarder::dispatch_and_wait`] ever waits for the network.
#[derive(Clone)]
pub struct Forwarder {
    sender: mpsc::Sender<Envelope>,
    builder: RecordBuilder,
    stats: Arc<ForwarderStats>,
    closed_reported: Arc<AtomicBool>,
}

impl Forwarder {
    /// Create a forwarder and spawn the task that pulls [`LogRecord`]s from
    /// a bounded channel and hands them to `sink` one at a time.
    ///
    /// Must be called from within a Tokio runtime. The returned
    /// [`ForwarderGuard`] stops the worker when dropped or shut down.
    pub fn spawn(
        sink: Arc<dyn LogSink>,
        builder: RecordBuilder,
        buffer: usize,
    ) -> (Self, ForwarderGuard) {
        let buffer = buffer.max(MIN_CHANNEL_BUFFER);
        let (tx, rx) = mpsc::channel::<Envelope>(buffer);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let stats = Arc::new(ForwarderStats::default());

        let handle = tokio::spawn(run_worker(sink, rx, shutdown_rx, Arc::clone(&stats)));

        let forwarder = Self {
            sender: tx,
            builder,
            stats,
            closed_reported: Arc::new(AtomicBool::new(false)),
        };
        let guard = ForwarderGuard {
            shutdown: Some(shutdown_tx),
            handle,
            forwarder: forwarder.clone(),
        };
        (forwarder, guard)
    }

    /// Build a record for `message` at `level` and queue it for delivery.
    ///
    /// Returns `true` if the record was dispatched, which says nothing about
    /// whether the collector will ever receive it.
    pub fn log_client_message(&self, message: impl Into<String>, level: Severity) -> bool {
        let record = self.builder.build(message, level);
        self.dispatch(record)
    }

    /// Queue an already-built record without waiting.
    pub fn dispatch(&self, record: LogRecord) -> bool {
        self.enqueue(Envelope { record, ack: None })
    }

    /// Queue `record` and block the calling thread until the worker has
    /// attempted delivery, or `wait` has elapsed.
    ///
    /// Returns `true` if the attempt finished in time, successful or not.
    /// Meant for a thread that is about to unwind past the runtime; calling
    /// it on a thread the worker needs only ends in the timeout.
    pub fn dispatch_and_wait(&self, record: LogRecord, wait: Duration) -> bool {
        let (ack_tx, ack_rx) = std_mpsc::sync_channel(1);
        if !self.enqueue(Envelope {
            record,
            ack: Some(ack_tx),
        }) {
            return false;
        }
        ack_rx.recv_timeout(wait).is_ok()
    }

    fn enqueue(&self, envelope: Envelope) -> bool {
        // Not tracing events: this runs inside the layer and the panic hook.
        match self.sender.try_send(envelope) {
            Ok(()) => {
                self.stats.enqueued_events.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(_)) => {
                self.stats.dropped_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("client log channel full, dropping log record");
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.stats.dropped_events.fetch_add(1, Ordering::Relaxed);
                if self.report_closed_once() {
                    eprintln!("client log forwarding has stopped, dropping further log records");
                }
                false
            }
        }
    }

    /// `true` only for the first caller after the worker has stopped.
    fn report_closed_once(&self) -> bool {
        !self.closed_reported.swap(true, Ordering::Relaxed)
    }

    pub fn record_builder(&self) -> &RecordBuilder {
        &self.builder
    }

    pub fn stats(&self) -> Arc<ForwarderStats> {
        Arc::clone(&self.stats)
    }
}

/// Owns the background worker of a [`Forwarder`].
///
/// Dropping the guard lets the worker drain whatever is already queued and
/// exit; [`ForwarderGuard::shutdown`] does the same and waits for it.
#[must_use = "dropping the guard stops log forwarding"]
pub struct ForwarderGuard {
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
    forwarder: Forwarder,
}

impl ForwarderGuard {
    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    /// Stop accepting new work, deliver every record still queued and wait
    /// up to `deadline` for that to finish.
    ///
    /// Returns `true` if the worker finished within the deadline. This is
    /// the only delivery provision for a process that is about to exit.
    pub async fn shutdown(mut self, deadline: Duration) -> bool {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        timeout(deadline, &mut self.handle).await.is_ok()
    }
}

async fn run_worker(
    sink: Arc<dyn LogSink>,
    mut rx: mpsc::Receiver<Envelope>,
    mut shutdown: oneshot::Receiver<()>,
    stats: Arc<ForwarderStats>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                rx.close();
                while let Some(envelope) = rx.recv().await {
                    deliver(&*sink, envelope, &stats).await;
                }
                break;
            }
            received = rx.recv() => match received {
                Some(envelope) => deliver(&*sink, envelope, &stats).await,
                None => break,
            },
        }
    }

    if let Err(e) = sink.flush().await {
        warn!(target: TRANSPORT_TARGET, error = %e, "failed to flush client log sink");
    }
}

async fn deliver(sink: &dyn LogSink, envelope: Envelope, stats: &ForwarderStats) {
    let Envelope { record, ack } = envelope;
    match sink.send(&record).await {
        Ok(()) => {
            stats.sent_records.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            stats.failed_sends.fetch_add(1, Ordering::Relaxed);
            warn!(
                target: TRANSPORT_TARGET,
                error = %e,
                level = %record.level,
                "failed to send client log to server"
            );
        }
    }
    if let Some(ack) = ack {
        let _ = ack.try_send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_sink::MemorySink;

    fn forwarder(sink: &MemorySink, buffer: usize) -> (Forwarder, ForwarderGuard) {
        Forwarder::spawn(Arc::new(sink.clone()), RecordBuilder::new("test-ua"), buffer)
    }

    #[tokio::test]
    async fn delivers_each_record_once() {
        let sink = MemorySink::new();
        let (forwarder, guard) = forwarder(&sink, 64);

        assert!(forwarder.log_client_message("one", Severity::Info));
        assert!(forwarder.log_client_message("two", Severity::Error));
        assert!(guard.shutdown(Duration::from_secs(5)).await);

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "one");
        assert_eq!(records[0].level, Severity::Info);
        assert_eq!(records[1].message, "two");
        assert_eq!(records[1].level, Severity::Error);
        assert!(records.iter().all(|r| r.user_agent == "test-ua"));

        let stats = forwarder.stats();
        assert_eq!(ForwarderStats::get(&stats.enqueued_events), 2);
        assert_eq!(ForwarderStats::get(&stats.sent_records), 2);
        assert_eq!(ForwarderStats::get(&stats.failed_sends), 0);
    }

    #[tokio::test]
    async fn full_queue_drops_without_blocking() {
        let sink = MemorySink::new();
        // The current-thread runtime does not poll the worker until we
        // await, so the queue fills up deterministically.
        let (forwarder, guard) = forwarder(&sink, 0);

        let dispatched = (0..MIN_CHANNEL_BUFFER + 4)
            .filter(|i| forwarder.log_client_message(format!("m{i}"), Severity::Debug))
            .count();
        assert_eq!(dispatched, MIN_CHANNEL_BUFFER);

        let stats = forwarder.stats();
        assert_eq!(ForwarderStats::get(&stats.dropped_events), 4);

        assert!(guard.shutdown(Duration::from_secs(5)).await);
        assert_eq!(sink.len(), MIN_CHANNEL_BUFFER);
    }

    #[tokio::test]
    async fn failed_sends_are_counted_and_not_retried() {
        let sink = MemorySink::failing();
        let (forwarder, guard) = forwarder(&sink, 16);

        assert!(forwarder.log_client_message("lost", Severity::Warn));
        assert!(guard.shutdown(Duration::from_secs(5)).await);

        let stats = forwarder.stats();
        assert_eq!(ForwarderStats::get(&stats.failed_sends), 1);
        assert_eq!(ForwarderStats::get(&stats.sent_records), 0);
    }

    #[tokio::test]
    async fn dispatch_after_shutdown_is_dropped() {
        let sink = MemorySink::new();
        let (forwarder, guard) = forwarder(&sink, 16);
        assert!(guard.shutdown(Duration::from_secs(5)).await);

        assert!(!forwarder.log_client_message("too late", Severity::Info));
        assert_eq!(ForwarderStats::get(&forwarder.stats().dropped_events), 1);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn stopped_worker_is_reported_once() {
        let sink = MemorySink::new();
        let (forwarder, guard) = forwarder(&sink, 16);
        let clone = forwarder.clone();
        assert!(guard.shutdown(Duration::from_secs(5)).await);

        // The first drop after shutdown claims the notice for every clone.
        assert!(!forwarder.log_client_message("one", Severity::Info));
        assert!(!clone.log_client_message("two", Severity::Info));
        assert!(!forwarder.report_closed_once());
        assert!(!clone.report_closed_once());
        assert_eq!(ForwarderStats::get(&forwarder.stats().dropped_events), 2);
    }

    #[tokio::test]
    async fn full_queue_does_not_claim_the_closed_notice() {
        let sink = MemorySink::new();
        let (forwarder, guard) = forwarder(&sink, 0);

        for i in 0..MIN_CHANNEL_BUFFER + 2 {
            forwarder.log_client_message(format!("m{i}"), Severity::Debug);
        }
        assert_eq!(ForwarderStats::get(&forwarder.stats().dropped_events), 2);
        assert!(guard.shutdown(Duration::from_secs(5)).await);

        assert!(forwarder.report_closed_once());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn dispatch_and_wait_returns_after_delivery() {
        let sink = MemorySink::new();
        let (forwarder, guard) = forwarder(&sink, 16);

        let record = forwarder.record_builder().build("fatal", Severity::Error);
        let waiter = forwarder.clone();
        let delivered = tokio::task::spawn_blocking(move || {
            waiter.dispatch_and_wait(record, Duration::from_secs(5))
        })
        .await
        .unwrap();

        assert!(delivered);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.records()[0].message, "fatal");
        assert!(guard.shutdown(Duration::from_secs(5)).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn dispatch_and_wait_counts_a_failed_attempt_as_finished() {
        let sink = MemorySink::failing();
        let (forwarder, guard) = forwarder(&sink, 16);

        let record = forwarder.record_builder().build("fatal", Severity::Error);
        let waiter = forwarder.clone();
        let finished = tokio::task::spawn_blocking(move || {
            waiter.dispatch_and_wait(record, Duration::from_secs(5))
        })
        .await
        .unwrap();

        assert!(finished);
        assert_eq!(ForwarderStats::get(&forwarder.stats().failed_sends), 1);
        assert!(guard.shutdown(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn dispatch_and_wait_gives_up_after_shutdown() {
        let sink = MemorySink::new();
        let (forwarder, guard) = forwarder(&sink, 16);
        assert!(guard.shutdown(Duration::from_secs(5)).await);

        let record = forwarder.record_builder().build("late", Severity::Error);
        assert!(!forwarder.dispatch_and_wait(record, Duration::from_millis(50)));
        assert!(sink.is_empty());
    }
}
