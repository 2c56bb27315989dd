use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;
use tracing::warn;

use tracing_client_log::config::ForwarderConfig;
use tracing_client_log::init::init_client_logging_with_sink;
use tracing_client_log::noop_sink::NoopSink;
use tracing_client_log::transport::ForwarderStats;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ForwarderConfig {
        channel_buffer: 50_000,
        request_timeout: Duration::from_millis(200),
        enable_stdout: false,
        ..ForwarderConfig::default()
    };

    let guard = init_client_logging_with_sink(Arc::new(NoopSink), config)?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        warn!(iteration = i, "custom load test message");
    }

    let elapsed = start.elapsed();
    let stats = guard.forwarder().stats();
    println!("custom config: logged {} events in {:?} (~{:.0} ev/s), {} dropped",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64(),
        ForwarderStats::get(&stats.dropped_events),
    );

    // Give the worker time to drain the queue
    let drained = guard.shutdown(Duration::from_secs(2)).await;
    println!("drained before deadline: {}", drained);
    Ok(())
}
