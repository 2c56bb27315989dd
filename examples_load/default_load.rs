use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;
use tracing::info;

use tracing_client_log::config::ForwarderConfig;
use tracing_client_log::init::init_client_logging_with_sink;
use tracing_client_log::noop_sink::NoopSink;
use tracing_client_log::transport::ForwarderStats;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // NoopSink never reads the endpoint.
    let config = ForwarderConfig {
        enable_stdout: false,
        ..ForwarderConfig::default()
    };

    let guard = init_client_logging_with_sink(Arc::new(NoopSink), config)?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        info!(iteration = i, "default load test message");
    }

    let elapsed = start.elapsed();
    let stats = guard.forwarder().stats();
    println!("default config: logged {} events in {:?} (~{:.0} ev/s), {} dropped",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64(),
        ForwarderStats::get(&stats.dropped_events),
    );

    guard.shutdown(Duration::from_secs(2)).await;
    Ok(())
}
