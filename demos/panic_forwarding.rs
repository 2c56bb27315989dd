use tokio::time::Duration;
use tracing::info;

use tracing_client_log::config::ForwarderConfig;
use tracing_client_log::hook::UncaughtError;
use tracing_client_log::init::init_client_logging;

/// A panicking task and a host-reported error, both forwarded at ERROR
/// without the runtime's default panic report.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ForwarderConfig::from_env()?;
    let guard = init_client_logging(config)?;

    info!("about to fail");

    let task = tokio::spawn(async {
        let items: Vec<u32> = Vec::new();
        items[3]
    });
    if task.await.is_err() {
        info!("worker task panicked; it was reported to the collector");
    }

    let handled = guard
        .forwarder()
        .report_uncaught(&UncaughtError::new("ReferenceError: cart is not defined", "app.js", 10, 5));
    info!(handled, "host error reported");

    guard.shutdown(Duration::from_secs(3)).await;
    Ok(())
}
