use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use tracing_client_log::config::ForwarderConfig;
use tracing_client_log::init::init_client_logging;

/// Forwards a handful of events to the collector given as the first
/// argument, or to `CLIENT_LOG_ENDPOINT` when no argument is passed.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(endpoint) => ForwarderConfig::new(endpoint)?,
        None => ForwarderConfig::from_env()?,
    };
    println!("forwarding to {}", config.endpoint);

    let guard = init_client_logging(config)?;

    debug!("booting");
    info!(route = "/checkout", "page loaded");
    warn!(retry_in_ms = 500, "slow response from cart service");
    error!("payment widget failed to render");

    let forwarder = guard.forwarder().clone();
    tokio::spawn(async move {
        forwarder.log_client_message("sent without tracing", tracing_client_log::Severity::Info);
    })
    .await?;

    if !guard.shutdown(Duration::from_secs(3)).await {
        eprintln!("collector did not drain in time");
    }
    Ok(())
}
