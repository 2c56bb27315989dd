use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Duration;
use tracing::{error, info};
use tracing_client_log::{
    config::ForwarderConfig,
    init::init_client_logging_with_sink,
    record::LogRecord,
    sink::LogSink,
};

/// Example of delivering client logs somewhere other than the HTTP
/// collector by implementing the `LogSink` trait directly. This one just
/// prints the JSON body that would have been posted.
struct StdoutJsonSink;

#[async_trait]
impl LogSink for StdoutJsonSink {
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        println!("[collector] {}", serde_json::to_string(record)?);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sink: Arc<dyn LogSink> = Arc::new(StdoutJsonSink);
    let config = ForwarderConfig::new("http://127.0.0.1:8000/log/client")?;

    let guard = init_client_logging_with_sink(sink, config)?;

    info!("custom sink example started");
    error!(component = "cart", "simulated error sent via custom sink");

    guard.shutdown(Duration::from_secs(1)).await;
    Ok(())
}
