use crate::config::{ForwarderConfig, MIN_REQUEST_TIMEOUT};
use crate::record::LogRecord;
use crate::sink::LogSink;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::error::Error;
use tokio::time::Duration;

/// [`LogSink`] that POSTs each record as a JSON body to a collector
/// endpoint.
///
/// One request per record. The response status and body are never
/// inspected; only transport-level failures (connection refused, timeout)
/// are reported back to the forwarder.
#[derive(Clone)]
pub struct HttpCollectorSink {
    client: Client,
    endpoint: String,
}

impl HttpCollectorSink {
    /// Construct a sink posting to `endpoint`.
    ///
    /// **Parameters**
    /// - `endpoint`: full collector URL, e.g. `http://127.0.0.1:8000/log/client`.
    /// - `user_agent`: sent as the `User-Agent` header.
    /// - `timeout`: upper bound on one request, clamped to at least 10ms.
    pub fn new(
        endpoint: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout.max(MIN_REQUEST_TIMEOUT))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &ForwarderConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config.endpoint.clone(),
            &config.user_agent,
            config.request_timeout,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LogSink for HttpCollectorSink {
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        let body = serde_json::to_vec(record)?;
        self.client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        Ok(())
    }
}
