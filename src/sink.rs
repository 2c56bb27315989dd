use crate::record::LogRecord;
use async_trait::async_trait;
use std::error::Error;

/// Asynchronous destination for [`LogRecord`]s produced by the forwarder.
///
/// Implementations transport records to a concrete collector (the JSON
/// HTTP endpoint, an in-memory buffer, nothing at all). The forwarder calls
/// `send` from its background task and never awaits it on the thread that
/// emitted the log event.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Send a single log record to the underlying collector.
    ///
    /// **Parameters**
    /// - `record`: fully-populated [`LogRecord`] built by the forwarder.
    ///
    /// **Returns**
    /// - `Ok(())` once the record was handed to the collector.
    /// - `Err(..)` if the transport failed (connection refused, timeout,
    ///   serialization error). The forwarder reports the failure once on
    ///   local output and drops the record; there are no retries.
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush any buffered records, if the sink buffers at all.
    ///
    /// Called once after the forwarder has drained its queue on shutdown.
    /// Default implementation is a no-op.
    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
