use crate::record::LogRecord;
use crate::sink::LogSink;
use async_trait::async_trait;
use std::error::Error;

/// A sink that simply drops all records.
///
/// Useful for measuring the overhead of the layer itself without any
/// network I/O.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl LogSink for NoopSink {
    async fn send(&self, _record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordBuilder, Severity};

    #[tokio::test]
    async fn accepts_everything() {
        let record = RecordBuilder::new("ua").build("dropped", Severity::Error);
        assert!(NoopSink.send(&record).await.is_ok());
        assert!(NoopSink.flush().await.is_ok());
    }
}
