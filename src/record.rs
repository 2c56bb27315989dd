use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::Level;

/// Severity of a forwarded record.
///
/// Serialized as the upper-case name (`"DEBUG"`, `"INFO"`, ...). The
/// forwarding layer only ever produces the first four variants; `Critical`
/// is accepted by the collector but never emitted by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Level> for Severity {
    fn from(level: Level) -> Self {
        match level {
            Level::TRACE | Level::DEBUG => Severity::Debug,
            Level::INFO => Severity::Info,
            Level::WARN => Severity::Warn,
            _ => Severity::Error,
        }
    }
}

/// One client log record, exactly as it is posted to the collector.
///
/// The JSON body carries the keys `level`, `message`, `timestamp` and
/// `userAgent`; the timestamp is RFC 3339 with millisecond precision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub level: Severity,
    pub message: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub user_agent: String,
}

fn serialize_timestamp<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Builds [`LogRecord`]s stamped with the configured user agent.
///
/// Clones share the same clock, so timestamps handed out by a builder and
/// its clones never go backwards even when the wall clock does.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    user_agent: Arc<str>,
    last_micros: Arc<AtomicI64>,
}

impl RecordBuilder {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: Arc::from(user_agent.into()),
            last_micros: Arc::new(AtomicI64::new(i64::MIN)),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Build a record for `message` at `level`, timestamped now.
    pub fn build(&self, message: impl Into<String>, level: Severity) -> LogRecord {
        LogRecord {
            level,
            message: message.into(),
            timestamp: self.now(),
            user_agent: self.user_agent.to_string(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let micros = now.timestamp_micros();
        let previous = self.last_micros.fetch_max(micros, Ordering::Relaxed);
        if previous > micros {
            DateTime::from_timestamp_micros(previous).unwrap_or(now)
        } else {
            now
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_tracing_levels_onto_four_severities() {
        assert_eq!(Severity::from(Level::TRACE), Severity::Debug);
        assert_eq!(Severity::from(Level::DEBUG), Severity::Debug);
        assert_eq!(Severity::from(Level::INFO), Severity::Info);
        assert_eq!(Severity::from(Level::WARN), Severity::Warn);
        assert_eq!(Severity::from(Level::ERROR), Severity::Error);
    }

    #[test]
    fn record_serializes_with_collector_keys() {
        let builder = RecordBuilder::new("test-agent/1.0");
        let record = builder.build("hello", Severity::Warn);

        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["level", "message", "timestamp", "userAgent"]);

        assert_eq!(object["level"], "WARN");
        assert_eq!(object["message"], "hello");
        assert_eq!(object["userAgent"], "test-agent/1.0");

        let timestamp = object["timestamp"].as_str().unwrap();
        assert!(timestamp.ends_with('Z'));
        DateTime::parse_from_rfc3339(timestamp).expect("timestamp is RFC 3339");
    }

    #[test]
    fn critical_serializes_upper_case() {
        assert_eq!(serde_json::to_value(Severity::Critical).unwrap(), "CRITICAL");
        assert_eq!(Severity::Critical.to_string(), "CRITICAL");
    }

    #[test]
    fn timestamps_never_decrease() {
        let builder = RecordBuilder::new("ua");
        let clone = builder.clone();
        let mut previous = builder.build("first", Severity::Info).timestamp;
        for i in 0..500 {
            let b = if i % 2 == 0 { &builder } else { &clone };
            let next = b.build("next", Severity::Debug).timestamp;
            assert!(next >= previous);
            previous = next;
        }
    }

    #[test]
    fn clock_holds_when_wall_clock_steps_back() {
        let builder = RecordBuilder::new("ua");
        let future = Utc::now() + chrono::Duration::hours(1);
        builder
            .last_micros
            .store(future.timestamp_micros(), Ordering::Relaxed);

        let record = builder.build("late", Severity::Info);
        assert_eq!(record.timestamp.timestamp_micros(), future.timestamp_micros());
    }

    #[test]
    fn every_record_carries_the_user_agent() {
        let builder = RecordBuilder::new("Mozilla/5.0 (X11; Linux x86_64)");
        for level in [Severity::Debug, Severity::Info, Severity::Warn, Severity::Error] {
            assert_eq!(builder.build("m", level).user_agent, builder.user_agent());
        }
    }
}
