/// Environment variable names used by this crate for configuring the
/// forwarder from a service's environment.
///
/// These are purely helpers; [`ForwarderConfig`](crate::config::ForwarderConfig)
/// can always be built without touching the environment.

/// Collector endpoint URL, e.g. `http://127.0.0.1:8000/log/client`. Required.
pub const CLIENT_LOG_ENDPOINT_ENV: &str = "CLIENT_LOG_ENDPOINT";

/// User agent reported in every record and in the `User-Agent` header.
pub const CLIENT_LOG_USER_AGENT_ENV: &str = "CLIENT_LOG_USER_AGENT";

/// Capacity of the in-memory queue between the layer and the worker.
pub const CLIENT_LOG_CHANNEL_BUFFER_ENV: &str = "CLIENT_LOG_CHANNEL_BUFFER";

/// Per-request timeout in milliseconds.
pub const CLIENT_LOG_TIMEOUT_MS_ENV: &str = "CLIENT_LOG_TIMEOUT_MS";

/// `true` / `false`: also print events locally through `fmt`.
pub const CLIENT_LOG_STDOUT_ENV: &str = "CLIENT_LOG_STDOUT";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an environment variable, treating unset and blank values alike.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
