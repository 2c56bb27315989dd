use crate::env::{
    env_opt, env_or, CLIENT_LOG_CHANNEL_BUFFER_ENV, CLIENT_LOG_ENDPOINT_ENV,
    CLIENT_LOG_STDOUT_ENV, CLIENT_LOG_TIMEOUT_MS_ENV, CLIENT_LOG_USER_AGENT_ENV,
};
use crate::error::ConfigError;
use tokio::time::Duration;
use url::Url;

/// Smallest queue the forwarder will run with.
pub const MIN_CHANNEL_BUFFER: usize = 16;

/// Shortest per-request timeout the HTTP sink will use.
pub const MIN_REQUEST_TIMEOUT: Duration = Duration::from_millis(10);

/// Configuration of the forwarder.
///
/// **Fields**
/// - `endpoint`: collector URL every record is POSTed to. There is no
///   default; it has to come from the caller or the environment.
/// - `user_agent`: identification string copied into every record.
/// - `channel_buffer`: maximum number of queued records before new ones
///   are dropped.
/// - `request_timeout`: upper bound on a single POST.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt` layer prints
///   every event locally before it is forwarded.
/// - `suppress_default_panic_output`: if `true`, the panic hook replaces
///   the previous hook instead of chaining to it, so the runtime's own
///   panic report is not printed.
/// - `panic_delivery_timeout`: how long the panic hook waits for the
///   panic's own record to reach the collector before letting the panic
///   continue.
/// - `ignored_targets`: event target prefixes that are never forwarded.
///
/// `Default` leaves `endpoint` empty; [`ForwarderConfig::new`] and the
/// HTTP entry points validate it.
#[derive(Clone, Debug)]
pub struct ForwarderConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub channel_buffer: usize,
    pub request_timeout: Duration,
    pub enable_stdout: bool,
    pub suppress_default_panic_output: bool,
    pub panic_delivery_timeout: Duration,
    pub ignored_targets: Vec<String>,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            user_agent: default_user_agent(),
            channel_buffer: 1024,
            request_timeout: Duration::from_secs(5),
            enable_stdout: true,
            suppress_default_panic_output: true,
            panic_delivery_timeout: Duration::from_secs(2),
            ignored_targets: default_ignored_targets(),
        }
    }
}

impl ForwarderConfig {
    /// Build a configuration for `endpoint` with default settings.
    pub fn new(endpoint: impl AsRef<str>) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: validate_endpoint(endpoint.as_ref())?,
            ..Self::default()
        })
    }

    /// Build a configuration from the `CLIENT_LOG_*` environment variables.
    ///
    /// `CLIENT_LOG_ENDPOINT` is required; everything else falls back to
    /// [`ForwarderConfig::default`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = env_opt(CLIENT_LOG_ENDPOINT_ENV)
            .ok_or(ConfigError::MissingEndpoint(CLIENT_LOG_ENDPOINT_ENV))?;
        let mut config = Self::new(endpoint)?;

        config.user_agent = env_or(CLIENT_LOG_USER_AGENT_ENV, &config.user_agent);

        if let Some(raw) = env_opt(CLIENT_LOG_CHANNEL_BUFFER_ENV) {
            config.channel_buffer = parse_number(CLIENT_LOG_CHANNEL_BUFFER_ENV, &raw)? as usize;
        }
        if let Some(raw) = env_opt(CLIENT_LOG_TIMEOUT_MS_ENV) {
            config.request_timeout =
                Duration::from_millis(parse_number(CLIENT_LOG_TIMEOUT_MS_ENV, &raw)?);
        }
        if let Some(raw) = env_opt(CLIENT_LOG_STDOUT_ENV) {
            config.enable_stdout = parse_bool(CLIENT_LOG_STDOUT_ENV, &raw)?;
        }

        Ok(config.normalized())
    }

    /// Clamp degenerate values up to their minimal thresholds.
    pub fn normalized(mut self) -> Self {
        self.channel_buffer = self.channel_buffer.max(MIN_CHANNEL_BUFFER);
        self.request_timeout = self.request_timeout.max(MIN_REQUEST_TIMEOUT);
        self
    }
}

/// Parse `endpoint` as an absolute `http`/`https` URL with a host and
/// return its normalized form.
pub fn validate_endpoint(endpoint: &str) -> Result<String, ConfigError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(ConfigError::MissingEndpoint(CLIENT_LOG_ENDPOINT_ENV));
    }

    let url = Url::parse(endpoint)
        .map_err(|err| ConfigError::InvalidEndpoint(endpoint.to_string(), err.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(ConfigError::UnsupportedScheme(endpoint.to_string())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidEndpoint(
            endpoint.to_string(),
            "missing host".to_string(),
        ));
    }

    Ok(url.into())
}

/// `<crate>/<version> (<os>; <arch>)`, the user agent used when none is
/// configured.
pub fn default_user_agent() -> String {
    format!(
        "{}/{} ({}; {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Targets whose events are produced by the transport itself.
pub fn default_ignored_targets() -> Vec<String> {
    ["tracing_client_log", "reqwest", "hyper", "hyper_util", "h2", "rustls"]
        .iter()
        .map(|t| t.to_string())
        .collect()
}

fn parse_number(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        expected: "a non-negative integer",
        value: raw.to_string(),
    })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            expected: "true or false",
            value: raw.to_string(),
        }),
    }
}
