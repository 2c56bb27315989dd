/// Error type returned when building a [`ForwarderConfig`](crate::config::ForwarderConfig).
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no collector endpoint configured (set {0})")]
    MissingEndpoint(&'static str),

    #[error("unsupported endpoint scheme in {0:?}, expected http:// or https://")]
    UnsupportedScheme(String),

    #[error("invalid endpoint {0:?}: {1}")]
    InvalidEndpoint(String, String),

    #[error("{key} must be {expected}, got {value:?}")]
    InvalidValue {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Error type returned by the `init_*` entry points.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("client logging is already installed for this process")]
    AlreadyInstalled,

    #[error("client logging must be initialized from within a Tokio runtime")]
    NoRuntime,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<tracing::subscriber::SetGlobalDefaultError> for InitError {
    fn from(_: tracing::subscriber::SetGlobalDefaultError) -> Self {
        InitError::AlreadyInstalled
    }
}
