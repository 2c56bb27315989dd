//! Forward an application's `tracing` events and panics to a remote client
//! log collector, one JSON record per event, without ever blocking or
//! failing the code that logs.
//!
//! ```no_run
//! use tracing_client_log::config::ForwarderConfig;
//! use tracing_client_log::init::init_client_logging;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ForwarderConfig::new("http://127.0.0.1:8000/log/client")?;
//! let guard = init_client_logging(config)?;
//!
//! tracing::info!("page loaded");
//!
//! guard.shutdown(std::time::Duration::from_secs(2)).await;
//! # Ok(())
//! # }
//! ```

pub mod record;
pub mod sink;
pub mod layer;
pub mod transport;
pub mod hook;

#[cfg(feature = "http")]
pub mod http_sink;

pub mod config;
pub mod env;
pub mod error;
pub mod init;
pub mod memory_sink;
pub mod noop_sink;

pub use error::{ConfigError, InitError};
pub use record::{LogRecord, Severity};
pub use transport::{Forwarder, ForwarderGuard};
