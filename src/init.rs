use crate::config::ForwarderConfig;
use crate::error::InitError;
use crate::hook::install_panic_hook;
use crate::layer::ForwardLayer;
use crate::record::RecordBuilder;
use crate::sink::LogSink;
use crate::transport::{Forwarder, ForwarderGuard};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Install client log forwarding for the whole process, delivering through
/// `sink`.
///
/// **Parameters**
/// - `sink`: implementation of [`LogSink`] that receives every record.
/// - `config`: [`ForwarderConfig`] controlling the queue, local output, the
///   panic hook and ignored targets. `endpoint` is not used here.
///
/// **Effects**
///
/// Installs a [`Registry`] with an optional `fmt` layer followed by a
/// [`ForwardLayer`] as the global default subscriber, then replaces the
/// panic hook. Local output always runs before forwarding.
///
/// Installation is checked: a second call fails with
/// [`InitError::AlreadyInstalled`] and leaves the first installation as
/// the only forwarding layer. Must be called from within a Tokio runtime.
pub fn init_client_logging_with_sink(
    sink: Arc<dyn LogSink>,
    config: ForwarderConfig,
) -> Result<ForwarderGuard, InitError> {
    if tokio::runtime::Handle::try_current().is_err() {
        return Err(InitError::NoRuntime);
    }

    let config = config.normalized();
    let builder = RecordBuilder::new(config.user_agent.clone());
    let (forwarder, guard) = Forwarder::spawn(sink, builder, config.channel_buffer);
    let layer =
        ForwardLayer::new(forwarder.clone()).with_ignored_targets(config.ignored_targets.clone());

    // Two subscriber types, so two branches.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(fmt_layer).with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    install_panic_hook(
        forwarder,
        config.suppress_default_panic_output,
        config.panic_delivery_timeout,
    );
    Ok(guard)
}

/// Install client log forwarding to the HTTP collector named in `config`.
///
/// This is the recommended entrypoint for applications.
#[cfg(feature = "http")]
pub fn init_client_logging(config: ForwarderConfig) -> Result<ForwarderGuard, InitError> {
    crate::config::validate_endpoint(&config.endpoint)?;
    let sink = crate::http_sink::HttpCollectorSink::from_config(&config.clone().normalized())
        .map_err(|e| InitError::HttpClient(Box::new(e)))?;
    init_client_logging_with_sink(Arc::new(sink), config)
}

/// Equivalent to [`init_client_logging`] with
/// [`ForwarderConfig::from_env`].
#[cfg(feature = "http")]
pub fn init_client_logging_from_env() -> Result<ForwarderGuard, InitError> {
    init_client_logging(ForwarderConfig::from_env()?)
}
