//! Top-level reporting boundary for uncaught failures.
//!
//! Hosts that surface their own uncaught errors (a wasm shell, an FFI
//! embedder, a GUI event loop) call [`Forwarder::report_uncaught`] with the
//! error's context. Rust panics reach the same path through the hook set by
//! [`install_panic_hook`].

use crate::record::Severity;
use crate::transport::Forwarder;
use std::any::Any;
use std::fmt;
use std::panic::{self, Location};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::time::Duration;

/// Structured context of an uncaught error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncaughtError {
    pub message: String,
    /// File or URL the error was raised in.
    pub source: String,
    pub line: u32,
    pub column: u32,
    /// Optional description of the error object itself.
    pub error: Option<String>,
}

impl UncaughtError {
    pub fn new(
        message: impl Into<String>,
        source: impl Into<String>,
        line: u32,
        column: u32,
    ) -> Self {
        Self {
            message: message.into(),
            source: source.into(),
            line,
            column,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Build the context for a panic from its payload and location.
    pub fn from_panic(payload: &(dyn Any + Send), location: Option<&Location<'_>>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_string()
        };

        let (source, line, column) = match location {
            Some(loc) => (loc.file().to_string(), loc.line(), loc.column()),
            None => ("<unknown>".to_string(), 0, 0),
        };

        let thread = std::thread::current();
        let error = format!("panicked on thread '{}'", thread.name().unwrap_or("<unnamed>"));

        Self::new(message, source, line, column).with_error(error)
    }
}

impl fmt::Display for UncaughtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Uncaught Error: {} at {}:{}:{}",
            self.message, self.source, self.line, self.column
        )?;
        if let Some(error) = &self.error {
            write!(f, " ({})", error)?;
        }
        Ok(())
    }
}

impl Forwarder {
    /// Forward an uncaught error at ERROR severity.
    ///
    /// Always returns `true`: the error counts as handled whether or not the
    /// record could be queued.
    pub fn report_uncaught(&self, error: &UncaughtError) -> bool {
        self.log_client_message(error.to_string(), Severity::Error);
        true
    }

    /// Like [`Forwarder::report_uncaught`], but blocks for up to `wait`
    /// until the record has been handed to the sink.
    ///
    /// Returns `true` if the delivery attempt finished in time.
    pub fn report_uncaught_and_wait(&self, error: &UncaughtError, wait: Duration) -> bool {
        let record = self.record_builder().build(error.to_string(), Severity::Error);
        self.dispatch_and_wait(record, wait)
    }
}

/// Whether the current thread may block on the worker.
///
/// A current-thread runtime drives the worker on the very thread that
/// panicked, so waiting there can only time out.
fn can_wait_for_delivery() -> bool {
    match Handle::try_current() {
        Ok(handle) => handle.runtime_flavor() != RuntimeFlavor::CurrentThread,
        Err(_) => true,
    }
}

/// Replace the process panic hook with one that forwards every panic
/// through `forwarder`.
///
/// The hook waits up to `delivery_timeout` for the panic's record to be
/// delivered before the panic continues, so a panic that unwinds out of
/// `block_on` (or `#[tokio::main]`) still reaches the collector before the
/// runtime is torn down. On a current-thread runtime it only queues.
///
/// With `suppress_default` the previous hook is discarded, so the runtime's
/// own "thread panicked at" report is no longer printed. Otherwise the
/// previous hook runs after forwarding.
pub fn install_panic_hook(
    forwarder: Forwarder,
    suppress_default: bool,
    delivery_timeout: Duration,
) {
    let previous = if suppress_default {
        None
    } else {
        Some(panic::take_hook())
    };

    panic::set_hook(Box::new(move |info| {
        let error = UncaughtError::from_panic(info.payload(), info.location());
        if can_wait_for_delivery() {
            forwarder.report_uncaught_and_wait(&error, delivery_timeout);
        } else {
            forwarder.report_uncaught(&error);
        }
        if let Some(previous) = &previous {
            previous(info);
        }
    }));
}
