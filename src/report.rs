use crate::Response;

/// Sink for single-line failure messages and completion diagnostics.
/// Fire-and-forget.
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, message: &str);

    /// Records the raw completion of a successful attempt. Runs before the
    /// success callback.
    fn log_completion(&self, response: &Response) {
        #[cfg(feature = "tracing")]
        tracing::debug!(?response, "request completed");

        #[cfg(not(feature = "tracing"))]
        eprintln!("request completed: {response:?}");
    }
}

impl<F> ErrorReporter for F
where
    F: Fn(&str) + Send + Sync + 'static,
{
    fn report(&self, message: &str) {
        self(message)
    }
}

/// Default reporter.
///
/// Emits `tracing` events with the `tracing` feature, otherwise writes to
/// stderr.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, message: &str) {
        #[cfg(feature = "tracing")]
        tracing::error!("{message}");

        #[cfg(not(feature = "tracing"))]
        eprintln!("{message}");
    }
}
