use std::{fmt, sync::Arc, time::Duration};

use reqwest::Method;

use crate::{RequestError, RequestOptions, Result};

/// Callback receiving the body of a successfully loaded response.
pub type SuccessCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Immutable description of one request and how to react to its outcome.
#[derive(Clone)]
pub struct RequestSpec {
    url: String,
    method: Method,
    on_success: SuccessCallback,
    max_retry: u32,
    delay: Duration,
    retry_budget: u32,
}

impl fmt::Debug for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSpec")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("on_success", &"<callback>")
            .field("max_retry", &self.max_retry)
            .field("delay", &self.delay)
            .field("retry_budget", &self.retry_budget)
            .finish()
    }
}

impl RequestSpec {
    /// Creates a spec with [`RequestOptions::default`].
    pub fn new<F>(url: impl Into<String>, on_success: F) -> Self
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let defaults = RequestOptions::default();
        Self {
            url: url.into(),
            method: Method::GET,
            on_success: Arc::new(on_success),
            max_retry: defaults.max_retry,
            delay: Duration::from_millis(defaults.delay_ms),
            retry_budget: defaults.retry_budget(),
        }
    }

    /// Applies method, delay and retry settings.
    ///
    /// Fails with [`RequestError::InvalidMethod`] when `opts.method` is not a
    /// valid HTTP method token.
    pub fn with_options(mut self, opts: RequestOptions) -> Result<Self> {
        self.method = parse_method(&opts.method)?;
        self.max_retry = opts.max_retry;
        self.delay = Duration::from_millis(opts.delay_ms);
        self.retry_budget = opts.retry_budget();
        Ok(self)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn max_retry(&self) -> u32 {
        self.max_retry
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Initial value of the retry counter for invokers built from this spec.
    pub fn retry_budget(&self) -> u32 {
        self.retry_budget
    }

    pub(crate) fn deliver(&self, body: String) {
        (self.on_success)(body)
    }
}

fn parse_method(method: &str) -> Result<Method> {
    let normalized = method.trim().to_ascii_uppercase();
    Method::from_bytes(normalized.as_bytes())
        .map_err(|_| RequestError::InvalidMethod(method.to_owned()))
}
