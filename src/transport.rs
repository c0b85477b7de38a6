use std::{future::Future, time::Duration};

use reqwest::Method;

use crate::{Completion, RequestError};

/// Performs one network exchange and reports how it ended.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, method: Method, url: String) -> impl Future<Output = Completion> + Send;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses an existing client, e.g. one configured with custom headers.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self {
            http,
            timeout: None,
        }
    }

    /// Sets a per-attempt timeout. Independent of the retry delay.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Transport for HttpTransport {
    fn send(&self, method: Method, url: String) -> impl Future<Output = Completion> + Send {
        let http = self.http.clone();
        let timeout = self.timeout;
        async move {
            let mut request = http.request(method, &url);
            if let Some(timeout) = timeout {
                request = request.timeout(timeout);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(err) => return Completion::Failed(RequestError::Transport(err).into()),
            };

            // The status line has arrived, so it is kept even if the body is cut short.
            let status = response.status();
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    return Completion::failed(
                        Some(status.as_u16()),
                        RequestError::Transport(err).to_string(),
                    )
                }
            };

            if status.is_success() {
                Completion::loaded(status.as_u16(), body)
            } else {
                Completion::Failed(
                    RequestError::Http {
                        status: status.as_u16(),
                        body,
                    }
                    .into(),
                )
            }
        }
    }
}
