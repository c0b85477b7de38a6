/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Non-success HTTP status code with raw response body.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// Every attempt allowed by the retry budget answered 404.
    #[error("resource unavailable at {url}")]
    NotFoundExhausted { url: String },
    /// The configured HTTP method is not a valid method token.
    #[error("invalid http method '{0}'")]
    InvalidMethod(String),
    /// Configuration could not be loaded or parsed.
    #[error("config error: {0}")]
    Config(String),
}
