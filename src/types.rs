use crate::RequestError;

/// A completed exchange with a success status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

/// A failed exchange. `status` is present when the server answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    pub status: Option<u16>,
    pub message: String,
}

impl Failure {
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

impl From<RequestError> for Failure {
    fn from(err: RequestError) -> Self {
        let status = match &err {
            RequestError::Http { status, .. } => Some(*status),
            RequestError::Transport(inner) => inner.status().map(|status| status.as_u16()),
            _ => None,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Outcome of one transport attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    Loaded(Response),
    Failed(Failure),
}

impl Completion {
    pub fn loaded(status: u16, body: impl Into<String>) -> Self {
        Self::Loaded(Response {
            status,
            body: body.into(),
        })
    }

    pub fn failed(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Failed(Failure {
            status,
            message: message.into(),
        })
    }
}

/// Final state of one call chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terminal {
    /// The success callback ran with the response body.
    Succeeded,
    /// Every attempt in the retry budget answered 404.
    NotFoundExhausted,
    /// A non-404 failure ended the chain without retrying.
    TransportFailure,
}
