//! `retrying-request` sends one HTTP request and retries it on 404.
//!
//! A [`RetryingRequestInvoker`] owns a [`RequestSpec`] and a retry counter:
//! - [`RetryingRequestInvoker::trigger`] starts a call chain on a tokio task
//! - [`RetryingRequestInvoker::run`] drives a call chain on the current task
//!
//! A 404 answer consumes one unit of the retry budget and, while budget is
//! left, schedules a fresh attempt after the configured delay. Any other
//! failure is reported once through the [`ErrorReporter`] and ends the chain.

mod error;
mod invoker;
pub mod machine;
mod options;
mod registry;
mod report;
mod request;
mod transport;
mod types;

pub use error::RequestError;
pub use invoker::RetryingRequestInvoker;
pub use options::RequestOptions;
pub use registry::{Registration, RetryObserver, RetryRegistry};
pub use report::{ErrorReporter, LogReporter};
pub use request::{RequestSpec, SuccessCallback};
pub use transport::{HttpTransport, Transport};
pub use types::{Completion, Failure, Response, Terminal};

pub type Result<T> = std::result::Result<T, RequestError>;
