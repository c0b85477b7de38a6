use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::{task::JoinHandle, time::sleep};

use crate::{
    machine::{Effect, Event, RetryMachine, RetryState, State, Transition},
    Completion, ErrorReporter, HttpTransport, LogReporter, RequestSpec, RetryObserver, Terminal,
    Transport,
};

/// Sends one request and retries it on 404 until the retry budget runs out.
///
/// Cloning is cheap and clones share the retry counter. Build a second
/// invoker to get an independent counter.
pub struct RetryingRequestInvoker<T = HttpTransport, R = LogReporter> {
    inner: Arc<Inner<T, R>>,
}

struct Inner<T, R> {
    spec: RequestSpec,
    machine: RetryMachine,
    transport: T,
    reporter: R,
    retry: Mutex<RetryState>,
}

impl<T, R> Clone for RetryingRequestInvoker<T, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, R> fmt::Debug for RetryingRequestInvoker<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingRequestInvoker")
            .field("spec", &self.inner.spec)
            .field("remaining_retries", &self.remaining_retries())
            .finish()
    }
}

impl RetryingRequestInvoker {
    /// Creates an invoker using [`HttpTransport`] and [`LogReporter`].
    ///
    /// Registers the retry configuration with `observer`. No request is sent
    /// until [`trigger`](Self::trigger) or [`run`](Self::run) is called.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use retrying_request::{RequestSpec, RetryRegistry, RetryingRequestInvoker};
    ///
    /// # async fn demo() {
    /// let registry = RetryRegistry::new();
    /// let spec = RequestSpec::new("https://example.com/report.json", |body| {
    ///     println!("{body}");
    /// });
    /// let invoker = RetryingRequestInvoker::new(spec, &registry);
    /// invoker.trigger();
    /// # }
    /// ```
    pub fn new(spec: RequestSpec, observer: &impl RetryObserver) -> Self {
        Self::with_parts(spec, HttpTransport::new(), LogReporter, observer)
    }
}

impl<T, R> RetryingRequestInvoker<T, R>
where
    T: Transport,
    R: ErrorReporter,
{
    /// Creates an invoker with custom transport and reporter.
    pub fn with_parts(
        spec: RequestSpec,
        transport: T,
        reporter: R,
        observer: &impl RetryObserver,
    ) -> Self {
        observer.on_init(spec.max_retry(), spec.delay());

        Self {
            inner: Arc::new(Inner {
                machine: RetryMachine::new(spec.url(), spec.delay()),
                retry: Mutex::new(RetryState::new(spec.retry_budget())),
                spec,
                transport,
                reporter,
            }),
        }
    }

    /// Starts a call chain on a spawned task and returns immediately.
    ///
    /// Must be called within a tokio runtime. The handle can be dropped; the
    /// chain still runs to its terminal state.
    pub fn trigger(&self) -> JoinHandle<Terminal> {
        let invoker = self.clone();
        tokio::spawn(async move { invoker.run().await })
    }

    /// Drives one call chain on the current task until it reaches a terminal
    /// state.
    pub async fn run(&self) -> Terminal {
        let mut state = State::Idle;
        let mut event = Event::Trigger;

        loop {
            let transition = self.apply(state, event);
            for effect in transition.effects {
                self.perform(effect);
            }

            state = transition.state;
            event = match state {
                State::Idle => Event::Trigger,
                State::Sent => Event::Completed(self.send().await),
                State::Retrying(delay) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        "retrying {} after {} ms",
                        self.inner.spec.url(),
                        delay.as_millis()
                    );

                    sleep(delay).await;
                    Event::TimerFired
                }
                State::Done(terminal) => return terminal,
            };
        }
    }

    async fn send(&self) -> Completion {
        let spec = &self.inner.spec;

        #[cfg(feature = "tracing")]
        tracing::debug!(method = %spec.method(), url = spec.url(), "sending request");

        self.inner
            .transport
            .send(spec.method().clone(), spec.url().to_owned())
            .await
    }

    fn perform(&self, effect: Effect) {
        match effect {
            Effect::LogCompletion(response) => self.inner.reporter.log_completion(&response),
            Effect::InvokeSuccess(body) => self.inner.spec.deliver(body),
            Effect::ReportError(message) => self.inner.reporter.report(&message),
        }
    }

    fn apply(&self, state: State, event: Event) -> Transition {
        let mut retry = self.lock_retry();
        let transition = self.inner.machine.step(state, *retry, event);
        *retry = transition.retry;
        transition
    }
}

impl<T, R> RetryingRequestInvoker<T, R> {
    pub fn spec(&self) -> &RequestSpec {
        &self.inner.spec
    }

    /// Attempts left in the shared retry budget.
    pub fn remaining_retries(&self) -> u32 {
        self.lock_retry().remaining()
    }

    fn lock_retry(&self) -> MutexGuard<'_, RetryState> {
        self.inner
            .retry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
