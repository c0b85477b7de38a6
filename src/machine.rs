//! Retry state machine for a single call chain.
//!
//! [`RetryMachine::step`] is a pure function from the current state, the
//! shared retry counter and an event to the next state, the updated counter and
//! the effects the caller has to perform, in order. The next state also says
//! what the caller waits on: the in-flight attempt in [`State::Sent`], the
//! retry timer in [`State::Retrying`].

use std::time::Duration;

use crate::{Completion, RequestError, Response, Terminal};

/// Remaining attempt budget shared by every chain of one invoker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryState {
    remaining: u32,
}

impl RetryState {
    pub fn new(budget: u32) -> Self {
        Self { remaining: budget }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    fn decrement(self) -> Self {
        Self {
            remaining: self.remaining.saturating_sub(1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    /// One attempt is in flight.
    Sent,
    /// A single retry timer of the given length is pending; no request is in
    /// flight.
    Retrying(Duration),
    Done(Terminal),
}

impl State {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Trigger,
    Completed(Completion),
    TimerFired,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    LogCompletion(Response),
    InvokeSuccess(String),
    ReportError(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub state: State,
    pub retry: RetryState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: State, retry: RetryState, effects: Vec<Effect>) -> Self {
        Self {
            state,
            retry,
            effects,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RetryMachine {
    url: String,
    delay: Duration,
}

impl RetryMachine {
    pub fn new(url: impl Into<String>, delay: Duration) -> Self {
        Self {
            url: url.into(),
            delay,
        }
    }

    pub fn step(&self, state: State, retry: RetryState, event: Event) -> Transition {
        match (state, event) {
            (State::Idle, Event::Trigger) | (State::Retrying(_), Event::TimerFired) => {
                Transition::to(State::Sent, retry, Vec::new())
            }
            (State::Sent, Event::Completed(Completion::Loaded(response))) => {
                let body = response.body.clone();
                Transition::to(
                    State::Done(Terminal::Succeeded),
                    retry,
                    vec![Effect::LogCompletion(response), Effect::InvokeSuccess(body)],
                )
            }
            (State::Sent, Event::Completed(Completion::Failed(failure))) => {
                if !failure.is_not_found() {
                    return Transition::to(
                        State::Done(Terminal::TransportFailure),
                        retry,
                        vec![Effect::ReportError(failure.message)],
                    );
                }

                let retry = retry.decrement();
                if retry.remaining() == 0 {
                    let message = RequestError::NotFoundExhausted {
                        url: self.url.clone(),
                    }
                    .to_string();
                    Transition::to(
                        State::Done(Terminal::NotFoundExhausted),
                        retry,
                        vec![Effect::ReportError(message)],
                    )
                } else {
                    Transition::to(State::Retrying(self.delay), retry, Vec::new())
                }
            }
            // Anything else is out of order for this state and is ignored.
            (state, _) => Transition::to(state, retry, Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Effect, Event, RetryMachine, RetryState, State};
    use crate::{Completion, Response, Terminal};

    const DELAY: Duration = Duration::from_millis(50);

    fn machine() -> RetryMachine {
        RetryMachine::new("http://host/missing", DELAY)
    }

    fn not_found() -> Event {
        Event::Completed(Completion::failed(Some(404), "http error 404: "))
    }

    #[test]
    fn trigger_from_idle_sends() {
        let t = machine().step(State::Idle, RetryState::new(3), Event::Trigger);
        assert_eq!(t.state, State::Sent);
        assert!(t.effects.is_empty());
        assert_eq!(t.retry.remaining(), 3);
    }

    #[test]
    fn load_logs_then_delivers_body() {
        let t = machine().step(
            State::Sent,
            RetryState::new(3),
            Event::Completed(Completion::loaded(200, "hello")),
        );
        assert_eq!(t.state, State::Done(Terminal::Succeeded));
        assert_eq!(
            t.effects,
            vec![
                Effect::LogCompletion(Response {
                    status: 200,
                    body: "hello".to_owned()
                }),
                Effect::InvokeSuccess("hello".to_owned()),
            ]
        );
    }

    #[test]
    fn not_found_with_budget_left_waits_for_one_retry() {
        let t = machine().step(State::Sent, RetryState::new(3), not_found());
        assert_eq!(t.state, State::Retrying(DELAY));
        assert_eq!(t.retry.remaining(), 2);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn timer_fired_resends_and_keeps_counter() {
        let t = machine().step(State::Retrying(DELAY), RetryState::new(2), Event::TimerFired);
        assert_eq!(t.state, State::Sent);
        assert_eq!(t.retry.remaining(), 2);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn last_not_found_reports_and_never_schedules() {
        let t = machine().step(State::Sent, RetryState::new(1), not_found());
        assert_eq!(t.state, State::Done(Terminal::NotFoundExhausted));
        assert_eq!(t.retry.remaining(), 0);
        assert_eq!(
            t.effects,
            vec![Effect::ReportError(
                "resource unavailable at http://host/missing".to_owned()
            )]
        );
    }

    #[test]
    fn not_found_with_empty_budget_stays_exhausted() {
        let t = machine().step(State::Sent, RetryState::new(0), not_found());
        assert_eq!(t.state, State::Done(Terminal::NotFoundExhausted));
        assert_eq!(t.retry.remaining(), 0);
    }

    #[test]
    fn other_failure_reports_message_without_touching_counter() {
        let t = machine().step(
            State::Sent,
            RetryState::new(3),
            Event::Completed(Completion::failed(Some(503), "http error 503: busy")),
        );
        assert_eq!(t.state, State::Done(Terminal::TransportFailure));
        assert_eq!(t.retry.remaining(), 3);
        assert_eq!(
            t.effects,
            vec![Effect::ReportError("http error 503: busy".to_owned())]
        );
    }

    #[test]
    fn network_failure_without_status_is_terminal() {
        let t = machine().step(
            State::Sent,
            RetryState::new(3),
            Event::Completed(Completion::failed(None, "transport error: refused")),
        );
        assert_eq!(t.state, State::Done(Terminal::TransportFailure));
    }

    #[test]
    fn out_of_order_events_are_ignored() {
        let m = machine();
        for (state, event) in [
            (State::Idle, Event::TimerFired),
            (State::Sent, Event::Trigger),
            (State::Retrying(DELAY), not_found()),
            (State::Done(Terminal::Succeeded), Event::Trigger),
            (State::Done(Terminal::NotFoundExhausted), Event::TimerFired),
        ] {
            let t = m.step(state, RetryState::new(2), event);
            assert_eq!(t.state, state);
            assert_eq!(t.retry.remaining(), 2);
            assert!(t.effects.is_empty());
        }
    }

    #[test]
    fn full_chain_spends_whole_budget() {
        let m = machine();
        let mut state = State::Idle;
        let mut retry = RetryState::new(3);
        let mut sends = 0;
        let mut timers = 0;
        let mut event = Event::Trigger;

        loop {
            let t = m.step(state, retry, event);
            state = t.state;
            retry = t.retry;
            event = match state {
                State::Sent => {
                    sends += 1;
                    not_found()
                }
                State::Retrying(_) => {
                    timers += 1;
                    Event::TimerFired
                }
                State::Idle | State::Done(_) => break,
            };
        }

        assert_eq!(sends, 3);
        assert_eq!(timers, 2);
        assert_eq!(state, State::Done(Terminal::NotFoundExhausted));
    }
}
