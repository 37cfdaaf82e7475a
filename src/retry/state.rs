//! Per-call retry state and the failure-handling step.
//!
//! Both execution modes drive the same state machine: call the operation,
//! hand any failure to [`RetryState::on_failure`], then either wait for the
//! returned delay or stop with the returned error.

use std::time::{Duration, Instant};

use super::classify::Classify;
use super::error::{RetryError, RetryExhausted};
use super::policy::RetryPolicy;

/// What to do after a failed attempt.
#[derive(Debug)]
pub enum Decision<E> {
    /// Wait this long, then call the operation again.
    Retry(Duration),
    /// Stop; the call resolves to this error.
    Stop(RetryError<E>),
}

/// Mutable state of a single retried call.
///
/// Created fresh for every call and dropped when the call resolves. While
/// waiting between attempts the state owns the last error.
#[derive(Debug)]
pub struct RetryState<E> {
    attempts: u32,
    last_error: Option<E>,
    started: Instant,
}

impl<E> Default for RetryState<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> RetryState<E> {
    /// Fresh state with no attempts made.
    pub fn new() -> Self {
        Self {
            attempts: 0,
            last_error: None,
            started: Instant::now(),
        }
    }

    /// Retryable failures counted so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The error of the most recent retryable failure.
    pub fn last_error(&self) -> Option<&E> {
        self.last_error.as_ref()
    }

    /// Time since the state was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stop with a cancellation that did not come from the operation.
    pub fn cancel(self) -> RetryError<E> {
        RetryError::Cancelled {
            attempts: self.attempts,
            error: None,
        }
    }
}

impl<E: Classify> RetryState<E> {
    /// Classify a failed attempt and decide how to continue.
    ///
    /// Cancellation stops immediately without counting. A kind outside the
    /// policy's retryable set stops with the error unchanged. Otherwise the
    /// attempt is counted; reaching the budget stops with
    /// [`RetryError::Exhausted`], and anything below it yields the jittered,
    /// capped delay before the next call.
    pub fn on_failure(&mut self, policy: &RetryPolicy<E::Kind>, error: E) -> Decision<E> {
        if error.is_cancellation() {
            return Decision::Stop(RetryError::Cancelled {
                attempts: self.attempts,
                error: Some(error),
            });
        }

        if !policy.retries(&error.kind()) {
            return Decision::Stop(RetryError::NotRetryable(error));
        }

        // Unbounded policies can outlive u32; the count pins at the top.
        self.attempts = self.attempts.saturating_add(1);

        if policy.max_attempts().is_reached(self.attempts) {
            self.last_error = None;
            return Decision::Stop(RetryError::Exhausted(RetryExhausted::new(
                error,
                self.attempts,
                self.started.elapsed(),
            )));
        }

        let delay = policy.jittered_delay(self.attempts, &mut rand::rng());
        self.last_error = Some(error);
        Decision::Retry(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Backoff;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Transient,
        Permanent,
        Cancelled,
    }

    #[derive(Debug, PartialEq)]
    struct TestError(Kind);

    impl Classify for TestError {
        type Kind = Kind;

        fn kind(&self) -> Kind {
            self.0
        }

        fn is_cancellation(&self) -> bool {
            self.0 == Kind::Cancelled
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy<Kind> {
        RetryPolicy::builder()
            .with_max_attempts(max_attempts)
            .with_base_delay(Duration::from_millis(10))
            .with_backoff(Backoff::Linear)
            .with_retry_on_kinds([Kind::Transient, Kind::Cancelled])
            .build()
            .unwrap()
    }

    #[test]
    fn test_retryable_failure_schedules_delay() {
        let policy = policy(3);
        let mut state = RetryState::new();

        let decision = state.on_failure(&policy, TestError(Kind::Transient));
        assert!(matches!(decision, Decision::Retry(d) if d == Duration::from_millis(10)));
        assert_eq!(state.attempts(), 1);
        assert_eq!(state.last_error(), Some(&TestError(Kind::Transient)));

        let decision = state.on_failure(&policy, TestError(Kind::Transient));
        assert!(matches!(decision, Decision::Retry(d) if d == Duration::from_millis(20)));
        assert_eq!(state.attempts(), 2);
    }

    #[test]
    fn test_budget_exhaustion() {
        let policy = policy(2);
        let mut state = RetryState::new();

        assert!(matches!(
            state.on_failure(&policy, TestError(Kind::Transient)),
            Decision::Retry(_)
        ));
        match state.on_failure(&policy, TestError(Kind::Transient)) {
            Decision::Stop(RetryError::Exhausted(exhausted)) => {
                assert_eq!(exhausted.attempts, 2);
                assert_eq!(exhausted.final_error, TestError(Kind::Transient));
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert!(state.last_error().is_none());
    }

    #[test]
    fn test_non_retryable_fails_fast() {
        let policy = policy(5);
        let mut state = RetryState::new();

        match state.on_failure(&policy, TestError(Kind::Permanent)) {
            Decision::Stop(RetryError::NotRetryable(err)) => {
                assert_eq!(err, TestError(Kind::Permanent))
            }
            other => panic!("expected fail-fast, got {:?}", other),
        }
        assert_eq!(state.attempts(), 0);
    }

    #[test]
    fn test_cancellation_is_never_retried() {
        // Kind::Cancelled is listed as retryable, cancellation still wins.
        let policy = policy(5);
        let mut state = RetryState::new();

        state.on_failure(&policy, TestError(Kind::Transient));
        match state.on_failure(&policy, TestError(Kind::Cancelled)) {
            Decision::Stop(RetryError::Cancelled { attempts, error }) => {
                assert_eq!(attempts, 1);
                assert_eq!(error, Some(TestError(Kind::Cancelled)));
            }
            other => panic!("expected cancellation, got {:?}", other),
        }
    }

    #[test]
    fn test_unbounded_never_exhausts() {
        let policy = RetryPolicy::<Kind>::default();
        let mut state = RetryState::new();

        for _ in 0..1_000 {
            assert!(matches!(
                state.on_failure(&policy, TestError(Kind::Permanent)),
                Decision::Retry(d) if d.is_zero()
            ));
        }
        assert_eq!(state.attempts(), 1_000);
    }

    #[test]
    fn test_unbounded_counter_saturates() {
        let policy = RetryPolicy::builder()
            .with_base_delay(Duration::from_millis(10))
            .with_backoff(Backoff::Linear)
            .with_max_delay(Duration::from_secs(1))
            .build()
            .unwrap();
        let mut state = RetryState::new();
        state.attempts = u32::MAX;

        for _ in 0..3 {
            assert!(matches!(
                state.on_failure(&policy, TestError(Kind::Transient)),
                Decision::Retry(d) if d == Duration::from_secs(1)
            ));
            assert_eq!(state.attempts(), u32::MAX);
        }
    }

    #[test]
    fn test_cancel_reports_attempts() {
        let policy = policy(5);
        let mut state = RetryState::new();
        state.on_failure(&policy, TestError(Kind::Transient));

        let err = state.cancel();
        assert_eq!(
            err,
            RetryError::Cancelled {
                attempts: 1,
                error: None
            }
        );
    }
}
