//! Testing utilities for code that retries.
//!
//! This module provides a wait strategy that records delays instead of
//! sleeping, and assertion macros for retry outcomes.
//!
//! # Examples
//!
//! ## RecordingSleeper
//!
//! ```rust
//! use retry_executor::testing::RecordingSleeper;
//! use retry_executor::{RetryExecutor, RetryPolicy};
//! use std::io;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::builder()
//!     .with_max_attempts(3)
//!     .with_base_delay(Duration::from_secs(60))
//!     .build()
//!     .unwrap();
//! let executor = RetryExecutor::<io::Error>::new(policy);
//! let sleeper = RecordingSleeper::new();
//!
//! // Returns immediately: the minute-long waits are only recorded.
//! let _ = executor.execute_with(&sleeper, || Err::<(), _>(io::Error::from(io::ErrorKind::TimedOut)));
//!
//! assert_eq!(sleeper.recorded(), vec![Duration::from_secs(60); 2]);
//! ```
//!
//! ## Assertion Macros
//!
//! ```rust
//! use retry_executor::{assert_exhausted, assert_not_retryable, RetryError, RetryExhausted};
//! use std::time::Duration;
//!
//! let exhausted: Result<(), _> = Err(RetryError::Exhausted(RetryExhausted::new(
//!     "flaky",
//!     3,
//!     Duration::ZERO,
//! )));
//! assert_exhausted!(exhausted, 3);
//!
//! let fast: Result<(), _> = Err(RetryError::NotRetryable("bad input"));
//! assert_not_retryable!(fast);
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;

use crate::retry::{AsyncSleeper, Sleeper};

/// Wait strategy that records each requested delay and returns at once.
///
/// Clones share the same record, so a clone can be handed to the executor
/// while the original is inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    /// Create a sleeper with an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order.
    pub fn recorded(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sum of all requested delays.
    pub fn total(&self) -> Duration {
        self.recorded().into_iter().sum()
    }

    fn record(&self, duration: Duration) {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.record(duration);
    }
}

impl AsyncSleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        self.record(duration);
        Box::pin(std::future::ready(()))
    }
}

/// Assert that a retried call was exhausted after the given number of attempts.
///
/// # Example
///
/// ```rust
/// use retry_executor::{assert_exhausted, RetryError, RetryExhausted};
/// use std::time::Duration;
///
/// let result: Result<i32, _> = Err(RetryError::Exhausted(RetryExhausted::new("e", 2, Duration::ZERO)));
/// assert_exhausted!(result, 2);
/// ```
#[macro_export]
macro_rules! assert_exhausted {
    ($result:expr, $attempts:expr) => {
        match $result {
            Err($crate::RetryError::Exhausted(exhausted)) => {
                assert_eq!(exhausted.attempts, $attempts);
            }
            other => {
                panic!("Expected Exhausted, got: {:?}", other);
            }
        }
    };
}

/// Assert that a retried call failed fast with a non-retryable error.
///
/// # Example
///
/// ```rust
/// use retry_executor::{assert_not_retryable, RetryError};
///
/// let result: Result<i32, _> = Err(RetryError::NotRetryable("bad request"));
/// assert_not_retryable!(result);
/// ```
#[macro_export]
macro_rules! assert_not_retryable {
    ($result:expr) => {
        match $result {
            Err($crate::RetryError::NotRetryable(_)) => {}
            other => {
                panic!("Expected NotRetryable, got: {:?}", other);
            }
        }
    };
}
