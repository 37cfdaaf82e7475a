//! Retry with backoff for blocking and async operations.
//!
//! The pieces:
//!
//! - **[`RetryPolicy`]**: immutable data describing the attempt budget, the
//!   delays and which error kinds are worth retrying
//! - **[`Classify`]**: maps an operation's error onto its kind
//! - **[`RetryExecutor`]**: runs an operation under a policy
//! - **[`Sleeper`] / [`AsyncSleeper`]**: how the executor waits between attempts
//!
//! # Quick Start
//!
//! ```rust
//! use retry_executor::{Backoff, RetryExecutor, RetryPolicy};
//! use std::io;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::builder()
//!     .with_max_attempts(4)
//!     .with_base_delay(Duration::from_millis(1))
//!     .with_backoff(Backoff::Exponential)
//!     .with_max_delay(Duration::from_millis(5))
//!     .with_retry_on_kinds([io::ErrorKind::TimedOut, io::ErrorKind::ConnectionReset])
//!     .build()
//!     .unwrap();
//! let executor = RetryExecutor::<io::Error>::new(policy);
//!
//! // NotFound is not retryable, so it comes back on the first call.
//! let result = executor.execute(|| -> io::Result<()> {
//!     Err(io::Error::from(io::ErrorKind::NotFound))
//! });
//! assert!(result.unwrap_err().is_not_retryable());
//! ```
//!
//! # Delays
//!
//! The delay before the next call, after `n` failed attempts, is
//! `backoff(base_delay, n)`, plus a uniform random offset in
//! `[-jitter, +jitter]`, floored at zero and capped at `max_delay`.
//!
//! # Outcomes
//!
//! A retried call returns the operation's success value or a [`RetryError`]:
//!
//! - [`RetryError::NotRetryable`]: the error kind is not retryable; the error
//!   is returned unchanged after a single call
//! - [`RetryError::Exhausted`]: `max_attempts` calls all failed
//! - [`RetryError::Cancelled`]: the call was cancelled

mod backoff;
mod classify;
mod config;
mod error;
mod executor;
mod policy;
mod sleep;
mod state;

pub use backoff::{Backoff, BackoffFn};
pub use classify::Classify;
pub use config::RetryConfig;
pub use error::{ConfigError, RetryError, RetryExhausted};
pub use executor::{RetryEvent, RetryExecutor};
pub use policy::{MaxAttempts, RetryOn, RetryPolicy, RetryPolicyBuilder};
pub use sleep::{AsyncSleeper, Sleeper, ThreadSleeper};
pub use state::{Decision, RetryState};

#[cfg(feature = "async")]
pub use sleep::TokioSleeper;
