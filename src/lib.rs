//! # retry-executor
//!
//! Retry with capped backoff and jitter, for blocking and async operations.
//!
//! An operation is run under an immutable [`RetryPolicy`]. Failures whose kind
//! the policy lists are retried after a computed delay until the attempt
//! budget runs out; every other failure comes straight back. The retry loop
//! is written once and shared by both execution modes, which only differ in
//! how they wait: [`RetryExecutor::execute`] blocks the thread,
//! [`RetryExecutor::execute_async`] suspends the task.
//!
//! ## Quick Example
//!
//! ```rust
//! use retry_executor::{RetryError, RetryExecutor, RetryPolicy};
//! use std::io;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::builder()
//!     .with_max_attempts(3)
//!     .with_base_delay(Duration::from_millis(1))
//!     .with_retry_on(io::ErrorKind::TimedOut)
//!     .build()
//!     .unwrap();
//! let executor = RetryExecutor::<io::Error>::new(policy);
//!
//! let mut calls = 0;
//! let result = executor.execute(|| {
//!     calls += 1;
//!     Err::<(), _>(io::Error::from(io::ErrorKind::TimedOut))
//! });
//!
//! match result {
//!     Err(RetryError::Exhausted(exhausted)) => assert_eq!(exhausted.attempts, 3),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! assert_eq!(calls, 3);
//! ```
//!
//! ## Features
//!
//! - `async` (default): [`RetryExecutor::execute_async`], cancellation tokens
//!   and [`TokioSleeper`]
//! - `tracing`: emit `tracing` events for retries and terminal failures
//! - `serde`: (de)serialize [`RetryConfig`]

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod retry;
pub mod testing;

// Re-exports
pub use retry::{
    AsyncSleeper, Backoff, BackoffFn, Classify, ConfigError, Decision, MaxAttempts, RetryConfig,
    RetryError, RetryEvent, RetryExecutor, RetryExhausted, RetryOn, RetryPolicy,
    RetryPolicyBuilder, RetryState, Sleeper, ThreadSleeper,
};

#[cfg(feature = "async")]
pub use retry::TokioSleeper;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::retry::{
        Backoff, Classify, RetryError, RetryExecutor, RetryExhausted, RetryPolicy,
    };
}
