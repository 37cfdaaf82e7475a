//! Error types for retry operations.

use std::fmt;
use std::time::Duration;

/// Error returned when all retry attempts are exhausted.
///
/// Contains the error from the final attempt along with metadata about the
/// retry sequence. [`std::error::Error::source`] yields the final error, so
/// the underlying cause stays reachable through the usual error chain.
///
/// # Examples
///
/// ```rust
/// use retry_executor::{RetryError, RetryExecutor, RetryPolicy};
/// use std::io;
///
/// let policy = RetryPolicy::builder().with_max_attempts(3).build().unwrap();
/// let executor = RetryExecutor::<io::Error>::new(policy);
///
/// let result = executor.execute(|| -> Result<(), io::Error> {
///     Err(io::Error::new(io::ErrorKind::TimedOut, "always fails"))
/// });
///
/// match result {
///     Err(RetryError::Exhausted(exhausted)) => {
///         assert_eq!(exhausted.attempts, 3);
///         assert_eq!(exhausted.final_error.kind(), io::ErrorKind::TimedOut);
///     }
///     _ => panic!("Expected exhaustion"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted<E> {
    /// The error from the final attempt.
    pub final_error: E,
    /// Total number of attempts made.
    pub attempts: u32,
    /// Total time spent retrying.
    pub total_duration: Duration,
}

impl<E> RetryExhausted<E> {
    /// Create a new RetryExhausted error.
    pub fn new(final_error: E, attempts: u32, total_duration: Duration) -> Self {
        Self {
            final_error,
            attempts,
            total_duration,
        }
    }

    /// Extract the final error, discarding metadata.
    pub fn into_error(self) -> E {
        self.final_error
    }

    /// Get a reference to the final error.
    pub fn error(&self) -> &E {
        &self.final_error
    }
}

impl<E: fmt::Display> fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "maximum number of attempts ({}) exceeded after {:?}: {}",
            self.attempts, self.total_duration, self.final_error
        )
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryExhausted<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.final_error)
    }
}

/// Terminal failure of a retried operation.
///
/// A retried call resolves to either the operation's success value or one of
/// these variants. Nothing is swallowed: every variant that originates from an
/// operation failure carries that failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The operation failed with an error kind outside the retryable set.
    ///
    /// The error is the operation's own, unchanged, from the first (and only)
    /// attempt that produced it.
    NotRetryable(E),
    /// The attempt budget was consumed without success.
    Exhausted(RetryExhausted<E>),
    /// The call was cancelled before it could resolve.
    ///
    /// `error` holds the operation's error when the operation itself reported
    /// cancellation, and is `None` when a cancellation token fired.
    Cancelled {
        /// Failed attempts counted before cancellation.
        attempts: u32,
        /// The cancellation error reported by the operation, if any.
        error: Option<E>,
    },
}

impl<E> RetryError<E> {
    /// Returns true if the attempt budget was exhausted.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted(_))
    }

    /// Returns true if the operation failed with a non-retryable error.
    pub fn is_not_retryable(&self) -> bool {
        matches!(self, Self::NotRetryable(_))
    }

    /// Returns true if the call was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Number of failed attempts counted towards the budget.
    ///
    /// Always zero for [`NotRetryable`](Self::NotRetryable), even when
    /// retryable failures came before it: the variant carries only the
    /// final error, not the count.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::NotRetryable(_) => 0,
            Self::Exhausted(exhausted) => exhausted.attempts,
            Self::Cancelled { attempts, .. } => *attempts,
        }
    }

    /// Get the underlying operation error, if there is one.
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::NotRetryable(e) => Some(e),
            Self::Exhausted(exhausted) => Some(&exhausted.final_error),
            Self::Cancelled { error, .. } => error.as_ref(),
        }
    }

    /// Extract the underlying operation error, if there is one.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::NotRetryable(e) => Some(e),
            Self::Exhausted(exhausted) => Some(exhausted.final_error),
            Self::Cancelled { error, .. } => error,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRetryable(e) => write!(f, "{}", e),
            Self::Exhausted(exhausted) => write!(f, "{}", exhausted),
            Self::Cancelled {
                attempts,
                error: Some(e),
            } => write!(f, "cancelled after {} failed attempts: {}", attempts, e),
            Self::Cancelled {
                attempts,
                error: None,
            } => write!(f, "cancelled after {} failed attempts", attempts),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotRetryable(e) => e.source(),
            Self::Exhausted(exhausted) => Some(&exhausted.final_error),
            Self::Cancelled { error, .. } => {
                error.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// Error returned when a retry policy is constructed with invalid values.
///
/// Raised at construction time, never deferred to the first call.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `max_attempts` was zero.
    ZeroMaxAttempts,
    /// A duration field was negative.
    NegativeDuration {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value, in seconds.
        value: f64,
    },
    /// A duration field was NaN, infinite, or too large to represent.
    InvalidDuration {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value, in seconds.
        value: f64,
    },
    /// A backoff function was requested by a name that does not exist.
    UnknownBackoff(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroMaxAttempts => write!(f, "max_attempts must be non-zero"),
            Self::NegativeDuration { field, value } => {
                write!(f, "{} must be non-negative, got {}", field, value)
            }
            Self::InvalidDuration { field, value } => {
                write!(f, "{} is not a valid duration: {}", field, value)
            }
            Self::UnknownBackoff(name) => write!(f, "unknown backoff function `{}`", name),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod error_tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_retry_exhausted_display() {
        let err = RetryExhausted::new("connection failed", 3, Duration::from_millis(500));
        let display = format!("{}", err);
        assert!(display.contains("maximum number of attempts (3) exceeded"));
        assert!(display.contains("connection failed"));
    }

    #[test]
    fn test_retry_exhausted_into_error() {
        let err = RetryExhausted::new("test error", 5, Duration::from_secs(1));
        assert_eq!(err.error(), &"test error");
        assert_eq!(err.into_error(), "test error");
    }

    #[test]
    fn test_retry_exhausted_source_is_final_error() {
        let err = RetryExhausted::new(
            io::Error::new(io::ErrorKind::TimedOut, "slow"),
            2,
            Duration::ZERO,
        );
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "slow");
    }

    #[test]
    fn test_retry_error_accessors() {
        let fast: RetryError<&str> = RetryError::NotRetryable("bad input");
        assert!(fast.is_not_retryable());
        assert_eq!(fast.attempts(), 0);
        assert_eq!(fast.error(), Some(&"bad input"));

        let exhausted = RetryError::Exhausted(RetryExhausted::new("flaky", 4, Duration::ZERO));
        assert!(exhausted.is_exhausted());
        assert_eq!(exhausted.attempts(), 4);
        assert_eq!(exhausted.into_inner(), Some("flaky"));

        let cancelled: RetryError<&str> = RetryError::Cancelled {
            attempts: 1,
            error: None,
        };
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.attempts(), 1);
        assert_eq!(cancelled.into_inner(), None);
    }

    #[test]
    fn test_retry_error_display() {
        let fast: RetryError<&str> = RetryError::NotRetryable("bad input");
        assert_eq!(fast.to_string(), "bad input");

        let cancelled: RetryError<&str> = RetryError::Cancelled {
            attempts: 2,
            error: None,
        };
        assert_eq!(cancelled.to_string(), "cancelled after 2 failed attempts");
    }

    #[test]
    fn test_exhausted_chain_reaches_last_error() {
        let err = RetryError::Exhausted(RetryExhausted::new(
            io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"),
            3,
            Duration::ZERO,
        ));
        let cause = err.source().expect("cause");
        assert_eq!(cause.to_string(), "reset by peer");
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::ZeroMaxAttempts.to_string(),
            "max_attempts must be non-zero"
        );
        let err = ConfigError::NegativeDuration {
            field: "jitter",
            value: -1.5,
        };
        assert_eq!(err.to_string(), "jitter must be non-negative, got -1.5");
    }
}
