//! Backoff functions mapping (base delay, attempt) to a delay.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A user-supplied backoff function.
pub type BackoffFn = Arc<dyn Fn(Duration, u32) -> Duration + Send + Sync>;

/// How the delay grows between retries.
///
/// The attempt number passed in is 1-based: it counts the failed attempts so
/// far, so the delay before the second call is computed with attempt `1`.
///
/// # Examples
///
/// ```rust
/// use retry_executor::Backoff;
/// use std::time::Duration;
///
/// let base = Duration::from_millis(100);
///
/// assert_eq!(Backoff::Constant.apply(base, 3), Duration::from_millis(100));
/// assert_eq!(Backoff::Linear.apply(base, 3), Duration::from_millis(300));
/// assert_eq!(Backoff::Exponential.apply(base, 3), Duration::from_millis(400));
/// assert_eq!(Backoff::Fibonacci.apply(base, 5), Duration::from_millis(500));
///
/// let custom = Backoff::custom(|base, attempt| base + Duration::from_millis(attempt as u64));
/// assert_eq!(custom.apply(base, 2), Duration::from_millis(102));
/// ```
#[derive(Clone, Default)]
pub enum Backoff {
    /// The base delay, unchanged.
    #[default]
    Constant,
    /// base * attempt.
    Linear,
    /// base * 2^(attempt - 1).
    Exponential,
    /// base * fib(attempt).
    Fibonacci,
    /// Any function of the base delay and the attempt number.
    Custom(BackoffFn),
}

impl Backoff {
    /// Wrap a custom backoff function.
    ///
    /// A panic inside `f` is not caught by the retry loop; it unwinds out of
    /// the executor as a configuration fault.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(Duration, u32) -> Duration + Send + Sync + 'static,
    {
        Backoff::Custom(Arc::new(f))
    }

    /// Look up a built-in backoff function by name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "constant" => Some(Backoff::Constant),
            "linear" => Some(Backoff::Linear),
            "exponential" => Some(Backoff::Exponential),
            "fibonacci" => Some(Backoff::Fibonacci),
            _ => None,
        }
    }

    /// Compute the delay before the next attempt.
    pub fn apply(&self, base: Duration, attempt: u32) -> Duration {
        match self {
            Backoff::Constant => base,
            Backoff::Linear => base.saturating_mul(attempt),
            Backoff::Exponential => {
                base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            }
            Backoff::Fibonacci => base.saturating_mul(fibonacci(attempt)),
            Backoff::Custom(f) => f(base, attempt),
        }
    }
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backoff::Constant => f.write_str("Constant"),
            Backoff::Linear => f.write_str("Linear"),
            Backoff::Exponential => f.write_str("Exponential"),
            Backoff::Fibonacci => f.write_str("Fibonacci"),
            Backoff::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Calculate the nth Fibonacci number.
fn fibonacci(n: u32) -> u32 {
    if n == 0 {
        return 0;
    }
    let mut a = 0u32;
    let mut b = 1u32;
    for _ in 1..n {
        let temp = a.saturating_add(b);
        a = b;
        b = temp;
    }
    b
}
