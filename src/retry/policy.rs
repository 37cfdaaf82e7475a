//! Retry policy types and configuration.

use std::collections::HashSet;
use std::hash::Hash;
use std::num::NonZeroU32;
use std::time::Duration;

use rand::Rng;

use super::backoff::Backoff;
use super::error::ConfigError;

/// A retry policy describing how to retry failed operations.
///
/// Policies are pure data: they describe retry behavior but don't execute it.
/// They are built once, validated at construction, and never change after.
/// `K` is the error-kind type the policy classifies failures by (see
/// [`Classify`](crate::Classify)).
///
/// The default policy retries every error kind forever with no delay.
///
/// # Examples
///
/// ```rust
/// use retry_executor::{Backoff, RetryPolicy};
/// use std::io::ErrorKind;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::builder()
///     .with_max_attempts(5)
///     .with_base_delay(Duration::from_millis(100))
///     .with_backoff(Backoff::Exponential)
///     .with_max_delay(Duration::from_millis(500))
///     .with_retry_on(ErrorKind::TimedOut)
///     .build()
///     .unwrap();
///
/// assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
/// assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
/// assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(500)); // capped
/// assert!(policy.retries(&ErrorKind::TimedOut));
/// assert!(!policy.retries(&ErrorKind::NotFound));
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy<K> {
    max_attempts: MaxAttempts,
    base_delay: Duration,
    max_delay: Option<Duration>,
    jitter: Duration,
    retry_on: RetryOn<K>,
    backoff: Backoff,
}

/// Upper bound on the total number of calls to the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxAttempts {
    /// Stop after this many calls.
    Bounded(NonZeroU32),
    /// Retry until success or a non-retryable error.
    #[default]
    Unbounded,
}

impl MaxAttempts {
    /// A bounded budget of `n` calls. Zero is rejected.
    pub fn new(n: u32) -> Result<Self, ConfigError> {
        NonZeroU32::new(n)
            .map(MaxAttempts::Bounded)
            .ok_or(ConfigError::ZeroMaxAttempts)
    }

    /// Whether `attempts` failed calls consume the whole budget.
    pub fn is_reached(&self, attempts: u32) -> bool {
        match self {
            MaxAttempts::Bounded(max) => attempts >= max.get(),
            MaxAttempts::Unbounded => false,
        }
    }

    /// The bound, if any.
    pub fn get(&self) -> Option<u32> {
        match self {
            MaxAttempts::Bounded(max) => Some(max.get()),
            MaxAttempts::Unbounded => None,
        }
    }
}

/// Which error kinds trigger a retry.
#[derive(Debug, Clone)]
pub enum RetryOn<K> {
    /// Every error kind is retried.
    Any,
    /// Only the listed kinds are retried. An empty set retries nothing.
    Kinds(HashSet<K>),
}

impl<K> Default for RetryOn<K> {
    fn default() -> Self {
        RetryOn::Any
    }
}

impl<K: Eq + Hash> PartialEq for RetryOn<K> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RetryOn::Any, RetryOn::Any) => true,
            (RetryOn::Kinds(a), RetryOn::Kinds(b)) => a == b,
            _ => false,
        }
    }
}

impl<K: Eq + Hash> Eq for RetryOn<K> {}

impl<K: Eq + Hash> RetryOn<K> {
    /// Whether an error of `kind` should be retried.
    pub fn contains(&self, kind: &K) -> bool {
        match self {
            RetryOn::Any => true,
            RetryOn::Kinds(kinds) => kinds.contains(kind),
        }
    }
}

impl<K> Default for RetryPolicy<K> {
    fn default() -> Self {
        Self {
            max_attempts: MaxAttempts::Unbounded,
            base_delay: Duration::ZERO,
            max_delay: None,
            jitter: Duration::ZERO,
            retry_on: RetryOn::Any,
            backoff: Backoff::Constant,
        }
    }
}

impl<K> RetryPolicy<K> {
    /// Start building a policy. Every field is optional.
    pub fn builder() -> RetryPolicyBuilder<K> {
        RetryPolicyBuilder::new()
    }

    /// Get the attempt budget.
    pub fn max_attempts(&self) -> MaxAttempts {
        self.max_attempts
    }

    /// Get the base delay passed to the backoff function.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Get the maximum delay cap.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    /// Get the jitter magnitude.
    pub fn jitter(&self) -> Duration {
        self.jitter
    }

    /// Get the retryable error kinds.
    pub fn retry_on(&self) -> &RetryOn<K> {
        &self.retry_on
    }

    /// Get the backoff function.
    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Calculate the delay before the next call, after `attempt` failures,
    /// without jitter.
    ///
    /// This is `backoff(base_delay, attempt)` capped at `max_delay`, and is
    /// the exact wait whenever jitter is zero.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.cap(self.backoff.apply(self.base_delay, attempt))
    }

    /// Calculate the delay before the next call with jitter applied.
    ///
    /// A uniform offset in `[-jitter, +jitter]` is added to the backoff
    /// output, the result is floored at zero, then capped at `max_delay`.
    pub fn jittered_delay<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let delay = self.backoff.apply(self.base_delay, attempt);
        if self.jitter.is_zero() {
            return self.cap(delay);
        }

        let jitter = self.jitter.as_secs_f64();
        let offset = rng.random_range(-jitter..=jitter);
        let secs = (delay.as_secs_f64() + offset).max(0.0);
        let jittered = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
        self.cap(jittered)
    }

    fn cap(&self, delay: Duration) -> Duration {
        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

impl<K: Eq + Hash> RetryPolicy<K> {
    /// Whether an error of `kind` is retryable under this policy.
    pub fn retries(&self, kind: &K) -> bool {
        self.retry_on.contains(kind)
    }
}

/// Builder for [`RetryPolicy`].
///
/// Durations can be given as [`Duration`] or as seconds in `f64`; the latter
/// are validated by [`build`](Self::build), which rejects negative and
/// non-finite values along with a zero attempt budget.
///
/// # Examples
///
/// ```rust
/// use retry_executor::{ConfigError, RetryPolicy};
///
/// let err = RetryPolicy::<()>::builder().with_max_attempts(0).build().unwrap_err();
/// assert_eq!(err, ConfigError::ZeroMaxAttempts);
///
/// let err = RetryPolicy::<()>::builder().with_jitter_secs(-0.5).build().unwrap_err();
/// assert!(matches!(err, ConfigError::NegativeDuration { field: "jitter", .. }));
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder<K> {
    max_attempts: Option<u32>,
    base_delay: DelayInput,
    max_delay: Option<DelayInput>,
    jitter: DelayInput,
    retry_on: RetryOn<K>,
    backoff: Backoff,
}

/// A duration as handed to the builder, validated on build.
#[derive(Debug, Clone, Copy)]
enum DelayInput {
    Exact(Duration),
    Secs(f64),
}

impl DelayInput {
    fn resolve(self, field: &'static str) -> Result<Duration, ConfigError> {
        match self {
            DelayInput::Exact(d) => Ok(d),
            DelayInput::Secs(value) if value < 0.0 => {
                Err(ConfigError::NegativeDuration { field, value })
            }
            DelayInput::Secs(value) => Duration::try_from_secs_f64(value)
                .map_err(|_| ConfigError::InvalidDuration { field, value }),
        }
    }
}

impl<K> Default for RetryPolicyBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> RetryPolicyBuilder<K> {
    /// Create a builder holding the default policy.
    pub fn new() -> Self {
        Self {
            max_attempts: None,
            base_delay: DelayInput::Exact(Duration::ZERO),
            max_delay: None,
            jitter: DelayInput::Exact(Duration::ZERO),
            retry_on: RetryOn::Any,
            backoff: Backoff::Constant,
        }
    }

    /// Limit the total number of calls to `n`, including the first.
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = Some(n);
        self
    }

    /// Retry until success or a non-retryable error.
    pub fn with_unbounded_attempts(mut self) -> Self {
        self.max_attempts = None;
        self
    }

    /// Set the base delay passed to the backoff function.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = DelayInput::Exact(delay);
        self
    }

    /// Set the base delay in seconds.
    pub fn with_base_delay_secs(mut self, secs: f64) -> Self {
        self.base_delay = DelayInput::Secs(secs);
        self
    }

    /// Cap every computed delay at `delay`.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(DelayInput::Exact(delay));
        self
    }

    /// Cap every computed delay, in seconds.
    pub fn with_max_delay_secs(mut self, secs: f64) -> Self {
        self.max_delay = Some(DelayInput::Secs(secs));
        self
    }

    /// Add a uniform random offset in `[-jitter, +jitter]` to each delay.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = DelayInput::Exact(jitter);
        self
    }

    /// Set the jitter magnitude in seconds.
    pub fn with_jitter_secs(mut self, secs: f64) -> Self {
        self.jitter = DelayInput::Secs(secs);
        self
    }

    /// Set the backoff function.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set a custom backoff function of (base delay, attempt).
    pub fn with_backoff_fn<F>(self, f: F) -> Self
    where
        F: Fn(Duration, u32) -> Duration + Send + Sync + 'static,
    {
        self.with_backoff(Backoff::custom(f))
    }

    /// Retry every error kind. This is the default.
    pub fn with_retry_on_any(mut self) -> Self {
        self.retry_on = RetryOn::Any;
        self
    }
}

impl<K: Eq + Hash> RetryPolicyBuilder<K> {
    /// Add one retryable error kind.
    ///
    /// The first call switches the policy from retrying every kind to
    /// retrying only the listed kinds.
    pub fn with_retry_on(self, kind: K) -> Self {
        self.with_retry_on_kinds(std::iter::once(kind))
    }

    /// Add several retryable error kinds.
    pub fn with_retry_on_kinds<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        let mut set = match self.retry_on {
            RetryOn::Kinds(set) => set,
            RetryOn::Any => HashSet::new(),
        };
        set.extend(kinds);
        self.retry_on = RetryOn::Kinds(set);
        self
    }
}

impl<K> RetryPolicyBuilder<K> {
    /// Validate and build the policy.
    pub fn build(self) -> Result<RetryPolicy<K>, ConfigError> {
        let max_attempts = match self.max_attempts {
            Some(n) => MaxAttempts::new(n)?,
            None => MaxAttempts::Unbounded,
        };
        let max_delay = self
            .max_delay
            .map(|delay| delay.resolve("max_delay"))
            .transpose()?;

        Ok(RetryPolicy {
            max_attempts,
            base_delay: self.base_delay.resolve("base_delay")?,
            max_delay,
            jitter: self.jitter.resolve("jitter")?,
            retry_on: self.retry_on,
            backoff: self.backoff,
        })
    }
}
