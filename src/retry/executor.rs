//! Retry executor running operations under a [`RetryPolicy`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "async")]
use std::future::Future;

#[cfg(feature = "async")]
use futures::future::BoxFuture;
#[cfg(feature = "async")]
use tokio_util::sync::CancellationToken;

use super::classify::Classify;
use super::error::RetryError;
use super::policy::RetryPolicy;
use super::sleep::{Sleeper, ThreadSleeper};
use super::state::{Decision, RetryState};

#[cfg(feature = "async")]
use super::sleep::{AsyncSleeper, TokioSleeper};

/// Information about a retry attempt, passed to hooks.
#[derive(Debug, Clone)]
pub struct RetryEvent<'a, E> {
    /// Which attempt just failed (1-indexed).
    pub attempt: u32,
    /// The error from the failed attempt.
    pub error: &'a E,
    /// Delay before the next attempt.
    pub next_delay: Duration,
    /// Total elapsed time since the first attempt.
    pub elapsed: Duration,
}

type RetryHook<E> = Arc<dyn Fn(&RetryEvent<'_, E>) + Send + Sync>;

/// Runs operations, re-invoking them on retryable failures.
///
/// The executor holds an immutable [`RetryPolicy`] shared by every call; each
/// call gets its own [`RetryState`], so one executor can serve any number of
/// concurrent calls without locking. Cloning is cheap.
///
/// Blocking operations go through [`execute`](Self::execute), which sleeps
/// the calling thread between attempts. Async operations go through
/// [`execute_async`](Self::execute_async), which suspends the task instead.
///
/// # Examples
///
/// ```rust
/// use retry_executor::{RetryExecutor, RetryPolicy};
/// use std::cell::Cell;
/// use std::io;
///
/// let policy = RetryPolicy::builder()
///     .with_max_attempts(3)
///     .with_retry_on(io::ErrorKind::Interrupted)
///     .build()
///     .unwrap();
/// let executor = RetryExecutor::<io::Error>::new(policy);
///
/// let calls = Cell::new(0);
/// let result = executor.execute(|| {
///     calls.set(calls.get() + 1);
///     if calls.get() < 3 {
///         Err(io::Error::from(io::ErrorKind::Interrupted))
///     } else {
///         Ok("ok")
///     }
/// });
///
/// assert_eq!(result.unwrap(), "ok");
/// assert_eq!(calls.get(), 3);
/// ```
pub struct RetryExecutor<E: Classify> {
    policy: Arc<RetryPolicy<E::Kind>>,
    on_retry: Option<RetryHook<E>>,
}

impl<E: Classify> Clone for RetryExecutor<E> {
    fn clone(&self) -> Self {
        Self {
            policy: Arc::clone(&self.policy),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<E: Classify> fmt::Debug for RetryExecutor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

impl<E: Classify> Default for RetryExecutor<E> {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl<E: Classify> From<RetryPolicy<E::Kind>> for RetryExecutor<E> {
    fn from(policy: RetryPolicy<E::Kind>) -> Self {
        Self::new(policy)
    }
}

impl<E: Classify> RetryExecutor<E> {
    /// Create an executor for `policy`.
    pub fn new(policy: RetryPolicy<E::Kind>) -> Self {
        Self {
            policy: Arc::new(policy),
            on_retry: None,
        }
    }

    /// Call `hook` after every retryable failure, before the wait.
    ///
    /// The hook only observes; it cannot change how the failure is handled.
    ///
    /// ```rust
    /// use retry_executor::{RetryEvent, RetryExecutor, RetryPolicy};
    /// use std::io;
    /// use std::sync::atomic::{AtomicU32, Ordering};
    /// use std::sync::Arc;
    ///
    /// let seen = Arc::new(AtomicU32::new(0));
    /// let policy = RetryPolicy::builder().with_max_attempts(3).build().unwrap();
    /// let executor = RetryExecutor::<io::Error>::new(policy)
    ///     .on_retry({
    ///         let seen = seen.clone();
    ///         move |event: &RetryEvent<'_, io::Error>| {
    ///             seen.store(event.attempt, Ordering::SeqCst);
    ///         }
    ///     });
    ///
    /// let _ = executor.execute(|| Err::<(), _>(io::Error::from(io::ErrorKind::TimedOut)));
    /// assert_eq!(seen.load(Ordering::SeqCst), 2);
    /// ```
    pub fn on_retry<H>(mut self, hook: H) -> Self
    where
        H: Fn(&RetryEvent<'_, E>) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    /// Get the policy.
    pub fn policy(&self) -> &RetryPolicy<E::Kind> {
        &self.policy
    }

    /// Run a blocking operation, sleeping the calling thread between attempts.
    pub fn execute<T, F>(&self, op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
    {
        self.execute_with(&ThreadSleeper, op)
    }

    /// Run a blocking operation with a custom wait strategy.
    pub fn execute_with<T, F, S>(&self, sleeper: &S, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        S: Sleeper + ?Sized,
    {
        let mut state = RetryState::new();

        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(error) => match state.on_failure(&self.policy, error) {
                    Decision::Retry(delay) => {
                        self.before_wait(&state, delay);
                        sleeper.sleep(delay);
                    }
                    Decision::Stop(error) => return Err(self.stopped(error)),
                },
            }
        }
    }

    /// Wrap a blocking operation into a new one that retries.
    ///
    /// The returned closure has the same call shape and success type as `op`.
    pub fn wrap<T, F>(&self, mut op: F) -> impl FnMut() -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
    {
        let executor = self.clone();
        move || executor.execute(&mut op)
    }

    fn before_wait(&self, state: &RetryState<E>, delay: Duration) {
        let Some(error) = state.last_error() else {
            return;
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            attempt = state.attempts(),
            delay_ms = delay.as_millis() as u64,
            kind = ?error.kind(),
            "retrying operation"
        );

        if let Some(hook) = &self.on_retry {
            let event = RetryEvent {
                attempt: state.attempts(),
                error,
                next_delay: delay,
                elapsed: state.elapsed(),
            };
            hook(&event);
        }
    }

    fn stopped(&self, error: RetryError<E>) -> RetryError<E> {
        #[cfg(feature = "tracing")]
        match &error {
            RetryError::NotRetryable(e) => {
                tracing::debug!(kind = ?e.kind(), "operation failed with a non-retryable error")
            }
            RetryError::Exhausted(exhausted) => tracing::warn!(
                attempts = exhausted.attempts,
                kind = ?exhausted.final_error.kind(),
                "retry attempts exhausted"
            ),
            RetryError::Cancelled { attempts, .. } => {
                tracing::debug!(attempts = *attempts, "retry cancelled")
            }
        }

        error
    }
}

#[cfg(feature = "async")]
impl<E: Classify> RetryExecutor<E> {
    /// Run an async operation, suspending the task between attempts.
    ///
    /// Dropping the returned future cancels the call immediately, whether it
    /// is inside the operation or waiting.
    ///
    /// ```rust
    /// use retry_executor::{RetryExecutor, RetryPolicy};
    /// use std::io;
    /// use std::sync::atomic::{AtomicU32, Ordering};
    ///
    /// # tokio_test::block_on(async {
    /// let policy = RetryPolicy::builder().with_max_attempts(5).build().unwrap();
    /// let executor = RetryExecutor::<io::Error>::new(policy);
    /// let calls = &AtomicU32::new(0);
    ///
    /// let result = executor
    ///     .execute_async(|| async move {
    ///         if calls.fetch_add(1, Ordering::SeqCst) < 2 {
    ///             Err(io::Error::from(io::ErrorKind::TimedOut))
    ///         } else {
    ///             Ok(42)
    ///         }
    ///     })
    ///     .await;
    ///
    /// assert_eq!(result.unwrap(), 42);
    /// assert_eq!(calls.load(Ordering::SeqCst), 3);
    /// # });
    /// ```
    pub async fn execute_async<T, F, Fut>(&self, op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_async(&TokioSleeper, None, op).await
    }

    /// Run an async operation with a custom wait strategy.
    pub async fn execute_async_with<T, F, Fut, S>(
        &self,
        sleeper: &S,
        op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        S: AsyncSleeper + ?Sized,
    {
        self.run_async(sleeper, None, op).await
    }

    /// Run an async operation until it resolves or `token` is cancelled.
    ///
    /// Cancellation is observed both while the operation runs and while
    /// waiting; it stops the call with [`RetryError::Cancelled`] and is not
    /// counted as an attempt.
    pub async fn execute_until_cancelled<T, F, Fut>(
        &self,
        token: &CancellationToken,
        op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_async(&TokioSleeper, Some(token), op).await
    }

    /// Wrap an async operation into a new one that retries.
    ///
    /// Each call of the returned closure runs an independent retry loop.
    pub fn wrap_async<T, F, Fut>(
        &self,
        op: F,
    ) -> impl Fn() -> BoxFuture<'static, Result<T, RetryError<E>>>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
        E::Kind: Send + Sync + 'static,
    {
        use futures::FutureExt;

        let executor = self.clone();
        let op = Arc::new(op);
        move || {
            let executor = executor.clone();
            let op = Arc::clone(&op);
            async move { executor.execute_async(|| op()).await }.boxed()
        }
    }

    async fn run_async<T, F, Fut, S>(
        &self,
        sleeper: &S,
        token: Option<&CancellationToken>,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        S: AsyncSleeper + ?Sized,
    {
        let mut state = RetryState::new();

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancelled(token) => return Err(self.stopped(state.cancel())),
                outcome = op() => outcome,
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(error) => match state.on_failure(&self.policy, error) {
                    Decision::Retry(delay) => {
                        self.before_wait(&state, delay);
                        tokio::select! {
                            biased;
                            _ = cancelled(token) => return Err(self.stopped(state.cancel())),
                            _ = sleeper.sleep(delay) => {}
                        }
                    }
                    Decision::Stop(error) => return Err(self.stopped(error)),
                },
            }
        }
    }
}

#[cfg(feature = "async")]
async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSleeper;
    use std::io;
    use std::sync::Mutex;

    fn timed_out() -> io::Error {
        io::Error::from(io::ErrorKind::TimedOut)
    }

    #[test]
    fn test_execute_immediate_success() {
        let executor = RetryExecutor::<io::Error>::default();
        let result = executor.execute(|| Ok::<_, io::Error>(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_hook_sees_every_retry() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let executor = RetryExecutor::<io::Error>::new(
            RetryPolicy::builder()
                .with_max_attempts(4)
                .with_base_delay(Duration::from_millis(5))
                .build()
                .unwrap(),
        )
        .on_retry({
            let events = events.clone();
            move |event: &RetryEvent<'_, io::Error>| {
                events
                    .lock()
                    .unwrap()
                    .push((event.attempt, event.error.kind(), event.next_delay));
            }
        });
        let sleeper = RecordingSleeper::new();

        let result = executor.execute_with(&sleeper, || Err::<(), _>(timed_out()));

        assert!(result.unwrap_err().is_exhausted());
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], (1, io::ErrorKind::TimedOut, Duration::from_millis(5)));
        assert_eq!(events[2].0, 3);
        assert_eq!(sleeper.recorded().len(), 3);
    }

    #[test]
    fn test_wrap_runs_independent_loops() {
        let executor =
            RetryExecutor::<io::Error>::new(RetryPolicy::builder().with_max_attempts(2).build().unwrap());
        let mut calls = 0;
        let mut wrapped = executor.wrap(|| {
            calls += 1;
            Err::<(), _>(timed_out())
        });

        assert_eq!(wrapped().unwrap_err().attempts(), 2);
        assert_eq!(wrapped().unwrap_err().attempts(), 2);
        drop(wrapped);
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_from_policy() {
        let policy = RetryPolicy::builder().with_max_attempts(2).build().unwrap();
        let executor: RetryExecutor<io::Error> = policy.into();
        assert_eq!(executor.policy().max_attempts().get(), Some(2));
    }

    #[test]
    fn test_executor_is_debug() {
        let executor = RetryExecutor::<io::Error>::default();
        let debug = format!("{:?}", executor);
        assert!(debug.contains("RetryExecutor"));
        assert!(debug.contains("on_retry: false"));
    }

    #[cfg(feature = "async")]
    #[tokio::test(start_paused = true)]
    async fn test_wrap_async_is_reusable() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let calls = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::<io::Error>::new(
            RetryPolicy::builder()
                .with_max_attempts(3)
                .with_base_delay(Duration::from_millis(10))
                .build()
                .unwrap(),
        );
        let wrapped = executor.wrap_async({
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                        Err(timed_out())
                    } else {
                        Ok("ok")
                    }
                }
            }
        });

        assert_eq!(wrapped().await.unwrap(), "ok");
        assert_eq!(wrapped().await.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[cfg(feature = "tracing")]
    #[tracing_test::traced_test]
    #[test]
    fn test_retries_and_exhaustion_are_logged() {
        let executor =
            RetryExecutor::<io::Error>::new(RetryPolicy::builder().with_max_attempts(2).build().unwrap());
        let _ = executor.execute_with(&RecordingSleeper::new(), || Err::<(), _>(timed_out()));

        assert!(logs_contain("retrying operation"));
        assert!(logs_contain("retry attempts exhausted"));
    }
}
