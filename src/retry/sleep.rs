//! Wait strategies used between attempts.
//!
//! The retry algorithm is the same in both execution modes; only the wait
//! differs. [`Sleeper`] blocks the calling thread, [`AsyncSleeper`] suspends
//! the current task and yields to the scheduler.

use std::time::Duration;

use futures::future::BoxFuture;

/// Blocking wait between attempts.
pub trait Sleeper {
    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Cooperative wait between attempts.
///
/// The returned future must not block a carrier thread; dropping it cancels
/// the wait.
pub trait AsyncSleeper: Send + Sync {
    /// Suspend for `duration`.
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

impl<S: AsyncSleeper + ?Sized> AsyncSleeper for &S {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        (**self).sleep(duration)
    }
}

/// Sleeps with [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Sleeps with [`tokio::time::sleep`].
#[cfg(feature = "async")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[cfg(feature = "async")]
impl AsyncSleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        use futures::FutureExt;
        tokio::time::sleep(duration).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_thread_sleeper_blocks() {
        let start = Instant::now();
        ThreadSleeper.sleep(Duration::from_millis(5));
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[cfg(feature = "async")]
    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_suspends() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_secs(3)).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_millis(3010));
    }
}
