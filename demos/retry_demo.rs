//! Retry Demo
//!
//! Shows the executor against a flaky service:
//! - Blocking retry with exponential backoff
//! - Async retry with jitter and a cap
//! - Fast failure on a non-retryable error
//! - Cancelling a call with a token
//! - A policy loaded from plain configuration
//!
//! Run with: cargo run --example retry_demo --features tracing

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use retry_executor::{
    Backoff, Classify, RetryConfig, RetryError, RetryEvent, RetryExecutor, RetryPolicy,
};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ServiceErrorKind {
    Timeout,
    Overloaded,
    BadRequest,
}

#[derive(Debug)]
struct ServiceError {
    kind: ServiceErrorKind,
    detail: String,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.detail)
    }
}

impl std::error::Error for ServiceError {}

impl Classify for ServiceError {
    type Kind = ServiceErrorKind;

    fn kind(&self) -> ServiceErrorKind {
        self.kind
    }
}

/// Fails with `kind` for the first `failures` calls.
#[derive(Clone)]
struct FlakyService {
    calls: Arc<AtomicU32>,
    failures: u32,
    kind: ServiceErrorKind,
}

impl FlakyService {
    fn new(failures: u32, kind: ServiceErrorKind) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            failures,
            kind,
        }
    }

    fn call(&self) -> Result<String, ServiceError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.failures {
            Err(ServiceError {
                kind: self.kind,
                detail: format!("call {} failed", n),
            })
        } else {
            Ok(format!("response after {} calls", n))
        }
    }

    async fn call_async(&self) -> Result<String, ServiceError> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.call()
    }
}

fn blocking_retry() {
    tracing::info!("blocking retry with exponential backoff");

    let policy = RetryPolicy::builder()
        .with_max_attempts(5)
        .with_base_delay(Duration::from_millis(50))
        .with_backoff(Backoff::Exponential)
        .with_retry_on_kinds([ServiceErrorKind::Timeout, ServiceErrorKind::Overloaded])
        .build()
        .expect("valid policy");
    let executor = RetryExecutor::new(policy).on_retry(|event: &RetryEvent<'_, ServiceError>| {
        tracing::info!(
            attempt = event.attempt,
            next_delay_ms = event.next_delay.as_millis() as u64,
            "hook: {}",
            event.error
        );
    });

    let service = FlakyService::new(3, ServiceErrorKind::Timeout);
    match executor.execute(|| service.call()) {
        Ok(response) => tracing::info!("{}", response),
        Err(e) => tracing::error!("{}", e),
    }
}

async fn async_retry() {
    tracing::info!("async retry with jitter and a cap");

    let policy = RetryPolicy::builder()
        .with_max_attempts(4)
        .with_base_delay(Duration::from_millis(100))
        .with_backoff(Backoff::Fibonacci)
        .with_jitter(Duration::from_millis(25))
        .with_max_delay(Duration::from_millis(250))
        .with_retry_on(ServiceErrorKind::Overloaded)
        .build()
        .expect("valid policy");
    let executor = RetryExecutor::new(policy);

    let service = FlakyService::new(10, ServiceErrorKind::Overloaded);
    match executor.execute_async(|| service.call_async()).await {
        Ok(response) => tracing::info!("{}", response),
        Err(RetryError::Exhausted(exhausted)) => tracing::error!(
            attempts = exhausted.attempts,
            "gave up after {:?}: {}",
            exhausted.total_duration,
            exhausted.final_error
        ),
        Err(e) => tracing::error!("{}", e),
    }
}

async fn non_retryable() {
    tracing::info!("non-retryable error fails fast");

    let executor = RetryExecutor::new(
        RetryPolicy::builder()
            .with_max_attempts(5)
            .with_retry_on(ServiceErrorKind::Timeout)
            .build()
            .expect("valid policy"),
    );

    let service = FlakyService::new(1, ServiceErrorKind::BadRequest);
    let result = executor.execute_async(|| service.call_async()).await;
    tracing::info!(
        calls = service.calls.load(Ordering::SeqCst),
        "result: {:?}",
        result.map_err(|e| e.to_string())
    );
}

async fn cancelled() {
    tracing::info!("cancelling a call during its wait");

    let executor = RetryExecutor::new(
        RetryPolicy::builder()
            .with_base_delay(Duration::from_secs(2))
            .build()
            .expect("valid policy"),
    );
    let token = CancellationToken::new();
    let service = FlakyService::new(u32::MAX, ServiceErrorKind::Timeout);

    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            token.cancel();
        })
    };

    let result = executor
        .execute_until_cancelled(&token, || service.call_async())
        .await;
    let _ = canceller.await;

    if let Err(e) = result {
        tracing::info!("{}", e);
    }
}

fn from_config() {
    tracing::info!("policy from plain configuration");

    let config = RetryConfig {
        max_attempts: Some(3),
        base_delay_secs: 0.01,
        backoff: "linear".to_string(),
        retry_on: Some(vec![ServiceErrorKind::Timeout]),
        ..Default::default()
    };
    match RetryPolicy::try_from(config) {
        Ok(policy) => {
            let executor = RetryExecutor::new(policy);
            let service = FlakyService::new(2, ServiceErrorKind::Timeout);
            tracing::info!("result: {:?}", executor.execute(|| service.call()));
        }
        Err(e) => tracing::error!("invalid configuration: {}", e),
    }

    let invalid = RetryConfig::<ServiceErrorKind> {
        max_attempts: Some(0),
        ..Default::default()
    };
    if let Err(e) = RetryPolicy::try_from(invalid) {
        tracing::warn!("rejected configuration: {}", e);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    blocking_retry();
    async_retry().await;
    non_retryable().await;
    cancelled().await;
    from_config();
}
