//! Plain-data retry configuration.
//!
//! [`RetryConfig`] is the loadable form of a [`RetryPolicy`]: durations are
//! seconds, the backoff function is named, and everything has a default. With
//! the `serde` feature it can be read from any serde format. Converting it
//! into a policy runs the same validation as the builder.
//!
//! ```rust,ignore
//! use retry_executor::{RetryConfig, RetryPolicy};
//!
//! let config: RetryConfig<String> = serde_json::from_str(r#"{
//!     "max_attempts": 5,
//!     "base_delay_secs": 0.2,
//!     "backoff": "exponential",
//!     "retry_on": ["timeout", "unavailable"]
//! }"#)?;
//!
//! let policy = RetryPolicy::try_from(config)?;
//! ```

use std::hash::Hash;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::backoff::Backoff;
use super::error::ConfigError;
use super::policy::RetryPolicy;

/// Loadable retry configuration.
///
/// `max_attempts: None` retries until success; `retry_on: None` retries
/// every error kind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct RetryConfig<K> {
    /// Total calls allowed, including the first.
    pub max_attempts: Option<u32>,
    /// Base delay passed to the backoff function, in seconds.
    pub base_delay_secs: f64,
    /// Cap on every delay, in seconds.
    pub max_delay_secs: Option<f64>,
    /// Jitter magnitude, in seconds.
    pub jitter_secs: f64,
    /// Name of a built-in backoff function.
    pub backoff: String,
    /// Error kinds worth retrying.
    pub retry_on: Option<Vec<K>>,
}

impl<K> Default for RetryConfig<K> {
    fn default() -> Self {
        Self {
            max_attempts: None,
            base_delay_secs: 0.0,
            max_delay_secs: None,
            jitter_secs: 0.0,
            backoff: "constant".to_string(),
            retry_on: None,
        }
    }
}

impl<K: Eq + Hash> TryFrom<RetryConfig<K>> for RetryPolicy<K> {
    type Error = ConfigError;

    fn try_from(config: RetryConfig<K>) -> Result<Self, Self::Error> {
        let backoff = Backoff::from_name(&config.backoff)
            .ok_or_else(|| ConfigError::UnknownBackoff(config.backoff.clone()))?;

        let mut builder = RetryPolicy::builder()
            .with_base_delay_secs(config.base_delay_secs)
            .with_jitter_secs(config.jitter_secs)
            .with_backoff(backoff);

        if let Some(n) = config.max_attempts {
            builder = builder.with_max_attempts(n);
        }
        if let Some(secs) = config.max_delay_secs {
            builder = builder.with_max_delay_secs(secs);
        }
        if let Some(kinds) = config.retry_on {
            builder = builder.with_retry_on_kinds(kinds);
        }

        builder.build()
    }
}
