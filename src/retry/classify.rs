//! Classification of operation errors into retry kinds.

use std::fmt::Debug;
use std::hash::Hash;
use std::io;

/// Maps an error value onto the kind used for retry decisions.
///
/// A [`RetryPolicy`](crate::RetryPolicy) lists the kinds that are worth
/// retrying; the executor asks each failure for its kind and fails fast when
/// the kind is not listed. Kinds are a separate type from the error itself,
/// so a policy can never be configured with an error instance by mistake.
///
/// # Examples
///
/// ```rust
/// use retry_executor::Classify;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum FetchErrorKind {
///     Timeout,
///     NotFound,
/// }
///
/// #[derive(Debug)]
/// enum FetchError {
///     Timeout { after_ms: u64 },
///     NotFound(String),
/// }
///
/// impl Classify for FetchError {
///     type Kind = FetchErrorKind;
///
///     fn kind(&self) -> FetchErrorKind {
///         match self {
///             FetchError::Timeout { .. } => FetchErrorKind::Timeout,
///             FetchError::NotFound(_) => FetchErrorKind::NotFound,
///         }
///     }
/// }
///
/// assert_eq!(FetchError::Timeout { after_ms: 30 }.kind(), FetchErrorKind::Timeout);
/// ```
pub trait Classify {
    /// The category of failure used for retry classification.
    type Kind: Eq + Hash + Debug;

    /// The kind of this error.
    fn kind(&self) -> Self::Kind;

    /// Whether this error signals cancellation by the host.
    ///
    /// Cancellation is never retried, whatever its kind, and is not counted
    /// as an attempt.
    fn is_cancellation(&self) -> bool {
        false
    }
}

impl Classify for io::Error {
    type Kind = io::ErrorKind;

    fn kind(&self) -> io::ErrorKind {
        io::Error::kind(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_kind() {
        let err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(Classify::kind(&err), io::ErrorKind::ConnectionRefused);
        assert!(!err.is_cancellation());
    }
}
