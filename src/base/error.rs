//! Unified channel error type.
//!
//! Every failure the library can encounter — handshake errors, connect
//! timeouts, transport errors on an established socket — is translated into
//! [`ChannelError`] before it reaches the caller. No `tungstenite`, I/O, or
//! URL-parse error ever crosses the public API directly, so callers depend
//! on a single error taxonomy regardless of what the transport does.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Unified connection error.
///
/// Carries a human-readable message and, when available, the lower-layer
/// error that caused it (reachable through [`std::error::Error::source`]).
/// The cause is reference-counted so the error can be handed to every
/// waiter of a readiness signal; all of them observe the same value.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ChannelError {
    message: String,
    #[source]
    cause: Option<Cause>,
    timed_out: bool,
}

impl ChannelError {
    /// Create an error from a message alone.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
            timed_out: false,
        }
    }

    /// Create an error wrapping a lower-layer cause, with a message giving
    /// the context in which it occurred.
    pub fn with_cause<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            cause: Some(Cause(Arc::new(cause))),
            timed_out: false,
        }
    }

    /// Create an error whose message is the cause's own rendering.
    ///
    /// Used for transport errors surfaced mid-stream, where the lower layer
    /// already says everything there is to say.
    pub fn from_error<E>(cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: cause.to_string(),
            cause: Some(Cause(Arc::new(cause))),
            timed_out: false,
        }
    }

    /// Create a connect-timeout error for the given limit.
    pub fn timeout(limit: Duration) -> Self {
        Self {
            message: format!("WebSocket connect timed out after {limit:?}"),
            cause: None,
            timed_out: true,
        }
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The lower-layer error this one wraps, if any.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_ref().map(|c| &*c.0)
    }

    /// Whether this error came from a connect-timeout expiring.
    pub fn is_timeout(&self) -> bool {
        self.timed_out
    }
}

/// Shared cause, kept behind `Arc` so [`ChannelError`] stays `Clone`.
#[derive(Debug, Clone)]
struct Cause(Arc<dyn StdError + Send + Sync>);

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for Cause {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_message_only() {
        let err = ChannelError::new("connection refused");
        assert_eq!(err.message(), "connection refused");
        assert_eq!(err.to_string(), "connection refused");
        assert!(err.cause().is_none());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_wraps_cause() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
        let err = ChannelError::with_cause("WebSocket handshake failed", io_err);
        assert_eq!(err.to_string(), "WebSocket handshake failed");
        assert!(err.cause().is_some());
        // The cause is reachable through the standard source chain.
        let source = StdError::source(&err).unwrap();
        assert_eq!(source.to_string(), "reset by peer");
    }

    #[test]
    fn test_from_error_uses_cause_message() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe");
        let err = ChannelError::from_error(io_err);
        assert_eq!(err.to_string(), "broken pipe");
    }

    #[test]
    fn test_timeout_flavor() {
        let err = ChannelError::timeout(Duration::from_millis(100));
        assert!(err.is_timeout());
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_clone_shares_outcome() {
        let err = ChannelError::with_cause(
            "WebSocket handshake failed",
            io::Error::new(io::ErrorKind::Other, "boom"),
        );
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
        assert!(cloned.cause().is_some());
    }
}
