use std::fmt::Display;

use thiserror::Error;

/// Errors surfaced by retrieval operations.
///
/// An empty result list is not an error; retrievers return `Ok(vec![])`
/// when nothing matched.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The search engine or embedding endpoint could not be reached,
    /// or answered with a server-side failure.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// A request did not complete within the configured timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The embedding call failed (auth, quota, malformed payload, ...).
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// The remote service answered, but the body did not have the
    /// expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The caller-supplied configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl RetrievalError {
    pub fn invalid_response<E: Display>(err: E) -> Self {
        Self::InvalidResponse(err.to_string())
    }

    pub fn config<E: Display>(err: E) -> Self {
        Self::Config(err.to_string())
    }

    /// Classify a transport failure from the HTTP client.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Unavailable(err.to_string())
        }
    }

    /// Whether a retry has any chance of succeeding.
    ///
    /// Transient transport failures are retryable; bad payloads and bad
    /// configuration are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(RetrievalError::Unavailable("down".into()).is_retryable());
        assert!(RetrievalError::Timeout("slow".into()).is_retryable());
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        assert!(!RetrievalError::Embedding("bad key".into()).is_retryable());
        assert!(!RetrievalError::InvalidResponse("no hits".into()).is_retryable());
        assert!(!RetrievalError::Config("k must be positive".into()).is_retryable());
    }

    #[test]
    fn messages_carry_context() {
        let err = RetrievalError::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Service unavailable: connection refused");
    }
}
