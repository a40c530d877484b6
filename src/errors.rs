use std::fmt;

use http::StatusCode;
use thiserror::Error;

/// Failure reported by a [`TokenProvider`](crate::TokenProvider) for a single
/// fetch attempt. Carries the HTTP status when the identity provider answered
/// at all; transport-level failures have no status.
#[derive(Clone, Debug)]
pub struct ProviderError {
    status: Option<StatusCode>,
    message: String,
}

impl ProviderError {
    /// Failure with an HTTP-style status from the provider.
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Failure with no status (connection reset, timeout, bad payload, ...).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 401/403 are never retried; everything else is considered transient.
    pub fn is_authorization(&self) -> bool {
        matches!(
            self.status,
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
        )
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "provider returned {status}: {}", self.message),
            None => write!(f, "provider call failed: {}", self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Provider failures accumulated across the attempts of one refresh.
#[derive(Clone, Debug)]
pub struct FailureLog(Vec<ProviderError>);

impl FailureLog {
    pub(crate) fn new(failures: Vec<ProviderError>) -> Self {
        Self(failures)
    }

    pub fn failures(&self) -> &[ProviderError] {
        &self.0
    }
}

impl fmt::Display for FailureLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A lone failure is surfaced directly; multiple get an indexed list.
        match self.0.as_slice() {
            [] => write!(f, "no attempts completed"),
            [only] => write!(f, "{only}"),
            many => {
                write!(f, "{} attempts failed:", many.len())?;
                for (i, err) in many.iter().enumerate() {
                    write!(f, " [{}] {err}", i + 1)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The cache was disposed; no further tokens will be served.
    #[error("token cache has been disposed")]
    Disposed,

    /// The provider rejected the credentials (401/403). Never retried.
    #[error("authorization failed: {0}")]
    Authorization(ProviderError),

    /// A refresh observed the disposal signal mid-flight.
    #[error("token refresh cancelled by cache disposal")]
    Cancelled,

    /// Every attempt in the retry budget failed.
    #[error("token refresh failed: {0}")]
    RetriesExhausted(FailureLog),
}
