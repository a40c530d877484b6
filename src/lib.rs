//! Self-refreshing, thread-safe cache for a short-lived bearer token.
//!
//! A [`TokenCache`] serves a valid token to any number of concurrent callers,
//! refreshes it in the background before expiry, refreshes reactively when a
//! caller finds it stale, collapses concurrent refreshes into one provider
//! call, and retries transient failures while surfacing 401/403 immediately.
//! Token acquisition itself lives behind the [`TokenProvider`] trait.

mod cache;
mod errors;
mod provider;
mod retry;
mod telemetry;
mod token;

pub use cache::{TokenCache, TokenCacheConfig};
pub use errors::{Error, FailureLog, ProviderError};
pub use provider::{ScopeRequest, TokenProvider};
pub use retry::{JitterStrategy, RetryPlan};
pub use telemetry::{DiagnosticsSink, FailureRecord, NoopDiagnostics, RefreshTelemetry};
pub use token::CachedToken;
