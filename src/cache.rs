use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use jiff::Timestamp;
use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::errors::{Error, FailureLog};
use crate::provider::{ScopeRequest, TokenProvider};
use crate::retry::{RetryOutcome, RetryPlan};
use crate::telemetry::{DiagnosticsSink, FailureRecord, NoopDiagnostics};
use crate::token::CachedToken;

/// Configuration inputs required to build a [`TokenCache`].
#[derive(Clone, Debug)]
pub struct TokenCacheConfig {
    /// How often the background loop forces a refresh.
    pub background_interval: Duration,
    /// Attempt budget and backoff applied around every provider fetch.
    pub retry: RetryPlan,
}

impl TokenCacheConfig {
    pub fn new(background_interval: Duration) -> Self {
        Self {
            background_interval,
            retry: RetryPlan::default_plan(),
        }
    }
}

/// Self-refreshing, thread-safe cache for a single short-lived bearer token.
///
/// Callers read a valid token through [`get_token`](TokenCache::get_token)
/// without contending on the refresh lock; a stale token triggers (or joins)
/// a single-flight refresh. A background task forces a refresh every
/// configured interval so the hot path rarely observes staleness.
///
/// Cheap to clone; clones share the same cached token and background loop.
#[derive(Clone)]
pub struct TokenCache {
    inner: Arc<CacheState>,
}

struct CacheState {
    provider: Arc<dyn TokenProvider>,
    scopes: ScopeRequest,
    token: RwLock<CachedToken>,
    // Binary single-flight lock: the holder performs the provider fetch.
    refresh_lock: Mutex<()>,
    cancel: CancellationToken,
    disposed: AtomicBool,
    retry: RetryPlan,
    rng: Mutex<StdRng>,
}

impl TokenCache {
    /// Builds the cache and starts its background refresh loop.
    ///
    /// Does not fetch eagerly; the first real fetch happens on the first
    /// [`get_token`](TokenCache::get_token) call or the first background
    /// tick, whichever comes first. Must be called within a tokio runtime.
    pub fn new(
        provider: Arc<dyn TokenProvider>,
        scope_identifier: &str,
        background_interval: Duration,
    ) -> Self {
        Self::with_config(
            provider,
            scope_identifier,
            TokenCacheConfig::new(background_interval),
        )
    }

    pub fn with_config(
        provider: Arc<dyn TokenProvider>,
        scope_identifier: &str,
        config: TokenCacheConfig,
    ) -> Self {
        let inner = Arc::new(CacheState {
            provider,
            scopes: ScopeRequest::from_resource(scope_identifier),
            token: RwLock::new(CachedToken::empty()),
            refresh_lock: Mutex::new(()),
            cancel: CancellationToken::new(),
            disposed: AtomicBool::new(false),
            retry: config.retry,
            rng: Mutex::new(StdRng::from_entropy()),
        });
        tokio::spawn(background_refresh_loop(
            Arc::downgrade(&inner),
            config.background_interval,
        ));
        Self { inner }
    }

    /// Returns a currently-valid token value.
    ///
    /// Fails with [`Error::Disposed`] after [`dispose`](TokenCache::dispose).
    /// If the cached token has expired, awaits a refresh (joining one already
    /// in progress) and propagates its terminal error unchanged.
    pub async fn get_token(&self, diagnostics: &dyn DiagnosticsSink) -> Result<String, Error> {
        if self.inner.disposed.load(Ordering::Acquire) {
            return Err(Error::Disposed);
        }
        {
            let token = self.inner.token.read().await;
            if !token.is_expired(Timestamp::now()) {
                return Ok(token.value.clone());
            }
        }
        let refreshed = self.inner.refresh_with_retry(false, diagnostics).await?;
        Ok(refreshed.value)
    }

    /// Signals cancellation to the background loop and any in-flight refresh
    /// and marks the cache disposed. Idempotent. An in-flight provider call
    /// is expected to observe the cancellation token cooperatively.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.cancel.cancel();
    }
}

impl CacheState {
    /// The single authoritative refresh path, shared by reactive callers and
    /// the background loop.
    ///
    /// With `force`, the lock holder always goes to the provider; the
    /// background loop uses this to renew before expiry. Without it, a waiter
    /// released by someone else's refresh takes the token that refresh
    /// published instead of fetching again.
    async fn refresh_with_retry(
        &self,
        force: bool,
        diagnostics: &dyn DiagnosticsSink,
    ) -> Result<CachedToken, Error> {
        let _flight = self.refresh_lock.lock().await;

        if !force {
            let token = self.token.read().await;
            if !token.is_expired(Timestamp::now()) {
                return Ok(token.clone());
            }
        }

        let start = Instant::now();
        let mut failures = Vec::new();
        let mut attempt: u8 = 1;
        loop {
            if self.cancel.is_cancelled() {
                debug!(attempt, "refresh cancelled before attempt");
                return Err(Error::Cancelled);
            }
            match self.provider.fetch_token(&self.scopes, &self.cancel).await {
                Ok(fresh) => {
                    // Publish while still holding the single-flight lock so
                    // released waiters always see the new token.
                    {
                        let mut slot = self.token.write().await;
                        *slot = fresh.clone();
                    }
                    RetryOutcome {
                        attempts: attempt,
                        success: true,
                        elapsed: start.elapsed(),
                    }
                    .log();
                    return Ok(fresh);
                }
                Err(err) => {
                    diagnostics.record_failure(&FailureRecord::from_provider(&err));
                    if err.is_authorization() {
                        RetryOutcome {
                            attempts: attempt,
                            success: false,
                            elapsed: start.elapsed(),
                        }
                        .log();
                        return Err(Error::Authorization(err));
                    }
                    if attempt >= self.retry.max_attempts {
                        failures.push(err);
                        RetryOutcome {
                            attempts: attempt,
                            success: false,
                            elapsed: start.elapsed(),
                        }
                        .log();
                        return Err(Error::RetriesExhausted(FailureLog::new(failures)));
                    }
                    let delay = {
                        let mut rng = self.rng.lock().await;
                        self.retry.delay_before_attempt(attempt + 1, &mut *rng)
                    };
                    warn!(
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "refresh attempt failed; retrying"
                    );
                    failures.push(err);
                    if !delay.is_zero() {
                        tokio::select! {
                            _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                    attempt += 1;
                }
            }
        }
    }
}

/// Forces a refresh every `interval` until the cache is disposed or every
/// handle to it has been dropped. A failed refresh is logged and retried on
/// the next tick; it never takes the loop down.
async fn background_refresh_loop(state: Weak<CacheState>, interval: Duration) {
    loop {
        let cancelled = {
            // Hold the state only long enough to clone the cancel token, so
            // an abandoned cache can be dropped while the loop sleeps.
            let Some(state) = state.upgrade() else { return };
            let cancel = state.cancel.clone();
            drop(state);
            tokio::select! {
                _ = cancel.cancelled() => true,
                _ = tokio::time::sleep(interval) => false,
            }
        };
        if cancelled {
            debug!("background token refresh stopping: cache disposed");
            return;
        }
        let Some(state) = state.upgrade() else { return };
        match state.refresh_with_retry(true, &NoopDiagnostics).await {
            Ok(token) => {
                debug!(expires_on = %token.expires_on, "background token refresh succeeded");
            }
            Err(Error::Cancelled) => return,
            Err(err) => {
                error!(error = %err, "background token refresh failed; retrying next interval");
            }
        }
    }
}
