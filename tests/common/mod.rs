#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;
use tokio_util::sync::CancellationToken;
use tracing::subscriber::{DefaultGuard, set_default};
use tracing_subscriber::{Registry, fmt, layer::SubscriberExt};

use bearer_cache::{
    CachedToken, DiagnosticsSink, FailureRecord, ProviderError, ScopeRequest, TokenProvider,
};

/// Expiry `d` from now, with millisecond precision.
pub fn expires_in(d: Duration) -> Timestamp {
    Timestamp::from_millisecond(Timestamp::now().as_millisecond() + d.as_millis() as i64)
        .expect("expiry in range")
}

/// Provider that replays a queue of scripted results, counting fetches.
/// An exhausted script yields transport errors.
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Result<CachedToken, ProviderError>>>,
    fetches: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            fetches: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Each fetch stalls for `delay` first, observing cancellation.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn push_ok(&self, value: &str, ttl: Duration) {
        self.steps
            .lock()
            .unwrap()
            .push_back(Ok(CachedToken::new(value, expires_in(ttl))));
    }

    pub fn push_err(&self, err: ProviderError) {
        self.steps.lock().unwrap().push_back(Err(err));
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for ScriptedProvider {
    async fn fetch_token(
        &self,
        _scopes: &ScopeRequest,
        cancel: &CancellationToken,
    ) -> Result<CachedToken, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(ProviderError::transport("fetch aborted by cancellation"));
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
        match self.steps.lock().unwrap().pop_front() {
            Some(step) => step,
            None => Err(ProviderError::transport("script exhausted")),
        }
    }
}

/// Provider that always succeeds, handing out "token-1", "token-2", ... so
/// tests can tell which fetch produced the token a caller received.
pub struct CountingProvider {
    ttl: Duration,
    delay: Option<Duration>,
    fetches: AtomicUsize,
}

impl CountingProvider {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            delay: None,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(ttl: Duration, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(ttl)
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for CountingProvider {
    async fn fetch_token(
        &self,
        _scopes: &ScopeRequest,
        cancel: &CancellationToken,
    ) -> Result<CachedToken, ProviderError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(ProviderError::transport("fetch aborted by cancellation"));
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
        Ok(CachedToken::new(
            format!("token-{n}"),
            expires_in(self.ttl),
        ))
    }
}

/// Diagnostics sink that collects every record for later assertions.
#[derive(Default)]
pub struct CollectingSink {
    records: Mutex<Vec<FailureRecord>>,
}

impl CollectingSink {
    pub fn records(&self) -> Vec<FailureRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl DiagnosticsSink for CollectingSink {
    fn record_failure(&self, record: &FailureRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}

struct VecWriter {
    lines: Arc<Mutex<Vec<String>>>,
}

impl std::io::Write for VecWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.lines.lock().unwrap();
        guard.push(String::from_utf8_lossy(buf).into_owned());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Installs a thread-default subscriber that captures formatted log lines.
pub fn capture_logs() -> (Arc<Mutex<Vec<String>>>, DefaultGuard) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let writer_lines = lines.clone();
    let subscriber = Registry::default().with(
        fmt::Layer::default()
            .with_writer(move || VecWriter {
                lines: writer_lines.clone(),
            })
            .with_target(false)
            .with_level(true)
            .with_ansi(false),
    );
    let guard = set_default(subscriber);
    (lines, guard)
}

pub fn drain_logs(lines: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    lines.lock().unwrap().clone()
}
