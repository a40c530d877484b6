use http::StatusCode;
use jiff::Timestamp;
use serde::Serialize;
use tracing::{Level, event};
use uuid::Uuid;

use crate::errors::ProviderError;

/// Structured record of one failed refresh attempt.
#[derive(Clone, Debug, Serialize)]
pub struct FailureRecord {
    pub status_code: u16,
    pub sub_status_code: u32,
    pub timestamp: Timestamp,
    pub message: String,
}

impl FailureRecord {
    pub fn new(status: StatusCode, sub_status_code: u32, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            sub_status_code,
            timestamp: Timestamp::now(),
            message: message.into(),
        }
    }

    /// Statusless transport failures are recorded as internal errors.
    pub(crate) fn from_provider(err: &ProviderError) -> Self {
        let status = err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, 0, err.message())
    }
}

/// Receives failure records during a refresh. Injected per call so the cache
/// stays decoupled from any particular logging or tracing backend.
pub trait DiagnosticsSink: Send + Sync {
    fn record_failure(&self, record: &FailureRecord);
}

/// Sink that drops every record. The background refresh loop uses this since
/// its refreshes are not attributed to any caller.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDiagnostics;

impl DiagnosticsSink for NoopDiagnostics {
    fn record_failure(&self, _record: &FailureRecord) {}
}

/// Standard sink: emits each record as a tracing event tagged with an
/// activity id and the caller's context label.
#[derive(Clone, Debug)]
pub struct RefreshTelemetry {
    activity_id: Uuid,
    context: String,
}

impl RefreshTelemetry {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            activity_id: Uuid::new_v4(),
            context: context.into(),
        }
    }

    pub fn activity_id(&self) -> Uuid {
        self.activity_id
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

impl DiagnosticsSink for RefreshTelemetry {
    fn record_failure(&self, record: &FailureRecord) {
        event!(
            Level::WARN,
            activity_id = %self.activity_id,
            context = %self.context,
            status = record.status_code,
            sub_status = record.sub_status_code,
            timestamp = %record.timestamp,
            error = %record.message,
            "refresh.attempt_failed"
        );
    }
}
