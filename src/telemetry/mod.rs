mod refresh;

pub use refresh::{DiagnosticsSink, FailureRecord, NoopDiagnostics, RefreshTelemetry};
