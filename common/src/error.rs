use thiserror::Error;

/// Local sensor read failures. Non-fatal: the poll loop logs the failure and
/// continues with the previous sample.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("motion sensor read failed: {0}")]
    Motion(String),
    #[error("temperature sensor read failed: {0}")]
    Temperature(String),
}

/// Telemetry store failures. Non-fatal: the affected evaluation cycle is
/// skipped with state untouched, and the next due cycle is the retry.
/// Timeouts are the same failure class as connection failures.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry push failed: {0}")]
    Push(String),
    #[error("telemetry pull failed: {0}")]
    Pull(String),
    #[error("telemetry pull returned no records")]
    EmptyWindow,
}
