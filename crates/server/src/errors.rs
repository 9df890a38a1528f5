use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that stop the server from starting.
///
/// Problems with individual deliveries are logged and answered with an HTTP
/// status code, they never show up here.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Authentication error
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Telemetry could not be set up
    #[error("Telemetry error: {0}")]
    TelemetryError(String),

    /// The listener could not be bound or failed while serving
    #[error("Network error: {0}")]
    NetworkError(String),
}
