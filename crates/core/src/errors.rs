use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that abort the processing of an event.
///
/// Expected conditions, such as a missing bug reference or a bug that fails
/// validation, are reported to the pull request author through a comment and
/// never show up here. These errors cover failures to talk back to the code
/// host and payloads that cannot be understood.
#[derive(Error, Debug)]
pub enum BugWardenError {
    #[error("Failed to update pull request. Issue was: '{0}'.")]
    FailedToUpdatePullRequest(String),

    #[error("Git provider error: {0}")]
    GitProviderError(String),

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),
}

/// Errors that occur while loading the bug warden configuration file.
#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read the configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse the configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unsupported configuration schema version: {0}")]
    UnsupportedSchemaVersion(u32),
}
