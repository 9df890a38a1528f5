#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Error types for developer platform and bug tracker operations.
///
/// This enum represents all possible errors that can occur when interacting
/// with the code hosting platform (GitHub) or with the bug tracker (Bugzilla).
/// Each variant provides specific context about the type of failure encountered.
///
/// The display text of these errors is surfaced verbatim in pull request
/// comments, so it should be readable by the people who will see those comments.
///
/// # Examples
///
/// ```rust
/// use bug_warden_developer_platforms::errors::Error;
///
/// let missing = Error::BugNotFound(123);
/// assert!(missing.is_not_found());
///
/// let failure = Error::TrackerError("injected error getting bug".to_string());
/// assert_eq!(failure.to_string(), "injected error getting bug");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Generic API request failure.
    ///
    /// The string parameter contains the message returned by the platform.
    #[error("API request failed: {0}")]
    ApiError(String),

    /// Authentication failed with the platform.
    ///
    /// This error indicates that the provided credentials (token, app credentials, etc.)
    /// are invalid, expired, or insufficient for the requested operation.
    ///
    /// # Examples
    ///
    /// - Invalid personal access token
    /// - Expired GitHub App installation token
    /// - Invalid Bugzilla API key
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// The bug tracker has no bug with the given ID.
    #[error("bug {0} does not exist")]
    BugNotFound(u64),

    /// Failed to find app installation for repository.
    ///
    /// Parameters: repository owner, repository name, installation ID
    #[error("Failed to find installation for repository: {0}/{1} with ID: {2}")]
    FailedToFindAppInstallation(String, String, u64),

    /// Failed to update pull request.
    ///
    /// This error occurs when an operation to modify a pull request fails.
    /// This could include failures to:
    /// - Add or remove labels
    /// - Post comments
    ///
    /// The string parameter contains specific details about what operation failed.
    #[error("Failed to update the PR: {0}")]
    FailedToUpdatePullRequest(String),

    /// Invalid response format from a platform API.
    ///
    /// This error indicates that the response received from the platform was not
    /// in the expected format, for instance a missing field or malformed JSON.
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// The code host has no pull request with the given number.
    #[error("pull request number {0} does not exist")]
    PullRequestNotFound(u64),

    /// The bug tracker rejected a request or could not be reached.
    ///
    /// The string parameter carries the raw error text so that it can be shown
    /// to the pull request author.
    #[error("{0}")]
    TrackerError(String),
}

impl Error {
    /// Returns `true` when the error means the requested bug or pull request
    /// does not exist, as opposed to a failure to talk to the remote system.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::BugNotFound(_) | Error::PullRequestNotFound(_))
    }
}
