//! # Labels
//!
//! This module keeps the bug related labels on a pull request in sync with the
//! state of the referenced bug.
//!
//! Bug Warden manages three kinds of labels:
//! - `bugzilla/valid-bug` when the referenced bug passed validation
//! - `bugzilla/invalid-bug` when it did not
//! - `bugzilla/severity-<level>` mirroring the severity of the bug
//!
//! Labels that do not belong to one of these kinds are never touched.

use crate::config::{INVALID_BUG_LABEL, SEVERITY_LABEL_PREFIX, VALID_BUG_LABEL};
use crate::errors::BugWardenError;
use bug_warden_developer_platforms::PullRequestProvider;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "labels_tests.rs"]
mod tests;

/// Returns `true` for the labels managed by Bug Warden.
pub fn is_managed_label(name: &str) -> bool {
    name == VALID_BUG_LABEL || name == INVALID_BUG_LABEL || name.starts_with(SEVERITY_LABEL_PREFIX)
}

/// Returns the label mirroring a bug severity.
///
/// # Examples
///
/// ```
/// use bug_warden_core::labels::severity_label;
///
/// assert_eq!(severity_label("urgent"), "bugzilla/severity-urgent");
/// ```
pub fn severity_label(severity: &str) -> String {
    format!("{}{}", SEVERITY_LABEL_PREFIX, severity)
}

/// Computes the managed labels a pull request should carry for a validated bug.
///
/// A bug without a severity gets no severity label.
pub fn desired_labels(valid: bool, severity: &str) -> Vec<String> {
    let mut labels = vec![if valid {
        VALID_BUG_LABEL.to_string()
    } else {
        INVALID_BUG_LABEL.to_string()
    }];

    if !severity.is_empty() {
        labels.push(severity_label(severity));
    }

    labels
}

/// Makes the managed labels on a pull request match `desired`.
///
/// Managed labels that are present but not desired are removed and desired
/// labels that are missing are added. Calling this twice with the same input
/// changes nothing the second time.
///
/// # Arguments
///
/// * `provider` - The Git provider implementation
/// * `owner` - The owner of the repository
/// * `repo` - The name of the repository
/// * `number` - The pull request number
/// * `desired` - The managed labels the pull request should carry, empty to
///   strip all of them
///
/// # Returns
///
/// The labels that were added.
pub async fn sync_bug_labels<P: PullRequestProvider>(
    provider: &P,
    owner: &str,
    repo: &str,
    number: u64,
    desired: &[String],
) -> Result<Vec<String>, BugWardenError> {
    let current = provider
        .list_labels(owner, repo, number)
        .await
        .map_err(|e| {
            warn!(
                repository_owner = owner,
                repository = repo,
                pull_request = number,
                error = %e,
                "Failed to list labels"
            );
            BugWardenError::GitProviderError(e.to_string())
        })?;

    for label in current.iter().filter(|l| is_managed_label(&l.name)) {
        if desired.contains(&label.name) {
            continue;
        }

        debug!(
            repository_owner = owner,
            repository = repo,
            pull_request = number,
            label = %label.name,
            "Removing label"
        );
        provider
            .remove_label(owner, repo, number, &label.name)
            .await
            .map_err(|e| BugWardenError::FailedToUpdatePullRequest(e.to_string()))?;
    }

    let to_add: Vec<String> = desired
        .iter()
        .filter(|d| !current.iter().any(|l| &l.name == *d))
        .cloned()
        .collect();

    if !to_add.is_empty() {
        debug!(
            repository_owner = owner,
            repository = repo,
            pull_request = number,
            labels = ?to_add,
            "Adding labels"
        );
        provider
            .add_labels(owner, repo, number, &to_add)
            .await
            .map_err(|e| BugWardenError::FailedToUpdatePullRequest(e.to_string()))?;
    }

    Ok(to_add)
}
