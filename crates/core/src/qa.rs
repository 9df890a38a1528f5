//! # QA Review Requests
//!
//! Handles the `/bugzilla cc-qa` and deprecated `/bugzilla assign-qa` commands
//! by looking up the code host user behind the QA contact of a bug.

use bug_warden_developer_platforms::models::Bug;
use bug_warden_developer_platforms::PullRequestProvider;
use tracing::warn;

#[cfg(test)]
#[path = "qa_tests.rs"]
mod tests;

pub const ASSIGN_QA_DEPRECATION_NOTICE: &str =
    "The `/bugzilla assign-qa` command is deprecated, please use `/bugzilla cc-qa` instead.";

/// Renders the outcome of a search for the users matching a QA contact email.
pub fn qa_search_result(email: &str, logins: &[String]) -> String {
    match logins {
        [] => format!(
            "No GitHub users were found matching the public email listed for the QA contact in Bugzilla ({}), skipping review request.",
            email
        ),
        [login] => format!("Requesting review from QA contact:\n/cc @{}", login),
        _ => format!(
            "Multiple GitHub users were found matching the public email listed for the QA contact in Bugzilla ({}), skipping review request. List of users with matching email:\n\t- {}",
            email,
            logins.join("\n\t- ")
        ),
    }
}

/// Builds the text requesting a review from the QA contact of `bug`.
///
/// Lookup failures are reported in the returned text instead of failing the
/// event, the rest of the response is still worth posting.
///
/// # Arguments
///
/// * `provider` - The code host, searched for users by public email
/// * `bug` - The bug whose QA contact should review the pull request
/// * `deprecated_command` - `true` when triggered by `/bugzilla assign-qa`
pub async fn qa_review_request<P: PullRequestProvider>(
    provider: &P,
    bug: &Bug,
    deprecated_command: bool,
) -> String {
    let body = match bug.qa_contact.as_deref().filter(|e| !e.is_empty()) {
        None => "No QA contact is listed for this bug in Bugzilla, skipping review request."
            .to_string(),
        Some(email) => match provider.find_logins_by_email(email).await {
            Ok(logins) => qa_search_result(email, &logins),
            Err(e) => {
                warn!(bug = bug.id, error = %e, "Failed to search for the QA contact");
                format!(
                    "An error was encountered searching GitHub for users with the public email listed for the QA contact in Bugzilla ({}), skipping review request:\n> {}",
                    email, e
                )
            }
        },
    };

    if deprecated_command {
        format!("{}\n{}", ASSIGN_QA_DEPRECATION_NOTICE, body)
    } else {
        body
    }
}
