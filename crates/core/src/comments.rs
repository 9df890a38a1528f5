//! # Pull Request Comments
//!
//! Every comment Bug Warden posts has the same shape: a mention of the person
//! who triggered the event, the message, and a collapsed section quoting the
//! text that triggered it followed by a fixed footer.
//!
//! This module renders that envelope along with the links and messages shared
//! by the different flows.

use std::fmt::Display;

use indoc::formatdoc;

#[cfg(test)]
#[path = "comments_tests.rs"]
mod tests;

pub const MISSING_REFERENCE_MESSAGE: &str = "No Bugzilla bug is referenced in the title of this pull request.\nTo reference a bug, add 'Bug XXX:' to the title of this pull request and request another bug refresh with <code>/bugzilla refresh</code>.";

pub const ISSUES_NOT_SUPPORTED_MESSAGE: &str =
    "Bugzilla bug referencing is only supported for Pull Requests, not issues.";

/// Renders a markdown link to a bug in the tracker.
///
/// # Examples
///
/// ```
/// use bug_warden_core::comments::bug_link;
///
/// assert_eq!(
///     bug_link(123, "https://bugzilla.example.com"),
///     "[Bugzilla bug 123](https://bugzilla.example.com/show_bug.cgi?id=123)"
/// );
/// ```
pub fn bug_link(bug_id: u64, endpoint: &str) -> String {
    format!(
        "[Bugzilla bug {}]({}/show_bug.cgi?id={})",
        bug_id, endpoint, bug_id
    )
}

/// Renders a markdown link to a pull request on the code host.
pub fn pr_link(github_url: &str, org: &str, repo: &str, number: u64) -> String {
    format!(
        "[{org}/{repo}#{number}]({}/{org}/{repo}/pull/{number})",
        github_url.trim_end_matches('/')
    )
}

/// Wraps a message in the standard response envelope.
///
/// # Arguments
///
/// * `login` - The user to mention
/// * `message` - The message itself
/// * `trigger_url` - Link to the comment or pull request that triggered the response
/// * `trigger_body` - The text that triggered the response, quoted line by line
/// * `footer` - Text appended at the end of the collapsed section
pub fn format_response(
    login: &str,
    message: &str,
    trigger_url: &str,
    trigger_body: &str,
    footer: &str,
) -> String {
    let quoted = trigger_body
        .split('\n')
        .map(|line| format!(">{}", line))
        .collect::<Vec<_>>()
        .join("\n");

    formatdoc!(
        "@{login}: {message}

        <details>

        In response to [this]({trigger_url}):

        {quoted}


        {footer}
        </details>"
    )
}

/// Message posted when the referenced bug does not exist.
pub fn bug_not_found_message(bug_id: u64, endpoint: &str) -> String {
    format!(
        "No Bugzilla bug with ID {} exists in the tracker at {}.\nOnce a valid bug is referenced in the title of this pull request, request a bug refresh with <code>/bugzilla refresh</code>.",
        bug_id, endpoint
    )
}

/// Message posted when the tracker returned an error.
///
/// `action` describes what was being done, for example `searching for bug 123`.
/// The raw error text is quoted so an administrator can act on it.
pub fn tracker_error_message(action: &str, endpoint: &str, error: &dyn Display) -> String {
    format!(
        "An error was encountered {} on the Bugzilla server at {}:\n> {}\nPlease contact an administrator to resolve this issue, then request a bug refresh with <code>/bugzilla refresh</code>.",
        action, endpoint, error
    )
}

/// Renders the collapsed list of validations that passed.
pub fn validations_details(validations: &[String]) -> String {
    if validations.is_empty() {
        return "<details><summary>No validations were run on this bug</summary></details>"
            .to_string();
    }

    format!(
        "<details><summary>{} validation(s) were run on this bug</summary>\n\n* {}</details>",
        validations.len(),
        validations.join("\n* ")
    )
}
