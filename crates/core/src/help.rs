//! # Help
//!
//! Describes the pull request commands Bug Warden understands and renders
//! branch policies as prose so users can find out what makes a bug valid.

use crate::config::{pretty_states, BranchPolicy};

#[cfg(test)]
#[path = "help_tests.rs"]
mod tests;

/// A comment command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHelp {
    pub usage: &'static str,
    pub description: &'static str,
    pub deprecated: bool,
}

/// The commands that can be posted as pull request comments.
pub const COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        usage: "/bugzilla refresh",
        description: "Check Bugzilla for a valid bug referenced in the PR title",
        deprecated: false,
    },
    CommandHelp {
        usage: "/bugzilla assign-qa",
        description: "(DEPRECATED) Assign PR to QA contact specified in Bugzilla",
        deprecated: true,
    },
    CommandHelp {
        usage: "/bugzilla cc-qa",
        description: "Request PR review from QA contact specified in Bugzilla",
        deprecated: false,
    },
];

/// Joins phrases into an English list: `a`, `a and b`, `a, b, and c`.
fn join_phrases(phrases: &[String]) -> String {
    match phrases {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{} and {}", first, second),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

/// Describes what a policy requires of a bug and what happens to it.
///
/// # Examples
///
/// ```
/// use bug_warden_core::config::{BranchPolicy, BugState};
/// use bug_warden_core::help::describe_policy;
///
/// let policy = BranchPolicy {
///     is_open: Some(true),
///     target_release: Some("4.4.z".to_string()),
///     state_after_validation: Some(BugState::with_status("POST")),
///     ..Default::default()
/// };
///
/// assert_eq!(
///     describe_policy(&policy),
///     "valid bugs must be open and target the \"4.4.z\" release. After being linked to a pull request, bugs will be moved to the POST state."
/// );
/// ```
pub fn describe_policy(policy: &BranchPolicy) -> String {
    let mut conditions = Vec::new();
    match policy.is_open {
        Some(true) => conditions.push("be open".to_string()),
        Some(false) => conditions.push("be closed".to_string()),
        None => {}
    }
    if let Some(release) = policy.target_release.as_deref() {
        conditions.push(format!("target the \"{}\" release", release));
    }
    if let Some(states) = policy.valid_states.as_ref() {
        conditions.push(format!(
            "be in one of the following states: {}",
            pretty_states(states)
        ));
    }
    if policy.checks_dependents() {
        conditions.push("depend on at least one other bug".to_string());
    }
    if let Some(states) = policy.dependent_bug_states.as_ref() {
        conditions.push(format!(
            "have all dependent bugs in one of the following states: {}",
            pretty_states(states)
        ));
    }
    if let Some(releases) = policy.dependent_bug_target_releases.as_ref() {
        conditions.push(format!(
            "have all dependent bugs target one of the following releases: {}",
            releases.join(", ")
        ));
    }

    let mut actions = Vec::new();
    if let Some(state) = policy.state_after_validation.as_ref() {
        actions.push(format!("moved to the {} state", state));
    }
    if policy.adds_external_link() {
        actions.push(
            "updated to refer to the pull request using the external bug tracker".to_string(),
        );
    }
    if let Some(state) = policy.state_after_merge.as_ref() {
        actions.push(format!(
            "moved to the {} state when all linked pull requests are merged",
            state
        ));
    }

    let mut description = if conditions.is_empty() {
        "any referenced bug is valid.".to_string()
    } else {
        format!("valid bugs must {}.", join_phrases(&conditions))
    };

    if !actions.is_empty() {
        description.push_str(&format!(
            " After being linked to a pull request, bugs will be {}.",
            join_phrases(&actions)
        ));
    }

    description
}
