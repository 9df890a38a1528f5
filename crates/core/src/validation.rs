//! # Bug Validation
//!
//! This module evaluates a bug against the policy configured for the branch a
//! pull request targets.
//!
//! Validation is a pure function of the bug, the bugs it depends on, the policy
//! and the tracker endpoint (used to render links). It is built from an ordered
//! list of independent [`BugCheck`]s. Each check only runs when the policy field
//! it looks at is set, and appends human readable lines to the verdict: a
//! validation for every constraint the bug satisfies and a reason for every
//! constraint it violates.
//!
//! The order of the checks, and therefore of the lines in the verdict, is fixed:
//! open state, target release, status, dependents.

use bug_warden_developer_platforms::models::Bug;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    comments::bug_link,
    config::{bug_matches_states, pretty_states, pretty_status, BranchPolicy, BugState},
};

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;

/// The outcome of validating a bug.
///
/// # Examples
///
/// ```
/// use bug_warden_core::validation::ValidationVerdict;
///
/// let verdict = ValidationVerdict::default();
/// assert!(verdict.valid);
/// assert!(verdict.validations.is_empty());
/// assert!(verdict.reasons.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// `true` when no constraint was violated
    pub valid: bool,

    /// The constraints that were satisfied, in evaluation order
    pub validations: Vec<String>,

    /// The constraints that were violated, in evaluation order
    pub reasons: Vec<String>,
}

impl Default for ValidationVerdict {
    fn default() -> Self {
        Self {
            valid: true,
            validations: Vec::new(),
            reasons: Vec::new(),
        }
    }
}

impl ValidationVerdict {
    fn pass(&mut self, validation: String) {
        self.validations.push(validation);
    }

    fn fail(&mut self, reason: String) {
        self.reasons.push(reason);
        self.valid = false;
    }
}

/// Everything a check may look at.
#[derive(Debug, Clone, Copy)]
pub struct CheckSubject<'a> {
    pub bug: &'a Bug,

    /// The bugs `bug` depends on, in declaration order. Only fetched when the
    /// policy constrains dependents.
    pub dependents: &'a [Bug],

    pub policy: &'a BranchPolicy,

    pub endpoint: &'a str,
}

/// A single policy constraint.
pub trait BugCheck: Send + Sync {
    /// A short name for the check, used in logs.
    fn name(&self) -> &'static str;

    /// Appends the outcome of the check to the verdict. Does nothing when the
    /// policy does not configure the constraint.
    fn evaluate(&self, subject: &CheckSubject<'_>, verdict: &mut ValidationVerdict);
}

/// Checks that the bug is open or closed as the policy requires.
#[derive(Debug, Default)]
pub struct OpenCheck;

impl BugCheck for OpenCheck {
    fn name(&self) -> &'static str {
        "open"
    }

    fn evaluate(&self, subject: &CheckSubject<'_>, verdict: &mut ValidationVerdict) {
        let Some(expect_open) = subject.policy.is_open else {
            return;
        };

        match (expect_open, subject.bug.is_open) {
            (true, true) => verdict.pass("bug is open, matching expected state (open)".to_string()),
            (false, false) => {
                verdict.pass("bug isn't open, matching expected state (not open)".to_string())
            }
            (true, false) => verdict.fail("expected the bug to be open, but it isn't".to_string()),
            (false, true) => {
                verdict.fail("expected the bug to not be open, but it is".to_string())
            }
        }
    }
}

/// Checks that the bug targets the release configured for the branch.
#[derive(Debug, Default)]
pub struct TargetReleaseCheck;

impl BugCheck for TargetReleaseCheck {
    fn name(&self) -> &'static str {
        "target-release"
    }

    fn evaluate(&self, subject: &CheckSubject<'_>, verdict: &mut ValidationVerdict) {
        let Some(target) = subject.policy.target_release.as_deref() else {
            return;
        };

        let releases = &subject.bug.target_release;
        if releases.is_empty() {
            verdict.fail(format!(
                "expected the bug to target the \"{}\" release, but no target release was set",
                target
            ));
        } else if releases.iter().any(|r| r == target) {
            verdict.pass(format!(
                "bug target release ({}) matches configured target release for branch ({})",
                target, target
            ));
        } else {
            verdict.fail(format!(
                "expected the bug to target the \"{}\" release, but it targets \"{}\" instead",
                target, releases[0]
            ));
        }
    }
}

/// Checks that the bug is in one of the valid states.
///
/// The state the bug is moved to after validation always counts as valid, so that
/// re-validating a bug that was already moved does not fail.
#[derive(Debug, Default)]
pub struct StatusCheck;

impl BugCheck for StatusCheck {
    fn name(&self) -> &'static str {
        "status"
    }

    fn evaluate(&self, subject: &CheckSubject<'_>, verdict: &mut ValidationVerdict) {
        let Some(valid_states) = subject.policy.valid_states.as_ref() else {
            return;
        };

        let mut allowed: Vec<BugState> = valid_states.clone();
        if let Some(after) = subject.policy.state_after_validation.as_ref() {
            if !allowed.contains(after) {
                allowed.push(after.clone());
            }
        }

        let bug = subject.bug;
        let current = pretty_status(&bug.status, &bug.resolution);
        if bug_matches_states(bug, &allowed) {
            verdict.pass(format!(
                "bug is in the state {}, which is one of the valid states ({})",
                current,
                pretty_states(&allowed)
            ));
        } else {
            verdict.fail(format!(
                "expected the bug to be in one of the following states: {}, but it is {} instead",
                pretty_states(&allowed),
                current
            ));
        }
    }
}

/// Checks the state and target release of the bugs this bug depends on.
#[derive(Debug, Default)]
pub struct DependentsCheck;

impl DependentsCheck {
    fn no_dependents_reason(subject: &CheckSubject<'_>) -> Option<String> {
        let link = bug_link(subject.bug.id, subject.endpoint);
        let policy = subject.policy;
        match (
            policy.dependent_bug_states.as_ref(),
            policy.dependent_bug_target_releases.as_ref(),
        ) {
            (Some(states), Some(releases)) => Some(format!(
                "expected {} to depend on a bug targeting a release in {} and in one of the following states: {}, but no dependents were found",
                link,
                releases.join(", "),
                pretty_states(states)
            )),
            (Some(states), None) => Some(format!(
                "expected {} to depend on a bug in one of the following states: {}, but no dependents were found",
                link,
                pretty_states(states)
            )),
            (None, Some(releases)) => Some(format!(
                "expected {} to depend on a bug targeting a release in {}, but no dependents were found",
                link,
                releases.join(", ")
            )),
            (None, None) => None,
        }
    }
}

impl BugCheck for DependentsCheck {
    fn name(&self) -> &'static str {
        "dependents"
    }

    fn evaluate(&self, subject: &CheckSubject<'_>, verdict: &mut ValidationVerdict) {
        if !subject.policy.checks_dependents() {
            return;
        }

        if subject.dependents.is_empty() {
            if let Some(reason) = Self::no_dependents_reason(subject) {
                verdict.fail(reason);
            }
            return;
        }

        let mut all_passed = true;
        for dependent in subject.dependents {
            let link = bug_link(dependent.id, subject.endpoint);

            if let Some(states) = subject.policy.dependent_bug_states.as_ref() {
                let current = pretty_status(&dependent.status, &dependent.resolution);
                if bug_matches_states(dependent, states) {
                    verdict.pass(format!(
                        "dependent bug {} is in the state {}, which is one of the valid states ({})",
                        link,
                        current,
                        pretty_states(states)
                    ));
                } else {
                    all_passed = false;
                    verdict.fail(format!(
                        "expected dependent {} to be in one of the following states: {}, but it is {} instead",
                        link,
                        pretty_states(states),
                        current
                    ));
                }
            }

            if let Some(releases) = subject.policy.dependent_bug_target_releases.as_ref() {
                match dependent.target_release.first() {
                    None => {
                        all_passed = false;
                        verdict.fail(format!(
                            "expected dependent {} to target a release in {}, but no target release was set",
                            link,
                            releases.join(", ")
                        ));
                    }
                    Some(release) if releases.contains(release) => verdict.pass(format!(
                        "dependent {} targets the \"{}\" release, which is one of the valid target releases: {}",
                        link,
                        release,
                        releases.join(", ")
                    )),
                    Some(release) => {
                        all_passed = false;
                        verdict.fail(format!(
                            "expected dependent {} to target a release in {}, but it targets \"{}\" instead",
                            link,
                            releases.join(", "),
                            release
                        ));
                    }
                }
            }
        }

        if all_passed {
            verdict.pass("bug has dependents".to_string());
        }
    }
}

/// The checks run by [`validate_bug`], in evaluation order.
pub fn default_checks() -> Vec<Box<dyn BugCheck>> {
    vec![
        Box::new(OpenCheck),
        Box::new(TargetReleaseCheck),
        Box::new(StatusCheck),
        Box::new(DependentsCheck),
    ]
}

/// Validates a bug against a branch policy.
///
/// # Arguments
///
/// * `bug` - The bug referenced by the pull request
/// * `dependents` - The bugs `bug` depends on, in declaration order
/// * `policy` - The policy for the branch the pull request targets
/// * `endpoint` - The tracker endpoint, used to render links to bugs
///
/// # Examples
///
/// ```
/// use bug_warden_core::config::BranchPolicy;
/// use bug_warden_core::validation::validate_bug;
/// use bug_warden_developer_platforms::models::Bug;
///
/// let bug = Bug { id: 123, is_open: false, ..Default::default() };
/// let policy = BranchPolicy { is_open: Some(true), ..Default::default() };
///
/// let verdict = validate_bug(&bug, &[], &policy, "https://bugzilla.example.com");
/// assert!(!verdict.valid);
/// assert_eq!(verdict.reasons, vec!["expected the bug to be open, but it isn't".to_string()]);
/// ```
pub fn validate_bug(
    bug: &Bug,
    dependents: &[Bug],
    policy: &BranchPolicy,
    endpoint: &str,
) -> ValidationVerdict {
    let subject = CheckSubject {
        bug,
        dependents,
        policy,
        endpoint,
    };

    let mut verdict = ValidationVerdict::default();
    for check in default_checks() {
        check.evaluate(&subject, &mut verdict);
        trace!(
            bug = bug.id,
            check = check.name(),
            valid = verdict.valid,
            "Evaluated bug check"
        );
    }

    verdict
}
