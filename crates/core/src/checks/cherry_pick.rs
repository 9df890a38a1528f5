//! # Cherry-pick Detection
//!
//! Pull requests opened by the cherry-pick robot carry a marker line in their
//! body naming the pull request they were cherry-picked from. This module
//! recognizes that marker.

use crate::config::CHERRY_PICK_REGEX;

#[cfg(test)]
#[path = "cherry_pick_tests.rs"]
mod tests;

/// Details of an automated cherry-pick pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CherryPick {
    /// The number of the pull request the change was cherry-picked from
    pub source_pr: u64,

    /// The branch the cherry-pick targets
    pub destination_branch: String,
}

/// Detects whether a pull request body belongs to an automated cherry-pick.
///
/// # Arguments
///
/// * `body` - The body of the pull request
/// * `base_ref` - The branch the pull request targets
///
/// # Examples
///
/// ```
/// use bug_warden_core::checks::cherry_pick::detect_cherry_pick;
///
/// let cherry_pick = detect_cherry_pick("This is an automated cherry-pick of #2", "release-4.4").unwrap();
/// assert_eq!(cherry_pick.source_pr, 2);
/// assert_eq!(cherry_pick.destination_branch, "release-4.4");
///
/// assert!(detect_cherry_pick("A regular pull request", "main").is_none());
/// ```
pub fn detect_cherry_pick(body: &str, base_ref: &str) -> Option<CherryPick> {
    let captures = CHERRY_PICK_REGEX.captures(body)?;
    let source_pr = captures.get(1)?.as_str().parse::<u64>().ok()?;

    Some(CherryPick {
        source_pr,
        destination_branch: base_ref.to_string(),
    })
}
