//! # Models
//!
//! This module contains the data models used throughout Bug Warden.
//!
//! These models represent the entities that Bug Warden works with: pull requests,
//! labels and users on the code hosting platform, and bugs, comments and external
//! tracker links on the bug tracker. They are designed to be serializable and
//! deserializable to facilitate integration with the remote APIs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// Represents a label on a pull request.
///
/// # Examples
///
/// ```
/// use bug_warden_developer_platforms::models::Label;
///
/// let label = Label {
///     name: "bugzilla/valid-bug".to_string(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// The name of the label
    pub name: String,
}

/// Represents a user on the code hosting platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
}

/// Represents a pull request from the code hosting platform.
///
/// This struct contains the information about a pull request that is needed to
/// link it to a bug and to track its merge status.
///
/// # Examples
///
/// ```
/// use bug_warden_developer_platforms::models::{PullRequest, User};
///
/// let pr = PullRequest {
///     number: 123,
///     title: "Bug 456: fix the frobnicator".to_string(),
///     body: None,
///     state: "open".to_string(),
///     merged: false,
///     base_ref: "main".to_string(),
///     html_url: "https://github.com/org/repo/pull/123".to_string(),
///     author: User { id: 1, login: "user".to_string() },
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// The pull request number
    pub number: u64,

    /// The title of the pull request
    pub title: String,

    /// The description/body of the pull request, if any
    pub body: Option<String>,

    /// The state of the pull request, either `open` or `closed`
    pub state: String,

    /// `true` if the pull request has been merged
    pub merged: bool,

    /// The name of the branch the pull request targets
    pub base_ref: String,

    /// The link to the pull request on the code hosting platform
    pub html_url: String,

    /// The user who opened the pull request
    pub author: User,
}

/// Represents a bug in the bug tracker.
///
/// Only the fields Bug Warden reads are modelled. List fields default to empty
/// when the tracker omits them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bug {
    pub id: u64,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub resolution: String,

    #[serde(default)]
    pub is_open: bool,

    /// The releases the bug is targeted at. Bugzilla reports this as a list even
    /// though it normally holds a single value.
    #[serde(default)]
    pub target_release: Vec<String>,

    #[serde(default)]
    pub severity: String,

    #[serde(default)]
    pub product: String,

    #[serde(default)]
    pub component: Vec<String>,

    #[serde(default)]
    pub version: Vec<String>,

    #[serde(default)]
    pub summary: String,

    /// IDs of the bugs this bug depends on, in declaration order.
    #[serde(default)]
    pub depends_on: Vec<u64>,

    /// IDs of the bugs that depend on this bug.
    #[serde(default)]
    pub blocks: Vec<u64>,

    /// The e-mail address of the QA contact, if one is assigned.
    #[serde(default)]
    pub qa_contact: Option<String>,
}

/// A comment on a bug. The comment with `count == 0` is the bug description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugComment {
    pub bug_id: u64,

    #[serde(default)]
    pub count: u64,

    #[serde(default)]
    pub text: String,
}

/// The fields to change on a bug.
///
/// Unset fields are left untouched by the tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

/// The fields used to create a new bug.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugCreate {
    pub product: String,

    pub component: Vec<String>,

    pub version: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub target_release: Vec<String>,

    pub severity: String,

    pub summary: String,

    pub description: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<u64>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub sub_components: BTreeMap<String, Vec<String>>,
}

/// A link between a bug and a pull request, stored on the bug in the tracker's
/// external bugs list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalLink {
    pub bug_id: u64,
    pub org: String,
    pub repo: String,
    pub number: u64,
}

impl ExternalLink {
    /// The identifier used by the tracker for the pull request, `org/repo/pull/N`.
    pub fn external_id(&self) -> String {
        format!("{}/{}/pull/{}", self.org, self.repo, self.number)
    }

    /// Parses an identifier in the `org/repo/pull/N` form. Returns `None` for
    /// links that do not point at a pull request.
    pub fn parse(bug_id: u64, external_id: &str) -> Option<Self> {
        let parts: Vec<&str> = external_id.trim_matches('/').split('/').collect();
        if parts.len() != 4 || parts[2] != "pull" {
            return None;
        }

        let number = parts[3].parse::<u64>().ok()?;
        Some(Self {
            bug_id,
            org: parts[0].to_string(),
            repo: parts[1].to_string(),
            number,
        })
    }

    /// Returns `true` when this link points at the given pull request.
    pub fn is_for(&self, org: &str, repo: &str, number: u64) -> bool {
        self.org == org && self.repo == repo && self.number == number
    }
}
