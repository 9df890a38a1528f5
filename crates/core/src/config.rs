//! Configuration settings for the Bug Warden core functionality.
//!
//! This module centralizes the constants, the command and reference patterns,
//! and the layered per-branch policy configuration used throughout the crate.
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use bug_warden_developer_platforms::models::{Bug, BugUpdate};

use crate::errors::ConfigLoadError;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Label applied to PRs that reference a bug which passed validation
pub const VALID_BUG_LABEL: &str = "bugzilla/valid-bug";

/// Label applied to PRs that reference a bug which failed validation
pub const INVALID_BUG_LABEL: &str = "bugzilla/invalid-bug";

/// Prefix of the label that mirrors the severity of the referenced bug
pub const SEVERITY_LABEL_PREFIX: &str = "bugzilla/severity-";

/// Key under which the policy that applies to every branch is stored
pub const WILDCARD_BRANCH: &str = "*";

/// The only configuration schema version this crate understands
pub const SUPPORTED_SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_GITHUB_URL: &str = "https://github.com";

pub const DEFAULT_RESPONSE_FOOTER: &str = "Instructions for interacting with me using PR comments are available [here](https://github.com/pvandervelde/bug_warden/blob/main/docs/commands.md). If you have questions or suggestions related to my behavior, please file an issue against the [pvandervelde/bug_warden](https://github.com/pvandervelde/bug_warden/issues/new) repository.";

lazy_static! {
    /// Pre-compiled regex for bug references in pull request titles
    pub static ref BUG_REFERENCE_REGEX: Regex =
        Regex::new(r"(?i)bug ([0-9]+):").expect("Failed to compile bug reference regex");

    /// Pre-compiled regex for the body of automated cherry-pick pull requests
    pub static ref CHERRY_PICK_REGEX: Regex = Regex::new(
        r"This is an automated cherry-pick of #([0-9]+)"
    ).expect("Failed to compile cherry-pick regex");

    /// Pre-compiled regex for the `/bugzilla refresh` command
    pub static ref REFRESH_COMMAND_REGEX: Regex =
        Regex::new(r"(?mi)^/bugzilla refresh\s*$").expect("Failed to compile refresh command regex");

    /// Pre-compiled regex for the deprecated `/bugzilla assign-qa` command
    pub static ref QA_ASSIGN_COMMAND_REGEX: Regex = Regex::new(r"(?mi)^/bugzilla assign-qa\s*$")
        .expect("Failed to compile assign-qa command regex");

    /// Pre-compiled regex for the `/bugzilla cc-qa` command
    pub static ref QA_CC_COMMAND_REGEX: Regex =
        Regex::new(r"(?mi)^/bugzilla cc-qa\s*$").expect("Failed to compile cc-qa command regex");
}

/// A bug status paired with an optional resolution.
///
/// An empty status or resolution acts as a wildcard when matching a bug:
/// `{ status = "CLOSED" }` matches a closed bug with any resolution, and
/// `{ resolution = "ERRATA" }` matches any bug resolved as `ERRATA`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BugState {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resolution: String,
}

impl BugState {
    pub fn new(status: &str, resolution: &str) -> Self {
        Self {
            status: status.to_string(),
            resolution: resolution.to_string(),
        }
    }

    /// Creates a state that matches any resolution of the given status.
    pub fn with_status(status: &str) -> Self {
        Self::new(status, "")
    }

    /// Returns `true` when a bug with the given status and resolution is in this state.
    pub fn matches(&self, status: &str, resolution: &str) -> bool {
        if !self.status.is_empty() && self.status != status {
            return false;
        }

        if !self.resolution.is_empty() && self.resolution != resolution {
            return false;
        }

        true
    }

    /// Returns `true` when the bug is in this state.
    pub fn matches_bug(&self, bug: &Bug) -> bool {
        self.matches(&bug.status, &bug.resolution)
    }

    /// The tracker update that moves a bug into this state.
    pub fn to_update(&self) -> BugUpdate {
        BugUpdate {
            status: if self.status.is_empty() {
                None
            } else {
                Some(self.status.clone())
            },
            resolution: if self.resolution.is_empty() {
                None
            } else {
                Some(self.resolution.clone())
            },
        }
    }
}

impl fmt::Display for BugState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&pretty_status(&self.status, &self.resolution))
    }
}

/// Renders a status and resolution the way they appear in comments.
pub fn pretty_status(status: &str, resolution: &str) -> String {
    if resolution.is_empty() {
        return status.to_string();
    }

    if status.is_empty() {
        return format!("any status with resolution {}", resolution);
    }

    format!("{} ({})", status, resolution)
}

/// Renders a list of states as a comma separated list.
pub fn pretty_states(states: &[BugState]) -> String {
    states
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Returns `true` when the bug is in any of the given states.
pub fn bug_matches_states(bug: &Bug, states: &[BugState]) -> bool {
    states.iter().any(|s| s.matches_bug(bug))
}

/// The policy that applies to pull requests targeting a branch.
///
/// Every field is optional. An absent field places no constraint on the bug
/// and triggers no action, it never means "must be empty".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchPolicy {
    /// Whether the bug must be open (`true`) or closed (`false`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_open: Option<bool>,

    /// The release the bug must target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_release: Option<String>,

    /// The states the bug may be in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_states: Option<Vec<BugState>>,

    /// The states the bugs this bug depends on may be in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent_bug_states: Option<Vec<BugState>>,

    /// The releases the bugs this bug depends on may target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent_bug_target_releases: Option<Vec<String>>,

    /// The state a bug is moved to once it passes validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_after_validation: Option<BugState>,

    /// The state a bug is moved to once all linked pull requests have merged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_after_merge: Option<BugState>,

    /// Whether to link the pull request to the bug in the tracker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_external_link: Option<bool>,

    /// Whether pull requests without a bug reference are flagged when opened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_by_default: Option<bool>,
}

impl BranchPolicy {
    /// Returns a policy where every field set in `other` replaces the field in `self`.
    pub fn overlay(&self, other: &BranchPolicy) -> BranchPolicy {
        BranchPolicy {
            is_open: other.is_open.or(self.is_open),
            target_release: other
                .target_release
                .clone()
                .or_else(|| self.target_release.clone()),
            valid_states: other
                .valid_states
                .clone()
                .or_else(|| self.valid_states.clone()),
            dependent_bug_states: other
                .dependent_bug_states
                .clone()
                .or_else(|| self.dependent_bug_states.clone()),
            dependent_bug_target_releases: other
                .dependent_bug_target_releases
                .clone()
                .or_else(|| self.dependent_bug_target_releases.clone()),
            state_after_validation: other
                .state_after_validation
                .clone()
                .or_else(|| self.state_after_validation.clone()),
            state_after_merge: other
                .state_after_merge
                .clone()
                .or_else(|| self.state_after_merge.clone()),
            add_external_link: other.add_external_link.or(self.add_external_link),
            validate_by_default: other.validate_by_default.or(self.validate_by_default),
        }
    }

    pub fn adds_external_link(&self) -> bool {
        self.add_external_link.unwrap_or(false)
    }

    pub fn validates_by_default(&self) -> bool {
        self.validate_by_default.unwrap_or(false)
    }

    /// Returns `true` when the policy constrains the bugs this bug depends on.
    pub fn checks_dependents(&self) -> bool {
        self.dependent_bug_states.is_some() || self.dependent_bug_target_releases.is_some()
    }
}

/// Settings for the bug tracker
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// The base URL of the Bugzilla server
    #[serde(default)]
    pub endpoint: String,
}

/// Settings for the code hosting platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// The base URL used to build links to pull requests
    #[serde(default = "default_github_url")]
    pub html_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            html_url: default_github_url(),
        }
    }
}

/// Settings for the comments posted on pull requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Text appended to every comment
    #[serde(default = "default_response_footer")]
    pub footer: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            footer: default_response_footer(),
        }
    }
}

/// Policies for the branches of a single repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoPolicies {
    #[serde(default)]
    pub branches: BTreeMap<String, BranchPolicy>,
}

/// Policies for an organization and its repositories
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgPolicies {
    #[serde(default)]
    pub branches: BTreeMap<String, BranchPolicy>,

    #[serde(default)]
    pub repos: BTreeMap<String, RepoPolicies>,
}

/// All configured policies, from global down to repository level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoliciesConfig {
    #[serde(default)]
    pub branches: BTreeMap<String, BranchPolicy>,

    #[serde(default)]
    pub orgs: BTreeMap<String, OrgPolicies>,
}

/// Top-level configuration struct for bug-warden
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugWardenConfig {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,

    #[serde(default)]
    pub bugzilla: TrackerConfig,

    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub response: ResponseConfig,

    #[serde(default)]
    pub policies: PoliciesConfig,
}

impl Default for BugWardenConfig {
    fn default() -> Self {
        Self {
            schema_version: SUPPORTED_SCHEMA_VERSION,
            bugzilla: TrackerConfig::default(),
            github: GitHubConfig::default(),
            response: ResponseConfig::default(),
            policies: PoliciesConfig::default(),
        }
    }
}

/// Provides the policy that applies to a branch of a repository.
pub trait PolicySource: Send + Sync {
    fn policy_for(&self, org: &str, repo: &str, branch: &str) -> BranchPolicy;
}

fn apply_layer(
    policy: BranchPolicy,
    layer: &BTreeMap<String, BranchPolicy>,
    branch: &str,
) -> BranchPolicy {
    let mut result = policy;
    if let Some(wildcard) = layer.get(WILDCARD_BRANCH) {
        result = result.overlay(wildcard);
    }

    if branch != WILDCARD_BRANCH {
        if let Some(specific) = layer.get(branch) {
            result = result.overlay(specific);
        }
    }

    result
}

impl PolicySource for BugWardenConfig {
    /// Resolves the policy for a branch.
    ///
    /// Layers are applied from least to most specific: global wildcard, global
    /// branch, organization wildcard, organization branch, repository wildcard,
    /// repository branch. Each layer only overrides the fields it sets.
    fn policy_for(&self, org: &str, repo: &str, branch: &str) -> BranchPolicy {
        let mut policy = apply_layer(BranchPolicy::default(), &self.policies.branches, branch);

        if let Some(org_policies) = self.policies.orgs.get(org) {
            policy = apply_layer(policy, &org_policies.branches, branch);

            if let Some(repo_policies) = org_policies.repos.get(repo) {
                policy = apply_layer(policy, &repo_policies.branches, branch);
            }
        }

        policy
    }
}

fn default_github_url() -> String {
    DEFAULT_GITHUB_URL.to_string()
}

fn default_response_footer() -> String {
    DEFAULT_RESPONSE_FOOTER.to_string()
}

/// Parses the bug-warden configuration from TOML text.
///
/// # Returns
/// * `Ok(BugWardenConfig)` if parsed and valid
/// * `Err(ConfigLoadError)` if the text is malformed or has an unsupported schema version
pub fn parse_bug_warden_config(content: &str) -> Result<BugWardenConfig, ConfigLoadError> {
    let config: BugWardenConfig = toml::from_str(content)?;
    if config.schema_version != SUPPORTED_SCHEMA_VERSION {
        return Err(ConfigLoadError::UnsupportedSchemaVersion(
            config.schema_version,
        ));
    }

    Ok(config)
}

/// Loads the bug-warden configuration from the given path.
///
/// # Arguments
/// * `path` - Path to the configuration file
///
/// # Returns
/// * `Ok(BugWardenConfig)` if loaded and valid
/// * `Err(ConfigLoadError)` if the file is missing, malformed, or has an unsupported schema version
pub fn load_bug_warden_config<P: AsRef<Path>>(path: P) -> Result<BugWardenConfig, ConfigLoadError> {
    let path_ref = path.as_ref();
    let content = match fs::read_to_string(path_ref) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigLoadError::NotFound(path_ref.display().to_string()));
        }
        Err(e) => return Err(ConfigLoadError::Io(e)),
    };

    parse_bug_warden_config(&content)
}
