//! # Event Normalization
//!
//! Webhook deliveries come in two shapes: pull request events and comments. This
//! module reduces both to a single [`Event`] describing what happened to the pull
//! request and which bug it refers to, or decides that the delivery is not
//! relevant.

use bug_warden_developer_platforms::PullRequestProvider;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::checks::bug_reference::extract_bug_id;
use crate::checks::cherry_pick::{detect_cherry_pick, CherryPick};
use crate::comments::{format_response, ISSUES_NOT_SUPPORTED_MESSAGE};
use crate::config::{QA_ASSIGN_COMMAND_REGEX, QA_CC_COMMAND_REGEX, REFRESH_COMMAND_REGEX};
use crate::errors::BugWardenError;

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;

/// A user as it appears in webhook payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadUser {
    pub login: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadRepository {
    pub name: String,
    pub owner: PayloadUser,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadInstallation {
    pub id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadBranch {
    #[serde(rename = "ref")]
    pub ref_field: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadPullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub html_url: String,
    pub user: PayloadUser,
    pub base: PayloadBranch,
}

/// The previous value of an edited field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedValue {
    pub from: String,
}

/// The record of what an `edited` delivery changed. Only the title matters here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestChanges {
    #[serde(default)]
    pub title: Option<ChangedValue>,
}

/// The payload of a `pull_request` webhook delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEventPayload {
    pub action: String,
    pub pull_request: PayloadPullRequest,
    #[serde(default)]
    pub changes: Option<PullRequestChanges>,
    pub repository: PayloadRepository,
    #[serde(default)]
    pub installation: Option<PayloadInstallation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadIssue {
    pub number: u64,

    /// Present only when the issue is a pull request
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadComment {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub html_url: String,
    pub user: PayloadUser,
}

/// The payload of an `issue_comment` webhook delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCommentPayload {
    pub action: String,
    pub issue: PayloadIssue,
    pub comment: PayloadComment,
    pub repository: PayloadRepository,
    #[serde(default)]
    pub installation: Option<PayloadInstallation>,
}

/// Parses a webhook payload.
pub fn parse_payload<T: DeserializeOwned>(body: &str) -> Result<T, BugWardenError> {
    serde_json::from_str(body).map_err(|e| BugWardenError::InvalidPayload(e.to_string()))
}

/// A webhook delivery reduced to what matters for bug linking.
///
/// `bug_id` and `missing` are never both set. Cherry-pick events carry
/// neither; the bug is resolved from the title of the source pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    pub org: String,
    pub repo: String,
    pub base_ref: String,
    pub number: u64,

    /// The state of the pull request (`open` or `closed`)
    pub state: String,

    /// The pull request title for pull request events, the comment body for commands
    pub body: String,

    /// Link to the pull request or comment that triggered the event
    pub html_url: String,

    /// The author of the pull request or comment
    pub login: String,

    pub bug_id: Option<u64>,

    /// `true` when the pull request does not reference a bug
    pub missing: bool,

    pub merged: bool,

    pub cherry_pick: Option<CherryPick>,

    /// Set by the deprecated `/bugzilla assign-qa` command
    pub assign_qa: bool,

    /// Set by the `/bugzilla cc-qa` command
    pub cc_qa: bool,
}

impl Event {
    fn from_pull_request(payload: &PullRequestEventPayload) -> Self {
        let pr = &payload.pull_request;
        Self {
            org: payload.repository.owner.login.clone(),
            repo: payload.repository.name.clone(),
            base_ref: pr.base.ref_field.clone(),
            number: pr.number,
            state: pr.state.clone(),
            body: pr.title.clone(),
            html_url: pr.html_url.clone(),
            login: pr.user.login.clone(),
            ..Default::default()
        }
    }

    fn with_reference(mut self, bug_id: Option<u64>) -> Self {
        self.missing = bug_id.is_none();
        self.bug_id = bug_id;
        self
    }
}

/// Applies the title change rules: no event unless the change altered the
/// referenced bug.
fn digest_title_change(
    payload: &PullRequestEventPayload,
    changes: &PullRequestChanges,
) -> Option<Event> {
    let previous = changes.title.as_ref()?;

    let old_reference = extract_bug_id(&previous.from);
    let new_reference = extract_bug_id(&payload.pull_request.title);
    if old_reference == new_reference {
        return None;
    }

    Some(Event::from_pull_request(payload).with_reference(new_reference))
}

/// Normalizes a pull request delivery.
///
/// # Arguments
///
/// * `payload` - The `pull_request` webhook payload
/// * `validate_by_default` - Whether a newly opened pull request without a bug
///   reference is reported as missing one
///
/// # Returns
///
/// `None` when the delivery is not relevant.
pub fn digest_pull_request(
    payload: &PullRequestEventPayload,
    validate_by_default: bool,
) -> Option<Event> {
    let pr = &payload.pull_request;
    match payload.action.as_str() {
        "opened" => {
            let body = pr.body.as_deref().unwrap_or_default();
            if let Some(cherry_pick) = detect_cherry_pick(body, &pr.base.ref_field) {
                debug!(
                    pull_request = pr.number,
                    source = cherry_pick.source_pr,
                    "Detected automated cherry-pick"
                );
                let mut event = Event::from_pull_request(payload);
                event.cherry_pick = Some(cherry_pick);
                return Some(event);
            }

            if let Some(changes) = payload.changes.as_ref() {
                return digest_title_change(payload, changes);
            }

            match extract_bug_id(&pr.title) {
                Some(id) => Some(Event::from_pull_request(payload).with_reference(Some(id))),
                None if validate_by_default => {
                    Some(Event::from_pull_request(payload).with_reference(None))
                }
                None => None,
            }
        }
        "edited" => {
            let changes = payload.changes.as_ref()?;
            digest_title_change(payload, changes)
        }
        "closed" if pr.merged => {
            let mut event =
                Event::from_pull_request(payload).with_reference(extract_bug_id(&pr.title));
            event.merged = true;
            Some(event)
        }
        _ => None,
    }
}

/// Returns `true` when the comment body contains a bug warden command.
pub fn is_command(body: &str) -> bool {
    REFRESH_COMMAND_REGEX.is_match(body)
        || QA_ASSIGN_COMMAND_REGEX.is_match(body)
        || QA_CC_COMMAND_REGEX.is_match(body)
}

/// Normalizes a comment delivery.
///
/// Commands on plain issues are answered immediately and produce no event. For
/// commands on pull requests the pull request is fetched to find the bug it
/// references.
///
/// # Arguments
///
/// * `provider` - The code host, used to reply and to fetch the pull request
/// * `payload` - The `issue_comment` webhook payload
/// * `footer` - The footer appended to replies
#[instrument(skip(provider, payload, footer), fields(repository_owner = %payload.repository.owner.login, repository = %payload.repository.name, number = payload.issue.number))]
pub async fn digest_comment<P: PullRequestProvider>(
    provider: &P,
    payload: &IssueCommentPayload,
    footer: &str,
) -> Result<Option<Event>, BugWardenError> {
    if payload.action != "created" || !is_command(&payload.comment.body) {
        return Ok(None);
    }

    let org = &payload.repository.owner.login;
    let repo = &payload.repository.name;
    let number = payload.issue.number;
    let comment = &payload.comment;

    if payload.issue.pull_request.is_none() {
        let response = format_response(
            &comment.user.login,
            ISSUES_NOT_SUPPORTED_MESSAGE,
            &comment.html_url,
            &comment.body,
            footer,
        );
        provider
            .add_comment(org, repo, number, &response)
            .await
            .map_err(|e| BugWardenError::FailedToUpdatePullRequest(e.to_string()))?;
        return Ok(None);
    }

    let pr = provider
        .get_pull_request(org, repo, number)
        .await
        .map_err(|e| BugWardenError::GitProviderError(e.to_string()))?;

    let event = Event {
        org: org.clone(),
        repo: repo.clone(),
        base_ref: pr.base_ref.clone(),
        number,
        state: pr.state.clone(),
        body: comment.body.clone(),
        html_url: comment.html_url.clone(),
        login: comment.user.login.clone(),
        merged: pr.merged,
        assign_qa: QA_ASSIGN_COMMAND_REGEX.is_match(&comment.body),
        cc_qa: QA_CC_COMMAND_REGEX.is_match(&comment.body),
        ..Default::default()
    }
    .with_reference(extract_bug_id(&pr.title));

    Ok(Some(event))
}
