//! # Bug Warden Core
//!
//! Core business logic for linking pull requests to Bugzilla bugs.
//!
//! Bug Warden watches pull requests whose titles reference a bug (`Bug 1234: ...`)
//! and keeps the pull request and the bug in sync:
//! - The bug is validated against the policy of the target branch and the
//!   result is reported through labels and a comment
//! - Valid bugs can be moved to a new state and linked to the pull request
//! - Once every linked pull request has merged the bug can be moved again
//! - Automated cherry-picks get a clone of the bug for their release branch
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use bug_warden_core::{
//!     config::BugWardenConfig, errors::BugWardenError, events::PullRequestEventPayload, BugWarden,
//! };
//! use bug_warden_developer_platforms::{BugTracker, PullRequestProvider};
//!
//! async fn on_delivery<P: PullRequestProvider, T: BugTracker>(
//!     provider: P,
//!     tracker: T,
//!     config: &BugWardenConfig,
//!     payload: &PullRequestEventPayload,
//! ) -> Result<(), BugWardenError> {
//!     let warden = BugWarden::with_config(provider, tracker, config);
//!
//!     if let Some(result) = warden.process_pull_request_event(payload, config).await? {
//!         println!("Pull request is now {:?}", result.state);
//!     }
//!
//!     Ok(())
//! }
//! ```

use bug_warden_developer_platforms::models::Bug;
use bug_warden_developer_platforms::{BugTracker, PullRequestProvider};
use tracing::{debug, info, instrument, warn};

pub mod checks;
pub mod cloner;
pub mod comments;
pub mod config;
pub mod errors;
pub mod events;
pub mod help;
pub mod labels;
pub mod merge;
pub mod qa;
pub mod validation;

#[cfg(test)]
mod test_support;

use comments::{
    bug_link, bug_not_found_message, format_response, tracker_error_message,
    validations_details, MISSING_REFERENCE_MESSAGE,
};
use config::{
    BranchPolicy, BugWardenConfig, PolicySource, DEFAULT_GITHUB_URL, DEFAULT_RESPONSE_FOOTER,
};
use errors::BugWardenError;
use events::{digest_comment, digest_pull_request, Event, IssueCommentPayload, PullRequestEventPayload};
use validation::ValidationVerdict;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// The state of a pull request with respect to its bug.
///
/// The state is derived fresh from the pull request and the bug every time an
/// event is handled, nothing is stored between events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No verdict was reached: the bug could not be read, or the event was a
    /// merge or a cherry-pick
    Unresolved,

    /// The pull request does not reference a bug
    Missing,

    /// The referenced bug passed validation
    Valid,

    /// The referenced bug failed validation
    Invalid,
}

/// Result of handling an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleResult {
    pub state: LifecycleState,

    /// The comment posted on the pull request, if any
    pub comment: Option<String>,
}

impl HandleResult {
    fn new(state: LifecycleState, comment: Option<String>) -> Self {
        Self { state, comment }
    }
}

/// Main struct for linking pull requests to bugs.
///
/// `BugWarden` turns [`Event`]s into reads and writes against the code host and
/// the bug tracker. Each event is handled on its own and every handled event
/// results in at most one comment on the pull request.
#[derive(Debug)]
pub struct BugWarden<P: PullRequestProvider, T: BugTracker> {
    provider: P,
    tracker: T,
    github_url: String,
    footer: String,
}

impl<P: PullRequestProvider, T: BugTracker> BugWarden<P, T> {
    /// Creates a new `BugWarden` with the default link base URL and footer.
    pub fn new(provider: P, tracker: T) -> Self {
        Self {
            provider,
            tracker,
            github_url: DEFAULT_GITHUB_URL.to_string(),
            footer: DEFAULT_RESPONSE_FOOTER.to_string(),
        }
    }

    /// Creates a new `BugWarden` using the link base URL and footer from the configuration.
    pub fn with_config(provider: P, tracker: T, config: &BugWardenConfig) -> Self {
        Self {
            provider,
            tracker,
            github_url: config.github.html_url.clone(),
            footer: config.response.footer.clone(),
        }
    }

    /// Normalizes and handles a `pull_request` delivery.
    ///
    /// # Returns
    ///
    /// `None` when the delivery is not relevant.
    pub async fn process_pull_request_event(
        &self,
        payload: &PullRequestEventPayload,
        policies: &dyn PolicySource,
    ) -> Result<Option<HandleResult>, BugWardenError> {
        let policy = policies.policy_for(
            &payload.repository.owner.login,
            &payload.repository.name,
            &payload.pull_request.base.ref_field,
        );

        let Some(event) = digest_pull_request(payload, policy.validates_by_default()) else {
            debug!(
                repository_owner = %payload.repository.owner.login,
                repository = %payload.repository.name,
                pull_request = payload.pull_request.number,
                action = %payload.action,
                "Ignoring pull request event"
            );
            return Ok(None);
        };

        self.handle(&event, &policy).await.map(Some)
    }

    /// Normalizes and handles an `issue_comment` delivery.
    ///
    /// # Returns
    ///
    /// `None` when the comment holds no command or was posted on an issue.
    pub async fn process_comment_event(
        &self,
        payload: &IssueCommentPayload,
        policies: &dyn PolicySource,
    ) -> Result<Option<HandleResult>, BugWardenError> {
        let Some(event) = digest_comment(&self.provider, payload, &self.footer).await? else {
            return Ok(None);
        };

        let policy = policies.policy_for(&event.org, &event.repo, &event.base_ref);
        self.handle(&event, &policy).await.map(Some)
    }

    /// Handles a normalized event.
    ///
    /// Cherry-picks are handed to the cloner, merges to the merge handler, and
    /// everything else validates the referenced bug.
    ///
    /// # Arguments
    ///
    /// * `event` - The event to handle
    /// * `policy` - The policy for the branch the pull request targets
    ///
    /// # Errors
    ///
    /// Only failures to update the pull request are returned as errors. Problems
    /// with the bug or the tracker are reported in the comment.
    #[instrument(skip(self, event, policy), fields(repository_owner = %event.org, repository = %event.repo, pull_request = event.number))]
    pub async fn handle(
        &self,
        event: &Event,
        policy: &BranchPolicy,
    ) -> Result<HandleResult, BugWardenError> {
        if let Some(cherry_pick) = event.cherry_pick.as_ref() {
            info!(source = cherry_pick.source_pr, "Handling cherry-pick");
            let message = cloner::clone_for_cherry_pick(
                &self.provider,
                &self.tracker,
                event,
                cherry_pick,
                policy,
                &self.github_url,
            )
            .await;
            let comment = self.respond(event, &message).await?;
            return Ok(HandleResult::new(LifecycleState::Unresolved, Some(comment)));
        }

        if event.merged {
            info!(bug = ?event.bug_id, "Handling merged pull request");
            let comment = match merge::handle_merge(
                &self.provider,
                &self.tracker,
                event,
                policy,
                &self.github_url,
            )
            .await
            {
                Some(message) => Some(self.respond(event, &message).await?),
                None => None,
            };
            return Ok(HandleResult::new(LifecycleState::Unresolved, comment));
        }

        let bug_id = match event.bug_id {
            Some(id) if !event.missing => id,
            _ => return self.handle_missing_reference(event).await,
        };

        self.handle_reference(event, bug_id, policy).await
    }

    async fn handle_missing_reference(&self, event: &Event) -> Result<HandleResult, BugWardenError> {
        info!("Pull request does not reference a bug");
        labels::sync_bug_labels(&self.provider, &event.org, &event.repo, event.number, &[])
            .await?;

        let comment = self.respond(event, MISSING_REFERENCE_MESSAGE).await?;
        Ok(HandleResult::new(LifecycleState::Missing, Some(comment)))
    }

    async fn fetch_dependents(&self, bug: &Bug) -> Result<Vec<Bug>, String> {
        let mut dependents = Vec::with_capacity(bug.depends_on.len());
        for dependent_id in &bug.depends_on {
            match self.tracker.get_bug(*dependent_id).await {
                Ok(dependent) => dependents.push(dependent),
                Err(e) => {
                    warn!(bug = bug.id, dependent = dependent_id, error = %e, "Failed to get dependent bug");
                    return Err(tracker_error_message(
                        &format!("searching for dependent bug {} for bug {}", dependent_id, bug.id),
                        self.tracker.endpoint(),
                        &e,
                    ));
                }
            }
        }

        Ok(dependents)
    }

    async fn handle_reference(
        &self,
        event: &Event,
        bug_id: u64,
        policy: &BranchPolicy,
    ) -> Result<HandleResult, BugWardenError> {
        let endpoint = self.tracker.endpoint();

        let bug = match self.tracker.get_bug(bug_id).await {
            Ok(bug) => bug,
            Err(e) if e.is_not_found() => {
                info!(bug = bug_id, "Referenced bug does not exist");
                let comment = self
                    .respond(event, &bug_not_found_message(bug_id, endpoint))
                    .await?;
                return Ok(HandleResult::new(LifecycleState::Unresolved, Some(comment)));
            }
            Err(e) => {
                warn!(bug = bug_id, error = %e, "Failed to get bug");
                let message =
                    tracker_error_message(&format!("searching for bug {}", bug_id), endpoint, &e);
                let comment = self.respond(event, &message).await?;
                return Ok(HandleResult::new(LifecycleState::Unresolved, Some(comment)));
            }
        };

        let dependents = if policy.checks_dependents() {
            match self.fetch_dependents(&bug).await {
                Ok(dependents) => dependents,
                Err(message) => {
                    let comment = self.respond(event, &message).await?;
                    return Ok(HandleResult::new(LifecycleState::Unresolved, Some(comment)));
                }
            }
        } else {
            Vec::new()
        };

        let verdict = validation::validate_bug(&bug, &dependents, policy, endpoint);
        info!(bug = bug_id, valid = verdict.valid, "Validated bug");

        labels::sync_bug_labels(
            &self.provider,
            &event.org,
            &event.repo,
            event.number,
            &labels::desired_labels(verdict.valid, &bug.severity),
        )
        .await?;

        let mut message = if verdict.valid {
            match self.apply_valid_actions(event, &bug, policy).await {
                Ok(actions) => valid_message(&bug_link(bug_id, endpoint), &actions, &verdict),
                Err(error_message) => error_message,
            }
        } else {
            invalid_message(&bug_link(bug_id, endpoint), &verdict)
        };

        if event.assign_qa || event.cc_qa {
            let qa = qa::qa_review_request(&self.provider, &bug, event.assign_qa).await;
            message.push_str("\n\n");
            message.push_str(&qa);
        }

        let state = if verdict.valid {
            LifecycleState::Valid
        } else {
            LifecycleState::Invalid
        };
        let comment = self.respond(event, &message).await?;
        Ok(HandleResult::new(state, Some(comment)))
    }

    /// Moves a valid bug to `state_after_validation` and links the pull request.
    ///
    /// Returns the sentences describing what was done, or the message reporting
    /// the tracker failure that stopped it.
    async fn apply_valid_actions(
        &self,
        event: &Event,
        bug: &Bug,
        policy: &BranchPolicy,
    ) -> Result<Vec<String>, String> {
        let endpoint = self.tracker.endpoint();
        let mut actions = Vec::new();

        if let Some(state) = policy.state_after_validation.as_ref() {
            if !state.matches_bug(bug) {
                if let Err(e) = self.tracker.update_bug(bug.id, &state.to_update()).await {
                    warn!(bug = bug.id, error = %e, "Failed to update bug");
                    return Err(tracker_error_message(
                        &format!("updating to the {} state for bug {}", state, bug.id),
                        endpoint,
                        &e,
                    ));
                }

                info!(bug = bug.id, state = %state, "Moved bug after validation");
                actions.push(format!("The bug has been moved to the {} state.", state));
            }
        }

        if policy.adds_external_link() {
            match self
                .tracker
                .add_external_link(bug.id, &event.org, &event.repo, event.number)
                .await
            {
                Ok(true) => {
                    info!(bug = bug.id, "Linked pull request to bug");
                    actions.push(
                        "The bug has been updated to refer to the pull request using the external bug tracker."
                            .to_string(),
                    );
                }
                Ok(false) => debug!(bug = bug.id, "Pull request is already linked to bug"),
                Err(e) => {
                    warn!(bug = bug.id, error = %e, "Failed to link pull request to bug");
                    return Err(tracker_error_message(
                        &format!(
                            "adding this pull request to the external tracker bugs for bug {}",
                            bug.id
                        ),
                        endpoint,
                        &e,
                    ));
                }
            }
        }

        Ok(actions)
    }

    /// Posts a message on the pull request in the standard envelope and returns
    /// the posted text.
    async fn respond(&self, event: &Event, message: &str) -> Result<String, BugWardenError> {
        let comment = format_response(
            &event.login,
            message,
            &event.html_url,
            &event.body,
            &self.footer,
        );

        self.provider
            .add_comment(&event.org, &event.repo, event.number, &comment)
            .await
            .map_err(|e| BugWardenError::FailedToUpdatePullRequest(e.to_string()))?;

        Ok(comment)
    }
}

fn valid_message(link: &str, actions: &[String], verdict: &ValidationVerdict) -> String {
    let mut message = format!("This pull request references {}, which is valid.", link);
    for action in actions {
        message.push(' ');
        message.push_str(action);
    }

    message.push_str("\n\n");
    message.push_str(&validations_details(&verdict.validations));
    message
}

fn invalid_message(link: &str, verdict: &ValidationVerdict) -> String {
    format!(
        "This pull request references {}, which is invalid:\n - {}\n\nComment <code>/bugzilla refresh</code> to re-evaluate validity if changes to the Bugzilla bug are made, or edit the title of this pull request to link to a different bug.",
        link,
        verdict.reasons.join("\n - ")
    )
}
