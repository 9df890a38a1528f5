//! # Merge Handling
//!
//! When a pull request that references a bug merges, the bug may move to the
//! `state_after_merge` configured for the branch. A bug can be fixed by several
//! pull requests, possibly across repositories, linked to it through the
//! external tracker list. The bug only moves once every one of them has merged.

use bug_warden_developer_platforms::models::{Bug, ExternalLink};
use bug_warden_developer_platforms::{BugTracker, PullRequestProvider};
use tracing::{debug, info, warn};

use crate::comments::{bug_link, pr_link, tracker_error_message};
use crate::config::{bug_matches_states, pretty_status, BranchPolicy, BugState};
use crate::events::Event;

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;

/// A pull request linked to a bug that has not merged.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Unmerged {
    link: String,
    state: String,
}

/// Returns `true` when a bug in this state may be moved after merge.
///
/// With neither `valid_states` nor `state_after_validation` configured any
/// state is accepted.
fn is_recognized_state(policy: &BranchPolicy, bug: &Bug) -> bool {
    let mut recognized: Vec<BugState> = policy.valid_states.clone().unwrap_or_default();
    if let Some(after) = policy.state_after_validation.as_ref() {
        recognized.push(after.clone());
    }

    recognized.is_empty() || bug_matches_states(bug, &recognized)
}

/// Processes a merged pull request.
///
/// # Arguments
///
/// * `provider` - The code host, used to check the state of the linked pull requests
/// * `tracker` - The bug tracker
/// * `event` - The merge event
/// * `policy` - The policy for the branch the pull request merged into
/// * `github_url` - Base URL used to render pull request links
///
/// # Returns
///
/// The message to post, or `None` when there is nothing to report.
pub async fn handle_merge<P: PullRequestProvider, T: BugTracker>(
    provider: &P,
    tracker: &T,
    event: &Event,
    policy: &BranchPolicy,
    github_url: &str,
) -> Option<String> {
    let bug_id = match event.bug_id {
        Some(id) if !event.missing => id,
        _ => return None,
    };
    let target = policy.state_after_merge.as_ref()?;
    let endpoint = tracker.endpoint();

    let mut links = match tracker.list_external_links(bug_id).await {
        Ok(links) => links,
        Err(e) => {
            warn!(bug = bug_id, error = %e, "Failed to list external tracker bugs");
            return Some(tracker_error_message(
                &format!("searching for external tracker bugs for bug {}", bug_id),
                endpoint,
                &e,
            ));
        }
    };

    if !links
        .iter()
        .any(|l| l.is_for(&event.org, &event.repo, event.number))
    {
        links.insert(
            0,
            ExternalLink {
                bug_id,
                org: event.org.clone(),
                repo: event.repo.clone(),
                number: event.number,
            },
        );
    }

    let mut merged = Vec::new();
    let mut unmerged = Vec::new();
    for link in &links {
        let rendered = pr_link(github_url, &link.org, &link.repo, link.number);
        if link.is_for(&event.org, &event.repo, event.number) {
            merged.push(rendered);
            continue;
        }

        match provider
            .get_pull_request(&link.org, &link.repo, link.number)
            .await
        {
            Ok(pr) if pr.merged => merged.push(rendered),
            Ok(pr) => unmerged.push(Unmerged {
                link: rendered,
                state: pr.state,
            }),
            Err(e) => {
                warn!(
                    bug = bug_id,
                    repository_owner = %link.org,
                    repository = %link.repo,
                    pull_request = link.number,
                    error = %e,
                    "Failed to check the state of a linked pull request"
                );
                return Some(format!(
                    "An error was encountered checking the state of the linked pull request {}:\n> {}\nPlease contact an administrator to resolve this issue, then request a bug refresh with <code>/bugzilla refresh</code>.",
                    rendered, e
                ));
            }
        }
    }

    let link = bug_link(bug_id, endpoint);
    if !unmerged.is_empty() {
        debug!(bug = bug_id, unmerged = unmerged.len(), "Not all linked pull requests have merged");
        let pending = unmerged
            .iter()
            .map(|u| format!(" * {} is {}", u.link, u.state))
            .collect::<Vec<_>>()
            .join("\n");
        return Some(format!(
            "Some pull requests linked via external trackers have merged: {}. The following pull requests linked via external trackers have not merged:\n{}\n{} will not be moved to the {} state until all linked pull requests have merged.",
            merged.join(", "),
            pending,
            link,
            target
        ));
    }

    let bug = match tracker.get_bug(bug_id).await {
        Ok(bug) => bug,
        Err(e) => {
            return Some(tracker_error_message(
                &format!("searching for bug {}", bug_id),
                endpoint,
                &e,
            ))
        }
    };

    let merged_prefix = format!(
        "All pull requests linked via external trackers have merged: {}.",
        merged.join(", ")
    );

    if target.matches_bug(&bug) {
        return Some(format!(
            "{} {} is already in the {} state.",
            merged_prefix, link, target
        ));
    }

    if !is_recognized_state(policy, &bug) {
        return Some(format!(
            "{} is in an unrecognized state ({}) and will not be moved to the {} state.",
            link,
            pretty_status(&bug.status, &bug.resolution),
            target
        ));
    }

    if let Err(e) = tracker.update_bug(bug_id, &target.to_update()).await {
        return Some(tracker_error_message(
            &format!("updating to the {} state for bug {}", target, bug_id),
            endpoint,
            &e,
        ));
    }

    info!(bug = bug_id, state = %target, "Moved bug after all linked pull requests merged");
    Some(format!(
        "{} {} has been moved to the {} state.",
        merged_prefix, link, target
    ))
}
