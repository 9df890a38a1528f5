//! # Cherry-pick Cloning
//!
//! A cherry-pick of a fix onto a release branch needs its own bug targeting the
//! release of that branch. When the cherry-pick robot opens a pull request, this
//! module finds the bug of the source pull request, reuses an existing clone
//! for the desired release or creates one, and asks for the cherry-pick to be
//! retitled so that it references the clone.

use std::collections::BTreeMap;
use std::fmt::Display;

use bug_warden_developer_platforms::errors::Error;
use bug_warden_developer_platforms::models::{Bug, BugCreate};
use bug_warden_developer_platforms::{BugTracker, PullRequestProvider};
use tracing::{debug, info, instrument, warn};

use crate::checks::bug_reference::{extract_bug_id, replace_bug_reference};
use crate::checks::cherry_pick::CherryPick;
use crate::comments::{bug_link, pr_link, tracker_error_message};
use crate::config::BranchPolicy;
use crate::events::Event;

#[cfg(test)]
#[path = "cloner_tests.rs"]
mod tests;

const ADMIN_FOOTER: &str = "Please contact an administrator to resolve this issue, then request a bug refresh with <code>/bugzilla refresh</code>.";

/// Builds the description of a clone from the first comment of the source bug.
pub fn clone_description(source_id: u64, source_description: &str) -> String {
    format!(
        "This is a clone of Bug #{}. This is the description of that bug:\n{}",
        source_id, source_description
    )
}

/// Builds the request that creates a clone of `source` for `release`.
pub fn clone_request(
    source: &Bug,
    release: &str,
    description: String,
    sub_components: BTreeMap<String, Vec<String>>,
) -> BugCreate {
    BugCreate {
        product: source.product.clone(),
        component: source.component.clone(),
        version: vec![release.to_string()],
        severity: source.severity.clone(),
        summary: source.summary.clone(),
        description,
        depends_on: vec![source.id],
        sub_components,
        ..Default::default()
    }
}

/// Finds an existing clone of `source` for `release` among the bugs it blocks.
async fn find_existing_clone<T: BugTracker>(
    tracker: &T,
    source: &Bug,
    release: &str,
) -> Result<Option<u64>, Error> {
    for blocked_id in &source.blocks {
        let blocked = tracker.get_bug(*blocked_id).await?;
        if blocked.depends_on.contains(&source.id) && blocked.version.iter().any(|v| v == release)
        {
            return Ok(Some(blocked.id));
        }
    }

    Ok(None)
}

/// Processes a cherry-pick event.
///
/// # Arguments
///
/// * `provider` - The code host, used to read the source pull request
/// * `tracker` - The bug tracker
/// * `event` - The cherry-pick event; `body` holds the cherry-pick title
/// * `cherry_pick` - The source pull request and destination branch
/// * `policy` - The policy for the destination branch
/// * `github_url` - Base URL used to render pull request links
///
/// # Returns
///
/// The message to post. Every outcome, including failures, is reported.
#[instrument(skip(provider, tracker, event, policy, github_url), fields(repository_owner = %event.org, repository = %event.repo, pull_request = event.number))]
pub async fn clone_for_cherry_pick<P: PullRequestProvider, T: BugTracker>(
    provider: &P,
    tracker: &T,
    event: &Event,
    cherry_pick: &CherryPick,
    policy: &BranchPolicy,
    github_url: &str,
) -> String {
    let endpoint = tracker.endpoint();

    let source_pr = match provider
        .get_pull_request(&event.org, &event.repo, cherry_pick.source_pr)
        .await
    {
        Ok(pr) => pr,
        Err(e) => {
            warn!(source = cherry_pick.source_pr, error = %e, "Failed to get the cherry-picked pull request");
            return format!(
                "Error creating a cherry-pick bug in Bugzilla: failed to check the state of cherrypicked pull request at {}/{}/{}/pull/{}: {}.\n{}",
                github_url.trim_end_matches('/'),
                event.org,
                event.repo,
                cherry_pick.source_pr,
                e,
                ADMIN_FOOTER
            );
        }
    };

    let Some(source_id) = extract_bug_id(&source_pr.title) else {
        return format!(
            "Could not make automatic cherrypick of {} for this PR as it does not reference a Bugzilla bug in its title.",
            pr_link(github_url, &event.org, &event.repo, cherry_pick.source_pr)
        );
    };
    let source_link = bug_link(source_id, endpoint);

    let Some(release) = policy.target_release.as_deref() else {
        return format!(
            "Could not make automatic cherrypick of {} for this PR as the target release is not set for this branch in the bug warden configuration. Running refresh:\n/bugzilla refresh",
            source_link
        );
    };

    let source = match tracker.get_bug(source_id).await {
        Ok(bug) => bug,
        Err(e) => {
            return format!(
                "Failed to create a cherry-pick bug in Bugzilla: {}",
                tracker_error_message(&format!("searching for bug {}", source_id), endpoint, &e)
            )
        }
    };

    match find_existing_clone(tracker, &source, release).await {
        Ok(Some(clone_id)) => {
            debug!(bug = source_id, clone = clone_id, "Found existing clone");
            return format!(
                "Not creating new clone for {} as {} has been detected as a clone for the correct target version of this cherrypick. Running refresh:\n/bugzilla refresh",
                source_link,
                bug_link(clone_id, endpoint)
            );
        }
        Ok(None) => {}
        Err(e) => {
            return format!(
                "Failed to create a cherry-pick bug in Bugzilla: {}",
                tracker_error_message(
                    &format!("searching for clones of bug {}", source_id),
                    endpoint,
                    &e
                )
            )
        }
    }

    let clone_error = |e: &dyn Display| {
        tracker_error_message(
            &format!(
                "creating a cherry-pick bug in Bugzilla: encountered error cloning {} for cherrypick for bug {}",
                source_link, source_id
            ),
            endpoint,
            e,
        )
    };

    let comments = match tracker.get_comments(source_id).await {
        Ok(comments) => comments,
        Err(e) => return clone_error(&e),
    };
    let first = comments
        .iter()
        .min_by_key(|c| c.count)
        .map(|c| c.text.as_str())
        .unwrap_or_default();

    let sub_components = match tracker.get_sub_components(source_id).await {
        Ok(sub_components) => sub_components,
        Err(e) => return clone_error(&e),
    };

    let request = clone_request(
        &source,
        release,
        clone_description(source_id, first),
        sub_components,
    );
    let clone_id = match tracker.create_bug(&request).await {
        Ok(id) => id,
        Err(e) => return clone_error(&e),
    };

    info!(bug = source_id, clone = clone_id, release, "Cloned bug for cherry-pick");
    format!(
        "{} has been cloned as {}. Retitling PR to link against new bug.\n/retitle {}",
        source_link,
        bug_link(clone_id, endpoint),
        replace_bug_reference(&event.body, clone_id)
    )
}
