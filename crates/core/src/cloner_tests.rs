use super::*;
use crate::test_support::{pull_request, MockProvider, MockTracker};
use bug_warden_developer_platforms::models::BugComment;

const GITHUB: &str = "https://github.com";

fn cherry_pick_event() -> (Event, CherryPick) {
    let cherry_pick = CherryPick {
        source_pr: 1,
        destination_branch: "v1".to_string(),
    };
    let event = Event {
        org: "org".to_string(),
        repo: "repo".to_string(),
        base_ref: "v1".to_string(),
        number: 2,
        state: "open".to_string(),
        body: "[v1] Bug 123: fixed it!".to_string(),
        html_url: "http.com".to_string(),
        login: "user".to_string(),
        cherry_pick: Some(cherry_pick.clone()),
        ..Default::default()
    };
    (event, cherry_pick)
}

fn targeting(release: &str) -> BranchPolicy {
    BranchPolicy {
        target_release: Some(release.to_string()),
        ..Default::default()
    }
}

fn source_bug() -> Bug {
    Bug {
        id: 123,
        product: "Test".to_string(),
        component: vec!["TestComponent".to_string()],
        version: vec!["v2".to_string()],
        status: "CLOSED".to_string(),
        severity: "urgent".to_string(),
        summary: "This is a test bug".to_string(),
        ..Default::default()
    }
}

fn tracker_with_source(source: Bug) -> MockTracker {
    let mut tracker = MockTracker::new().with_bug(source);
    tracker.comments.insert(
        123,
        vec![BugComment {
            bug_id: 123,
            count: 0,
            text: "This is a bug".to_string(),
        }],
    );
    tracker
}

fn provider_with_source() -> MockProvider {
    MockProvider::new()
        .with_pull_request("org", "repo", pull_request(1, "Bug 123: fixed it!"))
}

#[test]
fn test_clone_description() {
    assert_eq!(
        clone_description(123, "This is a bug"),
        "This is a clone of Bug #123. This is the description of that bug:\nThis is a bug"
    );
}

#[tokio::test]
async fn test_cherry_pick_creates_clone() {
    let provider = provider_with_source();
    let mut tracker = tracker_with_source(source_bug());
    let mut sub_components = BTreeMap::new();
    sub_components.insert(
        "TestComponent".to_string(),
        vec!["TestSubComponent".to_string()],
    );
    tracker.sub_components.insert(123, sub_components.clone());
    let (event, cherry_pick) = cherry_pick_event();

    let message =
        clone_for_cherry_pick(&provider, &tracker, &event, &cherry_pick, &targeting("v1"), GITHUB)
            .await;

    assert_eq!(
        message,
        "[Bugzilla bug 123](www.bugzilla/show_bug.cgi?id=123) has been cloned as [Bugzilla bug 124](www.bugzilla/show_bug.cgi?id=124). Retitling PR to link against new bug.\n/retitle [v1] Bug 124: fixed it!"
    );

    let created = tracker.created_bugs();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].product, "Test");
    assert_eq!(created[0].component, vec!["TestComponent".to_string()]);
    assert_eq!(created[0].version, vec!["v1".to_string()]);
    assert_eq!(created[0].severity, "urgent");
    assert_eq!(created[0].depends_on, vec![123]);
    assert_eq!(created[0].sub_components, sub_components);
    assert_eq!(
        created[0].description,
        "This is a clone of Bug #123. This is the description of that bug:\nThis is a bug"
    );
}

#[tokio::test]
async fn test_missing_source_pull_request() {
    let provider = MockProvider::new();
    let tracker = tracker_with_source(source_bug());
    let (event, cherry_pick) = cherry_pick_event();

    let message =
        clone_for_cherry_pick(&provider, &tracker, &event, &cherry_pick, &targeting("v1"), GITHUB)
            .await;

    assert_eq!(
        message,
        "Error creating a cherry-pick bug in Bugzilla: failed to check the state of cherrypicked pull request at https://github.com/org/repo/pull/1: pull request number 1 does not exist.\nPlease contact an administrator to resolve this issue, then request a bug refresh with <code>/bugzilla refresh</code>."
    );
    assert!(tracker.created_bugs().is_empty());
}

#[tokio::test]
async fn test_source_bug_error() {
    let provider = provider_with_source();
    let mut tracker = tracker_with_source(source_bug());
    tracker.bug_errors.insert(123);
    let (event, cherry_pick) = cherry_pick_event();

    let message =
        clone_for_cherry_pick(&provider, &tracker, &event, &cherry_pick, &targeting("v1"), GITHUB)
            .await;

    assert_eq!(
        message,
        "Failed to create a cherry-pick bug in Bugzilla: An error was encountered searching for bug 123 on the Bugzilla server at www.bugzilla:\n> injected error getting bug\nPlease contact an administrator to resolve this issue, then request a bug refresh with <code>/bugzilla refresh</code>."
    );
}

#[tokio::test]
async fn test_create_error() {
    let provider = provider_with_source();
    let mut tracker = tracker_with_source(source_bug());
    tracker.create_error = Some("injected error creating new bug".to_string());
    let (event, cherry_pick) = cherry_pick_event();

    let message =
        clone_for_cherry_pick(&provider, &tracker, &event, &cherry_pick, &targeting("v1"), GITHUB)
            .await;

    assert_eq!(
        message,
        "An error was encountered creating a cherry-pick bug in Bugzilla: encountered error cloning [Bugzilla bug 123](www.bugzilla/show_bug.cgi?id=123) for cherrypick for bug 123 on the Bugzilla server at www.bugzilla:\n> injected error creating new bug\nPlease contact an administrator to resolve this issue, then request a bug refresh with <code>/bugzilla refresh</code>."
    );
}

#[tokio::test]
async fn test_existing_clone_is_reused() {
    let provider = provider_with_source();
    let source = Bug {
        blocks: vec![124],
        ..source_bug()
    };
    let clone = Bug {
        id: 124,
        version: vec!["v1".to_string()],
        depends_on: vec![123],
        status: "NEW".to_string(),
        ..source_bug()
    };
    let tracker = tracker_with_source(source).with_bug(clone);
    let (event, cherry_pick) = cherry_pick_event();

    let message =
        clone_for_cherry_pick(&provider, &tracker, &event, &cherry_pick, &targeting("v1"), GITHUB)
            .await;

    assert_eq!(
        message,
        "Not creating new clone for [Bugzilla bug 123](www.bugzilla/show_bug.cgi?id=123) as [Bugzilla bug 124](www.bugzilla/show_bug.cgi?id=124) has been detected as a clone for the correct target version of this cherrypick. Running refresh:\n/bugzilla refresh"
    );
    assert!(tracker.created_bugs().is_empty());
}

#[tokio::test]
async fn test_clone_for_other_release_does_not_block_creation() {
    let provider = provider_with_source();
    let source = Bug {
        blocks: vec![124],
        ..source_bug()
    };
    let clone = Bug {
        id: 124,
        version: vec!["v3".to_string()],
        depends_on: vec![123],
        ..source_bug()
    };
    let tracker = tracker_with_source(source).with_bug(clone);
    let (event, cherry_pick) = cherry_pick_event();

    let message =
        clone_for_cherry_pick(&provider, &tracker, &event, &cherry_pick, &targeting("v1"), GITHUB)
            .await;

    assert_eq!(
        message,
        "[Bugzilla bug 123](www.bugzilla/show_bug.cgi?id=123) has been cloned as [Bugzilla bug 125](www.bugzilla/show_bug.cgi?id=125). Retitling PR to link against new bug.\n/retitle [v1] Bug 125: fixed it!"
    );
}

#[tokio::test]
async fn test_missing_target_release() {
    let provider = provider_with_source();
    let tracker = tracker_with_source(source_bug());
    let (event, cherry_pick) = cherry_pick_event();

    let message = clone_for_cherry_pick(
        &provider,
        &tracker,
        &event,
        &cherry_pick,
        &BranchPolicy::default(),
        GITHUB,
    )
    .await;

    assert_eq!(
        message,
        "Could not make automatic cherrypick of [Bugzilla bug 123](www.bugzilla/show_bug.cgi?id=123) for this PR as the target release is not set for this branch in the bug warden configuration. Running refresh:\n/bugzilla refresh"
    );
    assert!(tracker.created_bugs().is_empty());
}

#[tokio::test]
async fn test_source_without_reference() {
    let provider = MockProvider::new().with_pull_request("org", "repo", pull_request(1, "fixed it!"));
    let tracker = tracker_with_source(source_bug());
    let (event, cherry_pick) = cherry_pick_event();

    let message =
        clone_for_cherry_pick(&provider, &tracker, &event, &cherry_pick, &targeting("v1"), GITHUB)
            .await;

    assert_eq!(
        message,
        "Could not make automatic cherrypick of [org/repo#1](https://github.com/org/repo/pull/1) for this PR as it does not reference a Bugzilla bug in its title."
    );
}
