use super::*;
use crate::test_support::MockProvider;

#[test]
fn test_is_managed_label() {
    assert!(is_managed_label("bugzilla/valid-bug"));
    assert!(is_managed_label("bugzilla/invalid-bug"));
    assert!(is_managed_label("bugzilla/severity-urgent"));
    assert!(!is_managed_label("lgtm"));
    assert!(!is_managed_label("bugzilla/other"));
}

#[test]
fn test_desired_labels() {
    assert_eq!(
        desired_labels(true, "urgent"),
        vec![
            "bugzilla/valid-bug".to_string(),
            "bugzilla/severity-urgent".to_string()
        ]
    );
    assert_eq!(
        desired_labels(false, ""),
        vec!["bugzilla/invalid-bug".to_string()]
    );
}

#[tokio::test]
async fn test_sync_adds_missing_labels() {
    let provider = MockProvider::new().with_labels(1, &["lgtm"]);

    let added = sync_bug_labels(&provider, "org", "repo", 1, &desired_labels(true, "high"))
        .await
        .unwrap();

    assert_eq!(added.len(), 2);
    assert_eq!(
        provider.labels_of(1),
        vec!["bugzilla/severity-high", "bugzilla/valid-bug", "lgtm"]
    );
}

#[tokio::test]
async fn test_sync_replaces_stale_labels() {
    let provider = MockProvider::new().with_labels(
        1,
        &["bugzilla/valid-bug", "bugzilla/severity-low", "lgtm"],
    );

    sync_bug_labels(&provider, "org", "repo", 1, &desired_labels(false, "urgent"))
        .await
        .unwrap();

    assert_eq!(
        provider.labels_of(1),
        vec!["bugzilla/invalid-bug", "bugzilla/severity-urgent", "lgtm"]
    );
}

#[tokio::test]
async fn test_sync_with_nothing_desired_strips_managed_labels() {
    let provider = MockProvider::new().with_labels(
        1,
        &["bugzilla/invalid-bug", "bugzilla/severity-urgent", "lgtm"],
    );

    let added = sync_bug_labels(&provider, "org", "repo", 1, &[]).await.unwrap();

    assert!(added.is_empty());
    assert_eq!(provider.labels_of(1), vec!["lgtm"]);
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let provider = MockProvider::new();
    let desired = desired_labels(true, "medium");

    sync_bug_labels(&provider, "org", "repo", 1, &desired).await.unwrap();
    let added = sync_bug_labels(&provider, "org", "repo", 1, &desired).await.unwrap();

    assert!(added.is_empty());
    assert_eq!(
        provider.labels_of(1),
        vec!["bugzilla/severity-medium", "bugzilla/valid-bug"]
    );
}

#[tokio::test]
async fn test_sync_reports_provider_errors() {
    let mut provider = MockProvider::new();
    provider.fail_labels = true;

    let result = sync_bug_labels(&provider, "org", "repo", 1, &desired_labels(true, "")).await;

    assert!(matches!(
        result,
        Err(BugWardenError::FailedToUpdatePullRequest(_))
    ));
}
