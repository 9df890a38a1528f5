use super::*;
use crate::test_support::MockProvider;

const EMAIL: &str = "qa_tester@example.com";

fn bug_with_qa(qa_contact: Option<&str>) -> Bug {
    Bug {
        id: 123,
        qa_contact: qa_contact.map(|s| s.to_string()),
        ..Default::default()
    }
}

#[test]
fn test_qa_search_result() {
    assert_eq!(
        qa_search_result(EMAIL, &["ValidLogin".to_string()]),
        "Requesting review from QA contact:\n/cc @ValidLogin"
    );
    assert_eq!(
        qa_search_result(EMAIL, &[]),
        "No GitHub users were found matching the public email listed for the QA contact in Bugzilla (qa_tester@example.com), skipping review request."
    );
    assert_eq!(
        qa_search_result(EMAIL, &["Login1".to_string(), "Login2".to_string()]),
        "Multiple GitHub users were found matching the public email listed for the QA contact in Bugzilla (qa_tester@example.com), skipping review request. List of users with matching email:\n\t- Login1\n\t- Login2"
    );
}

#[tokio::test]
async fn test_review_request_for_single_match() {
    let provider = MockProvider::new().with_logins(EMAIL, &["ValidLogin"]);

    let text = qa_review_request(&provider, &bug_with_qa(Some(EMAIL)), false).await;

    assert_eq!(text, "Requesting review from QA contact:\n/cc @ValidLogin");
}

#[tokio::test]
async fn test_review_request_without_qa_contact() {
    let provider = MockProvider::new();

    for qa_contact in [None, Some("")] {
        let text = qa_review_request(&provider, &bug_with_qa(qa_contact), false).await;
        assert_eq!(
            text,
            "No QA contact is listed for this bug in Bugzilla, skipping review request."
        );
    }
}

#[tokio::test]
async fn test_assign_qa_carries_deprecation_notice() {
    let provider = MockProvider::new().with_logins(EMAIL, &["ValidLogin"]);

    let text = qa_review_request(&provider, &bug_with_qa(Some(EMAIL)), true).await;

    assert!(text.starts_with(ASSIGN_QA_DEPRECATION_NOTICE));
    assert!(text.ends_with("/cc @ValidLogin"));
}

#[tokio::test]
async fn test_search_failure_is_reported_in_text() {
    let mut provider = MockProvider::new();
    provider.fail_login_search = true;

    let text = qa_review_request(&provider, &bug_with_qa(Some(EMAIL)), false).await;

    assert!(text.contains("injected search error"));
    assert!(text.contains("skipping review request"));
}
