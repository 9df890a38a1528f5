use crate::AppState;

use super::{get_app_config, handle_get_request, handle_post_request, verify_github_signature};
use axum::{extract::State, http::HeaderMap};
use bug_warden_core::config::BugWardenConfig;
use bug_warden_developer_platforms::bugzilla::BugzillaClient;
use hmac::{Hmac, Mac};
use octocrab::Octocrab;
use reqwest::StatusCode;
use sha2::Sha256;
use std::sync::Arc;

const SECRET: &str = "test_secret";

fn app_state() -> Arc<AppState> {
    Arc::new(AppState {
        octocrab: Octocrab::default(),
        config: BugWardenConfig::default(),
        tracker: BugzillaClient::new("http://localhost:1", "key").unwrap(),
        webhook_secret: SECRET.to_string(),
    })
}

fn sign(body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(body.as_bytes());
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

fn signed_headers(event: &str, body: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("X-Hub-Signature-256", sign(body).parse().unwrap());
    headers.insert("X-GitHub-Event", event.parse().unwrap());
    headers
}

#[tokio::test]
async fn test_get_request_is_ok() {
    assert_eq!(handle_get_request(State(app_state())).await, StatusCode::OK);
}

#[tokio::test]
async fn test_unsigned_webhook_is_unauthorized() {
    let result = handle_post_request(State(app_state()), HeaderMap::new(), "{}".to_string()).await;

    assert_eq!(result, Err(StatusCode::UNAUTHORIZED));
}

#[tokio::test]
async fn test_malformed_pull_request_payload_is_bad_request() {
    let body = "{}".to_string();
    let headers = signed_headers("pull_request", &body);

    let result = handle_post_request(State(app_state()), headers, body).await;

    assert_eq!(result, Err(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn test_malformed_comment_payload_is_bad_request() {
    let body = "not json".to_string();
    let headers = signed_headers("issue_comment", &body);

    let result = handle_post_request(State(app_state()), headers, body).await;

    assert_eq!(result, Err(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn test_payload_without_installation_is_bad_request() {
    let body = r#"{
        "action": "opened",
        "pull_request": {
            "number": 1,
            "title": "Bug 123: fixed it!",
            "state": "open",
            "user": { "login": "user" },
            "base": { "ref": "main" }
        },
        "repository": { "name": "repo", "owner": { "login": "org" } }
    }"#
    .to_string();
    let headers = signed_headers("pull_request", &body);

    let result = handle_post_request(State(app_state()), headers, body).await;

    assert_eq!(result, Err(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn test_other_events_are_acknowledged() {
    let body = r#"{"zen": "Keep it logically awesome."}"#.to_string();
    let headers = signed_headers("ping", &body);

    let result = handle_post_request(State(app_state()), headers, body).await;

    assert_eq!(result, Ok(StatusCode::OK));
}

#[test]
fn test_verify_github_signature_valid_signature() {
    let mut headers = HeaderMap::new();
    headers.insert("X-Hub-Signature-256", sign("test_body").parse().unwrap());

    assert!(
        verify_github_signature(SECRET, &headers, "test_body"),
        "Signature verification should pass with a valid signature"
    );
}

#[test]
fn test_verify_github_signature_invalid_signature() {
    let mut headers = HeaderMap::new();
    headers.insert(
        "X-Hub-Signature-256",
        "sha256=invalid_signature".parse().unwrap(),
    );

    assert!(
        !verify_github_signature(SECRET, &headers, "test_body"),
        "Signature verification should fail with an invalid signature"
    );
}

#[test]
fn test_verify_github_signature_other_body() {
    let mut headers = HeaderMap::new();
    headers.insert("X-Hub-Signature-256", sign("test_body").parse().unwrap());

    assert!(!verify_github_signature(SECRET, &headers, "other_body"));
}

#[test]
fn test_verify_github_signature_missing_header() {
    assert!(
        !verify_github_signature(SECRET, &HeaderMap::new(), "test_body"),
        "Signature verification should fail when the header is missing"
    );
}

#[test]
fn test_get_app_config_missing_env_vars() {
    std::env::remove_var("GITHUB_APP_ID");

    let result = get_app_config();

    assert!(result.is_err());
}
