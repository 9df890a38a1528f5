use axum::{extract::State, routing::get, routing::post, Router};
use bug_warden_core::{
    config::{load_bug_warden_config, BugWardenConfig},
    errors::BugWardenError,
    events::{parse_payload, IssueCommentPayload, PullRequestEventPayload},
    BugWarden, HandleResult,
};
use bug_warden_developer_platforms::{
    bugzilla::BugzillaClient,
    github::{authenticate_with_access_token, create_app_client, GitHubProvider},
    models::User,
};
use hmac::{Hmac, Mac};
use octocrab::Octocrab;
use reqwest::{header::HeaderMap, StatusCode};
use sha2::Sha256;
use std::{env, fs, sync::Arc};
use tracing::{debug, error, info, instrument, warn};

mod errors;
use errors::ServerError;

mod telemetry;

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CONFIG_PATH: &str = "bug-warden.toml";

struct AppConfig {
    app_id: u64,
    app_private_key: String,
    webhook_secret: String,
    bugzilla_api_key: String,
    config_path: String,
    port_number: u16,
}

pub struct AppState {
    pub octocrab: Octocrab,
    pub config: BugWardenConfig,
    pub tracker: BugzillaClient,
    pub webhook_secret: String,
}

/// Creates a GitHub application client.
///
/// # Errors
///
/// Returns `ServerError::AuthError` if the private key cannot be parsed or the
/// app information cannot be retrieved.
async fn create_github_app(config: &AppConfig) -> Result<(Octocrab, User), ServerError> {
    info!(app_id = config.app_id, "Creating GitHub app client");

    let provider = create_app_client(config.app_id, &config.app_private_key)
        .await
        .map_err(|e| {
            ServerError::AuthError(format!(
                "Failed to load the GitHub provider. Error was: {}",
                e
            ))
        })?;
    debug!("GitHub App client created successfully");

    Ok(provider)
}

fn required_var(key: &str) -> Result<String, ServerError> {
    env::var(key).map_err(|e| {
        error!(
            error = e.to_string(),
            key, "Failed to get a required environment variable"
        );
        ServerError::ConfigError(format!("{} is not set", key))
    })
}

fn get_app_config() -> Result<AppConfig, ServerError> {
    let app_id = required_var("GITHUB_APP_ID")?;
    let app_id_to_number = app_id.parse::<u64>().map_err(|e| {
        error!(
            error = e.to_string(),
            app_id = %app_id,
            "Failed to parse the app ID",
        );
        ServerError::ConfigError("The app ID was not a number".to_string())
    })?;

    let key_path = required_var("GITHUB_APP_PRIVATE_KEY_PATH")?;
    let app_private_key = fs::read_to_string(&key_path).map_err(|e| {
        ServerError::ConfigError(format!(
            "Failed to read the GitHub App private key from {}: {}",
            key_path, e
        ))
    })?;

    let webhook_secret = required_var("GITHUB_WEBHOOK_SECRET")?;
    let bugzilla_api_key = required_var("BUGZILLA_API_KEY")?;

    let config_path =
        env::var("BUG_WARDEN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let port_number = match env::var("BUG_WARDEN_PORT") {
        Ok(val) => val.parse().map_err(|_| {
            ServerError::ConfigError(format!("BUG_WARDEN_PORT is not a number: {}", val))
        })?,
        Err(_) => DEFAULT_PORT,
    };
    debug!(port = port_number, "Got the port from the environment variables");

    Ok(AppConfig {
        app_id: app_id_to_number,
        app_private_key,
        webhook_secret,
        bugzilla_api_key,
        config_path,
        port_number,
    })
}

#[instrument(skip(_state))]
async fn handle_get_request(State(_state): State<Arc<AppState>>) -> StatusCode {
    info!("Received get request ...");
    StatusCode::OK
}

fn log_outcome(result: Result<Option<HandleResult>, BugWardenError>, repository: &str, number: u64) {
    match result {
        Ok(Some(outcome)) => info!(
            repository,
            pull_request = number,
            state = ?outcome.state,
            "Processed event"
        ),
        Ok(None) => debug!(repository, pull_request = number, "Event required no action"),
        Err(e) => error!(
            repository,
            pull_request = number,
            error = e.to_string(),
            "Failed to process event"
        ),
    }
}

async fn authenticate(
    state: &AppState,
    installation_id: Option<u64>,
    repo_owner: &str,
    repo_name: &str,
) -> Result<GitHubProvider, StatusCode> {
    let Some(installation_id) = installation_id else {
        warn!("Web hook payload did not include installation information. Cannot process changes.");
        return Err(StatusCode::BAD_REQUEST);
    };

    match authenticate_with_access_token(&state.octocrab, installation_id, repo_owner, repo_name)
        .await
    {
        Ok(api) => Ok(GitHubProvider::new(api)),
        Err(e) => {
            error!(
                repository_owner = repo_owner,
                repository = repo_name,
                error = e.to_string(),
                "Failed to authenticate with GitHub"
            );
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

async fn handle_pull_request_event(state: &AppState, body: &str) -> Result<StatusCode, StatusCode> {
    let payload: PullRequestEventPayload = parse_payload(body).map_err(|e| {
        error!(error = e.to_string(), "Could not extract pull request payload");
        StatusCode::BAD_REQUEST
    })?;

    let repo_owner = payload.repository.owner.login.as_str();
    let repo_name = payload.repository.name.as_str();
    let number = payload.pull_request.number;
    info!(
        repository_owner = repo_owner,
        repository = repo_name,
        pull_request = number,
        action = payload.action.as_str(),
        "Processing pull request event"
    );

    let installation_id = payload.installation.as_ref().map(|i| i.id);
    let provider = authenticate(state, installation_id, repo_owner, repo_name).await?;
    let warden = BugWarden::with_config(provider, state.tracker.clone(), &state.config);

    let result = warden
        .process_pull_request_event(&payload, &state.config)
        .await;
    log_outcome(result, repo_name, number);

    Ok(StatusCode::OK)
}

async fn handle_issue_comment_event(
    state: &AppState,
    body: &str,
) -> Result<StatusCode, StatusCode> {
    let payload: IssueCommentPayload = parse_payload(body).map_err(|e| {
        error!(error = e.to_string(), "Could not extract issue comment payload");
        StatusCode::BAD_REQUEST
    })?;

    let repo_owner = payload.repository.owner.login.as_str();
    let repo_name = payload.repository.name.as_str();
    let number = payload.issue.number;
    info!(
        repository_owner = repo_owner,
        repository = repo_name,
        pull_request = number,
        action = payload.action.as_str(),
        "Processing issue comment event"
    );

    let installation_id = payload.installation.as_ref().map(|i| i.id);
    let provider = authenticate(state, installation_id, repo_owner, repo_name).await?;
    let warden = BugWarden::with_config(provider, state.tracker.clone(), &state.config);

    let result = warden.process_comment_event(&payload, &state.config).await;
    log_outcome(result, repo_name, number);

    Ok(StatusCode::OK)
}

#[instrument(skip(state, headers, body))]
async fn handle_post_request(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, StatusCode> {
    info!("Received post request ...");

    if !verify_github_signature(&state.webhook_secret, &headers, &body) {
        warn!("Webhook did not have valid signature");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let event = headers
        .get("X-GitHub-Event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    debug!(event, "Webhook has valid signature. Processing information ...");

    match event {
        "pull_request" => handle_pull_request_event(&state, &body).await,
        "issue_comment" => handle_issue_comment_event(&state, &body).await,
        _ => {
            info!(event, "Event type requires no processing");
            Ok(StatusCode::OK)
        }
    }
}

#[instrument(skip(secret, body))]
fn verify_github_signature(secret: &str, headers: &HeaderMap, body: &str) -> bool {
    let signature = match headers.get("X-Hub-Signature-256") {
        Some(value) => value.to_str().unwrap_or(""),
        None => return false,
    };

    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body.as_bytes());
    let computed_signature = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));
    debug!(
        github_signature = signature,
        computed_signature, "Comparing the GitHub signature with the computed signature"
    );

    signature == computed_signature
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/bug_warden", get(handle_get_request))
        .route("/api/bug_warden", post(handle_post_request))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let otlp_endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();
    let tracer_provider = telemetry::init_telemetry(otlp_endpoint.as_deref())?;

    info!("Starting application");

    let app_config = get_app_config()?;
    let config = load_bug_warden_config(&app_config.config_path)
        .map_err(|e| ServerError::ConfigError(e.to_string()))?;
    info!(
        config = %app_config.config_path,
        bugzilla = %config.bugzilla.endpoint,
        "Loaded bug warden configuration"
    );

    let tracker = BugzillaClient::new(&config.bugzilla.endpoint, &app_config.bugzilla_api_key)
        .map_err(|e| ServerError::ConfigError(e.to_string()))?;

    let (octocrab, user) = create_github_app(&app_config).await?;
    info!(app = %user.login, "Authenticated as GitHub App");

    let state = Arc::new(AppState {
        octocrab,
        config,
        tracker,
        webhook_secret: app_config.webhook_secret,
    });

    let addr = format!("0.0.0.0:{}", app_config.port_number);
    let listener = tokio::net::TcpListener::bind(addr.clone())
        .await
        .map_err(|e| ServerError::NetworkError(format!("Failed to bind {}: {}", addr, e)))?;

    info!("Listening on {}", addr);
    axum::serve(listener, router(state))
        .await
        .map_err(|e| ServerError::NetworkError(e.to_string()))?;

    if let Some(provider) = tracer_provider {
        if let Err(e) = provider.shutdown() {
            warn!(error = e.to_string(), "Failed to flush telemetry");
        }
    }

    Ok(())
}
