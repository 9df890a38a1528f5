use async_trait::async_trait;
use jsonwebtoken::EncodingKey;
use octocrab::{models::IssueState, Octocrab};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    errors::Error,
    models::{Label, PullRequest, User},
    PullRequestProvider,
};

/// Authenticates with GitHub using an installation access token for a specific app installation.
///
/// This function retrieves an access token for a GitHub App installation and creates a new
/// `Octocrab` client authenticated with that token.
///
/// # Arguments
///
/// * `octocrab` - An existing `Octocrab` client instance, authenticated as the app.
/// * `installation_id` - The ID of the GitHub App installation.
/// * `repository_owner` - The owner of the repository associated with the installation.
/// * `source_repository` - The name of the repository associated with the installation.
///
/// # Errors
///
/// Returns [`Error::FailedToFindAppInstallation`] if no access token could be created
/// for the installation.
///
/// # Example
///
/// ```rust,no_run
/// use octocrab::Octocrab;
/// use bug_warden_developer_platforms::github::authenticate_with_access_token;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let octocrab = Octocrab::builder().build()?;
///     let authenticated_client = authenticate_with_access_token(
///         &octocrab,
///         12345678,
///         "example-owner",
///         "example-repo",
///     )
///     .await?;
///
///     // Use `authenticated_client` to perform API operations
///     Ok(())
/// }
/// ```
#[instrument(skip(octocrab))]
pub async fn authenticate_with_access_token(
    octocrab: &Octocrab,
    installation_id: u64,
    repository_owner: &str,
    source_repository: &str,
) -> Result<Octocrab, Error> {
    debug!(
        repository_owner = repository_owner,
        repository = source_repository,
        installation_id,
        "Finding installation"
    );

    let (api_with_token, _) = octocrab
        .installation_and_token(installation_id.into())
        .await
        .map_err(|e| {
            error!(
                repository_owner = repository_owner,
                repository = source_repository,
                installation_id,
                error = e.to_string(),
                "Failed to create a token for the installation",
            );

            Error::FailedToFindAppInstallation(
                repository_owner.to_string(),
                source_repository.to_string(),
                installation_id,
            )
        })?;

    info!(
        repository_owner = repository_owner,
        repository = source_repository,
        installation_id,
        "Created access token for installation",
    );

    Ok(api_with_token)
}

/// Creates an `Octocrab` client authenticated as a GitHub App using a JWT token.
///
/// # Arguments
///
/// * `app_id` - The ID of the GitHub App.
/// * `private_key` - The private key associated with the GitHub App, in PEM format.
///
/// # Returns
///
/// The authenticated client together with the user that represents the app.
///
/// # Errors
///
/// This function returns an `Error` in the following cases:
/// - If the private key cannot be parsed.
/// - If the `Octocrab` client cannot be built.
/// - If the app information cannot be retrieved.
#[instrument(skip(private_key))]
pub async fn create_app_client(app_id: u64, private_key: &str) -> Result<(Octocrab, User), Error> {
    let key = EncodingKey::from_rsa_pem(private_key.as_bytes()).map_err(|e| {
        Error::AuthError(format!(
            "Failed to translate the private key. Error was: {}",
            e
        ))
    })?;

    let octocrab = Octocrab::builder()
        .app(app_id.into(), key)
        .build()
        .map_err(|_| {
            Error::AuthError("Failed to get a personal token for the app install.".to_string())
        })?;

    info!("Created access token for the GitHub app");

    let app = octocrab.current().app().await.map_err(|e| {
        log_octocrab_error(
            "Failed to retrieve App information for the currently authenticated app",
            e,
        )
    })?;

    let user = User {
        id: app.id.into_inner(),
        login: app.name,
    };

    Ok((octocrab, user))
}

fn is_not_found(e: &octocrab::Error) -> bool {
    match e {
        octocrab::Error::GitHub { source, .. } => source.status_code.as_u16() == 404,
        _ => false,
    }
}

/// Logs an octocrab error and converts it into an [`Error::ApiError`] that carries
/// the text GitHub returned.
fn log_octocrab_error(message: &str, e: octocrab::Error) -> Error {
    let text = match &e {
        octocrab::Error::GitHub { source, backtrace } => {
            error!(
                error_message = source.message,
                backtrace = backtrace.to_string(),
                "{}. Received an error from GitHub",
                message
            );
            source.message.clone()
        }
        octocrab::Error::UriParse { source, backtrace } => {
            error!(
                error_message = source.to_string(),
                backtrace = backtrace.to_string(),
                "{}. Failed to parse URI.",
                message
            );
            source.to_string()
        }
        octocrab::Error::InvalidHeaderValue { source, backtrace } => {
            error!(
                error_message = source.to_string(),
                backtrace = backtrace.to_string(),
                "{}. One of the header values was invalid.",
                message
            );
            source.to_string()
        }
        _ => {
            error!(error_message = e.to_string(), message);
            e.to_string()
        }
    };

    Error::ApiError(text)
}

/// Converts the octocrab representation of a pull request into the Bug Warden model.
fn to_pull_request(pr: octocrab::models::pulls::PullRequest) -> PullRequest {
    let state = match pr.state {
        Some(IssueState::Closed) => "closed",
        _ => "open",
    };

    let author = pr
        .user
        .map(|u| User {
            id: u.id.into_inner(),
            login: u.login,
        })
        .unwrap_or_default();

    PullRequest {
        number: pr.number,
        title: pr.title.unwrap_or_default(),
        body: pr.body,
        state: state.to_string(),
        merged: pr.merged_at.is_some(),
        base_ref: pr.base.ref_field,
        html_url: pr.html_url.map(|u| u.to_string()).unwrap_or_default(),
        author,
    }
}

/// [`PullRequestProvider`] backed by the GitHub REST API.
#[derive(Debug, Default)]
pub struct GitHubProvider {
    client: Octocrab,
}

impl GitHubProvider {
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PullRequestProvider for GitHubProvider {
    #[instrument(skip(self))]
    async fn get_pull_request(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<PullRequest, Error> {
        match self
            .client
            .pulls(repo_owner, repo_name)
            .get(pr_number)
            .await
        {
            Ok(pr) => Ok(to_pull_request(pr)),
            Err(e) if is_not_found(&e) => {
                warn!(
                    repository_owner = repo_owner,
                    repository = repo_name,
                    pull_request = pr_number,
                    "Pull request does not exist"
                );
                Err(Error::PullRequestNotFound(pr_number))
            }
            Err(e) => Err(log_octocrab_error(
                "Failed to get pull request information",
                e,
            )),
        }
    }

    #[instrument(skip(self, comment))]
    async fn add_comment(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
        comment: &str,
    ) -> Result<(), Error> {
        match self
            .client
            .issues(repo_owner, repo_name)
            .create_comment(pr_number, comment)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                let err = log_octocrab_error("Failed to add pull request comment", e);
                Err(Error::FailedToUpdatePullRequest(format!(
                    "Failed to add comment: {}",
                    err
                )))
            }
        }
    }

    #[instrument(skip(self))]
    async fn add_labels(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
        labels: &[String],
    ) -> Result<(), Error> {
        match self
            .client
            .issues(repo_owner, repo_name)
            .add_labels(pr_number, labels)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                let err = log_octocrab_error("Failed to add new labels", e);
                Err(Error::FailedToUpdatePullRequest(format!(
                    "Failed to add labels: {}",
                    err
                )))
            }
        }
    }

    #[instrument(skip(self))]
    async fn remove_label(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
        label: &str,
    ) -> Result<(), Error> {
        match self
            .client
            .issues(repo_owner, repo_name)
            .remove_label(pr_number, label)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                let err = log_octocrab_error("Failed to remove label", e);
                Err(Error::FailedToUpdatePullRequest(format!(
                    "Failed to remove label: {}",
                    err
                )))
            }
        }
    }

    #[instrument(skip(self))]
    async fn list_labels(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<Vec<Label>, Error> {
        let mut current_page = self
            .client
            .issues(repo_owner, repo_name)
            .list_labels_for_issue(pr_number)
            .send()
            .await
            .map_err(|e| log_octocrab_error("Failed to list all labels for pull request", e))?;

        let mut labels = current_page.take_items();
        while let Ok(Some(mut new_page)) = self.client.get_page(&current_page.next).await {
            labels.extend(new_page.take_items());

            current_page = new_page;
        }

        let result = labels.into_iter().map(|l| Label { name: l.name }).collect();

        Ok(result)
    }

    #[instrument(skip(self))]
    async fn find_logins_by_email(&self, email: &str) -> Result<Vec<String>, Error> {
        let query = format!("{} in:email", email);
        let page = self
            .client
            .search()
            .users(&query)
            .send()
            .await
            .map_err(|e| log_octocrab_error("Failed to search for users by e-mail", e))?;

        let logins: Vec<String> = page.items.into_iter().map(|u| u.login).collect();
        debug!(count = logins.len(), "Found users with matching e-mail");

        Ok(logins)
    }
}
