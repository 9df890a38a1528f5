use async_trait::async_trait;

pub mod bugzilla;

pub mod errors;

pub mod github;

pub mod models;
use errors::Error;
use models::{Bug, BugComment, BugCreate, BugUpdate, ExternalLink, Label, PullRequest};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Trait for interacting with developer platforms that provide pull requests (e.g., GitHub).
///
/// Implementations of this trait provide the functionality needed to read pull
/// requests, post comments and manage labels.
///
/// # Example Implementation
///
/// ```rust,no_run
/// use bug_warden_developer_platforms::{PullRequestProvider, errors::Error, models::{Label, PullRequest}};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct GitHubProvider {
///     token: String,
/// }
///
/// #[async_trait]
/// impl PullRequestProvider for GitHubProvider {
///     async fn get_pull_request(
///         &self,
///         repo_owner: &str,
///         repo_name: &str,
///         pr_number: u64,
///     ) -> Result<PullRequest, Error> {
///         // Implementation to fetch PR from GitHub API
///         // ...
///         # unimplemented!()
///     }
///
///     // Implement other required methods...
///     # async fn add_comment(&self, _: &str, _: &str, _: u64, _: &str) -> Result<(), Error> { unimplemented!() }
///     # async fn add_labels(&self, _: &str, _: &str, _: u64, _: &[String]) -> Result<(), Error> { unimplemented!() }
///     # async fn remove_label(&self, _: &str, _: &str, _: u64, _: &str) -> Result<(), Error> { unimplemented!() }
///     # async fn list_labels(&self, _: &str, _: &str, _: u64) -> Result<Vec<Label>, Error> { unimplemented!() }
///     # async fn find_logins_by_email(&self, _: &str) -> Result<Vec<String>, Error> { unimplemented!() }
/// }
/// ```
#[async_trait]
pub trait PullRequestProvider: Send + Sync {
    /// Retrieves a pull request from the Git provider.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `pr_number` - The pull request number
    ///
    /// # Returns
    ///
    /// A `Result` containing the pull request information. A pull request that
    /// does not exist is reported as [`Error::PullRequestNotFound`].
    async fn get_pull_request(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<PullRequest, Error>;

    /// Adds a comment to a pull request or an issue.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `pr_number` - The pull request or issue number
    /// * `comment` - The text content of the comment
    async fn add_comment(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
        comment: &str,
    ) -> Result<(), Error>;

    /// Adds labels to a pull request.
    async fn add_labels(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
        labels: &[String],
    ) -> Result<(), Error>;

    /// Removes a label from a pull request.
    async fn remove_label(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
        label: &str,
    ) -> Result<(), Error>;

    /// Lists all labels applied to a pull request.
    async fn list_labels(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<Vec<Label>, Error>;

    /// Finds the logins of all users whose public e-mail address matches `email`.
    async fn find_logins_by_email(&self, email: &str) -> Result<Vec<String>, Error>;
}

/// Trait for interacting with a bug tracker (e.g., Bugzilla).
///
/// Every call reads or writes the remote tracker directly. Implementations hold
/// no cached state so that each invocation sees the current state of a bug.
#[async_trait]
pub trait BugTracker: Send + Sync {
    /// The base URL of the tracker, used to build links to bugs.
    fn endpoint(&self) -> &str;

    /// Retrieves a bug. A bug that does not exist is reported as [`Error::BugNotFound`].
    async fn get_bug(&self, id: u64) -> Result<Bug, Error>;

    /// Updates the status and/or resolution of a bug.
    async fn update_bug(&self, id: u64, update: &BugUpdate) -> Result<(), Error>;

    /// Creates a new bug and returns its ID.
    async fn create_bug(&self, bug: &BugCreate) -> Result<u64, Error>;

    /// Retrieves the comments on a bug, oldest first.
    async fn get_comments(&self, id: u64) -> Result<Vec<BugComment>, Error>;

    /// Retrieves the sub-components of a bug, keyed by component.
    async fn get_sub_components(
        &self,
        id: u64,
    ) -> Result<std::collections::BTreeMap<String, Vec<String>>, Error>;

    /// Lists the pull requests linked to a bug through its external tracker list.
    async fn list_external_links(&self, id: u64) -> Result<Vec<ExternalLink>, Error>;

    /// Links a pull request to a bug. Returns `true` if a new link was created and
    /// `false` if the link already existed.
    async fn add_external_link(
        &self,
        id: u64,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<bool, Error>;
}
