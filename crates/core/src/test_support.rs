//! In-memory collaborators shared by the unit tests of this crate.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use bug_warden_developer_platforms::errors::Error;
use bug_warden_developer_platforms::models::{
    Bug, BugComment, BugCreate, BugUpdate, ExternalLink, Label, PullRequest,
};
use bug_warden_developer_platforms::{BugTracker, PullRequestProvider};

pub const ENDPOINT: &str = "www.bugzilla";
pub const FOOTER: &str = "footer";

/// A comment posted through [`MockProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedComment {
    pub org: String,
    pub repo: String,
    pub number: u64,
    pub body: String,
}

#[derive(Debug, Default, Clone)]
pub struct MockProvider {
    pub pull_requests: Arc<Mutex<HashMap<(String, String, u64), PullRequest>>>,
    pub labels: Arc<Mutex<HashMap<u64, Vec<String>>>>,
    pub comments: Arc<Mutex<Vec<PostedComment>>>,
    pub logins_by_email: Arc<Mutex<HashMap<String, Vec<String>>>>,
    pub label_changes: Arc<Mutex<usize>>,
    pub fail_comments: bool,
    pub fail_labels: bool,
    pub fail_login_search: bool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pull_request(self, org: &str, repo: &str, pr: PullRequest) -> Self {
        self.pull_requests
            .lock()
            .unwrap()
            .insert((org.to_string(), repo.to_string(), pr.number), pr);
        self
    }

    pub fn with_labels(self, number: u64, labels: &[&str]) -> Self {
        self.labels
            .lock()
            .unwrap()
            .insert(number, labels.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn with_logins(self, email: &str, logins: &[&str]) -> Self {
        self.logins_by_email.lock().unwrap().insert(
            email.to_string(),
            logins.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    pub fn labels_of(&self, number: u64) -> Vec<String> {
        let mut labels = self
            .labels
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .unwrap_or_default();
        labels.sort();
        labels
    }

    /// Number of `add_labels` and `remove_label` calls that reached the provider.
    pub fn label_change_count(&self) -> usize {
        *self.label_changes.lock().unwrap()
    }

    pub fn posted_comments(&self) -> Vec<PostedComment> {
        self.comments.lock().unwrap().clone()
    }
}

#[async_trait]
impl PullRequestProvider for MockProvider {
    async fn get_pull_request(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<PullRequest, Error> {
        self.pull_requests
            .lock()
            .unwrap()
            .get(&(repo_owner.to_string(), repo_name.to_string(), pr_number))
            .cloned()
            .ok_or(Error::PullRequestNotFound(pr_number))
    }

    async fn add_comment(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
        comment: &str,
    ) -> Result<(), Error> {
        if self.fail_comments {
            return Err(Error::FailedToUpdatePullRequest(
                "Failed to add comment".to_string(),
            ));
        }

        self.comments.lock().unwrap().push(PostedComment {
            org: repo_owner.to_string(),
            repo: repo_name.to_string(),
            number: pr_number,
            body: comment.to_string(),
        });
        Ok(())
    }

    async fn add_labels(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        pr_number: u64,
        labels: &[String],
    ) -> Result<(), Error> {
        if self.fail_labels {
            return Err(Error::FailedToUpdatePullRequest(
                "Failed to add labels".to_string(),
            ));
        }

        *self.label_changes.lock().unwrap() += 1;
        let mut all = self.labels.lock().unwrap();
        let current = all.entry(pr_number).or_default();
        for label in labels {
            if !current.contains(label) {
                current.push(label.clone());
            }
        }
        Ok(())
    }

    async fn remove_label(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        pr_number: u64,
        label: &str,
    ) -> Result<(), Error> {
        if self.fail_labels {
            return Err(Error::FailedToUpdatePullRequest(
                "Failed to remove label".to_string(),
            ));
        }

        *self.label_changes.lock().unwrap() += 1;
        if let Some(current) = self.labels.lock().unwrap().get_mut(&pr_number) {
            current.retain(|l| l != label);
        }
        Ok(())
    }

    async fn list_labels(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        pr_number: u64,
    ) -> Result<Vec<Label>, Error> {
        Ok(self
            .labels
            .lock()
            .unwrap()
            .get(&pr_number)
            .map(|labels| {
                labels
                    .iter()
                    .map(|name| Label { name: name.clone() })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_logins_by_email(&self, email: &str) -> Result<Vec<String>, Error> {
        if self.fail_login_search {
            return Err(Error::ApiError("injected search error".to_string()));
        }

        Ok(self
            .logins_by_email
            .lock()
            .unwrap()
            .get(email)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MockTracker {
    pub bugs: Arc<Mutex<BTreeMap<u64, Bug>>>,
    pub bug_errors: HashSet<u64>,
    pub comments: BTreeMap<u64, Vec<BugComment>>,
    pub sub_components: BTreeMap<u64, BTreeMap<String, Vec<String>>>,
    pub links: Arc<Mutex<Vec<ExternalLink>>>,
    pub updates: Arc<Mutex<Vec<(u64, BugUpdate)>>>,
    pub created: Arc<Mutex<Vec<BugCreate>>>,
    pub create_error: Option<String>,
    pub fail_list_links: bool,
    pub fail_add_link: bool,
    pub fail_update: bool,
}

impl MockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bug(self, bug: Bug) -> Self {
        self.bugs.lock().unwrap().insert(bug.id, bug);
        self
    }

    pub fn with_link(self, bug_id: u64, org: &str, repo: &str, number: u64) -> Self {
        self.links.lock().unwrap().push(ExternalLink {
            bug_id,
            org: org.to_string(),
            repo: repo.to_string(),
            number,
        });
        self
    }

    pub fn bug(&self, id: u64) -> Option<Bug> {
        self.bugs.lock().unwrap().get(&id).cloned()
    }

    pub fn links_of(&self, bug_id: u64) -> Vec<ExternalLink> {
        self.links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.bug_id == bug_id)
            .cloned()
            .collect()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn created_bugs(&self) -> Vec<BugCreate> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl BugTracker for MockTracker {
    fn endpoint(&self) -> &str {
        ENDPOINT
    }

    async fn get_bug(&self, id: u64) -> Result<Bug, Error> {
        if self.bug_errors.contains(&id) {
            return Err(Error::TrackerError("injected error getting bug".to_string()));
        }

        self.bugs
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(Error::BugNotFound(id))
    }

    async fn update_bug(&self, id: u64, update: &BugUpdate) -> Result<(), Error> {
        if self.fail_update {
            return Err(Error::TrackerError("injected error updating bug".to_string()));
        }

        let mut bugs = self.bugs.lock().unwrap();
        let bug = bugs.get_mut(&id).ok_or(Error::BugNotFound(id))?;
        if let Some(status) = &update.status {
            bug.status = status.clone();
        }
        if let Some(resolution) = &update.resolution {
            bug.resolution = resolution.clone();
        }
        self.updates.lock().unwrap().push((id, update.clone()));
        Ok(())
    }

    async fn create_bug(&self, bug: &BugCreate) -> Result<u64, Error> {
        if let Some(message) = &self.create_error {
            return Err(Error::TrackerError(message.clone()));
        }

        let mut bugs = self.bugs.lock().unwrap();
        let id = bugs.keys().max().copied().unwrap_or_default() + 1;
        bugs.insert(
            id,
            Bug {
                id,
                product: bug.product.clone(),
                component: bug.component.clone(),
                version: bug.version.clone(),
                target_release: bug.target_release.clone(),
                severity: bug.severity.clone(),
                summary: bug.summary.clone(),
                depends_on: bug.depends_on.clone(),
                ..Default::default()
            },
        );
        self.created.lock().unwrap().push(bug.clone());
        Ok(id)
    }

    async fn get_comments(&self, id: u64) -> Result<Vec<BugComment>, Error> {
        Ok(self.comments.get(&id).cloned().unwrap_or_default())
    }

    async fn get_sub_components(&self, id: u64) -> Result<BTreeMap<String, Vec<String>>, Error> {
        Ok(self.sub_components.get(&id).cloned().unwrap_or_default())
    }

    async fn list_external_links(&self, id: u64) -> Result<Vec<ExternalLink>, Error> {
        if self.fail_list_links {
            return Err(Error::TrackerError(
                "injected error listing external bugs".to_string(),
            ));
        }

        Ok(self.links_of(id))
    }

    async fn add_external_link(
        &self,
        id: u64,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<bool, Error> {
        if self.fail_add_link {
            return Err(Error::TrackerError(
                "injected error adding external bug".to_string(),
            ));
        }

        let mut links = self.links.lock().unwrap();
        if links
            .iter()
            .any(|l| l.bug_id == id && l.is_for(org, repo, number))
        {
            return Ok(false);
        }

        links.push(ExternalLink {
            bug_id: id,
            org: org.to_string(),
            repo: repo.to_string(),
            number,
        });
        Ok(true)
    }
}

/// A pull request in `org/repo` with the given title.
pub fn pull_request(number: u64, title: &str) -> PullRequest {
    PullRequest {
        number,
        title: title.to_string(),
        state: "open".to_string(),
        base_ref: "branch".to_string(),
        html_url: format!("https://github.com/org/repo/pull/{}", number),
        ..Default::default()
    }
}
