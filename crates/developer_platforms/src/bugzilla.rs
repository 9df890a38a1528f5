//! Bugzilla REST API client implementation
//!
//! This module provides a [`BugTracker`] implementation that talks to the
//! Bugzilla REST API (`/rest/bug`) and, for external tracker links, to the
//! JSON-RPC endpoint of the ExternalBugs extension (`/jsonrpc.cgi`).
//!
//! The client holds no state besides its connection settings. Every call reads
//! the tracker directly.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::{
    errors::Error,
    models::{Bug, BugComment, BugCreate, BugUpdate, ExternalLink},
    BugTracker,
};

#[cfg(test)]
#[path = "bugzilla_tests.rs"]
mod tests;

const API_KEY_HEADER: &str = "X-BUGZILLA-API-KEY";

/// The external tracker type URL under which pull request links are stored.
pub const DEFAULT_EXTERNAL_TRACKER_URL: &str = "https://github.com/";

#[derive(Debug, Deserialize)]
struct BugListResponse<T> {
    #[serde(default = "Vec::new")]
    bugs: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct CreatedBug {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct CommentList {
    #[serde(default)]
    comments: Vec<BugComment>,
}

#[derive(Debug, Deserialize)]
struct CommentResponse {
    #[serde(default)]
    bugs: BTreeMap<String, CommentList>,
}

#[derive(Debug, Deserialize)]
struct ExternalBugType {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct ExternalBug {
    #[serde(default)]
    ext_bz_bug_id: String,

    #[serde(rename = "type")]
    bug_type: Option<ExternalBugType>,
}

#[derive(Debug, Deserialize)]
struct ExternalBugs {
    #[serde(default)]
    external_bugs: Vec<ExternalBug>,
}

#[derive(Debug, Deserialize)]
struct SubComponents {
    #[serde(default)]
    sub_components: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,

    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    error: Option<RpcError>,
}

/// Bugzilla client authenticated with an API key.
#[derive(Debug, Clone)]
pub struct BugzillaClient {
    endpoint: String,
    api_key: String,
    external_tracker_url: String,
    http_client: Client,
}

impl BugzillaClient {
    /// Creates a new Bugzilla client.
    ///
    /// # Arguments
    /// * `endpoint` - The base URL of the Bugzilla server (e.g. "https://bugzilla.example.com")
    /// * `api_key` - The API key sent with every request
    ///
    /// # Errors
    /// Returns `Error::AuthError` if the endpoint is not an http(s) URL.
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, Error> {
        if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
            return Err(Error::AuthError(format!(
                "Expected a Bugzilla endpoint like 'https://bugzilla.example.com', got: {}",
                endpoint
            )));
        }

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            external_tracker_url: DEFAULT_EXTERNAL_TRACKER_URL.to_string(),
            http_client: Client::new(),
        })
    }

    /// Sets the external tracker type URL used when linking pull requests.
    pub fn with_external_tracker_url(mut self, url: &str) -> Self {
        let mut url = url.to_string();
        if !url.ends_with('/') {
            url.push('/');
        }

        self.external_tracker_url = url;
        self
    }

    fn bug_url(&self, id: u64) -> String {
        format!("{}/rest/bug/{}", self.endpoint, id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, self.api_key.as_str())
            .header("Accept", "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, Error> {
        self.authorized(request)
            .send()
            .await
            .map_err(|e| Error::TrackerError(e.to_string()))
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
        response
            .json::<T>()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))
    }

    async fn check_status(id: u64, response: Response) -> Result<Response, Error> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(Error::BugNotFound(id)),
            _ => Err(Self::status_error(response).await),
        }
    }

    /// Turns an unsuccessful response into a [`Error::TrackerError`] carrying the body.
    async fn status_error(response: Response) -> Error {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        Error::TrackerError(format!(
            "response code {} not {}: {}",
            status.as_u16(),
            StatusCode::OK.as_u16(),
            error_text
        ))
    }

    /// Fetches a single bug restricted to the given fields.
    async fn get_bug_fields<T: DeserializeOwned>(
        &self,
        id: u64,
        include_fields: Option<&str>,
    ) -> Result<T, Error> {
        let mut request = self.http_client.get(self.bug_url(id));
        if let Some(fields) = include_fields {
            request = request.query(&[("include_fields", fields)]);
        }

        let response = Self::check_status(id, self.send(request).await?).await?;
        let list: BugListResponse<T> = Self::read_json(response).await?;
        list.bugs.into_iter().next().ok_or(Error::BugNotFound(id))
    }
}

#[async_trait]
impl BugTracker for BugzillaClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn get_bug(&self, id: u64) -> Result<Bug, Error> {
        debug!(bug = id, "Fetching bug");
        self.get_bug_fields(id, None).await
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn update_bug(&self, id: u64, update: &BugUpdate) -> Result<(), Error> {
        let request = self.http_client.put(self.bug_url(id)).json(update);
        Self::check_status(id, self.send(request).await?).await?;

        info!(
            bug = id,
            status = update.status.as_deref().unwrap_or_default(),
            resolution = update.resolution.as_deref().unwrap_or_default(),
            "Updated bug"
        );
        Ok(())
    }

    #[instrument(skip(self, bug), fields(endpoint = %self.endpoint))]
    async fn create_bug(&self, bug: &BugCreate) -> Result<u64, Error> {
        let url = format!("{}/rest/bug", self.endpoint);
        let response = self.send(self.http_client.post(url).json(bug)).await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        let created: CreatedBug = Self::read_json(response).await?;

        info!(bug = created.id, "Created bug");
        Ok(created.id)
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn get_comments(&self, id: u64) -> Result<Vec<BugComment>, Error> {
        let url = format!("{}/comment", self.bug_url(id));
        let response = Self::check_status(id, self.send(self.http_client.get(url)).await?).await?;
        let mut comments: CommentResponse = Self::read_json(response).await?;

        Ok(comments
            .bugs
            .remove(&id.to_string())
            .map(|c| c.comments)
            .unwrap_or_default())
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn get_sub_components(&self, id: u64) -> Result<BTreeMap<String, Vec<String>>, Error> {
        let bug: SubComponents = self.get_bug_fields(id, Some("sub_components")).await?;
        Ok(bug.sub_components)
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn list_external_links(&self, id: u64) -> Result<Vec<ExternalLink>, Error> {
        let bug: ExternalBugs = self.get_bug_fields(id, Some("external_bugs")).await?;

        let links = bug
            .external_bugs
            .iter()
            .filter(|b| {
                b.bug_type
                    .as_ref()
                    .map(|t| t.url == self.external_tracker_url)
                    .unwrap_or(true)
            })
            .filter_map(|b| ExternalLink::parse(id, &b.ext_bz_bug_id))
            .collect::<Vec<_>>();

        debug!(bug = id, count = links.len(), "Listed external links");
        Ok(links)
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn add_external_link(
        &self,
        id: u64,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<bool, Error> {
        let existing = self.list_external_links(id).await?;
        if existing.iter().any(|l| l.is_for(org, repo, number)) {
            debug!(bug = id, "External link already exists");
            return Ok(false);
        }

        let link = ExternalLink {
            bug_id: id,
            org: org.to_string(),
            repo: repo.to_string(),
            number,
        };
        let body = json!({
            "jsonrpc": "1.0",
            "method": "ExternalBugs.add_external_bug",
            "id": "identifier",
            "params": [{
                "api_key": self.api_key,
                "bug_ids": [id],
                "external_bugs": [{
                    "ext_type_url": self.external_tracker_url,
                    "ext_bz_bug_id": link.external_id(),
                }],
            }],
        });

        let url = format!("{}/jsonrpc.cgi", self.endpoint);
        let response = self.send(self.http_client.post(url).json(&body)).await?;
        let response = Self::check_status(id, response).await?;
        let rpc: RpcResponse = Self::read_json(response).await?;
        if let Some(error) = rpc.error {
            warn!(bug = id, code = error.code, "Failed to add external link");
            return Err(Error::TrackerError(format!(
                "JSONRPC error {}: {}",
                error.code, error.message
            )));
        }

        info!(bug = id, link = link.external_id(), "Added external link");
        Ok(true)
    }
}
