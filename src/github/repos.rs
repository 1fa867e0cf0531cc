//! Repositories, branches, commits, file contents, and organizations.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Method;
use serde_json::json;

use crate::error::OpsError;
use crate::github::transport::ApiTransport;
use crate::github::types::{Branch, Commit, FileContent, GitRef, Organization, Repository};

/// Remote branch lookups, abstracted so branch policy can be tested against
/// a fake backend.
#[async_trait]
pub trait BranchApi: Send + Sync {
    /// Fetch a branch, mapping 404 to `None`.
    async fn get_branch(
        &self,
        owner: &str,
        repo: &str,
        name: &str,
    ) -> Result<Option<Branch>, OpsError>;
}

/// Client for repository-scoped resources.
pub struct ReposClient {
    transport: Arc<ApiTransport>,
}

impl ReposClient {
    pub fn new(transport: Arc<ApiTransport>) -> Self {
        Self { transport }
    }

    /// `GET /repos/{owner}/{repo}`
    pub async fn get(&self, owner: &str, repo: &str) -> Result<Repository, OpsError> {
        self.transport
            .request(Method::GET, &format!("/repos/{owner}/{repo}"), None, None)
            .await
    }

    /// `GET /repos/{owner}/{repo}/branches`
    pub async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>, OpsError> {
        self.transport
            .request(
                Method::GET,
                &format!("/repos/{owner}/{repo}/branches"),
                Some(&[("per_page", "100")]),
                None,
            )
            .await
    }

    /// Create `refs/heads/{branch}` pointing at `sha`.
    pub async fn create_branch_ref(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> Result<GitRef, OpsError> {
        let body = json!({
            "ref": format!("refs/heads/{branch}"),
            "sha": sha,
        });
        self.transport
            .request(
                Method::POST,
                &format!("/repos/{owner}/{repo}/git/refs"),
                None,
                Some(&body),
            )
            .await
    }

    /// `GET /repos/{owner}/{repo}/commits/{sha}`
    pub async fn get_commit(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<Commit, OpsError> {
        self.transport
            .request(
                Method::GET,
                &format!("/repos/{owner}/{repo}/commits/{sha}"),
                None,
                None,
            )
            .await
    }

    /// `GET /repos/{owner}/{repo}/contents/{path}` at an optional ref.
    pub async fn get_file_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<FileContent, OpsError> {
        let query = git_ref.map(|r| [("ref", r)]);
        self.transport
            .request(
                Method::GET,
                &format!("/repos/{owner}/{repo}/contents/{path}"),
                query.as_ref().map(|q| q.as_slice()),
                None,
            )
            .await
    }

    /// Create or update a file through the contents API. `sha` is required
    /// when replacing an existing file.
    pub async fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        message: &str,
        content: &[u8],
        branch: &str,
        sha: Option<&str>,
    ) -> Result<(), OpsError> {
        let mut body = json!({
            "message": message,
            "content": STANDARD.encode(content),
            "branch": branch,
        });
        if let Some(sha) = sha {
            body["sha"] = json!(sha);
        }
        self.transport
            .request_no_content(
                Method::PUT,
                &format!("/repos/{owner}/{repo}/contents/{path}"),
                Some(&body),
            )
            .await
    }

    /// `GET /orgs/{org}`
    pub async fn get_organization(&self, org: &str) -> Result<Organization, OpsError> {
        self.transport
            .request(Method::GET, &format!("/orgs/{org}"), None, None)
            .await
    }
}

#[async_trait]
impl BranchApi for ReposClient {
    async fn get_branch(
        &self,
        owner: &str,
        repo: &str,
        name: &str,
    ) -> Result<Option<Branch>, OpsError> {
        let result: Result<Branch, OpsError> = self
            .transport
            .request(
                Method::GET,
                &format!("/repos/{owner}/{repo}/branches/{name}"),
                None,
                None,
            )
            .await;
        match result {
            Ok(branch) => Ok(Some(branch)),
            Err(OpsError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
