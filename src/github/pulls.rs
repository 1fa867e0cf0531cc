//! Pull requests resource client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use crate::error::OpsError;
use crate::github::transport::ApiTransport;
use crate::github::types::PullRequest;
use crate::models::PrOptions;

/// The seam the PR manager depends on. Production code uses [`PullsClient`];
/// tests substitute a fake that records call counts.
#[async_trait]
pub trait PullRequestApi: Send + Sync {
    /// Find the open PR whose head is `head`, if any.
    async fn find_open_by_head(
        &self,
        owner: &str,
        repo: &str,
        head: &str,
    ) -> Result<Option<PullRequest>, OpsError>;

    async fn create(
        &self,
        owner: &str,
        repo: &str,
        opts: &PrOptions,
    ) -> Result<PullRequest, OpsError>;

    async fn update(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        title: &str,
        body: &str,
    ) -> Result<PullRequest, OpsError>;
}

/// Client for pull request operations.
pub struct PullsClient {
    transport: Arc<ApiTransport>,
}

impl PullsClient {
    pub fn new(transport: Arc<ApiTransport>) -> Self {
        Self { transport }
    }

    /// `GET /repos/{owner}/{repo}/pulls/{number}`
    pub async fn get(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, OpsError> {
        self.transport
            .request(
                Method::GET,
                &format!("/repos/{owner}/{repo}/pulls/{number}"),
                None,
                None,
            )
            .await
    }

    /// `GET /repos/{owner}/{repo}/pulls` with optional state / head filters.
    /// `head` must be the bare branch name; the `owner:branch` qualifier is
    /// added here.
    pub async fn list(
        &self,
        owner: &str,
        repo: &str,
        state: Option<&str>,
        head: Option<&str>,
    ) -> Result<Vec<PullRequest>, OpsError> {
        let qualified_head = head.map(|h| format!("{owner}:{h}"));
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(s) = state {
            query.push(("state", s));
        }
        if let Some(h) = qualified_head.as_deref() {
            query.push(("head", h));
        }

        self.transport
            .request(
                Method::GET,
                &format!("/repos/{owner}/{repo}/pulls"),
                Some(&query),
                None,
            )
            .await
    }
}

#[async_trait]
impl PullRequestApi for PullsClient {
    async fn find_open_by_head(
        &self,
        owner: &str,
        repo: &str,
        head: &str,
    ) -> Result<Option<PullRequest>, OpsError> {
        let mut open = self.list(owner, repo, Some("open"), Some(head)).await?;
        Ok(if open.is_empty() {
            None
        } else {
            Some(open.remove(0))
        })
    }

    async fn create(
        &self,
        owner: &str,
        repo: &str,
        opts: &PrOptions,
    ) -> Result<PullRequest, OpsError> {
        let body = json!({
            "title": opts.title,
            "body": opts.body,
            "base": opts.base,
            "head": opts.head,
            "draft": opts.draft,
        });
        self.transport
            .request(
                Method::POST,
                &format!("/repos/{owner}/{repo}/pulls"),
                None,
                Some(&body),
            )
            .await
    }

    async fn update(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        title: &str,
        body: &str,
    ) -> Result<PullRequest, OpsError> {
        let patch = json!({
            "title": title,
            "body": body,
        });
        self.transport
            .request(
                Method::PATCH,
                &format!("/repos/{owner}/{repo}/pulls/{number}"),
                None,
                Some(&patch),
            )
            .await
    }
}
