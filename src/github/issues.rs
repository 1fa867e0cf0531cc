//! Issues and issue/PR comments resource client.
//!
//! PR comments live on the issues API, so commenting on pull request N goes
//! through `/issues/N/comments`.

use std::sync::Arc;

use reqwest::Method;
use serde_json::json;

use crate::error::OpsError;
use crate::github::transport::ApiTransport;
use crate::github::types::{Issue, IssueComment};

/// Client for issue operations.
pub struct IssuesClient {
    transport: Arc<ApiTransport>,
}

impl IssuesClient {
    pub fn new(transport: Arc<ApiTransport>) -> Self {
        Self { transport }
    }

    /// `GET /repos/{owner}/{repo}/issues/{number}`
    pub async fn get(&self, owner: &str, repo: &str, number: u64) -> Result<Issue, OpsError> {
        self.transport
            .request(
                Method::GET,
                &format!("/repos/{owner}/{repo}/issues/{number}"),
                None,
                None,
            )
            .await
    }

    /// Comment on an issue or pull request.
    pub async fn create_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<IssueComment, OpsError> {
        let payload = json!({ "body": body });
        self.transport
            .request(
                Method::POST,
                &format!("/repos/{owner}/{repo}/issues/{number}/comments"),
                None,
                Some(&payload),
            )
            .await
    }

    /// `GET /repos/{owner}/{repo}/issues/{number}/comments`
    pub async fn list_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<IssueComment>, OpsError> {
        self.transport
            .request(
                Method::GET,
                &format!("/repos/{owner}/{repo}/issues/{number}/comments"),
                Some(&[("per_page", "100")]),
                None,
            )
            .await
    }
}
