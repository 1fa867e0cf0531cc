//! Read-only GitHub REST response models.
//!
//! These structs only derive `Deserialize`: callers receive snapshots of
//! remote state and cannot accidentally mutate what looks like cached API
//! data.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::OpsError;
use crate::models::{PrState, PullRequestContext};

/// A repository as returned by `GET /repos/{owner}/{repo}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub default_branch: String,
    #[serde(default)]
    pub private: bool,
    pub html_url: String,
    pub clone_url: Option<String>,
    pub language: Option<String>,
}

/// Short commit reference embedded in branch responses.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitRef {
    pub sha: String,
}

/// A branch as returned by `GET /repos/{owner}/{repo}/branches/{branch}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: CommitRef,
    #[serde(default)]
    pub protected: bool,
}

/// Commit metadata from `GET /repos/{owner}/{repo}/commits/{sha}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub message: String,
}

/// Account reference embedded in several responses.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub login: String,
    pub id: u64,
}

/// Head/base side of a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct PrSide {
    #[serde(rename = "ref")]
    pub branch: String,
    pub sha: Option<String>,
}

/// A pull request as returned by the pulls API.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    /// `open` or `closed`; a closed PR with `merged_at` set was merged.
    pub state: String,
    pub title: String,
    pub body: Option<String>,
    #[serde(default)]
    pub draft: bool,
    pub head: PrSide,
    pub base: PrSide,
    pub html_url: String,
    pub merged_at: Option<DateTime<Utc>>,
    pub user: Option<Account>,
}

impl PullRequest {
    /// Collapse GitHub's state + merged_at pair into the tracked state.
    #[must_use]
    pub fn pr_state(&self) -> PrState {
        if self.merged_at.is_some() {
            PrState::Merged
        } else if self.state == "open" {
            PrState::Open
        } else {
            PrState::Closed
        }
    }

    /// Convert into the orchestrator's tracked context.
    #[must_use]
    pub fn into_context(self) -> PullRequestContext {
        let state = self.pr_state();
        PullRequestContext {
            number: Some(self.number),
            title: self.title,
            body: self.body.unwrap_or_default(),
            base: self.base.branch,
            head: self.head.branch,
            draft: self.draft,
            state,
        }
    }
}

/// An issue as returned by the issues API.
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub body: Option<String>,
}

/// A comment on an issue or pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    pub body: String,
    pub user: Option<Account>,
    pub created_at: DateTime<Utc>,
}

/// File contents from `GET /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileContent {
    pub path: String,
    pub sha: String,
    pub content: Option<String>,
    pub encoding: Option<String>,
}

impl FileContent {
    /// Decode the base64 payload GitHub delivers for file blobs.
    pub fn decoded(&self) -> Result<Vec<u8>, OpsError> {
        use base64::{engine::general_purpose::STANDARD, Engine as _};

        let Some(content) = &self.content else {
            return Err(OpsError::Http("file content missing from response".into()));
        };
        if self.encoding.as_deref() != Some("base64") {
            return Err(OpsError::Http(format!(
                "unexpected content encoding {:?}",
                self.encoding
            )));
        }
        // GitHub wraps base64 at 60 columns.
        let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| OpsError::Http(format!("invalid base64 file content: {e}")))
    }
}

/// An organization from `GET /orgs/{org}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Organization {
    pub login: String,
    pub id: u64,
    pub description: Option<String>,
}

/// A git ref created via `POST /repos/{owner}/{repo}/git/refs`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub name: String,
    pub object: CommitRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_request_deserialize_and_state() {
        let json = r#"{
            "number": 42,
            "state": "open",
            "title": "Add parser",
            "body": "Adds the parser module",
            "draft": false,
            "head": {"ref": "feature/parser", "sha": "abc123"},
            "base": {"ref": "main", "sha": null},
            "html_url": "https://github.com/octocat/hello-world/pull/42",
            "merged_at": null,
            "user": {"login": "octocat", "id": 1}
        }"#;
        let pr: PullRequest = serde_json::from_str(json).unwrap();
        assert_eq!(pr.number, 42);
        assert_eq!(pr.head.branch, "feature/parser");
        assert_eq!(pr.pr_state(), PrState::Open);

        let ctx = pr.into_context();
        assert_eq!(ctx.number, Some(42));
        assert_eq!(ctx.base, "main");
    }

    #[test]
    fn test_merged_pull_request_state() {
        let json = r#"{
            "number": 7,
            "state": "closed",
            "title": "Done",
            "body": null,
            "head": {"ref": "done", "sha": "abc"},
            "base": {"ref": "main", "sha": null},
            "html_url": "https://example.test/pull/7",
            "merged_at": "2024-03-01T12:00:00Z",
            "user": null
        }"#;
        let pr: PullRequest = serde_json::from_str(json).unwrap();
        assert_eq!(pr.pr_state(), PrState::Merged);
    }

    #[test]
    fn test_file_content_decode() {
        let file = FileContent {
            path: "README.md".into(),
            sha: "abc".into(),
            content: Some("aGVsbG8g\nd29ybGQ=".into()),
            encoding: Some("base64".into()),
        };
        assert_eq!(file.decoded().unwrap(), b"hello world");
    }

    #[test]
    fn test_file_content_decode_rejects_other_encodings() {
        let file = FileContent {
            path: "README.md".into(),
            sha: "abc".into(),
            content: Some("hello".into()),
            encoding: Some("utf-8".into()),
        };
        assert!(file.decoded().is_err());
    }
}
