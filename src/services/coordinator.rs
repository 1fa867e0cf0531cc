//! Top-level façade sequencing local git work, remote API work, and webhook
//! dispatch into named operations.
//!
//! Every failure is wrapped with the operation name and the workflow state
//! reached, so a caller can see that (say) the push succeeded and only the
//! PR step failed, and retry just that step. Multi-step operations are
//! never partially applied silently.

use std::time::Instant;

use thiserror::Error;
use tracing::{info, instrument};

use crate::error::OpsError;
use crate::github::GitHubOperations;
use crate::models::{
    BranchRef, OperationOutcome, PrOptions, PullRequestContext, RepoConfig, SetupAction,
    SetupOutcome, ShipOutcome, WebhookDisposition, WebhookEvent, WorkflowState,
};
use crate::services::branch_manager::BranchManager;
use crate::services::local_git::LocalGit;
use crate::services::pr_manager::PrManager;
use crate::services::webhook::WebhookValidator;

/// How `setup` should bring the working directory up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupMode {
    /// Always clone, removing any existing working directory.
    Clone,
    /// Pull when the working directory exists, clone otherwise.
    PullOrClone,
}

/// A coordinator-level failure: which operation, how far it got, and why.
#[derive(Debug, Error)]
#[error("operation '{operation}' failed at state '{state}': {source}")]
pub struct CoordinatorError {
    pub operation: &'static str,
    pub state: WorkflowState,
    #[source]
    pub source: OpsError,
}

impl CoordinatorError {
    fn wrap(operation: &'static str, state: WorkflowState) -> impl Fn(OpsError) -> Self {
        move |source| Self {
            operation,
            state,
            source,
        }
    }
}

/// Sequences repository operations for one configured repository.
///
/// Holds no mutable state of its own; the rate budget inside the GitHub
/// client is the only shared mutable resource. Callers must serialize
/// operations per working directory.
pub struct RepoCoordinator {
    config: RepoConfig,
    local: LocalGit,
    github: GitHubOperations,
    branches: BranchManager,
    prs: PrManager,
}

impl RepoCoordinator {
    pub fn new(config: RepoConfig, local: LocalGit, github: GitHubOperations) -> Self {
        let branches = BranchManager::new(local.clone());
        Self {
            config,
            local,
            github,
            branches,
            prs: PrManager::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Bring the local working directory up to date.
    #[instrument(skip(self), fields(repo = %self.config.slug()))]
    pub async fn setup(
        &self,
        mode: SetupMode,
        shallow: bool,
    ) -> Result<SetupOutcome, CoordinatorError> {
        let start = Instant::now();
        let fail = CoordinatorError::wrap("setup", WorkflowState::Uninitialized);
        let path = &self.config.local_path;

        let (action, head_sha) = match mode {
            SetupMode::Clone => {
                let sha = self
                    .local
                    .clone_repo(&self.config.clone_url, path, shallow)
                    .await
                    .map_err(&fail)?;
                (SetupAction::Cloned, Some(sha))
            }
            SetupMode::PullOrClone => {
                if path.join(".git").exists() {
                    self.local.pull(path).await.map_err(&fail)?;
                    let sha = self.local.head_sha(path).await.map_err(&fail)?;
                    (SetupAction::Pulled, Some(sha))
                } else {
                    let sha = self
                        .local
                        .clone_repo(&self.config.clone_url, path, shallow)
                        .await
                        .map_err(&fail)?;
                    (SetupAction::Cloned, Some(sha))
                }
            }
        };

        info!(?action, "setup complete");
        Ok(SetupOutcome {
            action,
            head_sha,
            duration: start.elapsed(),
        })
    }

    /// Full "ship a change" workflow: ensure branch → commit → push →
    /// create-or-update PR. Short-circuits on the first failure, reporting
    /// the state already reached.
    #[instrument(skip(self, opts, message, paths), fields(repo = %self.config.slug(), branch = %opts.head))]
    pub async fn create_pull_request(
        &self,
        message: &str,
        paths: &[String],
        opts: &PrOptions,
    ) -> Result<ShipOutcome, CoordinatorError> {
        let start = Instant::now();
        const OP: &str = "create_pull_request";
        let path = &self.config.local_path;

        if !path.join(".git").exists() {
            return Err(CoordinatorError {
                operation: OP,
                state: WorkflowState::Uninitialized,
                source: OpsError::GitOperation {
                    operation: "create_pull_request".into(),
                    detail: format!(
                        "no working directory at {}; run setup first",
                        path.display()
                    ),
                },
            });
        }

        let mut branch = self
            .branches
            .ensure_branch(self.github.repos(), &self.config, &opts.head, &opts.base)
            .await
            .map_err(CoordinatorError::wrap(OP, WorkflowState::Cloned))?;

        let commit_sha = self
            .local
            .commit(path, message, paths)
            .await
            .map_err(CoordinatorError::wrap(OP, WorkflowState::BranchCreated))?;

        self.local
            .push(path, &opts.head, false)
            .await
            .map_err(CoordinatorError::wrap(OP, WorkflowState::Committed))?;
        branch.head_sha = Some(commit_sha.clone());

        let (pr, state) = self
            .prs
            .create_or_update(self.github.pulls(), &self.config, opts)
            .await
            .map_err(CoordinatorError::wrap(OP, WorkflowState::Pushed))?;

        info!(number = ?pr.number, %state, "workflow complete");
        Ok(ShipOutcome {
            branch,
            commit_sha,
            pr,
            state,
            duration: start.elapsed(),
        })
    }

    /// Command surface: create (or reuse) a branch.
    pub async fn create_branch(
        &self,
        name: &str,
        base: &str,
    ) -> Result<OperationOutcome<BranchRef>, CoordinatorError> {
        let start = Instant::now();
        let branch = self
            .branches
            .ensure_branch(self.github.repos(), &self.config, name, base)
            .await
            .map_err(CoordinatorError::wrap(
                "create_branch",
                WorkflowState::Cloned,
            ))?;
        Ok(OperationOutcome {
            payload: branch,
            duration: start.elapsed(),
        })
    }

    /// Command surface: stage and commit, returning the new SHA.
    pub async fn commit(
        &self,
        message: &str,
        paths: &[String],
    ) -> Result<OperationOutcome<String>, CoordinatorError> {
        let start = Instant::now();
        let sha = self
            .local
            .commit(&self.config.local_path, message, paths)
            .await
            .map_err(CoordinatorError::wrap("commit", WorkflowState::BranchCreated))?;
        Ok(OperationOutcome {
            payload: sha,
            duration: start.elapsed(),
        })
    }

    /// Command surface: push a branch.
    pub async fn push(
        &self,
        branch: &str,
        force: bool,
    ) -> Result<OperationOutcome<()>, CoordinatorError> {
        let start = Instant::now();
        self.local
            .push(&self.config.local_path, branch, force)
            .await
            .map_err(CoordinatorError::wrap("push", WorkflowState::Committed))?;
        Ok(OperationOutcome {
            payload: (),
            duration: start.elapsed(),
        })
    }

    /// Command surface: create or update the PR for `opts.head`.
    pub async fn create_pr(
        &self,
        opts: &PrOptions,
    ) -> Result<OperationOutcome<PullRequestContext>, CoordinatorError> {
        let start = Instant::now();
        let (pr, _) = self
            .prs
            .create_or_update(self.github.pulls(), &self.config, opts)
            .await
            .map_err(CoordinatorError::wrap("create_pr", WorkflowState::Pushed))?;
        Ok(OperationOutcome {
            payload: pr,
            duration: start.elapsed(),
        })
    }

    /// Command surface: fetch one PR by number.
    pub async fn get_pr(
        &self,
        number: u64,
    ) -> Result<OperationOutcome<PullRequestContext>, CoordinatorError> {
        let start = Instant::now();
        let pr = self
            .github
            .pulls()
            .get(&self.config.owner, &self.config.name, number)
            .await
            .map_err(CoordinatorError::wrap("get_pr", WorkflowState::Uninitialized))?;
        Ok(OperationOutcome {
            payload: pr.into_context(),
            duration: start.elapsed(),
        })
    }
}

/// Validate and dispatch one inbound webhook delivery.
///
/// Free function rather than a method: webhook handling needs no repository
/// configuration, only the shared secret held by the validator. `ping` is
/// answered right after signature verification since it does not carry the
/// event shape.
pub fn handle_webhook(
    validator: &WebhookValidator,
    event_type: &str,
    signature_header: &str,
    payload: &[u8],
) -> Result<WebhookDisposition, OpsError> {
    if !validator.verify_signature(payload, signature_header) {
        return Err(OpsError::SignatureInvalid);
    }

    let body: serde_json::Value = serde_json::from_slice(payload)
        .map_err(|e| OpsError::PayloadInvalid(format!("body is not valid JSON: {e}")))?;

    if event_type == "ping" {
        return Ok(WebhookDisposition::Ping);
    }

    if !WebhookValidator::validate_payload_shape(&body) {
        return Err(OpsError::PayloadInvalid(
            "missing one of required keys: action, repository, sender".into(),
        ));
    }

    let event = WebhookEvent {
        event_type: event_type.to_string(),
        payload: payload.to_vec(),
        body,
    };

    let disposition = match event.event_type.as_str() {
        "push" => WebhookDisposition::Push {
            reference: event
                .body
                .get("ref")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        "pull_request" => WebhookDisposition::PullRequest {
            action: event.action().unwrap_or_default().to_string(),
            number: event
                .body
                .get("pull_request")
                .and_then(|p| p.get("number"))
                .and_then(serde_json::Value::as_u64),
        },
        "issue_comment" => WebhookDisposition::IssueComment {
            action: event.action().unwrap_or_default().to_string(),
        },
        other => WebhookDisposition::Ignored {
            event_type: other.to_string(),
        },
    };

    info!(
        event = %event.event_type,
        repo = event.repository_full_name().unwrap_or("<unknown>"),
        sender = event.sender_login().unwrap_or("<unknown>"),
        "webhook accepted"
    );
    Ok(disposition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    use crate::models::Credential;
    use crate::services::rate_limiter::RateLimitConfig;

    #[test]
    fn test_coordinator_construction_shares_local_git() {
        let root = tempfile::tempdir().unwrap();
        let config = RepoConfig::new(
            root.path(),
            "octocat",
            "hello-world",
            Path::new("hello-world"),
            "main",
            "https://github.com/octocat/hello-world.git",
        )
        .unwrap();
        let github = GitHubOperations::new(
            Credential::new("ghp_test_token_0000"),
            None,
            RateLimitConfig::default(),
            None,
            None,
        )
        .unwrap();
        let local = LocalGit::new(root.path());

        // `local.clone()` must duplicate the handle for the branch manager,
        // not kick off a repository clone.
        let coordinator = RepoCoordinator::new(config, local.clone(), github);
        assert_eq!(coordinator.config().slug(), "octocat/hello-world");
        assert_eq!(local.workspace_root(), root.path());
    }

    fn validator() -> WebhookValidator {
        WebhookValidator::new(b"test-secret".to_vec())
    }

    fn signed(payload: &[u8]) -> String {
        validator().sign(payload)
    }

    #[test]
    fn test_webhook_bad_signature_rejected() {
        let payload = br#"{"action":"opened"}"#;
        let err = handle_webhook(&validator(), "pull_request", "sha256=00ff", payload)
            .unwrap_err();
        assert!(matches!(err, OpsError::SignatureInvalid));
    }

    #[test]
    fn test_webhook_tampered_body_rejected() {
        let original = br#"{"action":"opened"}"#;
        let header = signed(original);
        let err = handle_webhook(
            &validator(),
            "pull_request",
            &header,
            br#"{"action":"closed"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, OpsError::SignatureInvalid));
    }

    #[test]
    fn test_webhook_invalid_json_rejected() {
        let payload = b"not json";
        let header = signed(payload);
        let err = handle_webhook(&validator(), "push", &header, payload).unwrap_err();
        assert!(matches!(err, OpsError::PayloadInvalid(_)));
    }

    #[test]
    fn test_webhook_missing_keys_rejected() {
        let payload = serde_json::to_vec(&json!({"action": "opened"})).unwrap();
        let header = signed(&payload);
        let err = handle_webhook(&validator(), "pull_request", &header, &payload).unwrap_err();
        assert!(matches!(err, OpsError::PayloadInvalid(_)));
    }

    #[test]
    fn test_webhook_pull_request_dispatch() {
        let payload = serde_json::to_vec(&json!({
            "action": "opened",
            "repository": {"full_name": "octocat/hello-world"},
            "sender": {"login": "octocat"},
            "pull_request": {"number": 7},
        }))
        .unwrap();
        let header = signed(&payload);
        let disposition =
            handle_webhook(&validator(), "pull_request", &header, &payload).unwrap();
        assert_eq!(
            disposition,
            WebhookDisposition::PullRequest {
                action: "opened".into(),
                number: Some(7),
            }
        );
    }

    #[test]
    fn test_webhook_ping_accepted_without_shape() {
        let payload = serde_json::to_vec(&json!({"zen": "Design for failure."})).unwrap();
        let header = signed(&payload);
        let disposition = handle_webhook(&validator(), "ping", &header, &payload).unwrap();
        assert_eq!(disposition, WebhookDisposition::Ping);
    }

    #[test]
    fn test_webhook_unknown_event_ignored() {
        let payload = serde_json::to_vec(&json!({
            "action": "created",
            "repository": {"full_name": "octocat/hello-world"},
            "sender": {"login": "octocat"},
        }))
        .unwrap();
        let header = signed(&payload);
        let disposition = handle_webhook(&validator(), "star", &header, &payload).unwrap();
        assert_eq!(
            disposition,
            WebhookDisposition::Ignored {
                event_type: "star".into()
            }
        );
    }
}
