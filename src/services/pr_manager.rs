//! Find-or-create pull request policy.
//!
//! The idempotency key is the head branch name: retried workflows must end
//! up with exactly one PR, updated in place, never a duplicate.

use tracing::{debug, info};

use crate::error::OpsError;
use crate::github::pulls::PullRequestApi;
use crate::models::{PrOptions, PullRequestContext, RepoConfig, WorkflowState};

#[derive(Debug, Clone, Default)]
pub struct PrManager;

impl PrManager {
    pub fn new() -> Self {
        Self
    }

    /// Create a PR for `opts.head`, or update the existing open one.
    ///
    /// Only *open* PRs match: a merged or closed PR with the same head is
    /// history, not something to resurrect, so a fresh PR is created in
    /// that case. Returns the resulting context and whether it was created
    /// or updated.
    pub async fn create_or_update(
        &self,
        api: &dyn PullRequestApi,
        config: &RepoConfig,
        opts: &PrOptions,
    ) -> Result<(PullRequestContext, WorkflowState), OpsError> {
        let existing = api
            .find_open_by_head(&config.owner, &config.name, &opts.head)
            .await?;

        match existing {
            Some(open) => {
                debug!(
                    number = open.number,
                    head = %opts.head,
                    "open PR already exists for head branch, updating"
                );
                let updated = api
                    .update(
                        &config.owner,
                        &config.name,
                        open.number,
                        &opts.title,
                        &opts.body,
                    )
                    .await?;
                Ok((updated.into_context(), WorkflowState::PrUpdated))
            }
            None => {
                let created = api.create(&config.owner, &config.name, opts).await?;
                info!(number = created.number, head = %opts.head, "created pull request");
                Ok((created.into_context(), WorkflowState::PrCreated))
            }
        }
    }
}
