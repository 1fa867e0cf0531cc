//! Idempotent branch policy on top of local git and the remote branch API.

use tracing::{debug, info};

use crate::error::OpsError;
use crate::github::repos::BranchApi;
use crate::models::{BranchRef, RepoConfig};
use crate::services::local_git::LocalGit;
use crate::validate::validate_branch_name;

/// Ensures branches exist exactly once, no matter how often a workflow is
/// retried. Duplicate-branch errors during retries are the failure mode
/// this type exists to prevent.
#[derive(Debug, Clone)]
pub struct BranchManager {
    local: LocalGit,
}

impl BranchManager {
    pub fn new(local: LocalGit) -> Self {
        Self { local }
    }

    /// Make `name` exist and be checked out, creating it from `base` only
    /// when it exists neither locally nor remotely.
    ///
    /// - existing local branch: checked out and reused;
    /// - existing remote branch: fetched and checked out as a tracking
    ///   branch, head SHA taken from the remote;
    /// - otherwise: created locally from `base`.
    pub async fn ensure_branch(
        &self,
        remote: &dyn BranchApi,
        config: &RepoConfig,
        name: &str,
        base: &str,
    ) -> Result<BranchRef, OpsError> {
        validate_branch_name(name)?;
        validate_branch_name(base)?;
        let path = &config.local_path;

        let mut branch = BranchRef::new(name, base)?;

        if self.local.branch_exists(path, name).await? {
            debug!(branch = name, "reusing existing local branch");
            self.local.checkout(path, name).await?;
            branch.head_sha = Some(self.local.head_sha(path).await?);
            return Ok(branch);
        }

        if let Some(remote_branch) = remote
            .get_branch(&config.owner, &config.name, name)
            .await?
        {
            info!(branch = name, "reusing existing remote branch");
            self.local.fetch(path, false).await?;
            self.local.checkout(path, name).await?;
            branch.head_sha = Some(remote_branch.commit.sha);
            return Ok(branch);
        }

        self.local.create_branch(path, name, base).await?;
        branch.head_sha = Some(self.local.head_sha(path).await?);
        Ok(branch)
    }
}

/// Fake remote used by unit tests elsewhere in the crate.
#[cfg(test)]
pub(crate) struct NoRemoteBranches;

#[cfg(test)]
#[async_trait::async_trait]
impl BranchApi for NoRemoteBranches {
    async fn get_branch(
        &self,
        _owner: &str,
        _repo: &str,
        _name: &str,
    ) -> Result<Option<crate::github::types::Branch>, OpsError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[tokio::test]
    async fn test_ensure_branch_rejects_invalid_names() {
        let root = tempfile::tempdir().unwrap();
        let manager = BranchManager::new(LocalGit::new(root.path()));
        let config = RepoConfig::new(
            root.path(),
            "octocat",
            "hello-world",
            Path::new("hello-world"),
            "main",
            "https://github.com/octocat/hello-world.git",
        )
        .unwrap();

        let err = manager
            .ensure_branch(&NoRemoteBranches, &config, "-bad", "main")
            .await
            .unwrap_err();
        assert!(matches!(err, OpsError::Validation(_)));
    }
}
