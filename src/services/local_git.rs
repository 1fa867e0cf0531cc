//! Local git operations against a working directory.
//!
//! Every operation shells out to `git` with an argument array, never a
//! shell-interpolated string, via `tokio::process`, so long transfers are
//! cancellable (`kill_on_drop`) and no input can smuggle extra arguments.
//! No retries happen at this layer; the coordinator owns retry policy
//! because it knows which operations are idempotent.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::OpsError;
use crate::validate::{validate_branch_name, validate_clone_url, validate_repo_path};

/// Executes git subprocesses scoped to a workspace root.
///
/// Callers must serialize operations per working directory; this type
/// imposes no cross-repository lock.
#[derive(Debug, Clone)]
pub struct LocalGit {
    workspace_root: PathBuf,
}

impl LocalGit {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
        }
    }

    #[must_use]
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Clone `url` into `local_path`, returning the HEAD SHA.
    ///
    /// An existing non-empty target is removed first with the filesystem
    /// API. If the process cwd is inside the target it is moved to the
    /// workspace root before deletion. A failed or cancelled clone cleans
    /// up the partial directory rather than leaving a corrupt checkout.
    pub async fn clone_repo(
        &self,
        url: &str,
        local_path: &Path,
        shallow: bool,
    ) -> Result<String, OpsError> {
        let url = validate_clone_url(url)?;
        let target = validate_repo_path(&self.workspace_root, local_path)?;

        if target.exists() && dir_is_non_empty(&target).await? {
            self.step_out_of(&target)?;
            info!(path = %target.display(), "removing existing working directory before clone");
            tokio::fs::remove_dir_all(&target).await?;
        }

        let mut args: Vec<String> = vec!["clone".into()];
        if shallow {
            args.push("--depth".into());
            args.push("1".into());
        }
        args.push(url.clone());
        args.push(target.to_string_lossy().into_owned());

        let result = run_git(None, &args, "clone").await;
        if result.is_err() {
            // Don't leave a partial transfer behind.
            let _ = tokio::fs::remove_dir_all(&target).await;
        }
        result?;

        let sha = self.head_sha(&target).await?;
        info!(path = %target.display(), head = %sha, "cloned repository");
        Ok(sha)
    }

    /// Fetch and merge the remote state of the current branch.
    ///
    /// A missing working directory is a warning, not an error: the caller is
    /// expected to clone first, and degrading gracefully here lets retried
    /// workflows converge instead of failing on ordering.
    pub async fn pull(&self, local_path: &Path) -> Result<(), OpsError> {
        let target = validate_repo_path(&self.workspace_root, local_path)?;
        if !target.exists() {
            warn!(path = %target.display(), "pull requested but working directory does not exist; clone first");
            return Ok(());
        }
        run_git(Some(&target), &["pull".into(), "--ff-only".into()], "pull").await?;
        debug!(path = %target.display(), "pulled");
        Ok(())
    }

    /// Fetch from origin, optionally pruning deleted remote branches.
    pub async fn fetch(&self, local_path: &Path, prune: bool) -> Result<(), OpsError> {
        let target = validate_repo_path(&self.workspace_root, local_path)?;
        let mut args: Vec<String> = vec!["fetch".into(), "origin".into()];
        if prune {
            args.push("--prune".into());
        }
        run_git(Some(&target), &args, "fetch").await?;
        Ok(())
    }

    /// Create and check out `name` from `base`. Idempotent: an existing
    /// branch is checked out as-is instead of recreated.
    pub async fn create_branch(
        &self,
        local_path: &Path,
        name: &str,
        base: &str,
    ) -> Result<(), OpsError> {
        validate_branch_name(name)?;
        validate_branch_name(base)?;
        let target = validate_repo_path(&self.workspace_root, local_path)?;

        if self.branch_exists(&target, name).await? {
            debug!(branch = name, "branch already exists, checking out");
            run_git(
                Some(&target),
                &["checkout".into(), name.to_string()],
                "checkout",
            )
            .await?;
        } else {
            run_git(
                Some(&target),
                &[
                    "checkout".into(),
                    "-b".into(),
                    name.to_string(),
                    base.to_string(),
                ],
                "checkout -b",
            )
            .await?;
            info!(branch = name, base = base, "created branch");
        }
        Ok(())
    }

    /// Check out an existing branch, including remote-tracking branches
    /// after a fetch.
    pub async fn checkout(&self, local_path: &Path, name: &str) -> Result<(), OpsError> {
        validate_branch_name(name)?;
        let target = validate_repo_path(&self.workspace_root, local_path)?;
        run_git(
            Some(&target),
            &["checkout".into(), name.to_string()],
            "checkout",
        )
        .await?;
        Ok(())
    }

    /// Stage `paths` (everything when empty) and commit, returning the new
    /// SHA. An empty diff is surfaced as a `GitOperation` error with a
    /// `nothing to commit` detail; commits are the one non-idempotent step
    /// and callers must see when no new SHA was produced.
    pub async fn commit(
        &self,
        local_path: &Path,
        message: &str,
        paths: &[String],
    ) -> Result<String, OpsError> {
        if message.is_empty() {
            return Err(OpsError::Validation("commit message is empty".into()));
        }
        let target = validate_repo_path(&self.workspace_root, local_path)?;

        let mut add_args: Vec<String> = vec!["add".into()];
        if paths.is_empty() {
            add_args.push("--all".into());
        } else {
            // `--` terminates option parsing so a path can never be taken
            // as a flag.
            add_args.push("--".into());
            add_args.extend(paths.iter().cloned());
        }
        run_git(Some(&target), &add_args, "add").await?;

        // `diff --cached --quiet` exits non-zero exactly when something is
        // staged.
        let has_staged = run_git_status(
            Some(&target),
            &["diff".into(), "--cached".into(), "--quiet".into()],
        )
        .await?;
        if !has_staged {
            return Err(OpsError::GitOperation {
                operation: "commit".into(),
                detail: "nothing to commit (working tree clean)".into(),
            });
        }

        run_git(
            Some(&target),
            &["commit".into(), "-m".into(), message.to_string()],
            "commit",
        )
        .await?;

        self.head_sha(&target).await
    }

    /// Push `branch` to origin.
    pub async fn push(
        &self,
        local_path: &Path,
        branch: &str,
        force: bool,
    ) -> Result<(), OpsError> {
        validate_branch_name(branch)?;
        let target = validate_repo_path(&self.workspace_root, local_path)?;

        let mut args: Vec<String> = vec!["push".into()];
        if force {
            args.push("--force".into());
        }
        args.push("--set-upstream".into());
        args.push("origin".into());
        args.push(branch.to_string());

        run_git(Some(&target), &args, "push").await?;
        info!(branch = branch, force = force, "pushed branch");
        Ok(())
    }

    /// Current HEAD SHA of the working directory.
    pub async fn head_sha(&self, local_path: &Path) -> Result<String, OpsError> {
        let out = run_git(
            Some(local_path),
            &["rev-parse".into(), "HEAD".into()],
            "rev-parse",
        )
        .await?;
        Ok(out.trim().to_string())
    }

    /// Whether a local branch with this name exists.
    pub async fn branch_exists(&self, local_path: &Path, name: &str) -> Result<bool, OpsError> {
        run_git_status(
            Some(local_path),
            &[
                "rev-parse".into(),
                "--verify".into(),
                "--quiet".into(),
                format!("refs/heads/{name}"),
            ],
        )
        .await
        .map(|failed| !failed)
    }

    /// Move the process cwd out of `target` if it is currently inside it,
    /// so deleting the directory cannot remove our own cwd.
    fn step_out_of(&self, target: &Path) -> Result<(), OpsError> {
        if let Ok(cwd) = std::env::current_dir() {
            if cwd.starts_with(target) {
                warn!(cwd = %cwd.display(), "process cwd is inside clone target, moving to workspace root");
                std::env::set_current_dir(&self.workspace_root)?;
            }
        }
        Ok(())
    }
}

async fn dir_is_non_empty(path: &Path) -> Result<bool, OpsError> {
    let mut entries = tokio::fs::read_dir(path).await?;
    Ok(entries.next_entry().await?.is_some())
}

/// Run git with `args`, capturing stdout. Non-zero exit maps to
/// `GitOperation` with the operation name and trimmed stderr.
async fn run_git(cwd: Option<&Path>, args: &[String], operation: &str) -> Result<String, OpsError> {
    let mut cmd = Command::new("git");
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    debug!(operation, args = ?args, "running git");
    let output = cmd.output().await?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(OpsError::GitOperation {
            operation: operation.to_string(),
            detail: stderr.trim().to_string(),
        })
    }
}

/// Run git where a non-zero exit is an expected outcome, not an error.
/// Returns `true` when the command exited non-zero.
async fn run_git_status(cwd: Option<&Path>, args: &[String]) -> Result<bool, OpsError> {
    let mut cmd = Command::new("git");
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let status = cmd.status().await?;
    Ok(!status.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clone_rejects_bad_url_before_io() {
        let git = LocalGit::new("/srv/workspace");
        let err = git
            .clone_repo("ftp://host/repo.git", Path::new("repo"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, OpsError::Validation(_)));
    }

    #[tokio::test]
    async fn test_clone_rejects_escaping_path() {
        let git = LocalGit::new("/srv/workspace");
        let err = git
            .clone_repo(
                "https://github.com/octocat/hello-world.git",
                Path::new("../outside"),
                false,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OpsError::Validation(_)));
    }

    #[tokio::test]
    async fn test_pull_missing_directory_is_noop() {
        let root = tempfile::tempdir().unwrap();
        let git = LocalGit::new(root.path());
        git.pull(Path::new("does-not-exist")).await.unwrap();
    }

    #[tokio::test]
    async fn test_commit_rejects_empty_message() {
        let root = tempfile::tempdir().unwrap();
        let git = LocalGit::new(root.path());
        let err = git
            .commit(Path::new("repo"), "", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, OpsError::Validation(_)));
    }

    #[tokio::test]
    async fn test_push_rejects_bad_branch_name() {
        let root = tempfile::tempdir().unwrap();
        let git = LocalGit::new(root.path());
        let err = git
            .push(Path::new("repo"), "-force-me", false)
            .await
            .unwrap_err();
        assert!(matches!(err, OpsError::Validation(_)));
    }
}
