//! Workflow state machine and operation outcomes.

use std::fmt;
use std::time::Duration;

use super::pull_request::PullRequestContext;
use super::repo::BranchRef;

/// Progress of one "ship a change" workflow.
///
/// `Uninitialized → Cloned → BranchCreated → Committed → Pushed →
/// PrCreated | PrUpdated`. Every transition is idempotent except
/// `Committed`, which always produces a new SHA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkflowState {
    Uninitialized,
    Cloned,
    BranchCreated,
    Committed,
    Pushed,
    PrCreated,
    PrUpdated,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Cloned => "cloned",
            Self::BranchCreated => "branch_created",
            Self::Committed => "committed",
            Self::Pushed => "pushed",
            Self::PrCreated => "pr_created",
            Self::PrUpdated => "pr_updated",
        };
        f.write_str(name)
    }
}

/// How `setup` brought the working directory up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupAction {
    Cloned,
    Pulled,
}

/// Result of `RepoCoordinator::setup`.
#[derive(Debug, Clone)]
pub struct SetupOutcome {
    pub action: SetupAction,
    pub head_sha: Option<String>,
    pub duration: Duration,
}

/// Result of the full create-pull-request workflow.
#[derive(Debug, Clone)]
pub struct ShipOutcome {
    pub branch: BranchRef,
    pub commit_sha: String,
    pub pr: PullRequestContext,
    /// `PrCreated` or `PrUpdated`, depending on whether an open PR for the
    /// head branch already existed.
    pub state: WorkflowState,
    pub duration: Duration,
}

/// Generic outcome wrapper for single-step command-surface operations.
#[derive(Debug, Clone)]
pub struct OperationOutcome<T> {
    pub payload: T,
    pub duration: Duration,
}
