//! Pull request context tracked across create/update cycles.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a pull request. `Merged` and `Closed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Merged,
    Closed,
}

impl PrState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Merged | Self::Closed)
    }
}

/// Options for creating or updating a pull request.
#[derive(Debug, Clone)]
pub struct PrOptions {
    pub title: String,
    pub body: String,
    /// Branch the PR merges into.
    pub base: String,
    /// Branch carrying the changes; also the idempotency key.
    pub head: String,
    pub draft: bool,
}

/// The orchestrator's view of one pull request.
///
/// `number` is `None` until the PR has actually been created remotely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestContext {
    pub number: Option<u64>,
    pub title: String,
    pub body: String,
    pub base: String,
    pub head: String,
    pub draft: bool,
    pub state: PrState,
}

impl PullRequestContext {
    /// A context for a PR that does not exist remotely yet.
    #[must_use]
    pub fn pending(opts: &PrOptions) -> Self {
        Self {
            number: None,
            title: opts.title.clone(),
            body: opts.body.clone(),
            base: opts.base.clone(),
            head: opts.head.clone(),
            draft: opts.draft,
            state: PrState::Open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!PrState::Open.is_terminal());
        assert!(PrState::Merged.is_terminal());
        assert!(PrState::Closed.is_terminal());
    }

    #[test]
    fn test_pending_context_has_no_number() {
        let opts = PrOptions {
            title: "Add parser".into(),
            body: "Details".into(),
            base: "main".into(),
            head: "feature/parser".into(),
            draft: false,
        };
        let ctx = PullRequestContext::pending(&opts);
        assert!(ctx.number.is_none());
        assert_eq!(ctx.state, PrState::Open);
        assert_eq!(ctx.head, "feature/parser");
    }
}
