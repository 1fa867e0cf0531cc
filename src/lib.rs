//! Repoflow: repository operations orchestrator for an automated CI/CD
//! agent.
//!
//! This library clones and updates local git working directories, performs
//! remote GitHub operations (branches, commits, pull requests, issues,
//! comments, file contents) under API rate limits, and validates inbound
//! webhook events. Callers drive it through [`RepoCoordinator`].

pub mod config;
pub mod error;
pub mod github;
pub mod handlers;
pub mod models;
pub mod services;
pub mod validate;

pub use config::Config;
pub use error::OpsError;

pub use models::{
    BranchRef, Credential, CredentialScheme, OperationOutcome, PrOptions, PrState,
    PullRequestContext, RepoConfig, SetupAction, SetupOutcome, ShipOutcome, WebhookDisposition,
    WebhookEvent, WorkflowState,
};

pub use github::{GitHubOperations, RetryConfig};

pub use services::{
    handle_webhook, BranchManager, CoordinatorError, LocalGit, PrManager, RateLimitConfig,
    RateLimiter, RepoCoordinator, SetupMode, WebhookValidator,
};
