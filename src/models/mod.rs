//! Core data models for repository operations.

mod pull_request;
mod repo;
mod webhook;
mod workflow;

pub use pull_request::{PrOptions, PrState, PullRequestContext};
pub use repo::{BranchRef, Credential, CredentialScheme, RepoConfig};
pub use webhook::{WebhookDisposition, WebhookEvent};
pub use workflow::{OperationOutcome, SetupAction, SetupOutcome, ShipOutcome, WorkflowState};
