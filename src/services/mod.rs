//! Orchestration services: rate limiting, webhook validation, local git,
//! branch/PR policy, and the coordinator façade.

pub mod branch_manager;
pub mod coordinator;
pub mod local_git;
pub mod pr_manager;
pub mod rate_limiter;
pub mod webhook;

pub use branch_manager::BranchManager;
pub use coordinator::{handle_webhook, CoordinatorError, RepoCoordinator, SetupMode};
pub use local_git::LocalGit;
pub use pr_manager::PrManager;
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use webhook::WebhookValidator;
