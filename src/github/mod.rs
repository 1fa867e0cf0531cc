//! Typed GitHub REST client: transport, resource clients, response models.

pub mod client;
pub mod issues;
pub mod pulls;
pub mod repos;
pub mod transport;
pub mod types;

pub use client::GitHubOperations;
pub use issues::IssuesClient;
pub use pulls::{PullRequestApi, PullsClient};
pub use repos::{BranchApi, ReposClient};
pub use transport::{ApiTransport, RetryConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
