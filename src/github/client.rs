//! Aggregate GitHub client.
//!
//! Owns the shared transport and rate limiter and exposes the resource
//! clients, mirroring how the coordinator consumes them.

use std::sync::Arc;
use std::time::Duration;

use crate::error::OpsError;
use crate::github::issues::IssuesClient;
use crate::github::pulls::PullsClient;
use crate::github::repos::ReposClient;
use crate::github::transport::{ApiTransport, RetryConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::models::Credential;
use crate::services::rate_limiter::{RateLimitConfig, RateLimiter};

/// Typed client over the GitHub REST surface. Every request goes through
/// the shared rate limiter; the budget is the only state mutated across
/// concurrent callers.
pub struct GitHubOperations {
    limiter: Arc<RateLimiter>,
    repos: ReposClient,
    pulls: PullsClient,
    issues: IssuesClient,
}

impl GitHubOperations {
    /// Create a client with explicit configuration. `base_url` defaults to
    /// the public API; tests point it at a local server.
    pub fn new(
        credential: Credential,
        base_url: Option<&str>,
        rate_limit: RateLimitConfig,
        retry: Option<RetryConfig>,
        timeout: Option<Duration>,
    ) -> Result<Self, OpsError> {
        let limiter = Arc::new(RateLimiter::new(rate_limit));
        let transport = Arc::new(ApiTransport::new(
            base_url.unwrap_or(DEFAULT_BASE_URL),
            credential,
            Arc::clone(&limiter),
            timeout.unwrap_or(DEFAULT_TIMEOUT),
            retry,
        )?);

        Ok(Self {
            limiter,
            repos: ReposClient::new(Arc::clone(&transport)),
            pulls: PullsClient::new(Arc::clone(&transport)),
            issues: IssuesClient::new(transport),
        })
    }

    #[must_use]
    pub fn repos(&self) -> &ReposClient {
        &self.repos
    }

    #[must_use]
    pub fn pulls(&self) -> &PullsClient {
        &self.pulls
    }

    #[must_use]
    pub fn issues(&self) -> &IssuesClient {
        &self.issues
    }

    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_with_defaults() {
        let client = GitHubOperations::new(
            Credential::new("ghp_test_token_0000"),
            None,
            RateLimitConfig::default(),
            None,
            None,
        )
        .unwrap();
        let _ = client.repos();
        let _ = client.pulls();
        let _ = client.issues();
    }

    #[test]
    fn test_client_with_custom_base_url() {
        let client = GitHubOperations::new(
            Credential::new("ghp_test_token_0000"),
            Some("https://ghe.example.test/api/v3/"),
            RateLimitConfig::default(),
            None,
            None,
        );
        assert!(client.is_ok());
    }
}
