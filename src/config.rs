//! Configuration for the webhook server binary.
//!
//! Only this module reads the environment. Library components receive
//! explicit values so tests never depend on ambient process state.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::services::rate_limiter::RateLimitConfig;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Shared secret for webhook signature verification.
    pub webhook_secret: String,
    /// GitHub access token.
    pub github_token: String,
    /// Root under which all working directories must live.
    pub workspace_root: PathBuf,
    /// GitHub API base URL (override for GitHub Enterprise).
    pub api_base_url: Option<String>,
    /// Outbound API rate budget.
    pub rate_limit: RateLimitConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let webhook_secret =
            env::var("WEBHOOK_SECRET").map_err(|_| ConfigError::MissingEnvVar("WEBHOOK_SECRET"))?;

        let github_token =
            env::var("GITHUB_TOKEN").map_err(|_| ConfigError::MissingEnvVar("GITHUB_TOKEN"))?;

        let workspace_root = env::var("WORKSPACE_ROOT")
            .map_err(|_| ConfigError::MissingEnvVar("WORKSPACE_ROOT"))?
            .into();

        let api_base_url = env::var("GITHUB_API_URL").ok();

        let max_calls = env::var("RATE_LIMIT_MAX_CALLS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("RATE_LIMIT_MAX_CALLS"))?;
        let window_secs: u64 = env::var("RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("RATE_LIMIT_WINDOW_SECS"))?;

        Ok(Self {
            host,
            port,
            webhook_secret,
            github_token,
            workspace_root,
            api_base_url,
            rate_limit: RateLimitConfig {
                max_calls,
                period: Duration::from_secs(window_secs),
            },
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
