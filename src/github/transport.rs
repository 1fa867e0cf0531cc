//! Rate-limited HTTP transport for the GitHub REST API.
//!
//! Retry policy, bounded by design:
//! - 403/429 carrying a rate-limit hint (`Retry-After` or
//!   `x-ratelimit-reset`): sleep per the hint, retry once; a second failure
//!   surfaces `RateLimitExceeded`. A 403 without a hint is a permission
//!   error and is never retried.
//! - 5xx: up to two retries with linear backoff (1s, 3s by default).
//! - other 4xx: surfaced immediately as caller errors.
//!
//! Every attempt acquires a token from the shared [`RateLimiter`] before the
//! request leaves the process.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::OpsError;
use crate::models::Credential;
use crate::services::rate_limiter::RateLimiter;

/// Default base URL for the GitHub REST API.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bounded retry configuration. Defaults follow the documented policy; the
/// counts are configuration, not call-site constants.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after a 5xx response.
    pub server_retries: u32,
    /// First 5xx backoff.
    pub backoff_start: Duration,
    /// Linear increment per further 5xx attempt (1s, 3s, 5s, ...).
    pub backoff_step: Duration,
    /// Retries after a rate-limited response with a hint.
    pub rate_limit_retries: u32,
    /// Wait used when a 429 carries no usable hint.
    pub default_retry_after: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            server_retries: 2,
            backoff_start: Duration::from_secs(1),
            backoff_step: Duration::from_secs(2),
            rate_limit_retries: 1,
            default_retry_after: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// Linear backoff for the nth (0-based) 5xx retry: start + n * step.
    #[must_use]
    pub fn server_backoff(&self, attempt: u32) -> Duration {
        self.backoff_start + self.backoff_step * attempt
    }
}

/// HTTP transport with authentication, rate limiting, and bounded retry.
pub struct ApiTransport {
    base_url: String,
    credential: Credential,
    client: Client,
    limiter: Arc<RateLimiter>,
    retry: RetryConfig,
}

impl ApiTransport {
    pub fn new(
        base_url: &str,
        credential: Credential,
        limiter: Arc<RateLimiter>,
        timeout: Duration,
        retry: Option<RetryConfig>,
    ) -> Result<Self, OpsError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("repoflow")
            .build()
            .map_err(|e| OpsError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
            client,
            limiter,
            retry: retry.unwrap_or_default(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request and deserialize the JSON response.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<&Value>,
    ) -> Result<T, OpsError> {
        let response = self.execute(method, path, query, body).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| OpsError::Http(format!("failed to parse response body: {e}")))
    }

    /// Issue a request where the response body is irrelevant (204 etc.).
    pub async fn request_no_content(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<(), OpsError> {
        self.execute(method, path, None, body).await.map(|_| ())
    }

    /// Run the request loop until success, a terminal error, or the retry
    /// budget is exhausted.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<&Value>,
    ) -> Result<Response, OpsError> {
        let url = format!("{}{}", self.base_url, path);
        let mut server_attempts: u32 = 0;
        let mut rate_limit_attempts: u32 = 0;

        loop {
            self.limiter.acquire().await;

            let mut request = self
                .client
                .request(method.clone(), &url)
                .header("Accept", "application/vnd.github+json")
                .bearer_auth(self.credential.expose());
            if let Some(q) = query {
                request = request.query(q);
            }
            if let Some(b) = body {
                request = request.json(b);
            }

            let response = request
                .send()
                .await
                .map_err(|e| OpsError::Http(e.to_string()))?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            match classify(status, response.headers()) {
                Failure::RateLimited(hint) => {
                    let wait = hint.unwrap_or(self.retry.default_retry_after);
                    if rate_limit_attempts < self.retry.rate_limit_retries {
                        rate_limit_attempts += 1;
                        warn!(
                            status = status.as_u16(),
                            wait_secs = wait.as_secs(),
                            attempt = rate_limit_attempts,
                            "rate limited, backing off for single retry"
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    return Err(OpsError::RateLimitExceeded {
                        retry_after_secs: wait.as_secs(),
                    });
                }
                Failure::Server => {
                    let error = parse_error_response(status, response).await;
                    if server_attempts < self.retry.server_retries {
                        let wait = self.retry.server_backoff(server_attempts);
                        server_attempts += 1;
                        warn!(
                            status = status.as_u16(),
                            wait_secs = wait.as_secs(),
                            attempt = server_attempts,
                            "server error, retrying with linear backoff"
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    return Err(error);
                }
                Failure::Caller => {
                    debug!(status = status.as_u16(), path, "caller error, not retrying");
                    return Err(parse_error_response(status, response).await);
                }
            }
        }
    }
}

/// How a non-2xx response participates in the retry policy.
#[derive(Debug, PartialEq, Eq)]
enum Failure {
    /// 403/429 that is actually a rate limit; carries the parsed wait hint.
    RateLimited(Option<Duration>),
    /// 5xx, transient, retried with linear backoff.
    Server,
    /// Any other 4xx: the caller got something wrong, never retried.
    Caller,
}

fn classify(status: StatusCode, headers: &HeaderMap) -> Failure {
    if status.is_server_error() {
        return Failure::Server;
    }
    match status {
        StatusCode::TOO_MANY_REQUESTS => Failure::RateLimited(rate_limit_hint(headers)),
        StatusCode::FORBIDDEN => {
            // GitHub reuses 403 for both permission denials and secondary
            // rate limits; only a hint header makes it a rate limit.
            match rate_limit_hint(headers) {
                Some(hint) => Failure::RateLimited(Some(hint)),
                None => Failure::Caller,
            }
        }
        _ => Failure::Caller,
    }
}

/// Extract the wait hinted by `Retry-After` (seconds) or
/// `x-ratelimit-reset` (epoch seconds).
fn rate_limit_hint(headers: &HeaderMap) -> Option<Duration> {
    if let Some(retry_after) = headers
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
    {
        return Some(Duration::from_secs(retry_after));
    }

    let reset = headers
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<i64>().ok())?;
    let now = Utc::now().timestamp();
    Some(Duration::from_secs(reset.saturating_sub(now).max(0) as u64))
}

/// Build an `Api` error from a failed response, preserving the status and a
/// snippet of the body.
async fn parse_error_response(status: StatusCode, response: Response) -> OpsError {
    let request_id = response
        .headers()
        .get("x-github-request-id")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| snippet(&body));

    OpsError::Api {
        status: status.as_u16(),
        code: status
            .canonical_reason()
            .unwrap_or("UNKNOWN")
            .to_uppercase()
            .replace(' ', "_"),
        message,
        request_id,
    }
}

fn snippet(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(
                reqwest::header::HeaderName::from_bytes(k.as_bytes()).unwrap(),
                HeaderValue::from_str(v).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_server_backoff_is_linear() {
        let retry = RetryConfig::default();
        assert_eq!(retry.server_backoff(0), Duration::from_secs(1));
        assert_eq!(retry.server_backoff(1), Duration::from_secs(3));
        assert_eq!(retry.server_backoff(2), Duration::from_secs(5));
    }

    #[test]
    fn test_classify_5xx_as_server() {
        assert_eq!(
            classify(StatusCode::BAD_GATEWAY, &HeaderMap::new()),
            Failure::Server
        );
        assert_eq!(
            classify(StatusCode::INTERNAL_SERVER_ERROR, &HeaderMap::new()),
            Failure::Server
        );
    }

    #[test]
    fn test_classify_429_as_rate_limited() {
        let h = headers(&[("Retry-After", "30")]);
        match classify(StatusCode::TOO_MANY_REQUESTS, &h) {
            Failure::RateLimited(Some(wait)) => assert_eq!(wait, Duration::from_secs(30)),
            other => panic!("unexpected classification {other:?}"),
        }
    }

    #[test]
    fn test_classify_403_without_hint_is_caller_error() {
        assert_eq!(
            classify(StatusCode::FORBIDDEN, &HeaderMap::new()),
            Failure::Caller
        );
    }

    #[test]
    fn test_classify_403_with_reset_is_rate_limited() {
        let reset = (Utc::now().timestamp() + 42).to_string();
        let h = headers(&[("x-ratelimit-reset", reset.as_str())]);
        match classify(StatusCode::FORBIDDEN, &h) {
            Failure::RateLimited(Some(wait)) => {
                assert!(wait <= Duration::from_secs(42));
                assert!(wait >= Duration::from_secs(40));
            }
            other => panic!("unexpected classification {other:?}"),
        }
    }

    #[test]
    fn test_classify_404_as_caller() {
        assert_eq!(
            classify(StatusCode::NOT_FOUND, &HeaderMap::new()),
            Failure::Caller
        );
    }

    #[test]
    fn test_retry_after_takes_precedence_over_reset() {
        let reset = (Utc::now().timestamp() + 500).to_string();
        let h = headers(&[("Retry-After", "10"), ("x-ratelimit-reset", reset.as_str())]);
        assert_eq!(rate_limit_hint(&h), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_stale_reset_yields_zero_wait() {
        let reset = (Utc::now().timestamp() - 100).to_string();
        let h = headers(&[("x-ratelimit-reset", reset.as_str())]);
        assert_eq!(rate_limit_hint(&h), Some(Duration::from_secs(0)));
    }

    #[test]
    fn test_snippet_truncates_long_bodies() {
        let long = "x".repeat(500);
        let s = snippet(&long);
        assert!(s.len() <= 204);
        assert!(s.ends_with("..."));
        assert_eq!(snippet("short"), "short");
    }
}
