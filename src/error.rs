//! Error taxonomy for repository operations.
//!
//! Every public operation returns either a populated result or one of these
//! errors, never both. Retry policy is derived from the variant, not from
//! string matching: validation and signature failures are never retried,
//! rate-limit and server-side failures are retried within the bounds
//! documented on the transport.

use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Operation-level error for the orchestrator.
#[derive(Debug, Error)]
pub enum OpsError {
    /// Bad path, URL, or branch name. The offending operation was never
    /// attempted.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A local git invocation failed. The operation name is preserved so
    /// callers can tell which step of a workflow broke.
    #[error("Git {operation} failed: {detail}")]
    GitOperation { operation: String, detail: String },

    /// The bounded retry against the remote API was exhausted.
    #[error("API rate limit exceeded (retry after {retry_after_secs}s)")]
    RateLimitExceeded { retry_after_secs: u64 },

    /// Non-2xx GitHub response that is not a rate limit.
    #[error("API error {status}: [{code}] {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// Webhook signature did not verify.
    #[error("Webhook signature invalid")]
    SignatureInvalid,

    /// Webhook body was not a well-formed event payload.
    #[error("Webhook payload invalid: {0}")]
    PayloadInvalid(String),

    /// Transport-level HTTP failure (connection refused, timeout, bad body).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Local I/O failure outside of a git invocation.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OpsError {
    /// Stable error code for logs and HTTP envelopes.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::GitOperation { .. } => "GIT_OPERATION_ERROR",
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::Api { .. } => "API_ERROR",
            Self::SignatureInvalid => "SIGNATURE_INVALID",
            Self::PayloadInvalid(_) => "PAYLOAD_INVALID",
            Self::Http(_) => "HTTP_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Whether a caller may safely retry the failed operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::SignatureInvalid | Self::PayloadInvalid(_) => false,
            Self::RateLimitExceeded { .. } | Self::GitOperation { .. } | Self::Http(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            Self::Io(_) => false,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
    meta: ErrorMeta,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Serialize)]
struct ErrorMeta {
    request_id: String,
}

impl ResponseError for OpsError {
    fn error_response(&self) -> HttpResponse {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.kind().to_string(),
                message: self.to_string(),
            },
            meta: ErrorMeta {
                request_id: uuid::Uuid::new_v4().to_string(),
            },
        };

        match self {
            Self::Validation(_) | Self::PayloadInvalid(_) => {
                HttpResponse::BadRequest().json(body)
            }
            Self::SignatureInvalid => HttpResponse::Unauthorized().json(body),
            Self::RateLimitExceeded { retry_after_secs } => HttpResponse::TooManyRequests()
                .insert_header(("Retry-After", retry_after_secs.to_string()))
                .json(body),
            _ => HttpResponse::InternalServerError().json(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            OpsError::Validation("bad".into()).kind(),
            "VALIDATION_ERROR"
        );
        assert_eq!(OpsError::SignatureInvalid.kind(), "SIGNATURE_INVALID");
        assert_eq!(
            OpsError::GitOperation {
                operation: "clone".into(),
                detail: "exit 128".into()
            }
            .kind(),
            "GIT_OPERATION_ERROR"
        );
    }

    #[test]
    fn test_validation_not_retryable() {
        assert!(!OpsError::Validation("bad".into()).is_retryable());
        assert!(!OpsError::SignatureInvalid.is_retryable());
        assert!(!OpsError::PayloadInvalid("missing action".into()).is_retryable());
    }

    #[test]
    fn test_server_and_rate_limit_retryable() {
        assert!(OpsError::RateLimitExceeded { retry_after_secs: 30 }.is_retryable());
        let server = OpsError::Api {
            status: 502,
            code: "BAD_GATEWAY".into(),
            message: "upstream".into(),
            request_id: None,
        };
        assert!(server.is_retryable());
    }

    #[test]
    fn test_client_api_error_not_retryable() {
        let not_found = OpsError::Api {
            status: 404,
            code: "NOT_FOUND".into(),
            message: "no such repo".into(),
            request_id: None,
        };
        assert!(!not_found.is_retryable());
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            OpsError::SignatureInvalid.error_response().status().as_u16(),
            401
        );
        assert_eq!(
            OpsError::PayloadInvalid("x".into())
                .error_response()
                .status()
                .as_u16(),
            400
        );
        assert_eq!(
            OpsError::RateLimitExceeded { retry_after_secs: 5 }
                .error_response()
                .status()
                .as_u16(),
            429
        );
    }
}
