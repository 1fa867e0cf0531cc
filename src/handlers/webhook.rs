//! `POST /webhooks/github`: validates and dispatches GitHub deliveries.
//!
//! Responses: 200 accepted, 400 malformed payload, 401 invalid signature.

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::debug;

use crate::error::OpsError;
use crate::models::WebhookDisposition;
use crate::services::coordinator::handle_webhook;
use crate::services::webhook::WebhookValidator;

/// Shared state for the webhook server.
pub struct AppState {
    pub validator: WebhookValidator,
}

/// Liveness endpoint.
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "repoflow",
    }))
}

/// Webhook receiver. The raw body bytes are what the signature covers, so
/// the payload is taken as `web::Bytes` and parsed only after the HMAC
/// check passes.
pub async fn github_webhook(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Bytes,
) -> Result<HttpResponse, OpsError> {
    let signature = header(&req, "X-Hub-Signature-256").unwrap_or_default();
    let event_type = header(&req, "X-GitHub-Event").unwrap_or_default();

    let disposition = handle_webhook(&state.validator, &event_type, &signature, &payload)?;
    debug!(?disposition, "webhook dispatched");

    let summary = match &disposition {
        WebhookDisposition::Push { reference } => json!({"event": "push", "ref": reference}),
        WebhookDisposition::PullRequest { action, number } => {
            json!({"event": "pull_request", "action": action, "number": number})
        }
        WebhookDisposition::IssueComment { action } => {
            json!({"event": "issue_comment", "action": action})
        }
        WebhookDisposition::Ping => json!({"event": "ping"}),
        WebhookDisposition::Ignored { event_type } => {
            json!({"event": event_type, "ignored": true})
        }
    };

    Ok(HttpResponse::Ok().json(json!({ "accepted": true, "data": summary })))
}

fn header(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}
