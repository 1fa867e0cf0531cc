//! Inbound webhook event model.

use serde_json::Value;

/// One inbound webhook delivery, alive only for the duration of the request.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Value of the `X-GitHub-Event` header.
    pub event_type: String,
    /// Raw payload bytes as delivered (the bytes the signature covers).
    pub payload: Vec<u8>,
    /// Parsed JSON body.
    pub body: Value,
}

impl WebhookEvent {
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.body.get("action").and_then(Value::as_str)
    }

    /// `full_name` of the repository the event concerns, if present.
    #[must_use]
    pub fn repository_full_name(&self) -> Option<&str> {
        self.body
            .get("repository")
            .and_then(|r| r.get("full_name"))
            .and_then(Value::as_str)
    }

    /// Login of the account that triggered the event, if present.
    #[must_use]
    pub fn sender_login(&self) -> Option<&str> {
        self.body
            .get("sender")
            .and_then(|s| s.get("login"))
            .and_then(Value::as_str)
    }
}

/// What the coordinator decided to do with a validated webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookDisposition {
    /// A push event on the named ref.
    Push { reference: String },
    /// A pull request event with its action (`opened`, `synchronize`, ...).
    PullRequest { action: String, number: Option<u64> },
    /// A comment on an issue or pull request.
    IssueComment { action: String },
    /// GitHub's connectivity-check event.
    Ping,
    /// A valid event this orchestrator does not act on.
    Ignored { event_type: String },
}
