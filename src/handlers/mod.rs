//! HTTP handlers for the inbound webhook endpoint.

mod webhook;

pub use webhook::{github_webhook, health_check, AppState};
