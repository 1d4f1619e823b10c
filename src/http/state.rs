use crate::webhook::Webhook;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Shared state for the webhook receiver handlers
#[derive(Clone)]
pub struct AppState {
    /// API key the notifications are signed with
    pub api_key: Arc<String>,

    /// Verified notifications are forwarded here
    pub webhooks: mpsc::Sender<Webhook>,
}

impl AppState {
    pub fn new(api_key: impl Into<String>, webhooks: mpsc::Sender<Webhook>) -> Self {
        Self {
            api_key: Arc::new(api_key.into()),
            webhooks,
        }
    }
}
