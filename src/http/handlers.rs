use super::state::AppState;
use crate::error::Error;
use crate::webhook::{Webhook, SIGNATURE_HEADER};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// POST /webhook
/// Accept a notification signed with the API key
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = match headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        Some(signature) => signature,
        None => {
            warn!("Webhook without {} header", SIGNATURE_HEADER);
            return error_response(StatusCode::UNAUTHORIZED, "missing signature");
        }
    };

    let webhook = match Webhook::from_signed(&state.api_key, &body, signature) {
        Ok(webhook) => webhook,
        Err(Error::InvalidSignature) => {
            warn!("Rejected webhook with invalid signature");
            return error_response(StatusCode::UNAUTHORIZED, "webhook signature does not match");
        }
        Err(e) => {
            warn!("Failed to decode webhook: {}", e);
            return error_response(StatusCode::BAD_REQUEST, format!("invalid payload: {}", e));
        }
    };

    info!("Received webhook of type {}", webhook.kind);

    if state.webhooks.send(webhook).await.is_err() {
        error!("Webhook consumer is gone");
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "receiver closed");
    }

    StatusCode::OK.into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
