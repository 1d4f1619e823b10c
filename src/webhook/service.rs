use crate::client::Client;
use crate::error::{ApiError, Result};
use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Registered webhook as reported by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookDetails {
    pub id: String,
    pub url: String,
    pub types: Vec<String>,
    pub last_request_sent_at: Option<DateTime<Utc>>,
    pub last_response_code: Option<String>,
}

/// Register and unregister the webhook of the current API key
pub struct WebhookService<'a> {
    client: &'a Client,
}

impl<'a> WebhookService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Assign `endpoint` to the API key for the given webhook types
    pub async fn register(&self, endpoint: &str, types: &[&str]) -> Result<()> {
        let params = [("url", endpoint.to_string()), ("types", types.join(","))];
        let request = self.client.request(Method::POST, "/webhooks", &params)?;

        let response = self.client.send(request).await?;
        if response.status() != StatusCode::CREATED {
            return Err(ApiError::UnexpectedStatus {
                expected: StatusCode::CREATED.as_u16(),
                actual: response.status().as_u16(),
            }
            .into());
        }

        info!("Registered webhook {} for {}", endpoint, types.join(","));
        Ok(())
    }

    pub async fn get(&self) -> Result<WebhookDetails> {
        let request = self.client.request(Method::GET, "/webhooks", &[])?;

        let response = self.client.send(request).await?;
        if response.status() != StatusCode::OK {
            return Err(ApiError::UnexpectedStatus {
                expected: StatusCode::OK.as_u16(),
                actual: response.status().as_u16(),
            }
            .into());
        }

        Ok(response.json().await?)
    }

    /// Remove the currently registered webhook
    pub async fn unregister(&self) -> Result<()> {
        let details = self.get().await?;
        let request = self
            .client
            .request(Method::DELETE, &format!("/webhooks/{}", details.id), &[])?;

        // The API answers inconsistently on delete; a failure here only means the
        // webhook is gone already.
        if let Err(e) = self.client.send(request).await {
            warn!("Deleting webhook {} failed: {}", details.id, e);
        }

        info!("Unregistered webhook {}", details.id);
        Ok(())
    }
}
