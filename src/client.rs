use crate::config::{Config, ObserverConfig, DEFAULT_ENDPOINT};
use crate::error::{ApiError, Error, Result};
use crate::observer::ObserverService;
use crate::webhook::WebhookService;
use reqwest::{Method, RequestBuilder, Response, Url};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;
use tracing::debug;

pub const USER_AGENT: &str = "eyeson-rs";

/// Client for the REST API and the realtime observer
#[derive(Debug)]
pub struct Client {
    api_key: Secret<String>,
    base_url: Option<Url>,
    http: reqwest::Client,
    observer: ObserverConfig,
}

/// Builder for [`Client`]
pub struct ClientBuilder {
    api_key: String,
    endpoint: Option<String>,
    timeout: Option<Duration>,
    user_agent: String,
    observer: ObserverConfig,
}

impl ClientBuilder {
    /// Use an endpoint other than the public API
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Build without a base endpoint; REST calls and observer connections will fail
    /// with a configuration error.
    pub fn no_endpoint(mut self) -> Self {
        self.endpoint = None;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn observer_config(mut self, observer: ObserverConfig) -> Self {
        self.observer = observer;
        self
    }

    pub fn build(self) -> Result<Client> {
        let base_url = match self.endpoint {
            Some(endpoint) => Some(Url::parse(&endpoint).map_err(|e| {
                Error::Configuration(format!("invalid endpoint {}: {}", endpoint, e))
            })?),
            None => None,
        };

        let mut http = reqwest::Client::builder().user_agent(self.user_agent);
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        Ok(Client {
            api_key: Secret::new(self.api_key),
            base_url,
            http: http.build()?,
            observer: self.observer,
        })
    }
}

impl Client {
    /// Client for the public API endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    pub fn builder(api_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            api_key: api_key.into(),
            endpoint: Some(DEFAULT_ENDPOINT.to_string()),
            timeout: None,
            user_agent: USER_AGENT.to_string(),
            observer: ObserverConfig::default(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder =
            Self::builder(config.api.api_key.clone()).observer_config(config.observer.clone());
        if let Some(endpoint) = &config.api.endpoint {
            builder = builder.endpoint(endpoint.clone());
        }
        builder.build()
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn observer(&self) -> ObserverService<'_> {
        ObserverService::new(self)
    }

    pub fn webhooks(&self) -> WebhookService<'_> {
        WebhookService::new(self)
    }

    pub fn rooms(&self) -> RoomsService<'_> {
        RoomsService { client: self }
    }

    pub(crate) fn authorization(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub(crate) fn observer_config(&self) -> &ObserverConfig {
        &self.observer
    }

    /// Prepare a request against `path` below the base URL.
    ///
    /// `params` go into the query for GET/DELETE and into a form body otherwise.
    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<RequestBuilder> {
        let base_url = self
            .base_url
            .as_ref()
            .ok_or_else(|| Error::Configuration("client base url not specified".to_string()))?;

        let url = Url::parse(&format!(
            "{}/{}",
            base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
        .map_err(|e| Error::Configuration(format!("invalid request path {}: {}", path, e)))?;

        let has_body = method == Method::POST || method == Method::PUT;

        let mut request = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");

        if !params.is_empty() {
            request = if has_body {
                request.form(params)
            } else {
                request.query(params)
            };
        }

        let api_key = self.api_key.expose_secret();
        if !api_key.is_empty() {
            request = request.header(reqwest::header::AUTHORIZATION, api_key.as_str());
        }

        Ok(request)
    }

    /// Send a request and reject non-success statuses
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status().as_u16();

        debug!("{} answered {}", response.url().path(), status);

        match ApiError::from_status(status) {
            Some(err) => Err(err.into()),
            None => Ok(response),
        }
    }
}

/// Room controls needed alongside the observer
pub struct RoomsService<'a> {
    client: &'a Client,
}

impl RoomsService<'_> {
    /// Force stop a running meeting
    pub async fn shutdown(&self, room_id: &str) -> Result<()> {
        let request = self
            .client
            .request(Method::DELETE, &format!("/rooms/{}", room_id), &[])?;
        self.client.send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let client = Client::new("key").unwrap();
        assert_eq!(
            client.base_url().map(Url::as_str),
            Some("https://api.eyeson.team/")
        );
    }

    #[test]
    fn test_invalid_endpoint_is_configuration_error() {
        let err = Client::builder("key").endpoint("not a url").build().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_request_without_endpoint_fails() {
        let client = Client::builder("key").no_endpoint().build().unwrap();
        let err = client.request(Method::GET, "/webhooks", &[]).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_request_headers_and_url() {
        let client = Client::builder("secret-key")
            .endpoint("http://localhost:9000/")
            .build()
            .unwrap();

        let request = client
            .request(Method::GET, "/rooms/abc", &[("page", "2".to_string())])
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.url().as_str(), "http://localhost:9000/rooms/abc?page=2");
        assert_eq!(request.headers()["authorization"], "secret-key");
        assert_eq!(request.headers()["accept"], "application/json");
    }

    #[test]
    fn test_post_params_go_into_form_body() {
        let client = Client::builder("k").endpoint("http://localhost:9000").build().unwrap();

        let request = client
            .request(Method::POST, "webhooks", &[("url", "http://hook".to_string())])
            .unwrap()
            .build()
            .unwrap();

        assert!(request.url().query().is_none());
        assert_eq!(
            request.headers()["content-type"],
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = Client::new("very-secret").unwrap();
        assert!(!format!("{:?}", client).contains("very-secret"));
    }
}
