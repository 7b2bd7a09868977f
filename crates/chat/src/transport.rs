use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

/// Outbound JSON POST handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub bearer: String,
    pub body: serde_json::Value,
}

/// Raw response as seen by the client before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{0}")]
    Other(String),
}

/// Carries a single completion request over the wire.
pub trait Transport {
    fn post_json(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post_json(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).post_json(request)
    }
}

/// Blocking reqwest transport. The timeout is enforced here, not by the client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Build)?;
        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn post_json(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(url = %request.url, "posting completion request");
        let response = self
            .http
            .post(&request.url)
            .bearer_auth(&request.bearer)
            .json(&request.body)
            .send()
            .map_err(|source| TransportError::Request {
                url: request.url.clone(),
                source,
            })?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|source| TransportError::Request {
            url: request.url.clone(),
            source,
        })?;
        Ok(HttpResponse { status, body })
    }
}
