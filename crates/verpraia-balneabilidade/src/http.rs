//! HTTP client factory for the balneability API.
//!
//! [`create_client`] builds a reqwest-backed [`HttpClient`] bound to one base
//! URL, sending a fixed `Origin` header and applying a per-request timeout.
//! Every failure leaving [`Transport::post`] is a [`RequestError`]; there is
//! no retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;
use verpraia_core::config::{ApiConfig, DEFAULT_API_BASE_URL, DEFAULT_API_ORIGIN, DEFAULT_TIMEOUT_MS};

use crate::error::{ClientError, RequestError};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Options for [`create_client`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOptions {
    pub base_url: String,
    pub origin: String,
    pub timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            origin: DEFAULT_API_ORIGIN.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl From<&ApiConfig> for HttpOptions {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            origin: config.origin.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Sent as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
}

impl RequestBody {
    pub fn form<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A successful response body, before it is decoded into records.
///
/// Some endpoints answer with a JSON document, others with a JSON document
/// encoded once more as a JSON string, whatever content type they declare.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBody {
    Text(String),
    Json(Value),
}

impl RawBody {
    /// Classify a response body regardless of its declared content type.
    ///
    /// A body that parses to a JSON string is unwrapped to `Text` so it is
    /// decoded a second time; a body that does not parse stays `Text`.
    pub fn classify(text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::String(inner)) => Self::Text(inner),
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(text),
        }
    }
}

/// The seam between the repository and the network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST to `path` (relative to the configured base URL) and return the
    /// raw body of a 2xx response.
    async fn post(
        &self,
        path: &str,
        body: Option<RequestBody>,
        headers: Option<HeaderMap>,
    ) -> Result<RawBody, RequestError>;
}

/// reqwest-backed [`Transport`]. Cheap to clone; clones share a connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

/// Build a configured client.
///
/// # Errors
/// Fails if the base URL does not parse, the origin is not a valid header
/// value, or the TLS backend cannot be initialized.
pub fn create_client(options: HttpOptions) -> Result<HttpClient, ClientError> {
    Url::parse(&options.base_url).map_err(|e| ClientError::InvalidBaseUrl {
        url: options.base_url.clone(),
        reason: e.to_string(),
    })?;

    let origin = HeaderValue::from_str(&options.origin)
        .map_err(|_| ClientError::InvalidOrigin(options.origin.clone()))?;

    let mut default_headers = HeaderMap::new();
    default_headers.insert(ORIGIN, origin);

    let client = Client::builder()
        .timeout(options.timeout)
        .default_headers(default_headers)
        .build()?;

    tracing::debug!(
        base_url = %options.base_url,
        timeout_ms = options.timeout.as_millis() as u64,
        "HTTP client created"
    );

    Ok(HttpClient {
        client,
        base_url: options.base_url.trim_end_matches('/').to_string(),
    })
}

impl HttpClient {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn post(
        &self,
        path: &str,
        body: Option<RequestBody>,
        headers: Option<HeaderMap>,
    ) -> Result<RawBody, RequestError> {
        let mut request = self.client.post(self.url(path));

        if let Some(RequestBody::Form(fields)) = body {
            request = request.form(&fields);
        }
        if let Some(headers) = headers {
            request = request.headers(headers);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(path, timeout = e.is_timeout(), error = %e, "Request failed without a response");
                return Err(RequestError::transport());
            }
        };

        let status = response.status();

        let text = response.text().await.map_err(|e| {
            tracing::warn!(path, status = status.as_u16(), timeout = e.is_timeout(), error = %e, "Failed to read response body");
            body_read_error(status)
        })?;

        if !status.is_success() {
            let err = RequestError::from_response(status.as_u16(), error_body(text));
            tracing::warn!(path, status = status.as_u16(), message = %err.message, "Request rejected");
            return Err(err);
        }

        Ok(RawBody::classify(text))
    }
}

/// A body that could not be read still reports the status it came with.
fn body_read_error(status: StatusCode) -> RequestError {
    if status.is_success() {
        RequestError::transport()
    } else {
        RequestError::from_response(status.as_u16(), None)
    }
}

/// Error bodies are relayed as JSON when they parse, as a string otherwise.
fn error_body(text: String) -> Option<Value> {
    if text.is_empty() {
        return None;
    }
    Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}
