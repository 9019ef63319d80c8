//! HTTP client for the Fastly TLS API
//!
//! Every request carries the `Fastly-Key` credential and JSON:API content
//! negotiation headers. Non-success responses become [`ApiError::Http`];
//! nothing is retried here.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, trace};

use crate::document::Document;
use crate::error::{ApiError, ApiResult};
use crate::TlsApi;

/// Fastly API base URI
pub const DEFAULT_BASE_URI: &str = "https://api.fastly.com";

/// Header carrying the API credential
pub const API_KEY_HEADER: &str = "Fastly-Key";

/// JSON:API media type used for both `Accept` and `Content-Type`
pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

/// Certificate authority requested for new subscriptions
pub const CERTIFICATE_AUTHORITY: &str = "lets-encrypt";

const DOMAINS_INCLUDE: &str =
    "tls_activations,tls_subscriptions.tls_authorizations,tls_subscriptions";

/// Client configuration
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URI of the API, without trailing slash
    pub base_uri: String,
    /// Fastly API key
    pub api_key: String,
    /// Request timeout; the transport default applies when unset
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.to_string(),
            api_key: api_key.into(),
            timeout: None,
        }
    }

    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = base_uri.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_uri", &self.base_uri)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Fastly TLS API client
#[derive(Debug, Clone)]
pub struct FastlyClient {
    http: Client,
    base_uri: String,
    api_key: String,
}

impl FastlyClient {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ApiError::Client)?;

        Ok(Self {
            http,
            base_uri: config.base_uri.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_uri, path)
    }

    /// Issue a request and decode the JSON body
    ///
    /// Returns `None` for an empty success body, as sent for `204 No Content`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ApiResult<Option<Value>> {
        let url = self.url(path);
        debug!(method = %method, url = %url, "Sending Fastly API request");

        let mut request = self
            .http
            .request(method, &url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, JSON_API_MEDIA_TYPE)
            .header(CONTENT_TYPE, JSON_API_MEDIA_TYPE);
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        trace!(status = %status, length = bytes.len(), "Fastly API response received");

        if !status.is_success() {
            return Err(ApiError::Http {
                url,
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body: serde_json::from_slice(&bytes).ok(),
            });
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| ApiError::Decode { url, source })
    }

    async fn document(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ApiResult<Document> {
        match self.request(method, path, body).await? {
            Some(value) => serde_json::from_value(value).map_err(|source| ApiError::Decode {
                url: self.url(path),
                source,
            }),
            None => Ok(Document::default()),
        }
    }
}

/// Request body creating a Let's Encrypt subscription for one domain
pub fn create_subscription_body(domain: &str) -> Value {
    json!({
        "data": {
            "type": "tls_subscription",
            "attributes": {
                "certificate_authority": CERTIFICATE_AUTHORITY,
            },
            "relationships": {
                "tls_domains": {
                    "data": [
                        { "type": "tls_domain", "id": domain },
                    ],
                },
                "tls_configuration": {
                    "data": {},
                },
            },
        },
    })
}

#[async_trait]
impl TlsApi for FastlyClient {
    async fn create_subscription(&self, domain: &str) -> ApiResult<Document> {
        let body = create_subscription_body(domain);
        self.document(Method::POST, "/tls/subscriptions", Some(&body))
            .await
    }

    async fn get_subscription(&self, id: &str) -> ApiResult<Document> {
        let path = format!("/tls/subscriptions/{}?include=tls_authorizations", id);
        self.document(Method::GET, &path, None).await
    }

    async fn list_subscriptions(&self) -> ApiResult<Document> {
        self.document(
            Method::GET,
            "/tls/subscriptions?include=tls_authorizations",
            None,
        )
        .await
    }

    async fn delete_subscription(&self, id: &str) -> ApiResult<()> {
        let path = format!("/tls/subscriptions/{}", id);
        self.request(Method::DELETE, &path, None).await?;
        Ok(())
    }

    async fn list_domains(&self) -> ApiResult<Document> {
        let path = format!("/tls/domains?include={}", DOMAINS_INCLUDE);
        self.document(Method::GET, &path, None).await
    }

    async fn get_activation(&self, id: &str) -> ApiResult<Document> {
        let path = format!("/tls/activations/{}", id);
        self.document(Method::GET, &path, None).await
    }

    async fn delete_activation(&self, id: &str) -> ApiResult<()> {
        let path = format!("/tls/activations/{}", id);
        self.request(Method::DELETE, &path, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_uri_trailing_slash() {
        let client =
            FastlyClient::new(ClientConfig::new("key").with_base_uri("http://localhost:8080/"))
                .unwrap();
        assert_eq!(client.base_uri(), "http://localhost:8080");
        assert_eq!(
            client.url("/tls/domains"),
            "http://localhost:8080/tls/domains"
        );
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let config = ClientConfig::new("super-secret").with_timeout(Duration::from_secs(10));
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains(DEFAULT_BASE_URI));
    }

    #[test]
    fn test_create_subscription_body() {
        let body = create_subscription_body("www.example.org");
        assert_eq!(body["data"]["type"], "tls_subscription");
        assert_eq!(
            body["data"]["attributes"]["certificate_authority"],
            "lets-encrypt"
        );
        assert_eq!(
            body["data"]["relationships"]["tls_domains"]["data"][0]["id"],
            "www.example.org"
        );
        assert_eq!(
            body["data"]["relationships"]["tls_configuration"]["data"],
            json!({})
        );
    }
}
