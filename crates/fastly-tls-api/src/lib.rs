//! Fastly TLS API client
//!
//! Thin verb+path bindings over the Fastly TLS subscription, domain and
//! activation endpoints, plus the JSON:API wire types they return.

pub mod client;
pub mod document;
pub mod error;

pub use client::{
    create_subscription_body, ClientConfig, FastlyClient, API_KEY_HEADER, CERTIFICATE_AUTHORITY,
    DEFAULT_BASE_URI, JSON_API_MEDIA_TYPE,
};
pub use document::{
    Document, ErrorObject, Linkage, PrimaryData, RawResource, Relationship, ResourceIdentifier,
};
pub use error::{ApiError, ApiResult};

use async_trait::async_trait;

/// Operations of the Fastly TLS API used by the lifecycle controller
///
/// Implemented by [`FastlyClient`]; the `mock` feature generates
/// `MockTlsApi` for tests that need to observe call order.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait TlsApi: Send + Sync {
    /// Create a Let's Encrypt subscription for `domain`
    async fn create_subscription(&self, domain: &str) -> ApiResult<Document>;

    /// Fetch one subscription including its authorizations
    async fn get_subscription(&self, id: &str) -> ApiResult<Document>;

    /// List subscriptions including their authorizations
    async fn list_subscriptions(&self) -> ApiResult<Document>;

    async fn delete_subscription(&self, id: &str) -> ApiResult<()>;

    /// List TLS domains with activations and subscription→authorization chains
    async fn list_domains(&self) -> ApiResult<Document>;

    async fn get_activation(&self, id: &str) -> ApiResult<Document>;

    async fn delete_activation(&self, id: &str) -> ApiResult<()>;
}
