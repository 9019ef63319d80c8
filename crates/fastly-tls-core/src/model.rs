//! Typed TLS resources
//!
//! Each JSON:API resource type the lifecycle controller cares about is
//! decoded into its own struct; everything else is kept as
//! [`Resource::Other`]. Relationships stay as `(type, id)` keys and are
//! resolved through [`crate::graph::Graph`].

use chrono::{DateTime, Utc};
use fastly_tls_api::RawResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DOMAIN_TYPE: &str = "tls_domain";
pub const SUBSCRIPTION_TYPE: &str = "tls_subscription";
pub const AUTHORIZATION_TYPE: &str = "tls_authorization";
pub const ACTIVATION_TYPE: &str = "tls_activation";

/// Relationship names
pub const SUBSCRIPTIONS_REL: &str = "tls_subscriptions";
pub const ACTIVATIONS_REL: &str = "tls_activations";
pub const AUTHORIZATIONS_REL: &str = "tls_authorizations";
pub const DOMAINS_REL: &str = "tls_domains";
pub const DOMAIN_REL: &str = "tls_domain";

/// Identity of a resource within a document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub kind: String,
    pub id: String,
}

impl ResourceKey {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Named relationship references of one resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships(BTreeMap<String, Vec<ResourceKey>>);

impl Relationships {
    pub fn from_raw(raw: &RawResource) -> Self {
        let links = raw
            .relationships
            .iter()
            .map(|(name, relationship)| {
                let keys = relationship
                    .identifiers()
                    .iter()
                    .map(|identifier| ResourceKey::new(&identifier.kind, &identifier.id))
                    .collect();
                (name.clone(), keys)
            })
            .collect();
        Self(links)
    }

    /// References under `name`, empty when the relationship is absent
    pub fn get(&self, name: &str) -> &[ResourceKey] {
        self.0.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Add references from `other` that are not already present
    pub fn merge(&mut self, other: &Relationships) {
        for (name, keys) in &other.0 {
            let existing = self.0.entry(name.clone()).or_default();
            for key in keys {
                if !existing.contains(key) {
                    existing.push(key.clone());
                }
            }
        }
    }
}

/// Certificate state of a subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionState {
    Pending,
    Processing,
    Issued,
    Renewing,
    /// Any state this client does not know how to present
    Unrecognized(String),
}

impl SubscriptionState {
    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionState::Pending => "pending",
            SubscriptionState::Processing => "processing",
            SubscriptionState::Issued => "issued",
            SubscriptionState::Renewing => "renewing",
            SubscriptionState::Unrecognized(raw) => raw,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            SubscriptionState::Pending | SubscriptionState::Processing => {
                Stage::AwaitingVerification
            }
            SubscriptionState::Issued | SubscriptionState::Renewing => Stage::Issued,
            SubscriptionState::Unrecognized(_) => Stage::Unsupported,
        }
    }
}

impl From<String> for SubscriptionState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => SubscriptionState::Pending,
            "processing" => SubscriptionState::Processing,
            "issued" => SubscriptionState::Issued,
            "renewing" => SubscriptionState::Renewing,
            _ => SubscriptionState::Unrecognized(value),
        }
    }
}

impl From<SubscriptionState> for String {
    fn from(state: SubscriptionState) -> Self {
        state.as_str().to_string()
    }
}

impl std::fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What guidance a subscription state calls for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Certificate not issued yet; domain ownership must be proven
    AwaitingVerification,
    /// Certificate issued or renewing; only edge routing records apply
    Issued,
    /// State unknown or absent
    Unsupported,
}

impl Stage {
    /// Stage of an optional state; a missing state is unsupported
    pub fn of(state: Option<&SubscriptionState>) -> Stage {
        state.map(SubscriptionState::stage).unwrap_or(Stage::Unsupported)
    }
}

/// One DNS record the domain owner has to publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    #[serde(rename = "type")]
    pub kind: String,
    pub record_type: String,
    pub record_name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// `tls_domain`, identified by the domain name
#[derive(Debug, Clone, PartialEq)]
pub struct TlsDomain {
    pub id: String,
    pub relationships: Relationships,
}

impl TlsDomain {
    pub fn name(&self) -> &str {
        &self.id
    }

    /// Referenced subscription ids, whether or not their bodies were included
    pub fn subscription_ids(&self) -> impl Iterator<Item = &str> {
        referenced_ids(&self.relationships, SUBSCRIPTIONS_REL, SUBSCRIPTION_TYPE)
    }

    /// Referenced activation ids, whether or not their bodies were included
    pub fn activation_ids(&self) -> impl Iterator<Item = &str> {
        referenced_ids(&self.relationships, ACTIVATIONS_REL, ACTIVATION_TYPE)
    }
}

fn referenced_ids<'a>(
    relationships: &'a Relationships,
    name: &str,
    kind: &'a str,
) -> impl Iterator<Item = &'a str> {
    relationships
        .get(name)
        .iter()
        .filter(move |key| key.kind == kind)
        .map(|key| key.id.as_str())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: String,
    pub state: Option<SubscriptionState>,
    pub certificate_authority: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub relationships: Relationships,
}

impl Subscription {
    pub fn stage(&self) -> Stage {
        Stage::of(self.state.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Authorization {
    pub id: String,
    pub challenges: Vec<Challenge>,
    pub relationships: Relationships,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub relationships: Relationships,
}

/// A resource type this client does not model
#[derive(Debug, Clone, PartialEq)]
pub struct OtherResource {
    pub kind: String,
    pub id: String,
    pub relationships: Relationships,
}

#[derive(Debug, Default, Deserialize)]
struct SubscriptionAttributes {
    #[serde(default)]
    state: Option<SubscriptionState>,
    #[serde(default)]
    certificate_authority: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthorizationAttributes {
    #[serde(default)]
    challenges: Vec<Challenge>,
}

#[derive(Debug, Default, Deserialize)]
struct ActivationAttributes {
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

/// Tagged union of every resource held by a graph
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Domain(TlsDomain),
    Subscription(Subscription),
    Authorization(Authorization),
    Activation(Activation),
    Other(OtherResource),
}

impl Resource {
    /// Decode a wire resource into its typed variant
    pub fn from_raw(raw: RawResource) -> Result<Self, serde_json::Error> {
        let relationships = Relationships::from_raw(&raw);
        let attributes = serde_json::Value::Object(raw.attributes);

        let resource = match raw.kind.as_str() {
            DOMAIN_TYPE => Resource::Domain(TlsDomain {
                id: raw.id,
                relationships,
            }),
            SUBSCRIPTION_TYPE => {
                let attributes: SubscriptionAttributes = serde_json::from_value(attributes)?;
                Resource::Subscription(Subscription {
                    id: raw.id,
                    state: attributes.state,
                    certificate_authority: attributes.certificate_authority,
                    created_at: attributes.created_at,
                    updated_at: attributes.updated_at,
                    relationships,
                })
            }
            AUTHORIZATION_TYPE => {
                let attributes: AuthorizationAttributes = serde_json::from_value(attributes)?;
                Resource::Authorization(Authorization {
                    id: raw.id,
                    challenges: attributes.challenges,
                    relationships,
                })
            }
            ACTIVATION_TYPE => {
                let attributes: ActivationAttributes = serde_json::from_value(attributes)?;
                Resource::Activation(Activation {
                    id: raw.id,
                    created_at: attributes.created_at,
                    relationships,
                })
            }
            _ => Resource::Other(OtherResource {
                kind: raw.kind,
                id: raw.id,
                relationships,
            }),
        };

        Ok(resource)
    }

    pub fn kind(&self) -> &str {
        match self {
            Resource::Domain(_) => DOMAIN_TYPE,
            Resource::Subscription(_) => SUBSCRIPTION_TYPE,
            Resource::Authorization(_) => AUTHORIZATION_TYPE,
            Resource::Activation(_) => ACTIVATION_TYPE,
            Resource::Other(other) => &other.kind,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Resource::Domain(domain) => &domain.id,
            Resource::Subscription(subscription) => &subscription.id,
            Resource::Authorization(authorization) => &authorization.id,
            Resource::Activation(activation) => &activation.id,
            Resource::Other(other) => &other.id,
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.kind(), self.id())
    }

    pub fn relationships(&self) -> &Relationships {
        match self {
            Resource::Domain(domain) => &domain.relationships,
            Resource::Subscription(subscription) => &subscription.relationships,
            Resource::Authorization(authorization) => &authorization.relationships,
            Resource::Activation(activation) => &activation.relationships,
            Resource::Other(other) => &other.relationships,
        }
    }

    pub fn relationships_mut(&mut self) -> &mut Relationships {
        match self {
            Resource::Domain(domain) => &mut domain.relationships,
            Resource::Subscription(subscription) => &mut subscription.relationships,
            Resource::Authorization(authorization) => &mut authorization.relationships,
            Resource::Activation(activation) => &mut activation.relationships,
            Resource::Other(other) => &mut other.relationships,
        }
    }

    pub fn as_domain(&self) -> Option<&TlsDomain> {
        match self {
            Resource::Domain(domain) => Some(domain),
            _ => None,
        }
    }

    pub fn as_subscription(&self) -> Option<&Subscription> {
        match self {
            Resource::Subscription(subscription) => Some(subscription),
            _ => None,
        }
    }

    pub fn as_authorization(&self) -> Option<&Authorization> {
        match self {
            Resource::Authorization(authorization) => Some(authorization),
            _ => None,
        }
    }

    pub fn as_activation(&self) -> Option<&Activation> {
        match self {
            Resource::Activation(activation) => Some(activation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawResource {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_state_parsing() {
        assert_eq!(
            SubscriptionState::from("pending".to_string()),
            SubscriptionState::Pending
        );
        assert_eq!(
            SubscriptionState::from("renewing".to_string()),
            SubscriptionState::Renewing
        );
        assert_eq!(
            SubscriptionState::from("failed".to_string()),
            SubscriptionState::Unrecognized("failed".to_string())
        );
        assert_eq!(SubscriptionState::Unrecognized("x".into()).as_str(), "x");
    }

    #[test]
    fn test_state_stages() {
        assert_eq!(SubscriptionState::Pending.stage(), Stage::AwaitingVerification);
        assert_eq!(
            SubscriptionState::Processing.stage(),
            Stage::AwaitingVerification
        );
        assert_eq!(SubscriptionState::Issued.stage(), Stage::Issued);
        assert_eq!(SubscriptionState::Renewing.stage(), Stage::Issued);
        assert_eq!(
            SubscriptionState::Unrecognized("failed".into()).stage(),
            Stage::Unsupported
        );
        assert_eq!(Stage::of(None), Stage::Unsupported);
    }

    #[test]
    fn test_decode_subscription() {
        let resource = Resource::from_raw(raw(json!({
            "type": "tls_subscription",
            "id": "sub-1",
            "attributes": {
                "state": "issued",
                "certificate_authority": "lets-encrypt",
                "created_at": "2020-04-01T10:00:00.000Z"
            },
            "relationships": {
                "tls_authorizations": {"data": [{"type": "tls_authorization", "id": "auth-1"}]}
            }
        })))
        .unwrap();

        let subscription = resource.as_subscription().unwrap();
        assert_eq!(subscription.state, Some(SubscriptionState::Issued));
        assert_eq!(
            subscription.certificate_authority.as_deref(),
            Some("lets-encrypt")
        );
        assert!(subscription.created_at.is_some());
        assert_eq!(
            subscription.relationships.get(AUTHORIZATIONS_REL),
            &[ResourceKey::new("tls_authorization", "auth-1")]
        );
        assert!(subscription.relationships.get(DOMAINS_REL).is_empty());
    }

    #[test]
    fn test_decode_subscription_without_state() {
        let resource = Resource::from_raw(raw(json!({
            "type": "tls_subscription",
            "id": "sub-1",
            "attributes": {"state": null}
        })))
        .unwrap();
        assert_eq!(resource.as_subscription().unwrap().stage(), Stage::Unsupported);
    }

    #[test]
    fn test_decode_unknown_type() {
        let resource = Resource::from_raw(raw(json!({
            "type": "tls_configuration",
            "id": "cfg-1",
            "attributes": {"name": "default"}
        })))
        .unwrap();
        assert_eq!(resource.kind(), "tls_configuration");
        assert_eq!(resource.key(), ResourceKey::new("tls_configuration", "cfg-1"));
        assert!(resource.as_domain().is_none());
    }

    #[test]
    fn test_decode_rejects_malformed_challenges() {
        let result = Resource::from_raw(raw(json!({
            "type": "tls_authorization",
            "id": "auth-1",
            "attributes": {"challenges": [{"type": "managed-dns"}]}
        })));
        assert!(result.is_err());
    }

    #[test]
    fn test_relationships_merge() {
        let mut left = Relationships::from_raw(&raw(json!({
            "type": "tls_domain",
            "id": "www.example.org",
            "relationships": {
                "tls_subscriptions": {"data": [{"type": "tls_subscription", "id": "sub-1"}]}
            }
        })));
        let right = Relationships::from_raw(&raw(json!({
            "type": "tls_domain",
            "id": "www.example.org",
            "relationships": {
                "tls_subscriptions": {"data": [
                    {"type": "tls_subscription", "id": "sub-1"},
                    {"type": "tls_subscription", "id": "sub-2"}
                ]},
                "tls_activations": {"data": [{"type": "tls_activation", "id": "act-1"}]}
            }
        })));

        left.merge(&right);
        assert_eq!(
            left.get(SUBSCRIPTIONS_REL),
            &[
                ResourceKey::new("tls_subscription", "sub-1"),
                ResourceKey::new("tls_subscription", "sub-2")
            ]
        );
        assert_eq!(left.get(ACTIVATIONS_REL).len(), 1);
        assert_eq!(left.names().count(), 2);
    }

    #[test]
    fn test_domain_reference_ids() {
        let resource = Resource::from_raw(raw(json!({
            "type": "tls_domain",
            "id": "www.example.org",
            "relationships": {
                "tls_activations": {"data": [{"type": "tls_activation", "id": "act-1"}]},
                "tls_subscriptions": {"data": [{"type": "tls_subscription", "id": "sub-1"}]}
            }
        })))
        .unwrap();

        let domain = resource.as_domain().unwrap();
        assert_eq!(domain.subscription_ids().collect::<Vec<_>>(), vec!["sub-1"]);
        assert_eq!(domain.activation_ids().collect::<Vec<_>>(), vec!["act-1"]);
    }
}
