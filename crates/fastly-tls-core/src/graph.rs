//! Resource graph resolver
//!
//! Flattens a JSON:API document (`data` plus `included`) into a map keyed
//! by `(type, id)` and resolves relationship stubs by lookup. Resolution is
//! independent of where a resource appeared in the document, and a stub
//! pointing at a resource the document omitted resolves to nothing.

use fastly_tls_api::{Document, RawResource};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, trace};

use crate::model::{
    Activation, Authorization, Resource, ResourceKey, Subscription, TlsDomain, ACTIVATIONS_REL,
    AUTHORIZATIONS_REL, DOMAINS_REL, DOMAIN_TYPE, SUBSCRIPTIONS_REL, SUBSCRIPTION_TYPE,
};

/// Errors raised while syncing a document
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Invalid attributes on {key}: {source}")]
    InvalidAttributes {
        key: ResourceKey,
        #[source]
        source: serde_json::Error,
    },
}

/// De-duplicated, request-scoped view of one API response
#[derive(Debug, Clone, Default)]
pub struct Graph {
    resources: HashMap<ResourceKey, Resource>,
    primary: Vec<ResourceKey>,
}

impl Graph {
    /// Build a graph from a document
    pub fn sync(document: Document) -> Result<Self, GraphError> {
        let mut graph = Graph::default();

        for raw in document.data.into_vec() {
            let key = graph.insert(raw)?;
            if !graph.primary.contains(&key) {
                graph.primary.push(key);
            }
        }

        for raw in document.included {
            graph.insert(raw)?;
        }

        debug!(
            resources = graph.resources.len(),
            primary = graph.primary.len(),
            "Synced JSON:API document"
        );
        Ok(graph)
    }

    fn insert(&mut self, raw: RawResource) -> Result<ResourceKey, GraphError> {
        let key = ResourceKey::new(&raw.kind, &raw.id);
        let mut resource =
            Resource::from_raw(raw).map_err(|source| GraphError::InvalidAttributes {
                key: key.clone(),
                source,
            })?;

        // Later attributes win; earlier references keep their position
        if let Some(previous) = self.resources.remove(&key) {
            trace!(key = %key, "Merging duplicate resource");
            let mut relationships = previous.relationships().clone();
            relationships.merge(resource.relationships());
            *resource.relationships_mut() = relationships;
        }

        self.resources.insert(key.clone(), resource);
        Ok(key)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn find(&self, kind: &str, id: &str) -> Option<&Resource> {
        self.resources.get(&ResourceKey::new(kind, id))
    }

    /// Resources of the `data` member, in document order
    pub fn primary(&self) -> impl Iterator<Item = &Resource> {
        self.primary.iter().filter_map(|key| self.resources.get(key))
    }

    /// Resources referenced by `from` under `relationship`
    ///
    /// References absent from the document are skipped.
    pub fn related<'g>(&'g self, from: &Resource, relationship: &str) -> Vec<&'g Resource> {
        self.resolve(from.relationships().get(relationship))
    }

    fn resolve<'g>(&'g self, keys: &[ResourceKey]) -> Vec<&'g Resource> {
        keys.iter()
            .filter_map(|key| {
                let resource = self.resources.get(key);
                if resource.is_none() {
                    trace!(key = %key, "Relationship target not included in document");
                }
                resource
            })
            .collect()
    }

    pub fn domain(&self, name: &str) -> Option<&TlsDomain> {
        self.find(DOMAIN_TYPE, name).and_then(Resource::as_domain)
    }

    pub fn subscription(&self, id: &str) -> Option<&Subscription> {
        self.find(SUBSCRIPTION_TYPE, id)
            .and_then(Resource::as_subscription)
    }

    pub fn primary_subscriptions(&self) -> Vec<&Subscription> {
        self.primary().filter_map(Resource::as_subscription).collect()
    }

    pub fn primary_domains(&self) -> Vec<&TlsDomain> {
        self.primary().filter_map(Resource::as_domain).collect()
    }

    pub fn subscriptions_of(&self, domain: &TlsDomain) -> Vec<&Subscription> {
        self.resolve(domain.relationships.get(SUBSCRIPTIONS_REL))
            .into_iter()
            .filter_map(Resource::as_subscription)
            .collect()
    }

    pub fn activations_of(&self, domain: &TlsDomain) -> Vec<&Activation> {
        self.resolve(domain.relationships.get(ACTIVATIONS_REL))
            .into_iter()
            .filter_map(Resource::as_activation)
            .collect()
    }

    pub fn authorizations_of(&self, subscription: &Subscription) -> Vec<&Authorization> {
        self.resolve(subscription.relationships.get(AUTHORIZATIONS_REL))
            .into_iter()
            .filter_map(Resource::as_authorization)
            .collect()
    }

    /// Domain names covered by a subscription
    ///
    /// Read straight from the relationship stubs, since a `tls_domain` id is
    /// the domain name itself. Works whether or not the domains were included.
    pub fn domain_names_of(&self, subscription: &Subscription) -> Vec<String> {
        subscription
            .relationships
            .get(DOMAINS_REL)
            .iter()
            .map(|key| key.id.clone())
            .collect()
    }
}
