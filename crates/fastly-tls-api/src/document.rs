//! JSON:API wire types
//!
//! The Fastly TLS endpoints answer with `application/vnd.api+json`
//! documents: a primary `data` member, an optional flat `included` list and
//! relationships expressed as bare `{type, id}` stubs. These types mirror
//! the wire shape only; resolving stubs into resources is left to callers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Top-level JSON:API document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub data: PrimaryData,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<RawResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorObject>,
}

impl Document {
    /// Primary resources in document order
    pub fn primary(&self) -> &[RawResource] {
        match &self.data {
            PrimaryData::Many(resources) => resources,
            PrimaryData::One(resource) => std::slice::from_ref(resource.as_ref()),
            PrimaryData::Empty => &[],
        }
    }
}

/// The `data` member: a single resource, a collection, or `null`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryData {
    Many(Vec<RawResource>),
    One(Box<RawResource>),
    #[default]
    Empty,
}

impl PrimaryData {
    pub fn into_vec(self) -> Vec<RawResource> {
        match self {
            PrimaryData::Many(resources) => resources,
            PrimaryData::One(resource) => vec![*resource],
            PrimaryData::Empty => Vec::new(),
        }
    }
}

/// A resource object as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResource {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub relationships: BTreeMap<String, Relationship>,
}

/// `{type, id}` stub pointing at another resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl ResourceIdentifier {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// A relationship member; only the linkage in `data` is kept
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Linkage,
}

impl Relationship {
    pub fn identifiers(&self) -> &[ResourceIdentifier] {
        self.data.identifiers()
    }
}

/// Resource linkage of a relationship
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    Many(Vec<ResourceIdentifier>),
    One(ResourceIdentifier),
    #[default]
    Empty,
    /// Linkage that is not a resource identifier, e.g. the `{}` placeholder
    /// sent for a default TLS configuration
    Opaque(Value),
}

impl Linkage {
    pub fn identifiers(&self) -> &[ResourceIdentifier] {
        match self {
            Linkage::Many(ids) => ids,
            Linkage::One(id) => std::slice::from_ref(id),
            Linkage::Empty | Linkage::Opaque(_) => &[],
        }
    }
}

/// Entry of a JSON:API `errors` list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl std::fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.title, &self.detail) {
            (Some(title), Some(detail)) => write!(f, "{} - {}", title, detail),
            (Some(title), None) => write!(f, "{}", title),
            (None, Some(detail)) => write!(f, "{}", detail),
            (None, None) => write!(f, "unknown error"),
        }
    }
}
