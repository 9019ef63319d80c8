//! TLS subscription lifecycle engine
//!
//! Resolves Fastly TLS JSON:API responses into a typed resource graph and
//! drives the create, verify and delete workflows for a domain, producing
//! the DNS instructions that match the subscription's certificate state.

pub mod challenge;
pub mod graph;
pub mod lifecycle;
pub mod model;
pub mod report;

pub use challenge::{select_by_type, RecordDisplay, MANAGED_DNS, MANAGED_HTTP_A, MANAGED_HTTP_CNAME};
pub use graph::{Graph, GraphError};
pub use lifecycle::{LifecycleController, LifecycleError, Operation};
pub use model::{
    Activation, Authorization, Challenge, Resource, ResourceKey, Stage, Subscription,
    SubscriptionState, TlsDomain,
};
pub use report::{Entry, Report};
