//! Subscription lifecycle controller
//!
//! Orchestrates create, verify and delete for a single domain. Calls are
//! issued sequentially because later requests need ids taken from earlier
//! responses. The first failure aborts the operation; no partial report is
//! returned.

use fastly_tls_api::{ApiError, TlsApi};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::challenge::{MANAGED_DNS, MANAGED_HTTP_A, MANAGED_HTTP_CNAME};
use crate::graph::{Graph, GraphError};
use crate::model::{Authorization, Stage, Subscription, SubscriptionState};
use crate::report::Report;

/// Errors that abort a lifecycle operation
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to resolve Fastly API response: {0}")]
    Graph(#[from] GraphError),

    #[error("Fastly API response for domain {domain} contains no TLS subscription")]
    MissingSubscription { domain: String },

    #[error("TLS subscription {subscription_id} for domain {domain} has no authorizations")]
    MissingAuthorization {
        domain: String,
        subscription_id: String,
    },
}

/// Operation requested by the CLI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Verify,
    Delete,
}

/// Drives one lifecycle operation against a [`TlsApi`]
pub struct LifecycleController<A> {
    api: A,
}

impl<A: TlsApi> LifecycleController<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn run(&self, operation: Operation, domain: &str) -> Result<Report, LifecycleError> {
        match operation {
            Operation::Create => self.create(domain).await,
            Operation::Verify => self.verify(domain).await,
            Operation::Delete => self.delete(domain).await,
        }
    }

    /// Create a subscription for `domain` and describe the records to publish
    pub async fn create(&self, domain: &str) -> Result<Report, LifecycleError> {
        info!(domain = %domain, "Creating TLS subscription");
        let graph = Graph::sync(self.api.create_subscription(domain).await?)?;

        let subscription = graph.primary_subscriptions().into_iter().next().ok_or_else(|| {
            LifecycleError::MissingSubscription {
                domain: domain.to_string(),
            }
        })?;
        let authorization = first_authorization(&graph, subscription, domain)?;
        debug!(
            domain = %domain,
            subscription_id = %subscription.id,
            state = ?subscription.state,
            "TLS subscription created"
        );

        let mut report = Report::new();
        guidance(
            &mut report,
            domain,
            subscription.state.as_ref(),
            Some(authorization),
        );
        Ok(report)
    }

    /// Report the certificate state of `domain`
    pub async fn verify(&self, domain: &str) -> Result<Report, LifecycleError> {
        let listing = Graph::sync(self.api.list_domains().await?)?;
        debug!(
            domains = listing.primary_domains().len(),
            "Located TLS domains linked to the account"
        );

        let mut report = Report::new();
        let Some(tls_domain) = listing.domain(domain) else {
            not_supported(&mut report, domain);
            return Ok(report);
        };
        let Some(subscription_id) = tls_domain.subscription_ids().next() else {
            not_supported(&mut report, domain);
            return Ok(report);
        };

        // A subscription referenced without an included body is fetched for its state
        let fetched;
        let (graph, subscription) = match listing.subscription(subscription_id) {
            Some(subscription) => (&listing, subscription),
            None => {
                debug!(
                    domain = %domain,
                    subscription_id = %subscription_id,
                    "TLS subscription not included in domain listing"
                );
                fetched = Graph::sync(self.api.get_subscription(subscription_id).await?)?;
                let subscription = fetched.subscription(subscription_id).ok_or_else(|| {
                    LifecycleError::MissingSubscription {
                        domain: domain.to_string(),
                    }
                })?;
                (&fetched, subscription)
            }
        };

        let authorization = match subscription.stage() {
            Stage::Unsupported => None,
            _ => Some(first_authorization(graph, subscription, domain)?),
        };
        guidance(
            &mut report,
            domain,
            subscription.state.as_ref(),
            authorization,
        );

        if subscription.stage() != Stage::Unsupported {
            if tls_domain.activation_ids().next().is_none() {
                report.message(format!("TLS is not yet active for domain {}", domain));
            } else {
                report.message(format!("TLS is active for domain {}", domain));
            }
        }
        Ok(report)
    }

    /// Deactivate and remove the TLS subscription of `domain`
    ///
    /// The activation is always deleted before the subscription.
    pub async fn delete(&self, domain: &str) -> Result<Report, LifecycleError> {
        let graph = Graph::sync(self.api.list_domains().await?)?;
        debug!(
            domains = graph.primary_domains().len(),
            "Located TLS domains linked to the account"
        );

        let mut report = Report::new();
        let Some(tls_domain) = graph.domain(domain) else {
            not_supported(&mut report, domain);
            return Ok(report);
        };
        // Ids come from the relationship stubs so an activation whose body was
        // not included is still removed before its subscription
        let Some(subscription_id) = tls_domain.subscription_ids().next() else {
            not_supported(&mut report, domain);
            return Ok(report);
        };

        match tls_domain.activation_ids().next() {
            Some(activation_id) => {
                info!(domain = %domain, activation_id = %activation_id, "Deleting TLS activation");
                self.api.delete_activation(activation_id).await?;
                report.message(format!(
                    "TLS subscription for domain {} has been deactivated",
                    domain
                ));
            }
            None => {
                report.message(format!(
                    "TLS subscription for domain {} was not active",
                    domain
                ));
            }
        }

        info!(domain = %domain, subscription_id = %subscription_id, "Deleting TLS subscription");
        self.api.delete_subscription(subscription_id).await?;
        report.message(format!(
            "TLS subscription for domain {} has been removed",
            domain
        ));
        report.message("This domain will no longer support TLS");

        Ok(report)
    }

    /// Summarize every subscription on the account
    pub async fn list(&self) -> Result<Report, LifecycleError> {
        let graph = Graph::sync(self.api.list_subscriptions().await?)?;
        let subscriptions = graph.primary_subscriptions();

        let mut report = Report::new();
        if subscriptions.is_empty() {
            report.message("No TLS subscriptions found");
            return Ok(report);
        }

        for subscription in subscriptions {
            let state = subscription
                .state
                .as_ref()
                .map(SubscriptionState::as_str)
                .unwrap_or("unknown");
            report.message(format!(
                "{}  {}  {}",
                subscription.id,
                state,
                graph.domain_names_of(subscription).join(", ")
            ));
        }
        Ok(report)
    }

    /// Guidance for one subscription fetched by id
    pub async fn show(&self, subscription_id: &str) -> Result<Report, LifecycleError> {
        let graph = Graph::sync(self.api.get_subscription(subscription_id).await?)?;
        let subscription = graph.subscription(subscription_id).ok_or_else(|| {
            LifecycleError::MissingSubscription {
                domain: subscription_id.to_string(),
            }
        })?;

        let domain = graph
            .domain_names_of(subscription)
            .into_iter()
            .next()
            .unwrap_or_else(|| subscription_id.to_string());

        let authorization = match subscription.stage() {
            Stage::Unsupported => None,
            _ => Some(first_authorization(&graph, subscription, &domain)?),
        };

        let mut report = Report::new();
        guidance(
            &mut report,
            &domain,
            subscription.state.as_ref(),
            authorization,
        );
        Ok(report)
    }
}

fn first_authorization<'g>(
    graph: &'g Graph,
    subscription: &Subscription,
    domain: &str,
) -> Result<&'g Authorization, LifecycleError> {
    graph
        .authorizations_of(subscription)
        .into_iter()
        .next()
        .ok_or_else(|| LifecycleError::MissingAuthorization {
            domain: domain.to_string(),
            subscription_id: subscription.id.clone(),
        })
}

fn not_supported(report: &mut Report, domain: &str) {
    warn!(domain = %domain, "Domain does not support TLS");
    report.warning(format!("Domain {} does not support TLS.", domain));
}

/// Route a subscription state to the records the owner has to publish
fn guidance(
    report: &mut Report,
    domain: &str,
    state: Option<&SubscriptionState>,
    authorization: Option<&Authorization>,
) {
    let challenges = authorization
        .map(|authorization| authorization.challenges.as_slice())
        .unwrap_or(&[]);

    match (Stage::of(state), state) {
        (Stage::AwaitingVerification, Some(state)) => {
            report.section(format!(
                "The domain {} is currently in a state of {} and the issuing of a certificate may take up to 30 minutes",
                domain, state
            ));
            report.section(
                "To start the domain verification process create a DNS CNAME record with the following values",
            );
            report.records(challenges, MANAGED_DNS);
            report.section(
                "Alongside the initial verification record configure the following CNAME record",
            );
            report.records(challenges, MANAGED_HTTP_CNAME);
            report.section(
                "As an alternative to using a CNAME record the following A record can be configured",
            );
            report.records(challenges, MANAGED_HTTP_A);
        }
        (Stage::Issued, Some(state)) => {
            report.section(format!(
                "The domain {} is currently in a state of {}. It could take up to an hour for the certificate to propagate globally.",
                domain, state
            ));
            report.section("To use the certificate configure the following CNAME record");
            report.records(challenges, MANAGED_HTTP_CNAME);
            report.section(
                "As an alternative to using a CNAME record the following A record can be configured",
            );
            report.records(challenges, MANAGED_HTTP_A);
        }
        _ => {
            debug!(domain = %domain, state = ?state, "Unrecognized subscription state");
            not_supported(report, domain);
        }
    }
}
