//! Publishing coordinator.
//!
//! Keeps a cert's `published` flag in step with the externally observed
//! route registry. It never registers routes itself: a cert becomes
//! publishable once an operator has deployed its page.

use std::fmt;

use crate::error::Result;
use crate::models::{Cert, CertForm, NewCert};
use crate::routes::RouteRegistry;
use crate::services::search;
use crate::storage::ContentStore;

/// Publish state decided when a cert is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishState {
    /// The cert's route was already live
    Published,
    /// The route must be registered before the cert can be published
    NeedsRoute { slug: String, route: String },
}

/// A freshly stored cert and how its publish state was decided.
#[derive(Debug, Clone)]
pub struct CertCreated {
    pub cert: Cert,
    pub state: PublishState,
}

impl CertCreated {
    /// Operator-facing note describing the outcome.
    pub fn message(&self) -> String {
        match &self.state {
            PublishState::Published => "Cert has been published".to_string(),
            PublishState::NeedsRoute { slug, route } => format!(
                "Cert created successfully. Register route '{route}' (slug '{slug}') to allow publishing"
            ),
        }
    }
}

/// Why a publish request changed nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishRejection {
    /// The identifier is not a registered endpoint
    RouteNotFound(String),
    /// The endpoint is live but no cert is bound to it
    NoCertForRoute(String),
}

impl fmt::Display for PublishRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishRejection::RouteNotFound(route) => write!(
                f,
                "Unable to publish cert as route '{route}' does not exist"
            ),
            PublishRejection::NoCertForRoute(route) => write!(
                f,
                "Unable to publish cert as no cert is bound to route '{route}'"
            ),
        }
    }
}

/// Result of a publish request.
#[derive(Debug, Clone)]
pub enum PublishResult {
    /// The cert is published. `changed` is false if it already was.
    Published { cert: Cert, changed: bool },
    /// Nothing was mutated; carries the current unpublished set for
    /// re-display.
    Rejected {
        reason: PublishRejection,
        unpublished: Vec<Cert>,
    },
}

impl PublishResult {
    pub fn is_published(&self) -> bool {
        matches!(self, PublishResult::Published { .. })
    }

    pub fn message(&self) -> String {
        match self {
            PublishResult::Published { .. } => "Cert published successfully".to_string(),
            PublishResult::Rejected { reason, .. } => reason.to_string(),
        }
    }
}

/// Bridges stored certs and the live route registry.
pub struct PublishingCoordinator<'a> {
    store: &'a dyn ContentStore,
    registry: &'a dyn RouteRegistry,
    namespace: String,
}

impl<'a> PublishingCoordinator<'a> {
    pub fn new(
        store: &'a dyn ContentStore,
        registry: &'a dyn RouteRegistry,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            store,
            registry,
            namespace: namespace.into(),
        }
    }

    /// Route namespace new certs are created under.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Mark a not-yet-stored cert published iff its route is live right now.
    pub async fn evaluate_publish_on_create(&self, cert: &mut NewCert) -> Result<PublishState> {
        cert.published = self.registry.contains(&cert.route).await?;

        if cert.published {
            Ok(PublishState::Published)
        } else {
            Ok(PublishState::NeedsRoute {
                slug: cert.slug().to_string(),
                route: cert.route.clone(),
            })
        }
    }

    /// Derive, evaluate and store a new cert.
    ///
    /// Collisions on name, code, path or route fail with `AppError::Unique`
    /// and write nothing.
    pub async fn create_cert(&self, form: &CertForm) -> Result<CertCreated> {
        let mut cert = NewCert::from_form(form, &self.namespace)?;
        let state = self.evaluate_publish_on_create(&mut cert).await?;
        let cert = self.store.insert_cert(cert).await?;

        match &state {
            PublishState::Published => {
                log::info!("Created cert {} ({}), route live: published", cert.name, cert.route)
            }
            PublishState::NeedsRoute { route, .. } => {
                log::info!("Created cert {} ({}), awaiting route {}", cert.name, cert.path, route)
            }
        }

        Ok(CertCreated { cert, state })
    }

    /// Publish the cert bound to a registered endpoint.
    ///
    /// Idempotent for already-published certs. An identifier that is not a
    /// live endpoint, or that no cert is bound to, mutates nothing.
    pub async fn publish_by_route_identifier(&self, identifier: &str) -> Result<PublishResult> {
        let identifier = identifier.trim();

        if !self.registry.contains(identifier).await? {
            log::warn!("Publish rejected: route '{}' is not registered", identifier);
            return self
                .reject(PublishRejection::RouteNotFound(identifier.to_string()))
                .await;
        }

        let Some(mut cert) = self.store.cert_by_route(identifier).await? else {
            log::warn!("Publish rejected: no cert bound to route '{}'", identifier);
            return self
                .reject(PublishRejection::NoCertForRoute(identifier.to_string()))
                .await;
        };

        let changed = self.store.mark_published(cert.id).await?;
        cert.published = true;

        if changed {
            log::info!("Published cert {} via {}", cert.name, identifier);
        } else {
            log::debug!("Cert {} already published", cert.name);
        }

        Ok(PublishResult::Published { cert, changed })
    }

    async fn reject(&self, reason: PublishRejection) -> Result<PublishResult> {
        let unpublished = search::find_unpublished(self.store).await?;
        Ok(PublishResult::Rejected {
            reason,
            unpublished,
        })
    }
}
