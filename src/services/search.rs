//! Cert search over the published catalog.

use crate::error::{AppError, Result};
use crate::models::Cert;
use crate::storage::ContentStore;

/// Where a query matched a cert, checked in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    Path,
    Name,
    Code,
    Tag,
}

/// First field of `cert` containing `query`, or `None`.
///
/// Case-sensitive substring match; later fields aren't checked once one
/// matches.
pub fn match_field(cert: &Cert, query: &str) -> Option<MatchField> {
    if cert.path.contains(query) {
        Some(MatchField::Path)
    } else if cert.name.contains(query) {
        Some(MatchField::Name)
    } else if cert.code.contains(query) {
        Some(MatchField::Code)
    } else if cert.tag_names().any(|tag| tag.contains(query)) {
        Some(MatchField::Tag)
    } else {
        None
    }
}

/// Published certs matching `query`, each at most once, in store order.
pub async fn find(store: &dyn ContentStore, query: &str) -> Result<Vec<Cert>> {
    if query.is_empty() {
        return Err(AppError::invalid_input("search term is empty"));
    }

    let results: Vec<Cert> = find_published(store)
        .await?
        .into_iter()
        .filter(|cert| match_field(cert, query).is_some())
        .collect();

    log::debug!("Search '{}' matched {} cert(s)", query, results.len());
    Ok(results)
}

/// Every published cert, in store order.
pub async fn find_published(store: &dyn ContentStore) -> Result<Vec<Cert>> {
    let mut certs = store.list_certs().await?;
    certs.retain(|cert| cert.published);
    Ok(certs)
}

/// Certs still waiting on their route.
pub async fn find_unpublished(store: &dyn ContentStore) -> Result<Vec<Cert>> {
    let mut certs = store.list_certs().await?;
    certs.retain(|cert| !cert.published);
    Ok(certs)
}
