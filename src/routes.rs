//! Route registry: the externally owned set of live endpoints.
//!
//! Route registration happens outside the catalog (an operator adds the page
//! and redeploys). The catalog only reads membership, and always re-reads it,
//! because the set may change between requests.
//!
//! ## Registry file
//!
//! ```toml
//! [[route]]
//! endpoint = "data.test_tst101"
//! path = "/test_tst101"
//! registered = true
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::utils::fs;

/// One endpoint known to the routing layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Endpoint identifier, e.g. `data.test_tst101`
    pub endpoint: String,

    /// URL path served by the endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default = "default_registered")]
    pub registered: bool,
}

fn default_registered() -> bool {
    true
}

impl RouteEntry {
    pub fn new(endpoint: impl Into<String>, path: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            path,
            registered: true,
        }
    }
}

/// Read-only view of the registered endpoints.
#[async_trait]
pub trait RouteRegistry: Send + Sync {
    /// Enumerate every known endpoint with its registration state.
    async fn endpoints(&self) -> Result<Vec<RouteEntry>>;

    /// Whether `identifier` is a currently registered endpoint.
    async fn contains(&self, identifier: &str) -> Result<bool> {
        Ok(self
            .endpoints()
            .await?
            .iter()
            .any(|entry| entry.registered && entry.endpoint == identifier))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RouteFile {
    #[serde(default, rename = "route")]
    routes: Vec<RouteEntry>,
}

/// Registry backed by a TOML file, re-read on every query.
#[derive(Debug, Clone)]
pub struct FileRouteRegistry {
    path: PathBuf,
}

impl FileRouteRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read(&self) -> Result<RouteFile> {
        match fs::read_toml::<RouteFile>(&self.path).await? {
            Some(file) => Ok(file),
            None => {
                log::warn!("No route registry found at {}", self.path.display());
                Ok(RouteFile::default())
            }
        }
    }

    /// Record an endpoint as registered. Returns false if it already was.
    ///
    /// Operator tooling only; the publishing workflow never registers routes.
    pub async fn register(&self, endpoint: &str, path: Option<String>) -> Result<bool> {
        let mut file = self.read().await?;

        let added = match file.routes.iter_mut().find(|e| e.endpoint == endpoint) {
            Some(entry) if entry.registered => false,
            Some(entry) => {
                entry.registered = true;
                if path.is_some() {
                    entry.path = path;
                }
                true
            }
            None => {
                file.routes.push(RouteEntry::new(endpoint, path));
                true
            }
        };

        if added {
            fs::write_toml(&self.path, &file).await?;
            log::info!("Registered route {} in {}", endpoint, self.path.display());
        }
        Ok(added)
    }
}

#[async_trait]
impl RouteRegistry for FileRouteRegistry {
    async fn endpoints(&self) -> Result<Vec<RouteEntry>> {
        Ok(self.read().await?.routes)
    }
}

/// In-process registry; `insert` stands in for a redeploy.
#[derive(Debug, Default)]
pub struct StaticRouteRegistry {
    entries: RwLock<BTreeMap<String, bool>>,
}

impl StaticRouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the given endpoints registered.
    pub fn with_endpoints<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = endpoints.into_iter().map(|e| (e.into(), true)).collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn insert(&self, endpoint: impl Into<String>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(endpoint.into(), true);
    }

    /// Keep the endpoint known but mark it unregistered.
    pub fn withdraw(&self, endpoint: &str) {
        if let Some(registered) = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(endpoint)
        {
            *registered = false;
        }
    }
}

#[async_trait]
impl RouteRegistry for StaticRouteRegistry {
    async fn endpoints(&self) -> Result<Vec<RouteEntry>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .iter()
            .map(|(endpoint, registered)| RouteEntry {
                endpoint: endpoint.clone(),
                path: None,
                registered: *registered,
            })
            .collect())
    }
}
