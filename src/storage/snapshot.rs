//! Published catalog snapshot.
//!
//! A static JSON rendition of the published certs, written for front-ends
//! that list the catalog without querying the content store.
//!
//! ```text
//! {storage_dir}/
//! └── catalog.json    # { updated_at, count, certs: [...] }
//! ```

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Cert;
use crate::utils::fs;

/// Metadata about a snapshot write.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// Number of certs written
    pub count: usize,
    /// Where the snapshot landed
    pub location: PathBuf,
    /// Timestamp of the write
    pub timestamp: DateTime<Utc>,
}

/// Contents of the snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// ISO 8601 timestamp of last update
    pub updated_at: DateTime<Utc>,
    /// Total cert count
    pub count: usize,
    /// The published certs
    pub certs: Vec<Cert>,
}

impl CatalogSnapshot {
    pub fn new(certs: Vec<Cert>) -> Self {
        Self {
            updated_at: Utc::now(),
            count: certs.len(),
            certs,
        }
    }
}

/// Reads and writes the snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Replace the snapshot with the given certs. Unpublished certs are
    /// dropped.
    pub async fn write(&self, certs: &[Cert]) -> Result<WriteMetadata> {
        let published: Vec<Cert> = certs.iter().filter(|c| c.published).cloned().collect();
        let snapshot = CatalogSnapshot::new(published);

        fs::write_json(&self.path, &snapshot).await?;
        log::info!(
            "Catalog snapshot: {} certs written to {}",
            snapshot.count,
            self.path.display()
        );

        Ok(WriteMetadata {
            count: snapshot.count,
            location: self.path.clone(),
            timestamp: snapshot.updated_at,
        })
    }

    /// Load the snapshot's certs; a missing file is an empty catalog.
    pub async fn load(&self) -> Result<Vec<Cert>> {
        match fs::read_json::<CatalogSnapshot>(&self.path).await? {
            Some(snapshot) => Ok(snapshot.certs),
            None => {
                log::warn!("No catalog snapshot found at {}", self.path.display());
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cert(id: i64, name: &str, published: bool) -> Cert {
        Cert {
            id,
            path: format!("/{}_c{}", name.to_lowercase(), id),
            route: format!("data.{}_c{}", name.to_lowercase(), id),
            name: name.to_string(),
            code: format!("c-{id}"),
            date: "01/01/2000".to_string(),
            exam_date: None,
            head_img: "head.png".to_string(),
            badge_img: "badge.png".to_string(),
            published,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_write_keeps_only_published() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().join("catalog.json"));

        let meta = store
            .write(&[cert(1, "Alpha", true), cert(2, "Beta", false)])
            .await
            .unwrap();
        assert_eq!(meta.count, 1);

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Alpha");
    }

    #[tokio::test]
    async fn test_load_missing_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().join("catalog.json"));
        assert!(store.load().await.unwrap().is_empty());
    }
}
