//! Storage abstractions for catalog persistence.
//!
//! The content store keeps the five catalog entities with their uniqueness
//! constraints enforced at write time. Multi-row writes are transactional:
//! a failed check leaves nothing behind.
//!
//! ## Tables
//!
//! ```text
//! certs ──< cert_tags >── tags
//!   │
//!   ├──< resources            (course | video | article | documentation)
//!   │        ▲
//!   └──< courses ─────────────┘ resource_id
//!           │
//!           └──< sections
//! ```

pub mod snapshot;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Cert, Course, NewCert, Resource, ResourceDraft, ResourceField, ResourceKind, Section,
    SectionDraft, SectionUpdate,
};

// Re-export for convenience
pub use snapshot::{CatalogSnapshot, SnapshotStore, WriteMetadata};
pub use sqlite::SqliteStore;

/// Durable keyed storage for certs and their content.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Insert a cert and its tags.
    ///
    /// Fails with `AppError::Unique` naming the first colliding field
    /// (Name, Code, Path, Route) before any row is written.
    async fn insert_cert(&self, cert: NewCert) -> Result<Cert>;

    /// First field of a prospective cert that collides with a stored one.
    async fn cert_conflict(
        &self,
        name: &str,
        code: &str,
        path: &str,
        route: &str,
    ) -> Result<Option<&'static str>>;

    async fn cert_by_id(&self, id: i64) -> Result<Option<Cert>>;

    async fn cert_by_path(&self, path: &str) -> Result<Option<Cert>>;

    async fn cert_by_route(&self, route: &str) -> Result<Option<Cert>>;

    async fn cert_by_name_and_code(&self, name: &str, code: &str) -> Result<Option<Cert>>;

    /// Every cert, with tags, in storage order.
    async fn list_certs(&self) -> Result<Vec<Cert>>;

    /// Set the published flag. Returns whether the stored value changed.
    async fn mark_published(&self, cert_id: i64) -> Result<bool>;

    /// Insert a non-course resource.
    async fn insert_resource(&self, draft: ResourceDraft) -> Result<Resource>;

    /// First unique resource column (URL, then Title) already taken by any
    /// resource, including those wrapped by courses.
    async fn resource_conflict(&self, url: &str, title: &str) -> Result<Option<ResourceField>>;

    /// Resources of one kind belonging to a cert. Course descriptors are
    /// reached through `courses_for_cert`, not here.
    async fn resources_for_cert(&self, cert_id: i64, kind: ResourceKind) -> Result<Vec<Resource>>;

    /// Insert a course and its descriptor resource in one transaction.
    async fn insert_course(&self, draft: ResourceDraft) -> Result<Course>;

    async fn course_by_id(&self, id: i64) -> Result<Option<Course>>;

    async fn courses_for_cert(&self, cert_id: i64) -> Result<Vec<Course>>;

    async fn insert_section(&self, draft: SectionDraft) -> Result<Section>;

    async fn section_by_id(&self, id: i64) -> Result<Option<Section>>;

    async fn sections_for_course(&self, course_id: i64) -> Result<Vec<Section>>;

    /// Overwrite a section's progress flags and return the stored row.
    async fn update_section(&self, id: i64, update: SectionUpdate) -> Result<Section>;
}
