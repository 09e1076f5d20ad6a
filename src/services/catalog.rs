//! Cert page aggregation.
//!
//! Views are re-derived from the store on every call so they always reflect
//! the latest writes.

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Cert, Course, Resource, ResourceKind, Section};
use crate::storage::ContentStore;

/// A course with its sections, as shown on a cert page.
#[derive(Debug, Clone, Serialize)]
pub struct CourseView {
    #[serde(flatten)]
    pub course: Course,
    pub sections: Vec<Section>,
}

/// Everything a cert page shows, grouped by resource kind.
#[derive(Debug, Clone, Serialize)]
pub struct CertView {
    pub cert: Cert,
    pub courses: Vec<CourseView>,
    pub videos: Vec<Resource>,
    pub articles: Vec<Resource>,
    pub documentation: Vec<Resource>,
}

impl CertView {
    /// Page title.
    pub fn title(&self) -> String {
        format!("CT: {}", self.cert.name)
    }

    /// Number of entries of one kind on the page.
    pub fn count(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Course => self.courses.len(),
            ResourceKind::Video => self.videos.len(),
            ResourceKind::Article => self.articles.len(),
            ResourceKind::Documentation => self.documentation.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        ResourceKind::ALL.iter().all(|kind| self.count(*kind) == 0)
    }
}

/// Collect a cert's courses (with sections) and resources.
pub async fn fetch_cert_view(store: &dyn ContentStore, cert: Cert) -> Result<CertView> {
    let mut courses = Vec::new();
    for course in store.courses_for_cert(cert.id).await? {
        let sections = store.sections_for_course(course.id).await?;
        courses.push(CourseView { course, sections });
    }

    let videos = store.resources_for_cert(cert.id, ResourceKind::Video).await?;
    let articles = store
        .resources_for_cert(cert.id, ResourceKind::Article)
        .await?;
    let documentation = store
        .resources_for_cert(cert.id, ResourceKind::Documentation)
        .await?;

    Ok(CertView {
        cert,
        courses,
        videos,
        articles,
        documentation,
    })
}

/// Look a cert up by page path and aggregate it.
pub async fn fetch_cert_view_by_path(store: &dyn ContentStore, path: &str) -> Result<CertView> {
    let cert = store
        .cert_by_path(path)
        .await?
        .ok_or_else(|| AppError::not_found("Cert", path))?;
    fetch_cert_view(store, cert).await
}
