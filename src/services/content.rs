//! Resource, course and section creation.

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Course, Resource, ResourceDraft, ResourceKind, Section, SectionDraft, SectionUpdate};
use crate::storage::ContentStore;

/// What a resource draft turned into.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "created", rename_all = "lowercase")]
pub enum CreatedContent {
    Course(Course),
    Resource(Resource),
}

impl CreatedContent {
    pub fn title(&self) -> &str {
        match self {
            CreatedContent::Course(course) => &course.resource.title,
            CreatedContent::Resource(resource) => &resource.title,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            CreatedContent::Course(_) => ResourceKind::Course,
            CreatedContent::Resource(resource) => resource.kind,
        }
    }

    /// Operator-facing note, e.g. `Video My Talk created successfully`.
    pub fn message(&self) -> String {
        let kind = self.kind().as_str();
        let mut label = kind.to_string();
        if let Some(first) = label.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        format!("{} {} created successfully", label, self.title())
    }
}

/// Adds learning content to existing certs.
pub struct ContentService<'a> {
    store: &'a dyn ContentStore,
}

impl<'a> ContentService<'a> {
    pub fn new(store: &'a dyn ContentStore) -> Self {
        Self { store }
    }

    /// Store a draft as a course or a plain resource, by its kind.
    ///
    /// URL and title collisions with any existing resource, course
    /// descriptors included, fail with `AppError::Unique`.
    pub async fn create_resource(&self, draft: ResourceDraft) -> Result<CreatedContent> {
        if draft.url.trim().is_empty() {
            return Err(AppError::invalid_input("resource URL is empty"));
        }
        if draft.title.trim().is_empty() {
            return Err(AppError::invalid_input("resource title is empty"));
        }
        if self.store.cert_by_id(draft.cert_id).await?.is_none() {
            return Err(AppError::not_found("Cert", draft.cert_id));
        }

        let created = match draft.kind {
            ResourceKind::Course => CreatedContent::Course(self.store.insert_course(draft).await?),
            _ => CreatedContent::Resource(self.store.insert_resource(draft).await?),
        };

        log::info!("{}", created.message());
        Ok(created)
    }

    pub async fn create_section(&self, draft: SectionDraft) -> Result<Section> {
        if draft.title.trim().is_empty() {
            return Err(AppError::invalid_input("section title is empty"));
        }
        if self.store.course_by_id(draft.course_id).await?.is_none() {
            return Err(AppError::not_found("Course", draft.course_id));
        }

        let section = self.store.insert_section(draft).await?;
        log::info!("Section {} {} created", section.number, section.title);
        Ok(section)
    }

    /// Set both progress flags on a section.
    pub async fn update_section(&self, id: i64, update: SectionUpdate) -> Result<Section> {
        let section = self.store.update_section(id, update).await?;
        log::info!(
            "Section {} updated (cards_made={}, complete={})",
            section.title,
            section.cards_made,
            section.complete
        );
        Ok(section)
    }
}
