// src/models/mod.rs

//! Domain models for the cert tracker.
//!
//! Entities persisted by the content store, the drafts submitted to create
//! them, and the application configuration.

mod cert;
mod config;
mod course;
mod resource;

// Re-export all public types
pub use cert::{Cert, CertForm, CertSlug, NewCert, Tag};
pub use config::{
    Config, DatabaseConfig, ExportConfig, LoggingConfig, OpenGraphConfig, RoutesConfig,
};
pub use course::{Course, Section, SectionDraft, SectionUpdate};
pub use resource::{Resource, ResourceDraft, ResourceField, ResourceKind, UnknownResourceKind};
