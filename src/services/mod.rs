//! Service layer for the cert catalog.
//!
//! - Publishing (`PublishingCoordinator`)
//! - Cert page aggregation (`catalog::fetch_cert_view`)
//! - Search (`search::find`)
//! - Resource, course and section creation (`ContentService`)
//! - OpenGraph prefill (`OpenGraphFetcher`)

pub mod catalog;
mod content;
#[cfg(feature = "opengraph")]
mod opengraph;
mod publishing;
pub mod search;

pub use catalog::{CertView, CourseView};
pub use content::{ContentService, CreatedContent};
#[cfg(feature = "opengraph")]
pub use opengraph::{OpenGraphData, OpenGraphFetcher};
pub use publishing::{
    CertCreated, PublishRejection, PublishResult, PublishState, PublishingCoordinator,
};
