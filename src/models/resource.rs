//! Learning resources attached to a cert.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use thiserror::Error;

/// What kind of learning asset a resource is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Course,
    Video,
    Article,
    Documentation,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Course,
        ResourceKind::Video,
        ResourceKind::Article,
        ResourceKind::Documentation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Course => "course",
            ResourceKind::Video => "video",
            ResourceKind::Article => "article",
            ResourceKind::Documentation => "documentation",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown resource type '{0}'")]
pub struct UnknownResourceKind(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownResourceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownResourceKind(s.to_string()))
    }
}

/// A single learning asset, or the descriptor a course wraps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: i64,
    pub cert_id: i64,
    #[serde(rename = "resource_type")]
    pub kind: ResourceKind,
    pub url: String,
    pub title: String,
    pub image: String,
    pub description: String,
    pub site_logo: String,
    pub site_name: String,
    pub has_og_data: bool,
    /// Creation time, `%m/%d/%Y:%H:%M:%S`
    pub timestamp: String,
}

impl Resource {
    /// Read a resource whose primary key sits in `id_column`.
    ///
    /// Joined course rows alias the resource key so it can't clash with the
    /// course's own `id`.
    pub(crate) fn from_columns(row: &SqliteRow, id_column: &str) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("resource_type")?;
        let kind = kind
            .parse::<ResourceKind>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Self {
            id: row.try_get(id_column)?,
            cert_id: row.try_get("cert_id")?,
            kind,
            url: row.try_get("url")?,
            title: row.try_get("title")?,
            image: row.try_get("image")?,
            description: row.try_get("description")?,
            site_logo: row.try_get("site_logo")?,
            site_name: row.try_get("site_name")?,
            has_og_data: row.try_get("has_og_data")?,
            timestamp: row.try_get("timestamp")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for Resource {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Self::from_columns(row, "id")
    }
}

/// Field values submitted to add a resource (or course) to a cert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDraft {
    pub cert_id: i64,
    #[serde(rename = "resource_type")]
    pub kind: ResourceKind,
    pub url: String,
    pub title: String,
    pub image: String,
    pub description: String,
    pub site_logo: String,
    pub site_name: String,
    #[serde(default)]
    pub has_og_data: bool,
}

/// Unique resource columns, in the order collisions are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceField {
    Url,
    Title,
}

impl ResourceField {
    pub fn label(&self) -> &'static str {
        match self {
            ResourceField::Url => "URL",
            ResourceField::Title => "Title",
        }
    }
}

impl fmt::Display for ResourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
