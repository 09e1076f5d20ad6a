//! Course and Section data structures.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::models::Resource;

/// A full-length course on a cert page.
///
/// The descriptive fields live in a `course`-typed resource row, so URL and
/// title uniqueness is shared with every other resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub cert_id: i64,
    pub complete: bool,
    pub resource: Resource,
}

impl<'r> FromRow<'r, SqliteRow> for Course {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            cert_id: row.try_get("cert_id")?,
            complete: row.try_get("complete")?,
            resource: Resource::from_columns(row, "resource_id")?,
        })
    }
}

/// A subdivision of a course, tracked for flashcards and completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Section {
    pub id: i64,
    pub course_id: i64,
    pub number: i64,
    pub title: String,
    pub cards_made: bool,
    pub complete: bool,
    pub timestamp: String,
}

/// Field values submitted to add a section to a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDraft {
    pub course_id: i64,
    pub number: i64,
    pub title: String,
}

/// Progress flags written by a section update. Both are always set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionUpdate {
    #[serde(default)]
    pub cards_made: bool,
    #[serde(default)]
    pub complete: bool,
}
