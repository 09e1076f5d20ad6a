//! SQLite content store.
//!
//! Unique columns are real constraints. Cert creation additionally runs an
//! ordered conflict check inside its transaction so the caller learns which
//! field collided. Checked writes open with `BEGIN IMMEDIATE`: the write lock
//! is held before the check runs, so a racing writer waits for the winner to
//! commit and then sees its row. A constraint failure outside a checked
//! write is mapped to the same `AppError::Unique`.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, Transaction};

use crate::error::{AppError, Result};
use crate::models::{
    Cert, Course, DatabaseConfig, NewCert, Resource, ResourceDraft, ResourceField, ResourceKind,
    Section, SectionDraft, SectionUpdate, Tag,
};
use crate::storage::ContentStore;
use crate::utils;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS certs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        path TEXT NOT NULL UNIQUE,
        route TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL UNIQUE,
        code TEXT NOT NULL UNIQUE,
        date TEXT NOT NULL,
        exam_date TEXT,
        head_img TEXT NOT NULL,
        badge_img TEXT NOT NULL,
        published INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS cert_tags (
        cert_id INTEGER NOT NULL REFERENCES certs(id),
        tag_id INTEGER NOT NULL REFERENCES tags(id),
        PRIMARY KEY (cert_id, tag_id)
    )",
    "CREATE TABLE IF NOT EXISTS resources (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        cert_id INTEGER NOT NULL REFERENCES certs(id),
        resource_type TEXT NOT NULL
            CHECK (resource_type IN ('course', 'video', 'article', 'documentation')),
        url TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL UNIQUE,
        image TEXT NOT NULL,
        description TEXT NOT NULL,
        site_logo TEXT NOT NULL,
        site_name TEXT NOT NULL,
        has_og_data INTEGER NOT NULL DEFAULT 0,
        timestamp TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_resources_cert ON resources (cert_id, resource_type)",
    "CREATE TABLE IF NOT EXISTS courses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        cert_id INTEGER NOT NULL REFERENCES certs(id),
        resource_id INTEGER NOT NULL UNIQUE REFERENCES resources(id),
        complete INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS sections (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        course_id INTEGER NOT NULL REFERENCES courses(id),
        number INTEGER NOT NULL UNIQUE,
        title TEXT NOT NULL UNIQUE,
        cards_made INTEGER NOT NULL DEFAULT 0,
        complete INTEGER NOT NULL DEFAULT 0,
        timestamp TEXT NOT NULL
    )",
];

/// How long a writer waits for another writer's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

static UNIQUE_FAILURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"UNIQUE constraint failed: \w+\.(\w+)").expect("unique failure regex must compile")
});

const SELECT_CERT: &str = "SELECT id, path, route, name, code, date, exam_date, \
     head_img, badge_img, published FROM certs";

const SELECT_RESOURCE: &str = "SELECT id, cert_id, resource_type, url, title, image, \
     description, site_logo, site_name, has_og_data, timestamp FROM resources";

const SELECT_COURSE: &str = "SELECT c.id AS id, c.cert_id AS cert_id, c.complete AS complete, \
     r.id AS resource_id, r.resource_type AS resource_type, r.url AS url, r.title AS title, \
     r.image AS image, r.description AS description, r.site_logo AS site_logo, \
     r.site_name AS site_name, r.has_og_data AS has_og_data, r.timestamp AS timestamp \
     FROM courses c JOIN resources r ON r.id = c.resource_id";

const SELECT_SECTION: &str =
    "SELECT id, course_id, number, title, cards_made, complete, timestamp FROM sections";

/// Content store backed by a SQLite connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) a database file.
    pub async fn open(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let path = path.as_ref();
        utils::fs::ensure_parent(path).await?;

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        log::debug!("Opened content store at {}", path.display());
        Self::with_pool(pool).await
    }

    /// Open a private in-memory database.
    ///
    /// Every SQLite memory connection is its own database, so the pool is
    /// pinned to one connection that is never recycled.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Open the store described by the `[database]` config section.
    pub async fn from_config(config: &DatabaseConfig, storage_dir: &Path) -> Result<Self> {
        if config.is_memory() {
            Self::open_in_memory().await
        } else {
            Self::open(config.path(storage_dir), config.max_connections).await
        }
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    async fn create_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Underlying pool, for callers that need raw queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a transaction that already holds the database write lock.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    async fn tags_for_cert(&self, cert_id: i64) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            "SELECT t.id AS id, t.name AS name FROM tags t \
             JOIN cert_tags ct ON ct.tag_id = t.id \
             WHERE ct.cert_id = ? ORDER BY t.id",
        )
        .bind(cert_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }

    async fn with_tags(&self, cert: Option<Cert>) -> Result<Option<Cert>> {
        match cert {
            Some(mut cert) => {
                cert.tags = self.tags_for_cert(cert.id).await?;
                Ok(Some(cert))
            }
            None => Ok(None),
        }
    }
}

/// Map a failed write to `AppError::Unique` when a unique constraint fired.
fn map_unique(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = unique_column(db_err.message())
                .map(|column| field_label(&column))
                .unwrap_or("Record");
            return AppError::unique(field);
        }
    }
    AppError::Database(err)
}

/// Column named by a SQLite `UNIQUE constraint failed: table.column` message.
fn unique_column(message: &str) -> Option<String> {
    UNIQUE_FAILURE
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn field_label(column: &str) -> &'static str {
    match column {
        "name" => "Name",
        "code" => "Code",
        "path" => "Path",
        "route" => "Route",
        "url" => ResourceField::Url.label(),
        "title" => ResourceField::Title.label(),
        "number" => "Number",
        "resource_id" => "Course",
        _ => "Record",
    }
}

async fn cert_conflict_on(
    conn: &mut SqliteConnection,
    name: &str,
    code: &str,
    path: &str,
    route: &str,
) -> Result<Option<&'static str>> {
    let checks = [
        ("name", "Name", name),
        ("code", "Code", code),
        ("path", "Path", path),
        ("route", "Route", route),
    ];

    for (column, label, value) in checks {
        let sql = format!("SELECT id FROM certs WHERE {column} = ? LIMIT 1");
        let hit: Option<i64> = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_optional(&mut *conn)
            .await?;
        if hit.is_some() {
            return Ok(Some(label));
        }
    }
    Ok(None)
}

async fn resource_conflict_on(
    conn: &mut SqliteConnection,
    url: &str,
    title: &str,
) -> Result<Option<ResourceField>> {
    let checks = [
        ("url", ResourceField::Url, url),
        ("title", ResourceField::Title, title),
    ];

    for (column, field, value) in checks {
        let sql = format!("SELECT id FROM resources WHERE {column} = ? LIMIT 1");
        let hit: Option<i64> = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_optional(&mut *conn)
            .await?;
        if hit.is_some() {
            return Ok(Some(field));
        }
    }
    Ok(None)
}

/// Insert a resource row with the given kind and return its id.
async fn insert_resource_on(
    conn: &mut SqliteConnection,
    draft: &ResourceDraft,
    kind: ResourceKind,
) -> Result<i64> {
    if let Some(field) = resource_conflict_on(&mut *conn, &draft.url, &draft.title).await? {
        return Err(AppError::unique(field.label()));
    }

    let id = sqlx::query(
        "INSERT INTO resources (cert_id, resource_type, url, title, image, description, \
         site_logo, site_name, has_og_data, timestamp) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(draft.cert_id)
    .bind(kind.as_str())
    .bind(&draft.url)
    .bind(&draft.title)
    .bind(&draft.image)
    .bind(&draft.description)
    .bind(&draft.site_logo)
    .bind(&draft.site_name)
    .bind(draft.has_og_data)
    .bind(utils::timestamp())
    .execute(&mut *conn)
    .await
    .map_err(map_unique)?
    .last_insert_rowid();

    Ok(id)
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn insert_cert(&self, cert: NewCert) -> Result<Cert> {
        let mut tx = self.begin_write().await?;

        if let Some(field) =
            cert_conflict_on(&mut tx, &cert.name, &cert.code, &cert.path, &cert.route).await?
        {
            return Err(AppError::unique(field));
        }

        let id = sqlx::query(
            "INSERT INTO certs (path, route, name, code, date, exam_date, head_img, \
             badge_img, published) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&cert.path)
        .bind(&cert.route)
        .bind(&cert.name)
        .bind(&cert.code)
        .bind(&cert.date)
        .bind(&cert.exam_date)
        .bind(&cert.head_img)
        .bind(&cert.badge_img)
        .bind(cert.published)
        .execute(&mut *tx)
        .await
        .map_err(map_unique)?
        .last_insert_rowid();

        for name in &cert.tags {
            let tag_id = sqlx::query("INSERT INTO tags (name) VALUES (?)")
                .bind(name)
                .execute(&mut *tx)
                .await?
                .last_insert_rowid();
            sqlx::query("INSERT INTO cert_tags (cert_id, tag_id) VALUES (?, ?)")
                .bind(id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        log::debug!("Stored cert {} ({}) with {} tags", id, cert.path, cert.tags.len());

        self.cert_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Cert", id))
    }

    async fn cert_conflict(
        &self,
        name: &str,
        code: &str,
        path: &str,
        route: &str,
    ) -> Result<Option<&'static str>> {
        let mut conn = self.pool.acquire().await?;
        cert_conflict_on(&mut conn, name, code, path, route).await
    }

    async fn cert_by_id(&self, id: i64) -> Result<Option<Cert>> {
        let sql = format!("{SELECT_CERT} WHERE id = ?");
        let cert = sqlx::query_as::<_, Cert>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        self.with_tags(cert).await
    }

    async fn cert_by_path(&self, path: &str) -> Result<Option<Cert>> {
        let sql = format!("{SELECT_CERT} WHERE path = ?");
        let cert = sqlx::query_as::<_, Cert>(&sql)
            .bind(path)
            .fetch_optional(&self.pool)
            .await?;
        self.with_tags(cert).await
    }

    async fn cert_by_route(&self, route: &str) -> Result<Option<Cert>> {
        let sql = format!("{SELECT_CERT} WHERE route = ?");
        let cert = sqlx::query_as::<_, Cert>(&sql)
            .bind(route)
            .fetch_optional(&self.pool)
            .await?;
        self.with_tags(cert).await
    }

    async fn cert_by_name_and_code(&self, name: &str, code: &str) -> Result<Option<Cert>> {
        let sql = format!("{SELECT_CERT} WHERE name = ? AND code = ?");
        let cert = sqlx::query_as::<_, Cert>(&sql)
            .bind(name)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        self.with_tags(cert).await
    }

    async fn list_certs(&self) -> Result<Vec<Cert>> {
        let sql = format!("{SELECT_CERT} ORDER BY id");
        let mut certs = sqlx::query_as::<_, Cert>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let links: Vec<(i64, i64, String)> = sqlx::query_as(
            "SELECT ct.cert_id, t.id, t.name FROM cert_tags ct \
             JOIN tags t ON t.id = ct.tag_id ORDER BY t.id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_cert: HashMap<i64, Vec<Tag>> = HashMap::new();
        for (cert_id, id, name) in links {
            by_cert.entry(cert_id).or_default().push(Tag { id, name });
        }
        for cert in &mut certs {
            cert.tags = by_cert.remove(&cert.id).unwrap_or_default();
        }

        Ok(certs)
    }

    async fn mark_published(&self, cert_id: i64) -> Result<bool> {
        let changed = sqlx::query("UPDATE certs SET published = 1 WHERE id = ? AND published = 0")
            .bind(cert_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if changed == 0 && self.cert_by_id(cert_id).await?.is_none() {
            return Err(AppError::not_found("Cert", cert_id));
        }
        Ok(changed > 0)
    }

    async fn insert_resource(&self, draft: ResourceDraft) -> Result<Resource> {
        if draft.kind == ResourceKind::Course {
            return Err(AppError::invalid_input(
                "course resources are stored through insert_course",
            ));
        }

        let mut tx = self.begin_write().await?;
        let id = insert_resource_on(&mut tx, &draft, draft.kind).await?;
        tx.commit().await?;

        let sql = format!("{SELECT_RESOURCE} WHERE id = ?");
        let resource = sqlx::query_as::<_, Resource>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(resource)
    }

    async fn resource_conflict(&self, url: &str, title: &str) -> Result<Option<ResourceField>> {
        let mut conn = self.pool.acquire().await?;
        resource_conflict_on(&mut conn, url, title).await
    }

    async fn resources_for_cert(&self, cert_id: i64, kind: ResourceKind) -> Result<Vec<Resource>> {
        let sql = format!("{SELECT_RESOURCE} WHERE cert_id = ? AND resource_type = ? ORDER BY id");
        let resources = sqlx::query_as::<_, Resource>(&sql)
            .bind(cert_id)
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(resources)
    }

    async fn insert_course(&self, draft: ResourceDraft) -> Result<Course> {
        let mut tx = self.begin_write().await?;

        let resource_id = insert_resource_on(&mut tx, &draft, ResourceKind::Course).await?;
        let id = sqlx::query("INSERT INTO courses (cert_id, resource_id, complete) VALUES (?, ?, 0)")
            .bind(draft.cert_id)
            .bind(resource_id)
            .execute(&mut *tx)
            .await
            .map_err(map_unique)?
            .last_insert_rowid();

        tx.commit().await?;

        self.course_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Course", id))
    }

    async fn course_by_id(&self, id: i64) -> Result<Option<Course>> {
        let sql = format!("{SELECT_COURSE} WHERE c.id = ?");
        let course = sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    async fn courses_for_cert(&self, cert_id: i64) -> Result<Vec<Course>> {
        let sql = format!("{SELECT_COURSE} WHERE c.cert_id = ? ORDER BY c.id");
        let courses = sqlx::query_as::<_, Course>(&sql)
            .bind(cert_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(courses)
    }

    async fn insert_section(&self, draft: SectionDraft) -> Result<Section> {
        let id = sqlx::query(
            "INSERT INTO sections (course_id, number, title, cards_made, complete, timestamp) \
             VALUES (?, ?, ?, 0, 0, ?)",
        )
        .bind(draft.course_id)
        .bind(draft.number)
        .bind(&draft.title)
        .bind(utils::timestamp())
        .execute(&self.pool)
        .await
        .map_err(map_unique)?
        .last_insert_rowid();

        self.section_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Section", id))
    }

    async fn section_by_id(&self, id: i64) -> Result<Option<Section>> {
        let sql = format!("{SELECT_SECTION} WHERE id = ?");
        let section = sqlx::query_as::<_, Section>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(section)
    }

    async fn sections_for_course(&self, course_id: i64) -> Result<Vec<Section>> {
        let sql = format!("{SELECT_SECTION} WHERE course_id = ? ORDER BY id");
        let sections = sqlx::query_as::<_, Section>(&sql)
            .bind(course_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(sections)
    }

    async fn update_section(&self, id: i64, update: SectionUpdate) -> Result<Section> {
        let changed = sqlx::query("UPDATE sections SET cards_made = ?, complete = ? WHERE id = ?")
            .bind(update.cards_made)
            .bind(update.complete)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if changed == 0 {
            return Err(AppError::not_found("Section", id));
        }
        self.section_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Section", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CertForm, ResourceKind};
    use tempfile::TempDir;

    fn form(name: &str, code: &str, tags: &str) -> CertForm {
        CertForm {
            name: name.to_string(),
            code: code.to_string(),
            date: "01/01/2000".to_string(),
            head_img: "test/test.jpg".to_string(),
            badge_img: "test/BADGE_test.png".to_string(),
            exam_date: None,
            tags: tags.to_string(),
        }
    }

    fn draft(cert_id: i64, kind: ResourceKind, url: &str, title: &str) -> ResourceDraft {
        ResourceDraft {
            cert_id,
            kind,
            url: url.to_string(),
            title: title.to_string(),
            image: "test/img.png".to_string(),
            description: "A test resource".to_string(),
            site_logo: "test.svg".to_string(),
            site_name: "Test".to_string(),
            has_og_data: false,
        }
    }

    async fn count(store: &SqliteStore, table: &str) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        sqlx::query_scalar(&sql)
            .fetch_one(store.pool())
            .await
            .unwrap()
    }

    async fn seeded() -> (SqliteStore, Cert) {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let cert = store
            .insert_cert(NewCert::from_form(&form("Test", "tst-101", "test_tag"), "data").unwrap())
            .await
            .unwrap();
        (store, cert)
    }

    #[test]
    fn test_unique_column_parsing() {
        assert_eq!(
            unique_column("UNIQUE constraint failed: resources.url"),
            Some("url".to_string())
        );
        assert_eq!(unique_column("FOREIGN KEY constraint failed"), None);
        assert_eq!(field_label("title"), "Title");
        assert_eq!(field_label("url"), "URL");
    }

    #[tokio::test]
    async fn test_insert_cert_roundtrip() {
        let (store, cert) = seeded().await;

        assert_eq!(cert.path, "/test_tst101");
        assert_eq!(cert.route, "data.test_tst101");
        assert!(!cert.published);
        assert_eq!(cert.tag_names().collect::<Vec<_>>(), vec!["test_tag"]);

        let by_path = store.cert_by_path("/test_tst101").await.unwrap().unwrap();
        let by_route = store.cert_by_route("data.test_tst101").await.unwrap().unwrap();
        let by_pair = store
            .cert_by_name_and_code("Test", "tst-101")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_path, cert);
        assert_eq!(by_route, cert);
        assert_eq!(by_pair, cert);
    }

    #[tokio::test]
    async fn test_duplicate_name_writes_nothing() {
        let (store, _) = seeded().await;

        let err = store
            .insert_cert(NewCert::from_form(&form("Test", "tst-102", "other"), "data").unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.unique_field(), Some("Name"));
        assert_eq!(count(&store, "certs").await, 1);
        assert_eq!(count(&store, "tags").await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_code_reported() {
        let (store, _) = seeded().await;

        let err = store
            .insert_cert(NewCert::from_form(&form("Other", "tst-101", ""), "data").unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Code must be unique");
        assert_eq!(count(&store, "certs").await, 1);
    }

    #[tokio::test]
    async fn test_path_collision_reported_when_name_and_code_differ() {
        let (store, _) = seeded().await;

        // Different case on both fields, same derived slug.
        let err = store
            .insert_cert(NewCert::from_form(&form("test", "TST-101", "other"), "data").unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Path must be unique");
        assert_eq!(count(&store, "certs").await, 1);
        assert_eq!(count(&store, "tags").await, 1);
    }

    #[tokio::test]
    async fn test_route_collision_reported_after_path() {
        let (store, _) = seeded().await;

        let mut cert = NewCert::from_form(&form("Other", "oth-1", ""), "data").unwrap();
        cert.route = "data.test_tst101".to_string();
        let err = store.insert_cert(cert).await.unwrap_err();

        assert_eq!(err.unique_field(), Some("Route"));
        assert_eq!(count(&store, "certs").await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_racing_creates_report_unique() {
        let tmp = TempDir::new().unwrap();
        let store = SqliteStore::open(tmp.path().join("certs.db"), 5).await.unwrap();

        for round in 0..25 {
            let name = format!("Race {round}");
            let first = NewCert::from_form(&form(&name, &format!("a-{round}"), ""), "data").unwrap();
            let second =
                NewCert::from_form(&form(&name, &format!("b-{round}"), ""), "data").unwrap();

            let (left, right) = tokio::join!(
                tokio::spawn({
                    let store = store.clone();
                    async move { store.insert_cert(first).await }
                }),
                tokio::spawn({
                    let store = store.clone();
                    async move { store.insert_cert(second).await }
                }),
            );
            let results = [left.unwrap(), right.unwrap()];

            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
            let err = results.into_iter().find_map(|r| r.err()).unwrap();
            assert_eq!(err.unique_field(), Some("Name"), "round {round}: {err}");
        }

        assert_eq!(count(&store, "certs").await, 25);
    }

    #[tokio::test]
    async fn test_list_certs_attaches_tags_in_order() {
        let (store, _) = seeded().await;
        store
            .insert_cert(NewCert::from_form(&form("Cloud", "clf-c02", "aws, cloud"), "data").unwrap())
            .await
            .unwrap();

        let certs = store.list_certs().await.unwrap();
        assert_eq!(certs.len(), 2);
        assert_eq!(certs[0].name, "Test");
        assert_eq!(certs[1].tag_names().collect::<Vec<_>>(), vec!["aws", "cloud"]);
    }

    #[tokio::test]
    async fn test_mark_published_reports_change() {
        let (store, cert) = seeded().await;

        assert!(store.mark_published(cert.id).await.unwrap());
        assert!(!store.mark_published(cert.id).await.unwrap());
        assert!(store.cert_by_id(cert.id).await.unwrap().unwrap().published);
        assert!(store.mark_published(999).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_resource_url_unique_across_courses() {
        let (store, cert) = seeded().await;

        store
            .insert_course(draft(cert.id, ResourceKind::Course, "http://test.test", "Course"))
            .await
            .unwrap();

        let err = store
            .insert_resource(draft(cert.id, ResourceKind::Video, "http://test.test", "Video"))
            .await
            .unwrap_err();
        assert_eq!(err.unique_field(), Some("URL"));

        assert_eq!(
            store.resource_conflict("http://other.test", "Course").await.unwrap(),
            Some(ResourceField::Title)
        );
        assert_eq!(
            store.resource_conflict("http://other.test", "Fresh").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_failed_course_leaves_no_rows() {
        let (store, cert) = seeded().await;
        store
            .insert_resource(draft(cert.id, ResourceKind::Video, "http://video.test", "Taken"))
            .await
            .unwrap();

        let err = store
            .insert_course(draft(cert.id, ResourceKind::Course, "http://course.test", "Taken"))
            .await
            .unwrap_err();

        assert_eq!(err.unique_field(), Some("Title"));
        assert_eq!(count(&store, "resources").await, 1);
        assert_eq!(count(&store, "courses").await, 0);
    }

    #[tokio::test]
    async fn test_resources_split_by_kind() {
        let (store, cert) = seeded().await;
        store
            .insert_course(draft(cert.id, ResourceKind::Course, "http://c.test", "C"))
            .await
            .unwrap();
        store
            .insert_resource(draft(cert.id, ResourceKind::Article, "http://a.test", "A"))
            .await
            .unwrap();

        let articles = store
            .resources_for_cert(cert.id, ResourceKind::Article)
            .await
            .unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "A");
        assert!(
            store
                .resources_for_cert(cert.id, ResourceKind::Video)
                .await
                .unwrap()
                .is_empty()
        );

        let courses = store.courses_for_cert(cert.id).await.unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].resource.kind, ResourceKind::Course);
        assert_eq!(courses[0].resource.title, "C");
        assert!(!courses[0].complete);
    }

    #[tokio::test]
    async fn test_insert_resource_rejects_course_kind() {
        let (store, cert) = seeded().await;
        let err = store
            .insert_resource(draft(cert.id, ResourceKind::Course, "http://c.test", "C"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_section_uniqueness_and_update() {
        let (store, cert) = seeded().await;
        let course = store
            .insert_course(draft(cert.id, ResourceKind::Course, "http://c.test", "C"))
            .await
            .unwrap();

        let section = store
            .insert_section(SectionDraft {
                course_id: course.id,
                number: 1,
                title: "Intro".to_string(),
            })
            .await
            .unwrap();
        assert!(!section.cards_made);
        assert!(!section.complete);

        let err = store
            .insert_section(SectionDraft {
                course_id: course.id,
                number: 1,
                title: "Another".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.unique_field(), Some("Number"));

        let updated = store
            .update_section(
                section.id,
                SectionUpdate {
                    cards_made: true,
                    complete: false,
                },
            )
            .await
            .unwrap();
        assert!(updated.cards_made);
        assert!(!updated.complete);
        assert_eq!(store.sections_for_course(course.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_file_store_persists() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db/certs.db");

        {
            let store = SqliteStore::open(&path, 2).await.unwrap();
            store
                .insert_cert(NewCert::from_form(&form("Test", "tst-101", ""), "data").unwrap())
                .await
                .unwrap();
            store.pool().close().await;
        }

        let reopened = SqliteStore::open(&path, 2).await.unwrap();
        assert_eq!(reopened.list_certs().await.unwrap().len(), 1);
    }
}
