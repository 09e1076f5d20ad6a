//! Cert and Tag data structures.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A free-form label attached to a cert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A certification topic page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cert {
    pub id: i64,

    /// URL-safe page path, e.g. `/test_tst101`
    pub path: String,

    /// Endpoint identifier bound to the page, e.g. `data.test_tst101`
    pub route: String,

    /// Display name
    pub name: String,

    /// Exam code as entered, e.g. `tst-101`
    pub code: String,

    pub date: String,

    /// Scheduled exam date, if any
    pub exam_date: Option<String>,

    pub head_img: String,
    pub badge_img: String,

    /// Visible in public listings
    pub published: bool,

    #[sqlx(skip)]
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Cert {
    /// The slug shared by path and route (`{name}_{code}`).
    pub fn slug(&self) -> &str {
        self.path.trim_start_matches('/')
    }

    /// Tag names in attachment order.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.name.as_str())
    }
}

/// Field values submitted to create a cert.
///
/// Tags arrive as a single comma-separated string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertForm {
    pub name: String,
    pub code: String,
    pub date: String,
    pub head_img: String,
    pub badge_img: String,
    #[serde(default)]
    pub exam_date: Option<String>,
    #[serde(default)]
    pub tags: String,
}

impl CertForm {
    /// Check the fields the slug and unique columns depend on.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::invalid_input("cert name is empty"));
        }
        if self.code.trim().is_empty() {
            return Err(AppError::invalid_input("cert code is empty"));
        }
        Ok(())
    }

    /// Split the tag string, trimming each piece and dropping blanks.
    pub fn tag_names(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    }
}

/// The `{name}_{code}` slug a cert's path and route are derived from.
///
/// Derived once at creation and stored; never recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertSlug(String);

impl CertSlug {
    /// Lowercase, spaces to underscores, hyphens stripped from the code.
    pub fn derive(name: &str, code: &str) -> Self {
        let name = name.replace(' ', "_").to_lowercase();
        let code = code.replace(' ', "_").to_lowercase().replace('-', "");
        Self(format!("{name}_{code}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Page path, e.g. `/test_tst101`.
    pub fn path(&self) -> String {
        format!("/{}", self.0)
    }

    /// Endpoint identifier under the given namespace, e.g. `data.test_tst101`.
    pub fn route(&self, namespace: &str) -> String {
        format!("{}.{}", namespace, self.0)
    }
}

/// A cert ready to be written, with path and route already derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCert {
    pub path: String,
    pub route: String,
    pub name: String,
    pub code: String,
    pub date: String,
    pub exam_date: Option<String>,
    pub head_img: String,
    pub badge_img: String,
    pub published: bool,
    pub tags: Vec<String>,
}

impl NewCert {
    /// Build an unpublished cert from submitted fields.
    pub fn from_form(form: &CertForm, namespace: &str) -> Result<Self> {
        form.validate()?;
        let slug = CertSlug::derive(&form.name, &form.code);

        Ok(Self {
            path: slug.path(),
            route: slug.route(namespace),
            name: form.name.clone(),
            code: form.code.clone(),
            date: form.date.clone(),
            exam_date: form
                .exam_date
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from),
            head_img: form.head_img.clone(),
            badge_img: form.badge_img.clone(),
            published: false,
            tags: form.tag_names(),
        })
    }

    pub fn slug(&self) -> &str {
        self.path.trim_start_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_form() -> CertForm {
        CertForm {
            name: "Test".to_string(),
            code: "tst-101".to_string(),
            date: "01/01/2000".to_string(),
            head_img: "test/test.jpg".to_string(),
            badge_img: "test/BADGE_test.png".to_string(),
            exam_date: Some(String::new()),
            tags: "test_tag".to_string(),
        }
    }

    #[test]
    fn test_slug_derivation() {
        let slug = CertSlug::derive("Test", "tst-101");
        assert_eq!(slug.as_str(), "test_tst101");
        assert_eq!(slug.path(), "/test_tst101");
        assert_eq!(slug.route("data"), "data.test_tst101");
    }

    #[test]
    fn test_slug_spaces_and_case() {
        let slug = CertSlug::derive("Solutions Architect", "SAA C-03");
        assert_eq!(slug.as_str(), "solutions_architect_saa_c03");
    }

    #[test]
    fn test_new_cert_from_form() {
        let cert = NewCert::from_form(&sample_form(), "data").unwrap();
        assert_eq!(cert.path, "/test_tst101");
        assert_eq!(cert.route, "data.test_tst101");
        assert_eq!(cert.slug(), "test_tst101");
        assert_eq!(cert.exam_date, None);
        assert!(!cert.published);
        assert_eq!(cert.tags, vec!["test_tag".to_string()]);
    }

    #[test]
    fn test_tag_splitting() {
        let form = CertForm {
            tags: " cloud, aws ,, associate ".to_string(),
            ..sample_form()
        };
        assert_eq!(form.tag_names(), vec!["cloud", "aws", "associate"]);
    }

    #[test]
    fn test_blank_code_rejected() {
        let form = CertForm {
            code: "  ".to_string(),
            ..sample_form()
        };
        assert!(NewCert::from_form(&form, "data").is_err());
    }
}
