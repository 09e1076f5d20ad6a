//! OpenGraph prefill for new resources.
//!
//! Reads `og:*` meta tags and the page icon so an operator only has to
//! confirm the fields. Any failure means "no data"; the resource can still
//! be entered by hand.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{OpenGraphConfig, ResourceDraft, ResourceKind};
use crate::utils::{self, http};

/// Metadata extracted from one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenGraphData {
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub site_name: Option<String>,
    pub site_logo: Option<String>,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::config(format!("invalid selector '{css}': {e:?}")))
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl OpenGraphData {
    /// Extract metadata from a parsed page fetched from `page_url`.
    ///
    /// Image and icon links are resolved against the page URL. The
    /// document `<title>` stands in for a missing `og:title`.
    pub fn parse(document: &Html, page_url: &str) -> Result<Self> {
        let meta = selector("meta[property], meta[name]")?;
        let icon = selector(r#"link[rel~="icon"]"#)?;
        let title = selector("title")?;

        let mut data = Self::default();
        for element in document.select(&meta) {
            let el = element.value();
            let Some(key) = el.attr("property").or_else(|| el.attr("name")) else {
                continue;
            };
            let Some(content) = el.attr("content").and_then(non_empty) else {
                continue;
            };

            let slot = match key {
                "og:url" => &mut data.url,
                "og:title" => &mut data.title,
                "og:description" => &mut data.description,
                "og:image" => &mut data.image,
                "og:site_name" => &mut data.site_name,
                _ => continue,
            };
            // First tag wins when a page repeats a property.
            if slot.is_none() {
                *slot = Some(content);
            }
        }

        if data.title.is_none() {
            data.title = document
                .select(&title)
                .next()
                .and_then(|t| non_empty(&t.text().collect::<String>()));
        }

        data.site_logo = document
            .select(&icon)
            .find_map(|link| link.value().attr("href").and_then(non_empty));

        let base = data.url.clone().unwrap_or_else(|| page_url.to_string());
        for link in [&mut data.image, &mut data.site_logo] {
            if let Some(href) = link.as_mut() {
                if let Some(resolved) = utils::resolve(&base, href) {
                    *href = resolved;
                }
            }
        }

        Ok(data)
    }

    /// Whether no OpenGraph field or icon was found.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Turn the metadata into a resource draft for `cert_id`.
    ///
    /// Missing fields are left blank; the URL falls back to the page URL.
    pub fn into_draft(self, cert_id: i64, kind: ResourceKind, page_url: &str) -> ResourceDraft {
        ResourceDraft {
            cert_id,
            kind,
            url: self.url.unwrap_or_else(|| page_url.to_string()),
            title: self.title.unwrap_or_default(),
            image: self.image.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            site_logo: self.site_logo.unwrap_or_default(),
            site_name: self.site_name.unwrap_or_default(),
            has_og_data: true,
        }
    }
}

/// Fetches pages and extracts their OpenGraph metadata.
pub struct OpenGraphFetcher {
    client: reqwest::Client,
}

impl OpenGraphFetcher {
    pub fn new(config: &OpenGraphConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_async_client(config)?,
        })
    }

    /// Fetch and parse `url`, reporting failures as errors.
    pub async fn fetch(&self, url: &str) -> Result<OpenGraphData> {
        Url::parse(url)?;
        let document = http::fetch_page_async(&self.client, url).await?;
        let data = OpenGraphData::parse(&document, url)?;

        if data.is_empty() {
            return Err(AppError::opengraph(url, "page has no OpenGraph data"));
        }
        Ok(data)
    }

    /// Fetch and build a draft, or `None` if the page yields nothing.
    pub async fn prefill(&self, cert_id: i64, kind: ResourceKind, url: &str) -> Option<ResourceDraft> {
        match self.fetch(url).await {
            Ok(data) => {
                log::info!("Prefilled {} from {}", kind, url);
                Some(data.into_draft(cert_id, kind, url))
            }
            Err(e) => {
                log::warn!("No OpenGraph data for {}: {}", url, e);
                None
            }
        }
    }
}
