use crate::error::Result;
use crate::scrape::{parse_entity_page, parse_what_links_here, LinkedEntity};
use crate::types::{Application, FormatCatalog, FormatSupport};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WIKI_URL: &str = "https://www.wikidata.org";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiConfig {
    pub base_url: String,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WIKI_URL.to_string(),
        }
    }
}

/// Applications found to read or write a given format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormatUsers {
    pub format: String,
    pub readers: Vec<String>,
    pub writers: Vec<String>,
}

/// Sequential client for knowledge-graph entity pages.
pub struct WikiClient {
    http: reqwest::Client,
    base_url: String,
}

impl WikiClient {
    pub fn new(config: &WikiConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches `/wiki/<path>`; a non-success status yields `None`.
    async fn fetch_page(&self, path: &str) -> Result<Option<String>> {
        let url = format!("{}/wiki/{}", self.base_url, path);
        log::debug!("request GET {url}");
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        log::debug!("response for GET {url} : {}", status.as_u16());
        if !status.is_success() {
            log::error!("GET {url} failed with status {}", status.as_u16());
            return Ok(None);
        }
        Ok(Some(response.text().await?))
    }

    /// Formats supported by a single application; empty if the page could not be fetched.
    pub async fn application(&self, tag: &str) -> Result<Application> {
        log::debug!("Extracting file formats data for app tag {tag}");
        let support = match self.fetch_page(tag).await? {
            Some(html) => parse_entity_page(&html),
            None => FormatSupport::default(),
        };
        Ok(Application {
            tag: tag.to_string(),
            support,
        })
    }

    /// Builds a catalog for `tags`, one request at a time. Repeated tags are fetched once.
    pub async fn build_catalog<S: AsRef<str>>(&self, tags: &[S]) -> Result<FormatCatalog> {
        log::info!("Application to file format mapping starting");
        let mut catalog = FormatCatalog::new();
        for tag in tags.iter().map(AsRef::as_ref) {
            if catalog.get(tag).is_some() {
                continue;
            }
            catalog.insert(self.application(tag).await?);
        }
        log::info!("Mapped {} applications", catalog.len());
        Ok(catalog)
    }

    /// Applications linking to `format` whose own page lists it as readable/writable.
    pub async fn applications_supporting(&self, format: &str) -> Result<FormatUsers> {
        let mut users = FormatUsers {
            format: format.to_string(),
            ..Default::default()
        };
        let Some(html) = self
            .fetch_page(&format!("Special:WhatLinksHere/{format}"))
            .await?
        else {
            return Ok(users);
        };

        let candidates: Vec<LinkedEntity> = parse_what_links_here(&html, format);
        log::info!("{} entities link to {format}", candidates.len());
        for candidate in candidates {
            let application = self.application(&candidate.tag).await?;
            if application.support.reads(format) {
                log::debug!("{} ({}) reads {format}", candidate.tag, candidate.name);
                users.readers.push(candidate.tag.clone());
            }
            if application.support.writes(format) {
                log::debug!("{} ({}) writes {format}", candidate.tag, candidate.name);
                users.writers.push(candidate.tag);
            }
        }
        Ok(users)
    }
}
