//! Wikimedia Commons adapter: the one structured-API source in the chain.
//!
//! A single authenticated-by-courtesy GET against the MediaWiki API
//! (`generator=search` over the File namespace with `imageinfo`), with
//! entries pre-filtered by MIME type and pixel dimensions. The usage policy
//! requires a contact address in the User-Agent; a missing address is the
//! crate's one fatal construction error.

use crate::config::ScrapingConfig;
use crate::models::{ImageCandidate, ImageSource, SizeFilter};
use crate::ratelimit::RateLimiter;
use crate::sources::{
    build_agent, read_body_capped, redact_url_for_log, SourceAdapter, MAX_RESPONSE_BYTES,
};
use crate::{ImageError, Result};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif"];

pub struct WikimediaSource {
    agent: ureq::Agent,
    endpoint: String,
    user_agent: String,
    limiter: RateLimiter,
    min_width: u32,
    min_height: u32,
}

impl WikimediaSource {
    pub fn new(config: &ScrapingConfig) -> Result<Self> {
        let contact = config
            .contact_email
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(ImageError::MissingContactEmail)?;

        Ok(Self {
            agent: build_agent(config.search_timeout()),
            endpoint: config.wikimedia_endpoint.clone(),
            user_agent: format!(
                "docsmith-images/{} ({contact})",
                env!("CARGO_PKG_VERSION")
            ),
            limiter: RateLimiter::new(config.scraping_delay()),
            min_width: config.wikimedia_min_width,
            min_height: config.wikimedia_min_height,
        })
    }

    fn search_url(&self, query: &str, max_results: usize) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| ImageError::Config(format!("invalid wikimedia endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("format", "json")
            .append_pair("formatversion", "2")
            .append_pair("generator", "search")
            .append_pair("gsrsearch", query)
            .append_pair("gsrnamespace", "6")
            .append_pair("gsrlimit", &max_results.to_string())
            .append_pair("prop", "imageinfo")
            .append_pair("iiprop", "url|size|mime");
        Ok(url)
    }
}

impl SourceAdapter for WikimediaSource {
    fn id(&self) -> ImageSource {
        ImageSource::Wikimedia
    }

    fn search(
        &mut self,
        query: &str,
        max_results: usize,
        _size_filter: Option<SizeFilter>,
    ) -> Vec<ImageCandidate> {
        let url = match self.search_url(query, max_results) {
            Ok(url) => url,
            Err(err) => {
                warn!(source = "wikimedia", %err, "could not build search URL");
                return Vec::new();
            }
        };

        self.limiter.wait();
        let mut response = match self
            .agent
            .get(url.as_str())
            .header("User-Agent", self.user_agent.as_str())
            .call()
        {
            Ok(response) => response,
            Err(err) => {
                warn!(source = "wikimedia", %err, "search request failed");
                return Vec::new();
            }
        };

        let status = response.status().as_u16();
        if status >= 400 {
            warn!(source = "wikimedia", status, "search returned error status");
            return Vec::new();
        }

        let Some(body) = read_body_capped(&mut response, MAX_RESPONSE_BYTES) else {
            warn!(source = "wikimedia", "failed to read search response body");
            return Vec::new();
        };

        let candidates = match parse_search_response(&body, self.min_width, self.min_height) {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(source = "wikimedia", %err, "malformed API response");
                return Vec::new();
            }
        };

        debug!(
            source = "wikimedia",
            count = candidates.len(),
            endpoint = %redact_url_for_log(&self.endpoint),
            "search complete"
        );
        candidates
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    query: Option<ApiQuery>,
}

#[derive(Debug, Deserialize)]
struct ApiQuery {
    #[serde(default)]
    pages: Vec<ApiPage>,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    #[serde(default)]
    title: String,
    #[serde(default)]
    imageinfo: Vec<ApiImageInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiImageInfo {
    #[serde(default)]
    url: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    mime: String,
    #[serde(default)]
    thumburl: Option<String>,
}

fn parse_search_response(
    raw: &[u8],
    min_width: u32,
    min_height: u32,
) -> serde_json::Result<Vec<ImageCandidate>> {
    let envelope: ApiEnvelope = serde_json::from_slice(raw)?;
    let pages = envelope.query.map(|q| q.pages).unwrap_or_default();

    let candidates = pages
        .into_iter()
        .filter_map(|page| map_page(page, min_width, min_height))
        .collect();
    Ok(candidates)
}

fn map_page(page: ApiPage, min_width: u32, min_height: u32) -> Option<ImageCandidate> {
    let info = page.imageinfo.into_iter().next()?;
    if info.url.is_empty() {
        return None;
    }
    if !ACCEPTED_MIME_TYPES.contains(&info.mime.as_str()) {
        return None;
    }
    if info.width < min_width || info.height < min_height {
        return None;
    }

    Some(ImageCandidate {
        url: info.url,
        thumbnail_url: info.thumburl,
        title: Some(file_page_title(&page.title)),
        source: ImageSource::Wikimedia,
        width: info.width,
        height: info.height,
    })
}

/// "File:Eiffel Tower at dawn.jpg" -> "Eiffel Tower at dawn".
fn file_page_title(raw: &str) -> String {
    let without_namespace = raw.strip_prefix("File:").unwrap_or(raw);
    match without_namespace.rsplit_once('.') {
        Some((stem, ext)) if ext.len() <= 4 && !stem.is_empty() => stem.to_string(),
        _ => without_namespace.to_string(),
    }
}
