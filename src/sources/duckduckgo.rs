//! DuckDuckGo Images adapter: scrape shape with a token handshake.
//!
//! There is no stable public API. The HTML search page embeds a `vqd`
//! session token that the image data endpoint (`i.js`) requires; the token
//! location has moved between page revisions, so extraction is regex-based
//! rather than selector-based. A 403 or a missing token means the provider
//! is blocking us; both degrade to an empty result.

use crate::config::ScrapingConfig;
use crate::models::{ImageCandidate, ImageSource, SizeFilter};
use crate::ratelimit::RateLimiter;
use crate::sources::{
    build_agent, get_with_browser_headers, is_scrape_noise, read_body_capped, SourceAdapter,
    MAX_RESPONSE_BYTES,
};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

pub struct DuckDuckGoSource {
    agent: ureq::Agent,
    endpoint: String,
    config: ScrapingConfig,
    limiter: RateLimiter,
}

impl DuckDuckGoSource {
    pub fn new(config: &ScrapingConfig) -> Self {
        Self {
            agent: build_agent(config.search_timeout()),
            endpoint: config.duckduckgo_endpoint.clone(),
            config: config.clone(),
            limiter: RateLimiter::new(config.scraping_delay()),
        }
    }

    fn fetch_token(&mut self, query: &str) -> Option<String> {
        let mut url = Url::parse(&self.endpoint).ok()?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("iax", "images")
            .append_pair("ia", "images");

        self.limiter.wait();
        let mut response = match get_with_browser_headers(&self.agent, url.as_str(), &self.config)
        {
            Ok(response) => response,
            Err(err) => {
                warn!(source = "duckduckgo", %err, "token page fetch failed");
                return None;
            }
        };
        let status = response.status().as_u16();
        if status >= 400 {
            warn!(source = "duckduckgo", status, "token page returned error status");
            return None;
        }

        let body = read_body_capped(&mut response, MAX_RESPONSE_BYTES)?;
        let html = String::from_utf8_lossy(&body);
        extract_vqd(&html)
    }

    fn fetch_results(
        &mut self,
        query: &str,
        token: &str,
        max_results: usize,
        size_filter: Option<SizeFilter>,
    ) -> Vec<ImageCandidate> {
        let Ok(mut url) = Url::parse(&self.endpoint) else {
            return Vec::new();
        };
        url.set_path("/i.js");
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("l", "us-en")
                .append_pair("o", "json")
                .append_pair("q", query)
                .append_pair("vqd", token)
                .append_pair("p", "1");
            if let Some(filter) = size_filter {
                pairs.append_pair("f", size_filter_param(filter));
            }
        }

        self.limiter.wait();
        let mut response = match get_with_browser_headers(&self.agent, url.as_str(), &self.config)
        {
            Ok(response) => response,
            Err(err) => {
                warn!(source = "duckduckgo", %err, "image endpoint fetch failed");
                return Vec::new();
            }
        };
        let status = response.status().as_u16();
        if status == 403 {
            warn!(source = "duckduckgo", "blocked by provider (403)");
            return Vec::new();
        }
        if status >= 400 {
            warn!(source = "duckduckgo", status, "image endpoint error status");
            return Vec::new();
        }

        let Some(body) = read_body_capped(&mut response, MAX_RESPONSE_BYTES) else {
            warn!(source = "duckduckgo", "failed to read image endpoint body");
            return Vec::new();
        };

        match parse_results(&body, max_results) {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(source = "duckduckgo", %err, "malformed image endpoint response");
                Vec::new()
            }
        }
    }
}

impl SourceAdapter for DuckDuckGoSource {
    fn id(&self) -> ImageSource {
        ImageSource::DuckDuckGo
    }

    fn search(
        &mut self,
        query: &str,
        max_results: usize,
        size_filter: Option<SizeFilter>,
    ) -> Vec<ImageCandidate> {
        let Some(token) = self.fetch_token(query) else {
            warn!(
                source = "duckduckgo",
                "vqd token extraction failed (blocked or page layout changed)"
            );
            return Vec::new();
        };

        let candidates = self.fetch_results(query, &token, max_results, size_filter);
        debug!(source = "duckduckgo", count = candidates.len(), "search complete");
        candidates
    }
}

fn size_filter_param(filter: SizeFilter) -> &'static str {
    match filter {
        SizeFilter::Large => "size:Large",
        SizeFilter::Medium => "size:Medium",
        SizeFilter::Icon => "size:Small",
    }
}

/// The token appears either as a query fragment (`vqd=4-128...`) or a
/// JavaScript literal (`vqd="..."` / `vqd='...'`).
pub(crate) fn extract_vqd(html: &str) -> Option<String> {
    let pattern = Regex::new(r#"vqd=["']?([\d-]+)"#).expect("vqd regex");
    pattern
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|token| token.len() >= 8)
}

#[derive(Debug, Deserialize)]
struct DdgEnvelope {
    #[serde(default)]
    results: Vec<DdgResult>,
}

#[derive(Debug, Deserialize)]
struct DdgResult {
    #[serde(default)]
    image: String,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

pub(crate) fn parse_results(
    raw: &[u8],
    max_results: usize,
) -> serde_json::Result<Vec<ImageCandidate>> {
    let envelope: DdgEnvelope = serde_json::from_slice(raw)?;
    let candidates = envelope
        .results
        .into_iter()
        .filter(|entry| !is_scrape_noise(&entry.image))
        .map(|entry| ImageCandidate {
            url: entry.image,
            thumbnail_url: entry.thumbnail,
            title: entry.title,
            source: ImageSource::DuckDuckGo,
            width: entry.width,
            height: entry.height,
        })
        .take(max_results)
        .collect();
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vqd_extraction_handles_both_embedding_styles() {
        let in_query = r#"<script>var u='/i.js?q=x&vqd=4-128129123912&o=json'</script>"#;
        assert_eq!(extract_vqd(in_query).as_deref(), Some("4-128129123912"));

        let in_literal = r#"<script>vqd="3-456789012345";load();</script>"#;
        assert_eq!(extract_vqd(in_literal).as_deref(), Some("3-456789012345"));
    }

    #[test]
    fn vqd_extraction_fails_on_captcha_pages() {
        let html = "<html><body>Unfortunately, bots use DuckDuckGo too.</body></html>";
        assert!(extract_vqd(html).is_none());
    }

    #[test]
    fn short_token_fragments_are_not_mistaken_for_vqd() {
        assert!(extract_vqd("vqd=12").is_none());
    }

    #[test]
    fn parse_maps_results_and_filters_noise() {
        let raw = r#"{
          "results": [
            {"image": "https://example.com/photos/tower.jpg",
             "thumbnail": "https://example.com/t/tower.jpg",
             "title": "Eiffel Tower", "width": 1600, "height": 1200},
            {"image": "https://example.com/assets/logo.png",
             "title": "Site logo", "width": 600, "height": 600},
            {"image": "data:image/gif;base64,R0lGOD",
             "title": "inline", "width": 0, "height": 0},
            {"image": "https://example.com/photos/bridge.jpg",
             "title": "Bridge", "width": 1024, "height": 768}
          ]
        }"#;
        let out = parse_results(raw.as_bytes(), 10).expect("parse");
        assert_eq!(out.len(), 2, "candidates={out:?}");
        assert_eq!(out[0].url, "https://example.com/photos/tower.jpg");
        assert_eq!(out[0].source, ImageSource::DuckDuckGo);
        assert_eq!((out[0].width, out[0].height), (1600, 1200));
    }

    #[test]
    fn parse_respects_max_results() {
        let raw = r#"{"results": [
            {"image": "https://example.com/a.jpg"},
            {"image": "https://example.com/b.jpg"},
            {"image": "https://example.com/c.jpg"}
        ]}"#;
        let out = parse_results(raw.as_bytes(), 2).expect("parse");
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn parse_rejects_html_error_pages() {
        assert!(parse_results(b"<html>blocked</html>", 5).is_err());
    }
}
