//! Bing Images adapter: scrape shape over embedded JSON.
//!
//! Each result tile is an `<a class="iusc">` whose `m` attribute holds a
//! JSON blob with the full-size URL (`murl`), thumbnail (`turl`) and title
//! (`t`). No token handshake is needed, but the page serves a challenge
//! when it suspects automation; that is detected and treated as a blocked,
//! empty result.

use crate::config::ScrapingConfig;
use crate::models::{ImageCandidate, ImageSource, SizeFilter};
use crate::ratelimit::RateLimiter;
use crate::sources::{
    build_agent, get_with_browser_headers, is_scrape_noise, read_body_capped, SourceAdapter,
    MAX_RESPONSE_BYTES,
};
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

const BLOCK_MARKERS: &[&str] = &["captcha", "unusual traffic", "/challenge/"];

pub struct BingSource {
    agent: ureq::Agent,
    endpoint: String,
    config: ScrapingConfig,
    limiter: RateLimiter,
}

impl BingSource {
    pub fn new(config: &ScrapingConfig) -> Self {
        Self {
            agent: build_agent(config.search_timeout()),
            endpoint: config.bing_endpoint.clone(),
            config: config.clone(),
            limiter: RateLimiter::new(config.scraping_delay()),
        }
    }

    fn search_url(&self, query: &str, size_filter: Option<SizeFilter>) -> Option<Url> {
        let mut url = Url::parse(&self.endpoint).ok()?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("q", query)
                .append_pair("form", "HDRSC2")
                .append_pair("first", "1");
            if let Some(filter) = size_filter {
                pairs.append_pair("qft", size_filter_param(filter));
            }
        }
        Some(url)
    }
}

impl SourceAdapter for BingSource {
    fn id(&self) -> ImageSource {
        ImageSource::Bing
    }

    fn search(
        &mut self,
        query: &str,
        max_results: usize,
        size_filter: Option<SizeFilter>,
    ) -> Vec<ImageCandidate> {
        let Some(url) = self.search_url(query, size_filter) else {
            warn!(source = "bing", "invalid endpoint URL");
            return Vec::new();
        };

        self.limiter.wait();
        let mut response = match get_with_browser_headers(&self.agent, url.as_str(), &self.config)
        {
            Ok(response) => response,
            Err(err) => {
                warn!(source = "bing", %err, "search request failed");
                return Vec::new();
            }
        };
        let status = response.status().as_u16();
        if status >= 400 {
            warn!(source = "bing", status, "search returned error status");
            return Vec::new();
        }

        let Some(body) = read_body_capped(&mut response, MAX_RESPONSE_BYTES) else {
            warn!(source = "bing", "failed to read search response body");
            return Vec::new();
        };
        let html = String::from_utf8_lossy(&body);

        if is_blocked(&html) {
            warn!(source = "bing", "blocked by provider (challenge page)");
            return Vec::new();
        }

        let candidates = parse_results(&html, max_results);
        debug!(source = "bing", count = candidates.len(), "search complete");
        candidates
    }
}

fn size_filter_param(filter: SizeFilter) -> &'static str {
    match filter {
        SizeFilter::Large => "+filterui:imagesize-large",
        SizeFilter::Medium => "+filterui:imagesize-medium",
        SizeFilter::Icon => "+filterui:imagesize-small",
    }
}

pub(crate) fn is_blocked(html: &str) -> bool {
    let lowered = html.to_ascii_lowercase();
    BLOCK_MARKERS.iter().any(|marker| lowered.contains(marker))
}

#[derive(Debug, Deserialize)]
struct TileMeta {
    #[serde(default)]
    murl: String,
    #[serde(default)]
    turl: Option<String>,
    #[serde(default)]
    t: Option<String>,
}

pub(crate) fn parse_results(html: &str, max_results: usize) -> Vec<ImageCandidate> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a.iusc").expect("iusc selector");

    let mut out = Vec::new();
    for anchor in document.select(&selector) {
        if out.len() >= max_results {
            break;
        }
        let Some(raw_meta) = anchor.value().attr("m") else {
            continue;
        };
        let Ok(meta) = serde_json::from_str::<TileMeta>(raw_meta) else {
            // Tile metadata shape drifts; skip what we cannot read.
            continue;
        };
        if meta.murl.is_empty() || is_scrape_noise(&meta.murl) {
            continue;
        }

        out.push(ImageCandidate {
            url: meta.murl,
            thumbnail_url: meta.turl,
            title: meta.t.filter(|t| !t.trim().is_empty()),
            source: ImageSource::Bing,
            width: 0,
            height: 0,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <html><body>
      <a class="iusc" m='{"murl":"https://example.com/photos/tower.jpg","turl":"https://tse.example.net/th?id=1","t":"Eiffel Tower at night"}'>tile</a>
      <a class="iusc" m='{"murl":"https://example.com/assets/site-logo.png","t":"logo"}'>tile</a>
      <a class="iusc" m='not json at all'>tile</a>
      <a class="iusc" m='{"murl":"https://example.com/photos/bridge.jpg","t":""}'>tile</a>
      <a class="other" href="/somewhere">not a tile</a>
    </body></html>
    "#;

    #[test]
    fn parse_reads_tile_metadata_and_skips_noise_and_garbage() {
        let out = parse_results(SAMPLE, 10);
        assert_eq!(out.len(), 2, "candidates={out:?}");
        assert_eq!(out[0].url, "https://example.com/photos/tower.jpg");
        assert_eq!(out[0].title.as_deref(), Some("Eiffel Tower at night"));
        assert_eq!(out[0].source, ImageSource::Bing);
        // Empty titles collapse to None.
        assert!(out[1].title.is_none());
    }

    #[test]
    fn parse_respects_max_results() {
        let out = parse_results(SAMPLE, 1);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn challenge_pages_are_detected_as_blocked() {
        assert!(is_blocked(
            "<html><title>Verify</title><div>Please solve this CAPTCHA</div></html>"
        ));
        assert!(is_blocked(
            "<html>We have detected unusual traffic from your network.</html>"
        ));
        assert!(!is_blocked(SAMPLE));
    }
}
