pub mod bing;
pub mod duckduckgo;
pub mod wikimedia;

pub use bing::BingSource;
pub use duckduckgo::DuckDuckGoSource;
pub use wikimedia::WikimediaSource;

use crate::config::ScrapingConfig;
use crate::models::{ImageCandidate, ImageSource, SizeFilter};
use crate::validate::keyword_match;
use std::io::Read;
use std::time::Duration;
use url::Url;

/// Largest provider response body we are willing to buffer.
pub(crate) const MAX_RESPONSE_BYTES: u64 = 2 * 1024 * 1024;

/// Substrings that mark a scraped URL as chrome rather than content.
/// Adapters apply this coarse filter themselves because the generic
/// validator only runs provider-agnostic checks.
const SCRAPE_NOISE_MARKERS: &[&str] = &["logo", "icon", "avatar", "sprite", "emoji", "favicon"];

/// One external image provider. Implementations never fail: network,
/// parse, timeout, and blocking trouble all log and yield an empty list so
/// the orchestrator can move on to the next source. `&mut self` carries the
/// per-instance rate-limiter timestamp.
pub trait SourceAdapter {
    fn id(&self) -> ImageSource;

    fn search(
        &mut self,
        query: &str,
        max_results: usize,
        size_filter: Option<SizeFilter>,
    ) -> Vec<ImageCandidate>;
}

pub(crate) fn build_agent(timeout: Duration) -> ureq::Agent {
    let mut config = ureq::Agent::config_builder();
    config = config
        .http_status_as_error(false)
        .timeout_global(Some(timeout));
    let agent: ureq::Agent = config.build().into();
    agent
}

/// GET with a rotated User-Agent and the standard browser header set.
pub(crate) fn get_with_browser_headers(
    agent: &ureq::Agent,
    url: &str,
    config: &ScrapingConfig,
) -> std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    let mut request = agent.get(url).header("User-Agent", config.random_user_agent());
    for (name, value) in config.browser_headers() {
        request = request.header(*name, *value);
    }
    request.call()
}

pub(crate) fn read_body_capped(
    response: &mut ureq::http::Response<ureq::Body>,
    cap: u64,
) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    response
        .body_mut()
        .as_reader()
        .take(cap)
        .read_to_end(&mut buf)
        .ok()?;
    Some(buf)
}

/// Scheme+host only, so log lines never leak query strings.
pub(crate) fn redact_url_for_log(value: &str) -> String {
    match Url::parse(value) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            let host = parsed.host_str().unwrap_or("unknown-host");
            format!("{scheme}://{host}/...")
        }
        Err(_) => "[invalid-url]".to_string(),
    }
}

/// Adapter-side rejection for scraped URLs the generic validator would not
/// catch cheaply: data-URIs, SVG markup, obvious page chrome.
pub(crate) fn is_scrape_noise(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    if lower.is_empty() || lower.starts_with("data:") {
        return true;
    }
    if lower.contains(".svg") {
        return true;
    }
    keyword_match(url, SCRAPE_NOISE_MARKERS)
}
