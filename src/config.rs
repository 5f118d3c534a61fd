use crate::models::ImageSource;
use crate::{ImageError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Realistic browser signatures rotated across outbound requests to reduce
/// provider blocking. Chrome, Firefox, Safari and Edge on Windows/macOS.
const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36 Edg/119.0.0.0",
];

/// Standard browser-like headers sent with every scraping request.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("Accept-Encoding", "gzip, deflate, br"),
    ("DNT", "1"),
    ("Connection", "keep-alive"),
    ("Upgrade-Insecure-Requests", "1"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapingConfig {
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
    #[serde(default = "default_source_priority")]
    pub source_priority: Vec<ImageSource>,
    #[serde(default = "default_search_timeout_secs")]
    pub search_timeout_secs: u64,
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    /// Minimum spacing between requests made by one adapter instance.
    #[serde(default = "default_scraping_delay_ms")]
    pub scraping_delay_ms: u64,
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    /// Generic validator floor for candidates with known dimensions.
    #[serde(default = "default_min_dimension")]
    pub min_width: u32,
    #[serde(default = "default_min_dimension")]
    pub min_height: u32,
    /// Stricter floor applied inside the Wikimedia Commons adapter.
    #[serde(default = "default_wikimedia_min_width")]
    pub wikimedia_min_width: u32,
    #[serde(default = "default_wikimedia_min_height")]
    pub wikimedia_min_height: u32,
    #[serde(default = "default_wikimedia_endpoint")]
    pub wikimedia_endpoint: String,
    #[serde(default = "default_duckduckgo_endpoint")]
    pub duckduckgo_endpoint: String,
    #[serde(default = "default_bing_endpoint")]
    pub bing_endpoint: String,
    /// Required by the Wikimedia Commons usage policy: a reachable contact
    /// address embedded in the User-Agent. Absence is fatal at adapter
    /// construction.
    #[serde(default)]
    pub contact_email: Option<String>,
}

fn default_user_agents() -> Vec<String> {
    DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect()
}

fn default_source_priority() -> Vec<ImageSource> {
    vec![
        ImageSource::Wikimedia,
        ImageSource::DuckDuckGo,
        ImageSource::Bing,
    ]
}

fn default_search_timeout_secs() -> u64 {
    10
}

fn default_download_timeout_secs() -> u64 {
    15
}

fn default_scraping_delay_ms() -> u64 {
    1_000
}

fn default_max_file_size_mb() -> u64 {
    5
}

fn default_min_dimension() -> u32 {
    200
}

fn default_wikimedia_min_width() -> u32 {
    400
}

fn default_wikimedia_min_height() -> u32 {
    300
}

fn default_wikimedia_endpoint() -> String {
    "https://commons.wikimedia.org/w/api.php".to_string()
}

fn default_duckduckgo_endpoint() -> String {
    "https://duckduckgo.com".to_string()
}

fn default_bing_endpoint() -> String {
    "https://www.bing.com/images/search".to_string()
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            user_agents: default_user_agents(),
            source_priority: default_source_priority(),
            search_timeout_secs: default_search_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            scraping_delay_ms: default_scraping_delay_ms(),
            max_file_size_mb: default_max_file_size_mb(),
            min_width: default_min_dimension(),
            min_height: default_min_dimension(),
            wikimedia_min_width: default_wikimedia_min_width(),
            wikimedia_min_height: default_wikimedia_min_height(),
            wikimedia_endpoint: default_wikimedia_endpoint(),
            duckduckgo_endpoint: default_duckduckgo_endpoint(),
            bing_endpoint: default_bing_endpoint(),
            contact_email: None,
        }
    }
}

impl ScrapingConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn scraping_delay(&self) -> Duration {
        Duration::from_millis(self.scraping_delay_ms)
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    /// One User-Agent picked from the rotation pool.
    pub fn random_user_agent(&self) -> &str {
        if self.user_agents.is_empty() {
            return DEFAULT_USER_AGENTS[0];
        }
        let index = rand::thread_rng().gen_range(0..self.user_agents.len());
        &self.user_agents[index]
    }

    /// Browser-like header set sent alongside the User-Agent.
    pub fn browser_headers(&self) -> &'static [(&'static str, &'static str)] {
        BROWSER_HEADERS
    }
}

pub fn load_scraping_config(path: &Path) -> Result<ScrapingConfig> {
    if !path.exists() {
        return Ok(ScrapingConfig::default());
    }
    let bytes = std::fs::read(path)?;
    let parsed: ScrapingConfig = serde_json::from_slice(&bytes).map_err(|e| {
        ImageError::Config(format!(
            "failed to parse scraping config at {}: {e}",
            path.to_string_lossy()
        ))
    })?;
    Ok(parsed)
}
