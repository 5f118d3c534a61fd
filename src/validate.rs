use crate::models::ImageCandidate;
use url::Url;

/// URL substrings that mark a candidate as decorative rather than content.
const URL_BLACKLIST: &[&str] = &[
    "logo",
    "icon",
    "avatar",
    "thumbnail",
    "pixel",
    "1x1",
    "spacer",
    "blank",
];

const ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

pub(crate) fn keyword_match(value: &str, keywords: &[&str]) -> bool {
    let lowered = value.to_ascii_lowercase();
    keywords.iter().any(|keyword| lowered.contains(keyword))
}

/// Cheap, provider-agnostic checks applied before any network fetch.
/// Structured-API candidates arrive pre-filtered by MIME type and skip the
/// extension check; unknown dimensions pass through for the downloader to
/// judge.
pub fn validate_candidate(candidate: &ImageCandidate, min_width: u32, min_height: u32) -> bool {
    let url = candidate.url.trim();
    if url.is_empty() {
        return false;
    }

    let lower = url.to_ascii_lowercase();
    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        return false;
    }

    if keyword_match(url, URL_BLACKLIST) {
        return false;
    }

    if !candidate.source.is_structured_api() && !has_allowed_extension(url) {
        return false;
    }

    if candidate.width > 0
        && candidate.height > 0
        && (candidate.width < min_width || candidate.height < min_height)
    {
        return false;
    }

    true
}

fn has_allowed_extension(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            let path = parsed.path().to_ascii_lowercase();
            ALLOWED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
        }
        Err(_) => {
            let lower = url.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.iter().any(|ext| lower.contains(ext))
        }
    }
}
