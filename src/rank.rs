use crate::models::ImageResult;
use std::collections::HashSet;
use url::Url;

/// Title terms that carry no signal about what the picture shows.
const GENERIC_TITLE_TERMS: &[&str] = &["image", "photo", "picture", "download", "free", "stock"];

/// Hosts with consistently usable, full-size photographic material.
const REPUTABLE_DOMAINS: &[&str] = &[
    "wikimedia",
    "wikipedia",
    "flickr",
    "unsplash",
    "pexels",
    "pixabay",
];

const LOW_QUALITY_MARKERS: &[&str] = &["thumbnail", "thumb", "small", "icon", "logo", "avatar"];

/// Orders a pooled result list best-first. Stable sort over a pure scoring
/// function, so identical input always yields identical output and ties
/// keep encounter order.
pub fn rank_results(results: Vec<ImageResult>, query: &str) -> Vec<ImageResult> {
    let query_words: HashSet<String> = query
        .split_whitespace()
        .map(|word| word.to_ascii_lowercase())
        .filter(|word| !word.is_empty())
        .collect();

    let mut scored: Vec<(f32, ImageResult)> = results
        .into_iter()
        .map(|result| (relevance_score(&result, &query_words), result))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, result)| result).collect()
}

pub fn relevance_score(result: &ImageResult, query_words: &HashSet<String>) -> f32 {
    let mut score = 0.0_f32;

    if let Some(title) = result.title.as_deref() {
        let lowered = title.to_ascii_lowercase();
        let title_words: HashSet<&str> = lowered.split_whitespace().collect();
        let overlap = query_words
            .iter()
            .filter(|word| title_words.contains(word.as_str()))
            .count();
        score += 2.0 * overlap as f32;

        if GENERIC_TITLE_TERMS.iter().any(|term| lowered.contains(term)) {
            score -= 1.0;
        }
    }

    let lowered_url = result.url.to_ascii_lowercase();
    if let Ok(parsed) = Url::parse(&result.url) {
        if let Some(host) = parsed.host_str() {
            let host = host.to_ascii_lowercase();
            if REPUTABLE_DOMAINS.iter().any(|domain| host.contains(domain)) {
                score += 3.0;
            }
        }
    }

    if LOW_QUALITY_MARKERS
        .iter()
        .any(|marker| lowered_url.contains(marker))
    {
        score -= 2.0;
    }

    // JPEG is more likely a full photo; PNG is often a graphic.
    let path = Url::parse(&result.url)
        .map(|parsed| parsed.path().to_ascii_lowercase())
        .unwrap_or_else(|_| lowered_url.clone());
    if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        score += 0.5;
    } else if path.ends_with(".png") {
        score += 0.3;
    }

    score
}
