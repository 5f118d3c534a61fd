//! Content heuristics consumed by callers that have no language model on
//! hand: whether a section benefits from an image, a search query derived
//! from its text, and where the document assembler should put the result.

use crate::models::{DocType, Placement};

/// Subject matter that typically benefits from an accompanying image.
const VISUAL_KEYWORDS: &[&str] = &[
    "portrait",
    "photo",
    "picture",
    "image",
    "visual",
    "appearance",
    "building",
    "architecture",
    "landscape",
    "scene",
    "location",
    "person",
    "people",
    "individual",
    "character",
    "figure",
    "artwork",
    "painting",
    "sculpture",
    "design",
    "style",
    "historical",
    "monument",
    "memorial",
    "structure",
    "place",
];

/// Scenic/atmospheric content reads better as a slide background.
const BACKGROUND_KEYWORDS: &[&str] = &["landscape", "scene", "background", "setting", "atmosphere"];

pub fn needs_image(content: &str) -> bool {
    let lowered = content.to_ascii_lowercase();
    VISUAL_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// Derives a short search query from section text: capitalized terms
/// (likely proper nouns) from the leading lines, falling back to the first
/// few words.
pub fn suggest_query(content: &str) -> String {
    let mut key_terms: Vec<&str> = Vec::new();
    for line in content.lines().take(3) {
        for word in line.split_whitespace() {
            if is_capitalized_term(word) {
                key_terms.push(word);
            }
        }
    }
    if !key_terms.is_empty() {
        key_terms.truncate(3);
        return key_terms.join(" ");
    }

    content
        .split_whitespace()
        .take(5)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_capitalized_term(word: &str) -> bool {
    if word.chars().count() <= 2 {
        return false;
    }
    let mut chars = word.chars();
    let first_upper = chars.next().map(char::is_uppercase).unwrap_or(false);
    first_upper && chars.all(|c| !c.is_uppercase())
}

/// Word documents always embed inline; slides choose between a background
/// fill and a foreground figure based on the content.
pub fn placement_for(content: &str, doc_type: DocType) -> Placement {
    match doc_type {
        DocType::Word => Placement::Inline,
        DocType::Powerpoint => {
            let lowered = content.to_ascii_lowercase();
            if BACKGROUND_KEYWORDS
                .iter()
                .any(|keyword| lowered.contains(keyword))
            {
                Placement::Background
            } else {
                Placement::Foreground
            }
        }
    }
}
