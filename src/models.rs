use serde::{Deserialize, Serialize};

/// One external image provider in the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    Wikimedia,
    DuckDuckGo,
    Bing,
}

impl ImageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSource::Wikimedia => "wikimedia",
            ImageSource::DuckDuckGo => "duckduckgo",
            ImageSource::Bing => "bing",
        }
    }

    /// Structured-API providers pre-filter entries by MIME type, so their
    /// candidates are exempt from URL extension checking.
    pub fn is_structured_api(&self) -> bool {
        matches!(self, ImageSource::Wikimedia)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeFilter {
    Large,
    Medium,
    Icon,
}

/// The consuming document's kind, which selects the optimizer's target
/// bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Word,
    Powerpoint,
}

impl DocType {
    /// Maximum embedded-image dimensions: inline document images stay
    /// small, slide images may fill a slide background.
    pub fn bounds(&self) -> (u32, u32) {
        match self {
            DocType::Word => (800, 600),
            DocType::Powerpoint => (1200, 800),
        }
    }
}

/// Where the document assembler should place a chosen image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Inline,
    Background,
    Foreground,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Inline => "inline",
            Placement::Background => "background",
            Placement::Foreground => "foreground",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub max_results: usize,
}

/// An unvalidated image reference as one provider returned it.
/// `width`/`height` are 0 when the provider does not expose them cheaply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageCandidate {
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub title: Option<String>,
    pub source: ImageSource,
    pub width: u32,
    pub height: u32,
}

/// A candidate that passed validation. Within a returned list the order is
/// significant: index 0 is the best match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResult {
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub title: Option<String>,
    pub source: ImageSource,
    pub width: u32,
    pub height: u32,
}

impl From<ImageCandidate> for ImageResult {
    fn from(candidate: ImageCandidate) -> Self {
        ImageResult {
            url: candidate.url,
            thumbnail_url: candidate.thumbnail_url,
            title: candidate.title,
            source: candidate.source,
            width: candidate.width,
            height: candidate.height,
        }
    }
}

/// A downloaded payload that is guaranteed to decode as a raster image.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub data: Vec<u8>,
    pub format: image::ImageFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_serde_names_are_lowercase() {
        let json = serde_json::to_string(&ImageSource::DuckDuckGo).expect("serialize");
        assert_eq!(json, "\"duckduckgo\"");
        let parsed: ImageSource = serde_json::from_str("\"wikimedia\"").expect("parse");
        assert_eq!(parsed, ImageSource::Wikimedia);
    }

    #[test]
    fn doc_type_bounds_are_larger_for_slides() {
        let (ww, wh) = DocType::Word.bounds();
        let (pw, ph) = DocType::Powerpoint.bounds();
        assert!(pw > ww && ph > wh);
    }
}
