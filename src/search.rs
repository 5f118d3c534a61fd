//! Fallback orchestrator: drives the priority chain across source
//! adapters, validating and pooling candidates until enough survive, then
//! ranks the pool once and truncates.

use crate::config::ScrapingConfig;
use crate::models::{ImageResult, ImageSource, SearchQuery, SizeFilter};
use crate::rank::rank_results;
use crate::sources::{BingSource, DuckDuckGoSource, SourceAdapter, WikimediaSource};
use crate::validate::validate_candidate;
use crate::Result;
use std::collections::HashSet;
use tracing::{debug, info, warn};

pub struct ImageSearcher {
    sources: Vec<Box<dyn SourceAdapter>>,
    min_width: u32,
    min_height: u32,
}

impl ImageSearcher {
    /// Builds adapters in priority order. A misconfigured structured-API
    /// adapter (missing contact email) is fatal here: that is a broken
    /// deployment, not a search that found nothing.
    pub fn from_config(config: &ScrapingConfig) -> Result<Self> {
        let mut sources: Vec<Box<dyn SourceAdapter>> = Vec::new();
        for source in &config.source_priority {
            match source {
                ImageSource::Wikimedia => sources.push(Box::new(WikimediaSource::new(config)?)),
                ImageSource::DuckDuckGo => sources.push(Box::new(DuckDuckGoSource::new(config))),
                ImageSource::Bing => sources.push(Box::new(BingSource::new(config))),
            }
        }
        Ok(Self {
            sources,
            min_width: config.min_width,
            min_height: config.min_height,
        })
    }

    /// Injection seam for tests and custom chains.
    pub fn with_sources(
        sources: Vec<Box<dyn SourceAdapter>>,
        min_width: u32,
        min_height: u32,
    ) -> Self {
        Self {
            sources,
            min_width,
            min_height,
        }
    }

    pub fn search(&mut self, query: &SearchQuery) -> Vec<ImageResult> {
        self.search_with_fallback(&query.text, query.max_results)
    }

    /// Tries each source in priority order, over-fetching 2x to compensate
    /// for validator and ranker attrition, and stops as soon as the
    /// validated pool can satisfy `max_results`. An empty return is a
    /// normal outcome, never papered over with a placeholder.
    pub fn search_with_fallback(&mut self, query: &str, max_results: usize) -> Vec<ImageResult> {
        let query = query.trim();
        if query.is_empty() || max_results == 0 {
            return Vec::new();
        }

        let mut pool: Vec<ImageResult> = Vec::new();
        let mut seen_urls: HashSet<String> = HashSet::new();

        for source in &mut self.sources {
            let id = source.id();
            let candidates = source.search(query, max_results * 2, Some(SizeFilter::Large));
            let fetched = candidates.len();

            let mut kept = 0_usize;
            for candidate in candidates {
                if !validate_candidate(&candidate, self.min_width, self.min_height) {
                    continue;
                }
                if !seen_urls.insert(candidate.url.clone()) {
                    continue;
                }
                pool.push(ImageResult::from(candidate));
                kept += 1;
            }
            debug!(
                source = id.as_str(),
                fetched,
                kept,
                pooled = pool.len(),
                "source consulted"
            );

            if pool.len() >= max_results {
                debug!(source = id.as_str(), "enough validated results, stopping early");
                break;
            }
        }

        if pool.is_empty() {
            warn!(query, "no images found across any configured source");
            return Vec::new();
        }

        let mut ranked = rank_results(pool, query);
        ranked.truncate(max_results);
        info!(query, count = ranked.len(), "image search complete");
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageCandidate;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakeSource {
        id: ImageSource,
        candidates: Vec<ImageCandidate>,
        calls: Rc<Cell<usize>>,
    }

    impl FakeSource {
        fn boxed(
            id: ImageSource,
            candidates: Vec<ImageCandidate>,
            calls: Rc<Cell<usize>>,
        ) -> Box<dyn SourceAdapter> {
            Box::new(Self {
                id,
                candidates,
                calls,
            })
        }
    }

    impl SourceAdapter for FakeSource {
        fn id(&self) -> ImageSource {
            self.id
        }

        fn search(
            &mut self,
            _query: &str,
            _max_results: usize,
            _size_filter: Option<SizeFilter>,
        ) -> Vec<ImageCandidate> {
            self.calls.set(self.calls.get() + 1);
            self.candidates.clone()
        }
    }

    fn candidate(url: &str, title: &str) -> ImageCandidate {
        ImageCandidate {
            url: url.to_string(),
            thumbnail_url: None,
            title: Some(title.to_string()),
            source: ImageSource::Bing,
            width: 1_024,
            height: 768,
        }
    }

    #[test]
    fn first_source_with_enough_results_short_circuits_the_chain() {
        let first_calls = Rc::new(Cell::new(0));
        let second_calls = Rc::new(Cell::new(0));
        let first = FakeSource::boxed(
            ImageSource::DuckDuckGo,
            vec![
                candidate("https://example.com/a.jpg", "Eiffel Tower"),
                candidate("https://example.com/b.jpg", "Eiffel Tower Paris"),
                candidate("https://example.com/c.jpg", "Tower"),
            ],
            first_calls.clone(),
        );
        let second = FakeSource::boxed(ImageSource::Bing, Vec::new(), second_calls.clone());

        let mut searcher = ImageSearcher::with_sources(vec![first, second], 200, 200);
        let out = searcher.search_with_fallback("Eiffel Tower Paris", 3);

        assert_eq!(out.len(), 3);
        assert_eq!(first_calls.get(), 1);
        assert_eq!(second_calls.get(), 0, "second source must not be consulted");
    }

    #[test]
    fn exhausted_chain_returns_empty_without_failing() {
        let calls = Rc::new(Cell::new(0));
        let sources = vec![
            FakeSource::boxed(ImageSource::DuckDuckGo, Vec::new(), calls.clone()),
            FakeSource::boxed(ImageSource::Bing, Vec::new(), calls.clone()),
        ];
        let mut searcher = ImageSearcher::with_sources(sources, 200, 200);
        let out = searcher.search_with_fallback("asdkjaslkdj nonsense query", 5);
        assert!(out.is_empty());
        assert_eq!(calls.get(), 2, "every source should have been tried");
    }

    #[test]
    fn never_returns_more_than_max_results() {
        for k in 1..=4 {
            let calls = Rc::new(Cell::new(0));
            let source = FakeSource::boxed(
                ImageSource::Bing,
                (0..10)
                    .map(|i| candidate(&format!("https://example.com/{i}.jpg"), "Tower"))
                    .collect(),
                calls,
            );
            let mut searcher = ImageSearcher::with_sources(vec![source], 200, 200);
            let out = searcher.search_with_fallback("Tower", k);
            assert!(out.len() <= k, "k={k} len={}", out.len());
        }
    }

    #[test]
    fn invalid_candidates_are_dropped_and_later_sources_fill_in() {
        let first = FakeSource::boxed(
            ImageSource::DuckDuckGo,
            vec![
                candidate("https://example.com/site-logo.jpg", "Logo"),
                candidate("data:image/png;base64,xyz", "Inline"),
            ],
            Rc::new(Cell::new(0)),
        );
        let second = FakeSource::boxed(
            ImageSource::Bing,
            vec![candidate("https://example.com/tower.jpg", "Eiffel Tower")],
            Rc::new(Cell::new(0)),
        );
        let mut searcher = ImageSearcher::with_sources(vec![first, second], 200, 200);
        let out = searcher.search_with_fallback("Eiffel Tower", 2);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, "https://example.com/tower.jpg");
    }

    #[test]
    fn duplicate_urls_across_sources_are_pooled_once() {
        let shared = candidate("https://example.com/tower.jpg", "Eiffel Tower");
        let first = FakeSource::boxed(
            ImageSource::DuckDuckGo,
            vec![shared.clone()],
            Rc::new(Cell::new(0)),
        );
        let second = FakeSource::boxed(ImageSource::Bing, vec![shared], Rc::new(Cell::new(0)));
        let mut searcher = ImageSearcher::with_sources(vec![first, second], 200, 200);
        let out = searcher.search_with_fallback("Eiffel Tower", 5);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn results_come_back_ranked_best_first() {
        let source = FakeSource::boxed(
            ImageSource::Bing,
            vec![
                candidate("https://example.com/unrelated.jpg", "Sunset over mountains"),
                candidate("https://example.com/match.jpg", "Eiffel Tower Paris"),
            ],
            Rc::new(Cell::new(0)),
        );
        let mut searcher = ImageSearcher::with_sources(vec![source], 200, 200);
        let out = searcher.search_with_fallback("Eiffel Tower Paris", 2);
        assert_eq!(out[0].url, "https://example.com/match.jpg");
    }

    #[test]
    fn blank_query_and_zero_max_results_short_circuit() {
        let calls = Rc::new(Cell::new(0));
        let source = FakeSource::boxed(ImageSource::Bing, Vec::new(), calls.clone());
        let mut searcher = ImageSearcher::with_sources(vec![source], 200, 200);
        assert!(searcher.search_with_fallback("   ", 5).is_empty());
        assert!(searcher.search_with_fallback("tower", 0).is_empty());
        assert_eq!(calls.get(), 0);
    }
}
