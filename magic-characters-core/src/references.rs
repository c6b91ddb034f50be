//! Cards that reference a character by name
//!
//! A card references a character when its name starts with the identity at a
//! word boundary or ends with it after one. Only the first result page is
//! read, so characters with very many references are undercounted.

use crate::cache_store::{CacheStore, cache_key};
use crate::card_source::{CardSource, PageRequest};
use crate::error::FinderError;
use crate::scryfall::Card;
use std::collections::BTreeSet;
use tracing::{error, info, warn};

pub type ReferenceSet = BTreeSet<String>;

const EMBLEM_MARKER: &str = "Emblem";

/// Escape regex metacharacters and whitespace so the identity stays one literal term
pub fn escape_identity(identity: &str) -> String {
    let mut escaped = String::with_capacity(identity.len() + 4);
    for c in regex::escape(identity).chars() {
        if matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Scryfall regex search for names anchored on `identity` at either end
pub fn reference_query(identity: &str) -> String {
    let escaped = escape_identity(identity);
    format!(r"name:/^{0}\b|\b{0}$/", escaped)
}

pub fn references_cache_key(identity: &str) -> String {
    format!("references_{}", cache_key(identity))
}

/// Front-face names of the referencing cards, emblems excluded
pub fn collect_references(cards: &[Card]) -> ReferenceSet {
    cards
        .iter()
        .filter(|card| !card.raw_name.contains(EMBLEM_MARKER))
        .map(|card| card.name.clone())
        .collect()
}

#[derive(Debug)]
pub enum ReferenceOutcome {
    Cached(ReferenceSet),
    Fetched(ReferenceSet),
    Failed {
        partial: ReferenceSet,
        reason: FinderError,
    },
}

impl ReferenceOutcome {
    pub fn references(&self) -> &ReferenceSet {
        match self {
            ReferenceOutcome::Cached(references) | ReferenceOutcome::Fetched(references) => {
                references
            }
            ReferenceOutcome::Failed { partial, .. } => partial,
        }
    }

    pub fn into_references(self) -> ReferenceSet {
        match self {
            ReferenceOutcome::Cached(references) | ReferenceOutcome::Fetched(references) => {
                references
            }
            ReferenceOutcome::Failed { partial, .. } => partial,
        }
    }
}

pub struct ReferenceSearcher<'a, S: CardSource + ?Sized> {
    source: &'a S,
    store: &'a CacheStore,
}

impl<'a, S: CardSource + ?Sized> ReferenceSearcher<'a, S> {
    pub fn new(source: &'a S, store: &'a CacheStore) -> Self {
        ReferenceSearcher { source, store }
    }

    /// Reference set for `identity`, from the cache when fresh, otherwise from one search page.
    ///
    /// Never fails outright: a failed search comes back as [`ReferenceOutcome::Failed`]
    /// with whatever was gathered, and is not cached.
    pub async fn find_references(&self, identity: &str) -> ReferenceOutcome {
        let key = references_cache_key(identity);
        if let Some(cached) = self.store.load::<ReferenceSet>(&key) {
            info!(character = identity, references = cached.len(), "Using cached references");
            return ReferenceOutcome::Cached(cached);
        }

        info!(character = identity, "Searching Scryfall for references");
        let request = PageRequest::Query(reference_query(identity));
        match self.source.fetch_page(&request).await {
            Ok(page) => {
                let references = collect_references(&page.cards);
                if page.has_more {
                    info!(
                        character = identity,
                        "More reference pages available, reading the first only"
                    );
                }
                if let Err(e) = self.store.save(&key, &references) {
                    warn!(character = identity, error = %e, "Failed to cache references");
                }
                ReferenceOutcome::Fetched(references)
            }
            Err(reason) => {
                error!(
                    character = identity,
                    error = %reason,
                    "Failed to fetch references"
                );
                ReferenceOutcome::Failed {
                    partial: ReferenceSet::new(),
                    reason,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card_source::SearchPage;
    use crate::card_source::fake::{FakeCardSource, cards};
    use std::env;
    use std::fs;

    fn create_test_store(name: &str) -> CacheStore {
        let dir = env::temp_dir().join(format!(
            "magic-characters-references-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        CacheStore::new(dir).unwrap()
    }

    fn urza_source() -> FakeCardSource {
        FakeCardSource::new().with_page(
            PageRequest::Query(reference_query("Urza")),
            SearchPage::with_next(
                cards(&[
                    "Urza, Academy Headmaster",
                    "Urza, Lord Protector // Urza, Planeswalker",
                    "Urza's Emblem",
                    "Urza's Saga",
                    "Urza, Academy Headmaster",
                ]),
                "page-2",
            ),
        )
    }

    #[test]
    fn test_reference_query_format() {
        assert_eq!(reference_query("Urza"), r"name:/^Urza\b|\bUrza$/");
        assert_eq!(
            reference_query("Nicol Bolas"),
            r"name:/^Nicol\ Bolas\b|\bNicol\ Bolas$/"
        );
        assert!(reference_query("Ob Nixilis?").contains(r"Ob\ Nixilis\?"));
    }

    #[test]
    fn test_whitespace_and_metacharacters_are_escaped() {
        assert_eq!(escape_identity("Sidar Kondo"), r"Sidar\ Kondo");
        assert_eq!(escape_identity("Kaya's Ghost-Form"), r"Kaya's\ Ghost\-Form");
        assert_eq!(escape_identity("A\tB"), "A\\\tB");
        assert_eq!(escape_identity("Urza"), "Urza");
    }

    #[test]
    fn test_cache_key_for_identity() {
        assert_eq!(references_cache_key("Nicol Bolas"), "references_nicol_bolas");
    }

    #[test]
    fn test_emblems_are_excluded_and_faces_trimmed() {
        let references = collect_references(&cards(&[
            "Urza's Emblem",
            "Urza, Academy Headmaster",
            "Urza, Lord Protector // Urza, Planeswalker",
        ]));
        let expected: ReferenceSet = ["Urza, Academy Headmaster", "Urza, Lord Protector"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(references, expected);
    }

    #[tokio::test]
    async fn test_fetches_single_page_and_caches() {
        let store = create_test_store("fetch");
        let source = urza_source();
        let searcher = ReferenceSearcher::new(&source, &store);

        let outcome = searcher.find_references("Urza").await;
        assert!(matches!(outcome, ReferenceOutcome::Fetched(_)));
        let references = outcome.into_references();
        assert_eq!(references.len(), 3);
        assert!(references.contains("Urza, Academy Headmaster"));
        assert!(references.contains("Urza, Lord Protector"));
        assert!(!references.iter().any(|name| name.contains("Emblem")));

        // has_more was set but the continuation is never followed
        assert_eq!(source.request_count(), 1);
        assert!(store.entry_path("references_urza").exists());

        let _ = fs::remove_dir_all(store.cache_dir());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let store = create_test_store("cache-hit");
        let source = urza_source();
        let searcher = ReferenceSearcher::new(&source, &store);

        let fetched = searcher.find_references("Urza").await.into_references();
        let outcome = searcher.find_references("Urza").await;

        assert!(matches!(outcome, ReferenceOutcome::Cached(_)));
        assert_eq!(outcome.references(), &fetched);
        assert_eq!(source.request_count(), 1);

        let _ = fs::remove_dir_all(store.cache_dir());
    }

    #[tokio::test]
    async fn test_failure_returns_partial_and_is_not_cached() {
        let store = create_test_store("failure");
        let source =
            FakeCardSource::new().with_failure(PageRequest::Query(reference_query("Gideon")));
        let searcher = ReferenceSearcher::new(&source, &store);

        let outcome = searcher.find_references("Gideon").await;
        match &outcome {
            ReferenceOutcome::Failed { partial, reason } => {
                assert!(partial.is_empty());
                assert!(matches!(reason, FinderError::Status { status: 503, .. }));
            }
            other => panic!("Expected a failed lookup, got {:?}", other),
        }
        assert!(!store.entry_path("references_gideon").exists());

        // The next lookup goes back to the network
        searcher.find_references("Gideon").await;
        assert_eq!(source.request_count(), 2);

        let _ = fs::remove_dir_all(store.cache_dir());
    }

    #[tokio::test]
    async fn test_cache_write_failure_still_returns_references() {
        let store = create_test_store("write-failure");
        fs::remove_dir_all(store.cache_dir()).unwrap();
        let source = urza_source();
        let searcher = ReferenceSearcher::new(&source, &store);

        let outcome = searcher.find_references("Urza").await;
        assert!(matches!(outcome, ReferenceOutcome::Fetched(_)));
        assert_eq!(outcome.references().len(), 3);
    }
}
