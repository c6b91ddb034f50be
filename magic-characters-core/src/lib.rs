pub mod cache_store;
pub mod canonicalize;
pub mod card_source;
pub mod catalog;
pub mod error;
pub mod format;
pub mod ranking;
pub mod references;
pub mod scryfall;

pub use cache_store::{CacheStore, cache_key};
pub use canonicalize::{NameCanonicalizer, ProtectedNames};
pub use card_source::{CardSearch, CardSource, PageRequest, SearchOutcome, SearchPage};
pub use error::FinderError;
pub use format::format_report;
pub use ranking::{CharacterTally, RankedCharacter, rank_characters};
pub use references::{ReferenceOutcome, ReferenceSearcher, ReferenceSet};
pub use scryfall::{ApiCall, Card, ScryfallClient};

use catalog::{load_protected_names, load_seed_cards};
use tracing::{info, warn};

/// Characters need at least this many referencing cards to be reported
pub const DEFAULT_MIN_REFERENCES: usize = 2;

/// Counters describing the most recent run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub seeds: usize,
    pub rejected_identities: usize,
    pub cached_lookups: usize,
    pub fetched_lookups: usize,
    pub failed_lookups: usize,
    pub characters: usize,
}

/// Main interface for ranking recurring characters
pub struct CharacterFinder<S: CardSource> {
    source: S,
    store: CacheStore,
    last_run: Option<RunSummary>,
}

impl<S: CardSource> CharacterFinder<S> {
    pub fn new(source: S, store: CacheStore) -> Self {
        CharacterFinder {
            source,
            store,
            last_run: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Summary of the most recent completed run
    pub fn run_summary(&self) -> Option<&RunSummary> {
        self.last_run.as_ref()
    }

    /// Find every character referenced by at least `min_references` cards, most referenced first.
    ///
    /// Only a failure to cache a complete seed list ends the run early; failed
    /// searches shrink the result instead.
    pub async fn find_character_references(
        &mut self,
        min_references: usize,
    ) -> Result<Vec<RankedCharacter>, FinderError> {
        let mut summary = RunSummary::default();

        let seeds = load_seed_cards(&self.source, &self.store).await?;
        summary.seeds = seeds.len();
        if seeds.is_empty() {
            warn!("No seed cards available, nothing to rank");
            self.last_run = Some(summary);
            return Ok(Vec::new());
        }

        // Fetched before the first name is canonicalized and kept for the whole run
        let protected = load_protected_names(&self.source, &self.store).await;
        info!(names = protected.len(), "Planeswalker names ready");
        let canonicalizer = NameCanonicalizer::new(protected);
        let searcher = ReferenceSearcher::new(&self.source, &self.store);

        let mut tally = CharacterTally::new();
        for card in &seeds {
            let Some(identity) = canonicalizer.canonicalize(&card.raw_name) else {
                summary.rejected_identities += 1;
                continue;
            };

            let references = match searcher.find_references(&identity).await {
                ReferenceOutcome::Cached(references) => {
                    summary.cached_lookups += 1;
                    references
                }
                ReferenceOutcome::Fetched(references) => {
                    summary.fetched_lookups += 1;
                    references
                }
                ReferenceOutcome::Failed { partial, reason } => {
                    summary.failed_lookups += 1;
                    warn!(
                        character = %identity,
                        error = %reason,
                        "Continuing with partial references"
                    );
                    partial
                }
            };

            if references.len() >= min_references {
                tally.record(identity, references);
            }
        }

        let ranked = tally.into_ranked();
        summary.characters = ranked.len();
        info!(
            seeds = summary.seeds,
            rejected = summary.rejected_identities,
            cached = summary.cached_lookups,
            fetched = summary.fetched_lookups,
            failed = summary.failed_lookups,
            characters = summary.characters,
            "Character search complete"
        );
        self.last_run = Some(summary);

        Ok(ranked)
    }
}
