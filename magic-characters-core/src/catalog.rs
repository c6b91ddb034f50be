//! Cached, fully paginated catalog queries: the seed cards and the planeswalker names

use crate::cache_store::CacheStore;
use crate::canonicalize::ProtectedNames;
use crate::card_source::{CardSearch, CardSource};
use crate::error::FinderError;
use crate::scryfall::Card;
use tracing::{error, info, warn};

pub const SEED_QUERY: &str = "(type:legendary type:creatures) or type:planeswalker";
pub const SEED_CACHE_KEY: &str = "legendary_creatures";

pub const PLANESWALKER_QUERY: &str = "type:planeswalker";
pub const PLANESWALKER_CACHE_KEY: &str = "planeswalker_names";

/// Every legendary creature and planeswalker, one entry per card.
///
/// A search that stops early still yields the cards gathered so far, but only a
/// complete list is cached. Failing to cache a complete list is an error.
pub async fn load_seed_cards<S: CardSource + ?Sized>(
    source: &S,
    store: &CacheStore,
) -> Result<Vec<Card>, FinderError> {
    if let Some(cards) = store.load::<Vec<Card>>(SEED_CACHE_KEY) {
        info!(cards = cards.len(), "Using cached legendary creatures data");
        return Ok(cards);
    }

    info!("Fetching legendary creatures from Scryfall");
    let outcome = CardSearch::new(source, SEED_QUERY).collect_all().await;

    match outcome.failure {
        None => {
            store.save(SEED_CACHE_KEY, &outcome.cards)?;
            info!(cards = outcome.cards.len(), "Saved legendary creatures to cache");
            Ok(outcome.cards)
        }
        Some(reason) => {
            error!(
                cards = outcome.cards.len(),
                error = %reason,
                "Failed to fetch every legendary creature, continuing with a partial list"
            );
            Ok(outcome.cards)
        }
    }
}

/// Full planeswalker names used while canonicalizing seed names.
pub async fn load_protected_names<S: CardSource + ?Sized>(
    source: &S,
    store: &CacheStore,
) -> ProtectedNames {
    if let Some(names) = store.load::<Vec<String>>(PLANESWALKER_CACHE_KEY) {
        info!(names = names.len(), "Using cached planeswalker names");
        return ProtectedNames::from_names(names);
    }

    info!("Fetching planeswalker names from Scryfall");
    let outcome = CardSearch::new(source, PLANESWALKER_QUERY)
        .collect_all()
        .await;
    let protected = ProtectedNames::from_cards(&outcome.cards);

    match outcome.failure {
        None => {
            if let Err(e) = store.save(PLANESWALKER_CACHE_KEY, &protected.to_sorted_vec()) {
                warn!(error = %e, "Failed to cache planeswalker names");
            }
        }
        Some(reason) => {
            error!(
                names = protected.len(),
                error = %reason,
                "Error fetching planeswalker names"
            );
        }
    }

    protected
}
