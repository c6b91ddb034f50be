//! Paginated card searches against an external card database
//!
//! [`CardSource`] fetches one page at a time; [`CardSearch`] walks the
//! continuation locators of a query lazily, spacing requests out and stopping
//! with whatever it has gathered when a page fails.

use crate::error::FinderError;
use crate::scryfall::Card;
use async_trait::async_trait;
use tokio::time::Duration;
use tracing::{debug, warn};

/// Minimum pause between two page requests of the same search
pub const PAGE_DELAY: Duration = Duration::from_millis(200);

/// What to fetch: the first page of a query, or a continuation locator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageRequest {
    /// Query expression in the database's own search language, passed through verbatim
    Query(String),
    /// Next-page locator returned by the previous page
    Next(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub cards: Vec<Card>,
    pub has_more: bool,
    pub next_page: Option<String>,
}

impl SearchPage {
    pub fn last(cards: Vec<Card>) -> Self {
        SearchPage {
            cards,
            has_more: false,
            next_page: None,
        }
    }

    pub fn with_next(cards: Vec<Card>, next_page: impl Into<String>) -> Self {
        SearchPage {
            cards,
            has_more: true,
            next_page: Some(next_page.into()),
        }
    }
}

#[async_trait]
pub trait CardSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<SearchPage, FinderError>;
}

/// Every card a search produced, plus the reason it stopped early if it did
#[derive(Debug)]
pub struct SearchOutcome {
    pub cards: Vec<Card>,
    pub failure: Option<FinderError>,
}

impl SearchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

pub struct CardSearch<'a, S: CardSource + ?Sized> {
    source: &'a S,
    query: String,
    pending: Option<PageRequest>,
    pages_fetched: usize,
    failure: Option<FinderError>,
}

impl<'a, S: CardSource + ?Sized> CardSearch<'a, S> {
    pub fn new(source: &'a S, query: impl Into<String>) -> Self {
        let query = query.into();
        CardSearch {
            source,
            pending: Some(PageRequest::Query(query.clone())),
            query,
            pages_fetched: 0,
            failure: None,
        }
    }

    /// Fetch the next page of cards, or `None` once the search is exhausted or has failed.
    pub async fn next_page(&mut self) -> Option<Vec<Card>> {
        let request = self.pending.take()?;

        if self.pages_fetched > 0 {
            tokio::time::sleep(PAGE_DELAY).await;
        }

        match self.source.fetch_page(&request).await {
            Ok(page) => {
                self.pages_fetched += 1;
                debug!(
                    query = %self.query,
                    page = self.pages_fetched,
                    cards = page.cards.len(),
                    has_more = page.has_more,
                    "Fetched search page"
                );

                self.pending = match (page.has_more, page.next_page) {
                    (true, Some(next)) => Some(PageRequest::Next(next)),
                    (true, None) => {
                        warn!(query = %self.query, "Search reported more pages without a locator");
                        None
                    }
                    (false, _) => None,
                };
                Some(page.cards)
            }
            Err(e) => {
                warn!(
                    query = %self.query,
                    page = self.pages_fetched + 1,
                    error = %e,
                    "Search page failed, keeping partial results"
                );
                self.failure = Some(e);
                None
            }
        }
    }

    pub async fn collect_all(mut self) -> SearchOutcome {
        let mut cards = Vec::new();
        while let Some(batch) = self.next_page().await {
            cards.extend(batch);
        }

        SearchOutcome {
            cards,
            failure: self.failure,
        }
    }
}
