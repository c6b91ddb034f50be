use super::{client::ScryfallClient, models::*};
use crate::card_source::{CardSource, PageRequest, SearchPage};
use crate::error::FinderError;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{StatusCode, Url};

const SCRYFALL_SEARCH: &str = "https://api.scryfall.com/cards/search";

/// Full URL for a page request; queries ask for one entry per card rather than per printing
pub fn page_url(request: &PageRequest) -> Result<Url, FinderError> {
    match request {
        PageRequest::Query(query) => {
            Url::parse_with_params(SCRYFALL_SEARCH, &[("q", query.as_str()), ("unique", "cards")])
                .map_err(|e| FinderError::InvalidUrl(format!("{}: {}", query, e)))
        }
        PageRequest::Next(locator) => {
            Url::parse(locator).map_err(|e| FinderError::InvalidUrl(format!("{}: {}", locator, e)))
        }
    }
}

/// Turn one search response into a page. No matches (404) is an empty last page,
/// any other non-success status is an error, and cards without a usable name are skipped.
pub fn page_from_answer(
    status: StatusCode,
    url: &str,
    body: &str,
) -> Result<SearchPage, FinderError> {
    if status == StatusCode::NOT_FOUND {
        debug!("No cards matched {}", url);
        return Ok(SearchPage::default());
    }
    if !status.is_success() {
        return Err(FinderError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let answer: ScryfallSearchAnswer = serde_json::from_str(body)?;
    let mut cards = Vec::with_capacity(answer.data.len());
    for card_data in &answer.data {
        match Card::from_scryfall_object(card_data) {
            Ok(card) => cards.push(card),
            Err(e) => {
                info!("Skipping invalid card: {}", e);
                continue;
            }
        }
    }

    Ok(SearchPage {
        cards,
        has_more: answer.has_more,
        next_page: answer.next_page,
    })
}

#[async_trait]
impl CardSource for ScryfallClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<SearchPage, FinderError> {
        let url = page_url(request)?;
        let response = self.call(url.clone()).await?;

        let status = response.status();
        let body = response.text().await?;
        page_from_answer(status, url.as_str(), &body)
    }
}
