use crate::error::FinderError;
use log::debug;
use std::sync::Mutex;
use time::OffsetDateTime;
use tokio::time::{Duration, Instant};

// Headers required according to https://scryfall.com/docs/api/
const USER_AGENT: &str = "magic-characters-core/0.1";
const ACCEPT: &str = "application/json;q=0.9,*/*;q=0.8";
const SCRYFALL_COOLDOWN: Duration = Duration::from_millis(200);
const MAX_API_HISTORY: usize = 100;

#[derive(Debug, Clone)]
pub struct ApiCall {
    pub url: String,
    pub timestamp: OffsetDateTime,
    pub status_code: u16,
    pub success: bool,
}

#[derive(Debug)]
pub struct ScryfallClient {
    client: reqwest::Client,
    // Earliest instant the next request may go out
    next_call: Mutex<Instant>,
    history: Mutex<Vec<ApiCall>>,
    total_calls: Mutex<usize>,
}

impl ScryfallClient {
    pub fn new() -> Result<Self, FinderError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(ACCEPT),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(ScryfallClient {
            client,
            next_call: Mutex::new(Instant::now()),
            history: Mutex::new(Vec::new()),
            total_calls: Mutex::new(0),
        })
    }

    /// Reserve the next request slot, at least one cooldown after the previous one
    fn reserve_slot(&self) -> Instant {
        let mut next_call = self
            .next_call
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let slot = (*next_call).max(Instant::now());
        *next_call = slot + SCRYFALL_COOLDOWN;
        slot
    }

    pub async fn call(&self, url: reqwest::Url) -> Result<reqwest::Response, FinderError> {
        tokio::time::sleep_until(self.reserve_slot()).await;
        debug!("calling scryfall API: {}", url);

        let timestamp = OffsetDateTime::now_utc();
        let result = self.client.get(url.clone()).send().await;

        let (status_code, success) = match &result {
            Ok(response) => (response.status().as_u16(), response.status().is_success()),
            // Unknown status for transport errors
            Err(_) => (0, false),
        };
        self.record_call(ApiCall {
            url: url.to_string(),
            timestamp,
            status_code,
            success,
        });

        result.map_err(FinderError::Network)
    }

    fn record_call(&self, api_call: ApiCall) {
        if let Ok(mut total) = self.total_calls.lock() {
            *total += 1;
        }
        if let Ok(mut history) = self.history.lock() {
            history.push(api_call);
            if history.len() > MAX_API_HISTORY {
                let excess = history.len() - MAX_API_HISTORY;
                history.drain(0..excess);
            }
        }
    }

    /// The most recent network calls, oldest first
    pub fn api_call_history(&self) -> Vec<ApiCall> {
        self.history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    /// Number of requests sent by this client, including those dropped from the history
    pub fn network_call_count(&self) -> usize {
        self.total_calls.lock().map(|total| *total).unwrap_or(0)
    }
}
