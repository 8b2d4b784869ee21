//! REST client for the order tracking backend.
//!
//! Lookups normalize every failure into a [`LookupOutcome`] so the dispatch
//! loop never has to reason about transport errors. The root cause only
//! surfaces in the logs.

use std::time::Duration;

use rand::Rng;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{instrument, warn};

use super::model::{LookupOutcome, OrderRecord, OrderSummary, SearchOutcome};

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// A failed attempt, split by whether a second try could plausibly help.
enum FetchError {
    Retryable(String),
    Fatal(String),
}

#[derive(Debug, Clone)]
pub struct OrderApi {
    client: Client,
    base_url: String,
}

impl OrderApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch a single order by its order number.
    ///
    /// Network failures and 5xx responses get exactly one retry after a short
    /// jittered pause. A 404 or a well-formed "no such order" body is a clean
    /// [`LookupOutcome::NotFound`] and is never retried.
    #[instrument(level = "debug", skip(self))]
    pub async fn lookup(&self, order_number: &str) -> LookupOutcome {
        match self.fetch_order(order_number).await {
            Ok(outcome) => outcome,
            Err(FetchError::Fatal(cause)) => {
                warn!(target: "orders", %cause, order_number, "order lookup failed");
                LookupOutcome::TransientError
            }
            Err(FetchError::Retryable(cause)) => {
                let delay = retry_delay();
                warn!(
                    target: "orders",
                    %cause,
                    order_number,
                    retry_in_ms = delay.as_millis() as u64,
                    "order lookup failed; retrying once"
                );
                tokio::time::sleep(delay).await;
                match self.fetch_order(order_number).await {
                    Ok(outcome) => outcome,
                    Err(FetchError::Retryable(cause)) | Err(FetchError::Fatal(cause)) => {
                        warn!(target: "orders", %cause, order_number, "order lookup failed after retry");
                        LookupOutcome::TransientError
                    }
                }
            }
        }
    }

    /// Search orders by customer name, phone number, or email. Same retry
    /// policy as [`OrderApi::lookup`].
    #[instrument(level = "debug", skip(self))]
    pub async fn search(&self, term: &str) -> SearchOutcome {
        match self.fetch_search(term).await {
            Ok(outcome) => outcome,
            Err(FetchError::Fatal(cause)) => {
                warn!(target: "orders", %cause, term, "order search failed");
                SearchOutcome::TransientError
            }
            Err(FetchError::Retryable(cause)) => {
                let delay = retry_delay();
                warn!(
                    target: "orders",
                    %cause,
                    term,
                    retry_in_ms = delay.as_millis() as u64,
                    "order search failed; retrying once"
                );
                tokio::time::sleep(delay).await;
                match self.fetch_search(term).await {
                    Ok(outcome) => outcome,
                    Err(FetchError::Retryable(cause)) | Err(FetchError::Fatal(cause)) => {
                        warn!(target: "orders", %cause, term, "order search failed after retry");
                        SearchOutcome::TransientError
                    }
                }
            }
        }
    }

    async fn fetch_order(&self, order_number: &str) -> Result<LookupOutcome, FetchError> {
        let url = self.order_url(order_number).ok_or_else(|| {
            FetchError::Fatal(format!("cannot build order URL from {}", self.base_url))
        })?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Retryable(format!("order API request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(LookupOutcome::NotFound);
        }
        if status.is_server_error() {
            return Err(FetchError::Retryable(format!("order API returned {status}")));
        }
        if !status.is_success() {
            return Err(FetchError::Fatal(format!("order API returned {status}")));
        }
        let envelope: OrderEnvelope = response
            .json()
            .await
            .map_err(|e| FetchError::Fatal(format!("malformed order API response: {e}")))?;
        match envelope.order {
            Some(order) if envelope.success => Ok(LookupOutcome::Found(order)),
            _ => Ok(LookupOutcome::NotFound),
        }
    }

    async fn fetch_search(&self, term: &str) -> Result<SearchOutcome, FetchError> {
        let url = self.search_url(term).ok_or_else(|| {
            FetchError::Fatal(format!("cannot build search URL from {}", self.base_url))
        })?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Retryable(format!("order API request failed: {e}")))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(FetchError::Retryable(format!("order API returned {status}")));
        }
        if !status.is_success() {
            return Err(FetchError::Fatal(format!("order API returned {status}")));
        }
        let envelope: SearchEnvelope = response
            .json()
            .await
            .map_err(|e| FetchError::Fatal(format!("malformed search response: {e}")))?;
        let orders = envelope.orders.unwrap_or_default();
        if envelope.success && !orders.is_empty() {
            Ok(SearchOutcome::Found(orders))
        } else {
            Ok(SearchOutcome::NoMatches)
        }
    }

    fn order_url(&self, order_number: &str) -> Option<Url> {
        let mut url = Url::parse(&self.base_url).ok()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["api", "order", order_number]);
        Some(url)
    }

    fn search_url(&self, term: &str) -> Option<Url> {
        let mut url = Url::parse(&self.base_url).ok()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["api", "orders", "search"]);
        url.query_pairs_mut().append_pair("q", term);
        Some(url)
    }
}

fn retry_delay() -> Duration {
    Duration::from_millis(rand::rng().random_range(250..=750))
}

#[derive(Debug, Deserialize)]
struct OrderEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    order: Option<OrderRecord>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    orders: Option<Vec<OrderSummary>>,
}
