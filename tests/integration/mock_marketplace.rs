//! Mock marketplace for integration testing.
//!
//! Provides a deterministic `MarketplaceApi` implementation that serves
//! canned listing pages and price histories from memory, records every
//! request, and can be forced into failure.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use flipscout::market::{MarketplaceApi, RawListing};
use flipscout::types::PricePoint;

/// A mock marketplace for deterministic testing.
#[derive(Default)]
pub struct MockMarketplace {
    pages: Vec<Vec<RawListing>>,
    histories: HashMap<String, Vec<PricePoint>>,
    /// Page index at which listing requests start failing.
    fail_from_page: Option<u32>,
    history_requests: Arc<Mutex<Vec<String>>>,
    page_requests: Arc<Mutex<Vec<u32>>>,
}

impl MockMarketplace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page of listings.
    pub fn with_page(mut self, listings: Vec<RawListing>) -> Self {
        self.pages.push(listings);
        self
    }

    /// Register the price history served for an item name.
    pub fn with_history(mut self, item_name: &str, points: Vec<PricePoint>) -> Self {
        self.histories.insert(item_name.to_string(), points);
        self
    }

    /// Fail every listings request from `page` onwards.
    pub fn failing_from_page(mut self, page: u32) -> Self {
        self.fail_from_page = Some(page);
        self
    }

    pub fn history_requests(&self) -> Vec<String> {
        self.history_requests.lock().unwrap().clone()
    }

    pub fn page_requests(&self) -> Vec<u32> {
        self.page_requests.lock().unwrap().clone()
    }

    /// A CSFloat-shaped listing object.
    pub fn listing(id: &str, name: &str, price: u64, predicted: u64, buy_order: u64) -> RawListing {
        json!({
            "id": id,
            "price": price,
            "type": "buy_now",
            "item": {"market_hash_name": name},
            "reference": {
                "base_price": predicted,
                "predicted_price": predicted,
                "highest_buy_order": buy_order,
                "quantity": 12
            }
        })
    }

    /// `days` identical daily points.
    pub fn flat_history(days: usize, avg_price_cents: u64, sales: u64) -> Vec<PricePoint> {
        (0..days).map(|_| PricePoint::new(avg_price_cents, sales)).collect()
    }
}

#[async_trait]
impl MarketplaceApi for MockMarketplace {
    async fn fetch_listings_page(&self, page: u32) -> Result<Vec<RawListing>> {
        self.page_requests.lock().unwrap().push(page);
        if self.fail_from_page.is_some_and(|p| page >= p) {
            return Err(anyhow!("mock: listings page {page} unavailable"));
        }
        Ok(self.pages.get(page as usize).cloned().unwrap_or_default())
    }

    async fn fetch_price_history(&self, item_name: &str) -> Result<Vec<PricePoint>> {
        self.history_requests.lock().unwrap().push(item_name.to_string());
        self.histories
            .get(item_name)
            .cloned()
            .ok_or_else(|| anyhow!("mock: no history for {item_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_serves_pages_in_order() {
        let mock = MockMarketplace::new()
            .with_page(vec![MockMarketplace::listing("a", "A", 100, 0, 0)])
            .with_page(vec![MockMarketplace::listing("b", "B", 100, 0, 0)]);

        assert_eq!(mock.fetch_listings_page(0).await.unwrap()[0]["id"], "a");
        assert_eq!(mock.fetch_listings_page(1).await.unwrap()[0]["id"], "b");
        assert!(mock.fetch_listings_page(2).await.unwrap().is_empty());
        assert_eq!(mock.page_requests(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_mock_forced_error() {
        let mock = MockMarketplace::new()
            .with_page(vec![MockMarketplace::listing("a", "A", 100, 0, 0)])
            .failing_from_page(0);
        assert!(mock.fetch_listings_page(0).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_unknown_history_errors() {
        let mock = MockMarketplace::new();
        assert!(mock.fetch_price_history("nope").await.is_err());
        assert_eq!(mock.history_requests(), vec!["nope".to_string()]);
    }
}
