//! Marketplace integrations.
//!
//! Defines the `MarketplaceApi` trait and the CSFloat HTTP implementation.
//! The engine only talks to the trait, so tests can substitute canned
//! listings and price histories.

pub mod csfloat;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::PricePoint;

/// An unparsed listing object as returned in a page of the feed.
///
/// Listings are validated one at a time by the analyzer so a single
/// malformed entry never poisons the rest of its page.
pub type RawListing = serde_json::Value;

/// Read-only access to a marketplace's listing and price-history endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    /// Fetch one page of buy-now listings. An empty vec means the feed is
    /// exhausted.
    async fn fetch_listings_page(&self, page: u32) -> Result<Vec<RawListing>>;

    /// Fetch the daily price history for an item, oldest first.
    async fn fetch_price_history(&self, item_name: &str) -> Result<Vec<PricePoint>>;
}
