//! Shared types for the FLIPSCOUT scanner.
//!
//! These types form the data model used across all modules: the listing
//! snapshot from the feed, daily price points, derived history statistics,
//! and the deal record persisted for review.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Convert an integer minor-unit amount (cents) to decimal currency units.
pub fn cents_to_decimal(cents: u64) -> Decimal {
    Decimal::from(cents) / dec!(100)
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Reference prices the marketplace attaches to a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReferencePrices {
    pub predicted_price_cents: u64,
    pub highest_buy_order_cents: u64,
}

/// A validated listing snapshot from the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub id: String,
    pub item_name: String,
    pub price_cents: u64,
    pub reference: ReferencePrices,
}

impl Listing {
    /// Asking price in currency units.
    pub fn price(&self) -> Decimal {
        cents_to_decimal(self.price_cents)
    }

    pub fn predicted_price(&self) -> Decimal {
        cents_to_decimal(self.reference.predicted_price_cents)
    }

    pub fn highest_buy_order(&self) -> Decimal {
        cents_to_decimal(self.reference.highest_buy_order_cents)
    }

    /// Helper to build a test listing with no reference prices.
    #[cfg(test)]
    pub fn sample(id: &str, price_cents: u64) -> Self {
        Listing {
            id: id.to_string(),
            item_name: "AK-47 | Redline (Field-Tested)".to_string(),
            price_cents,
            reference: ReferencePrices::default(),
        }
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} @ ${:.2} (predicted ${:.2} | top bid ${:.2})",
            self.id,
            self.item_name,
            self.price(),
            self.predicted_price(),
            self.highest_buy_order(),
        )
    }
}

// ---------------------------------------------------------------------------
// Price history
// ---------------------------------------------------------------------------

/// One day of aggregated sales from the price-history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PricePoint {
    #[serde(rename = "avg_price")]
    pub avg_price_cents: u64,
    #[serde(rename = "count", default)]
    pub sale_count: u64,
    #[serde(default)]
    pub day: Option<String>,
}

impl PricePoint {
    pub fn new(avg_price_cents: u64, sale_count: u64) -> Self {
        Self {
            avg_price_cents,
            sale_count,
            day: None,
        }
    }
}

/// Trailing-window statistics derived from a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryStats {
    pub avg_price: Decimal,
    pub volatility: Decimal,
    pub avg_sales_per_day: Decimal,
    pub days_analyzed: usize,
}

impl fmt::Display for HistoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-day avg = ${:.2} | Volatility = ±${:.2} | Sales/day = {}",
            self.days_analyzed, self.avg_price, self.volatility, self.avg_sales_per_day,
        )
    }
}

// ---------------------------------------------------------------------------
// Deals
// ---------------------------------------------------------------------------

/// How a deal is expected to be realised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipType {
    /// Sell immediately into the highest standing buy order.
    Instant,
    /// Hold and sell later near the historical average.
    Future,
}

impl fmt::Display for FlipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlipType::Instant => write!(f, "INSTANT"),
            FlipType::Future => write!(f, "FUTURE"),
        }
    }
}

/// Review status of a stored deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealStatus {
    Holding,
    Sold,
}

impl fmt::Display for DealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DealStatus::Holding => write!(f, "holding"),
            DealStatus::Sold => write!(f, "sold"),
        }
    }
}

/// An accepted opportunity as produced by the scorer, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlipCandidate {
    pub item_id: String,
    pub name: String,
    pub price: Decimal,
    pub target_price: Decimal,
    pub flip_type: FlipType,
    pub profit: Decimal,
    pub avg_price_7d: Decimal,
    pub volatility: Decimal,
    pub avg_sales: Decimal,
}

/// A deal as persisted in the deal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub item_id: String,
    pub name: String,
    pub price: Decimal,
    pub target_price: Decimal,
    pub flip_type: FlipType,
    pub profit: Decimal,
    pub avg_price_7d: Decimal,
    pub volatility: Decimal,
    pub avg_sales: Decimal,
    #[serde(deserialize_with = "deserialize_buy_time")]
    pub buy_time: DateTime<Utc>,
    pub status: DealStatus,
}

impl Deal {
    /// Stamp a candidate as bought now and held for resale.
    pub fn holding(candidate: FlipCandidate, buy_time: DateTime<Utc>) -> Self {
        Deal {
            item_id: candidate.item_id,
            name: candidate.name,
            price: candidate.price,
            target_price: candidate.target_price,
            flip_type: candidate.flip_type,
            profit: candidate.profit,
            avg_price_7d: candidate.avg_price_7d,
            volatility: candidate.volatility,
            avg_sales: candidate.avg_sales,
            buy_time,
            status: DealStatus::Holding,
        }
    }
}

/// Parse a stored buy time. Accepts RFC 3339, and offset-less ISO 8601
/// timestamps which are taken as UTC.
pub fn parse_buy_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_buy_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_buy_time(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid buy_time: {raw}")))
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for FLIPSCOUT.
#[derive(Debug, thiserror::Error)]
pub enum FlipError {
    #[error("Marketplace API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
