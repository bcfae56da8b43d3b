//! CSFloat marketplace integration.
//!
//! Pages through buy-now listings and pulls per-item daily price graphs.
//!
//! Base URL: https://csfloat.com/api/v1
//! Auth: optional `Authorization: <key>` header. Listing reads work
//! without a key but are more aggressively rate limited.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::{MarketplaceApi, RawListing};
use crate::config::ApiConfig;
use crate::types::{FlipError, Listing, PricePoint, ReferencePrices};

// ---------------------------------------------------------------------------
// API response types (CSFloat JSON → Rust)
// ---------------------------------------------------------------------------

/// Envelope returned by `/listings`.
#[derive(Debug, Deserialize)]
struct ListingsPage {
    #[serde(default)]
    data: Vec<RawListing>,
}

/// The subset of a CSFloat listing object that scoring needs.
#[derive(Debug, Deserialize)]
struct CsFloatListing {
    #[serde(default, deserialize_with = "string_or_number")]
    id: Option<String>,
    #[serde(default)]
    price: u64,
    #[serde(default)]
    item: CsFloatItem,
    #[serde(default)]
    reference: CsFloatReference,
}

#[derive(Debug, Default, Deserialize)]
struct CsFloatItem {
    #[serde(default)]
    market_hash_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CsFloatReference {
    #[serde(default)]
    predicted_price: u64,
    #[serde(default)]
    highest_buy_order: u64,
}

/// Listing ids arrive as strings, but accept bare numbers too.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Why a raw listing could not be turned into a `Listing`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListingError {
    #[error("malformed listing: {0}")]
    Malformed(String),

    #[error("listing has no id")]
    MissingId,

    #[error("listing has no item name")]
    MissingName,
}

/// Validate a raw feed entry.
pub fn parse_listing(raw: &RawListing) -> std::result::Result<Listing, ListingError> {
    let parsed: CsFloatListing = serde_json::from_value(raw.clone())
        .map_err(|e| ListingError::Malformed(e.to_string()))?;

    let name = parsed
        .item
        .market_hash_name
        .filter(|n| !n.is_empty())
        .ok_or(ListingError::MissingName)?;
    let id = parsed
        .id
        .filter(|id| !id.is_empty())
        .ok_or(ListingError::MissingId)?;

    Ok(Listing {
        id,
        item_name: name,
        price_cents: parsed.price,
        reference: ReferencePrices {
            predicted_price_cents: parsed.reference.predicted_price,
            highest_buy_order_cents: parsed.reference.highest_buy_order,
        },
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// CSFloat REST client.
pub struct CsFloatClient {
    http: Client,
    base_url: String,
    page_size: u32,
    min_price_cents: u64,
    max_price_cents: u64,
    listing_type: String,
}

impl CsFloatClient {
    /// Create a new client. `api_key` is sent verbatim as the
    /// `Authorization` header when present.
    pub fn new(config: &ApiConfig, api_key: Option<SecretString>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let mut value = HeaderValue::from_str(key.expose_secret())
                .context("API key is not a valid header value")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("flipscout/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client for CSFloat")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            min_price_cents: config.min_price_cents,
            max_price_cents: config.max_price_cents,
            listing_type: config.listing_type.clone(),
        })
    }

    fn listings_url(&self) -> String {
        format!("{}/listings", self.base_url)
    }

    fn history_url(&self, item_name: &str) -> String {
        format!(
            "{}/history/{}/graph",
            self.base_url,
            urlencoding::encode(item_name)
        )
    }

    /// Turn a non-2xx response into a `FlipError::Api`.
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(FlipError::Api { status, body }.into())
    }
}

// ---------------------------------------------------------------------------
// MarketplaceApi trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl MarketplaceApi for CsFloatClient {
    async fn fetch_listings_page(&self, page: u32) -> Result<Vec<RawListing>> {
        debug!(page, "Fetching CSFloat listings page");

        let resp = self
            .http
            .get(self.listings_url())
            .query(&[
                ("limit", self.page_size.to_string()),
                ("page", page.to_string()),
                ("min_price", self.min_price_cents.to_string()),
                ("max_price", self.max_price_cents.to_string()),
                ("type", self.listing_type.clone()),
            ])
            .send()
            .await
            .context("CSFloat listings request failed")?;

        let page_body: ListingsPage = Self::check_status(resp)
            .await?
            .json()
            .await
            .context("Failed to parse CSFloat listings response")?;

        Ok(page_body.data)
    }

    async fn fetch_price_history(&self, item_name: &str) -> Result<Vec<PricePoint>> {
        let url = self.history_url(item_name);
        debug!(url = %url, "Fetching CSFloat price graph");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("CSFloat history request failed")?;

        let points: Vec<PricePoint> = Self::check_status(resp)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse price graph for {item_name}"))?;

        Ok(points)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
