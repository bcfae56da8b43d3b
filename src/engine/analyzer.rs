//! Market analyzer — the per-listing pipeline.
//!
//! Validates raw listings, drops ones already seen this run, pulls price
//! history, scores, and stores accepted deals. Every listing yields an
//! explicit outcome so one bad record never aborts the batch and nothing is
//! dropped without a recorded reason.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, error, info, warn};

use crate::analysis::history::analyze_history;
use crate::analysis::scorer::{DealScorer, Rejection};
use crate::market::csfloat::{parse_listing, ListingError};
use crate::market::{MarketplaceApi, RawListing};
use crate::storage::DealStore;
use crate::types::Deal;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a listing produced no deal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Skip {
    #[error(transparent)]
    Invalid(#[from] ListingError),

    #[error("already analysed this run")]
    AlreadySeen,

    #[error("price ${price} above max listing price ${max}")]
    OverBudget { price: Decimal, max: Decimal },

    #[error(transparent)]
    Rejected(#[from] Rejection),
}

impl Skip {
    /// Short stable label for aggregating counts in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Skip::Invalid(ListingError::Malformed(_)) => "malformed",
            Skip::Invalid(ListingError::MissingId) => "missing_id",
            Skip::Invalid(ListingError::MissingName) => "missing_name",
            Skip::AlreadySeen => "already_seen",
            Skip::OverBudget { .. } => "over_budget",
            Skip::Rejected(r) => r.label(),
        }
    }
}

/// Result of analysing one listing.
#[derive(Debug, Clone)]
pub enum ListingOutcome {
    /// Accepted and written to the deal record.
    Deal(Deal),
    /// Accepted by the scorer but the deal record could not be written.
    StoreFailed { item_id: String, error: String },
    Skipped(Skip),
}

/// Aggregated outcomes of one batch, in feed order.
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    pub outcomes: Vec<ListingOutcome>,
}

impl AnalysisReport {
    pub fn deals(&self) -> Vec<&Deal> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                ListingOutcome::Deal(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    pub fn deal_count(&self) -> usize {
        self.deals().len()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ListingOutcome::Skipped(_)))
            .count()
    }

    pub fn store_failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ListingOutcome::StoreFailed { .. }))
            .count()
    }

    /// Skip counts keyed by reason label, sorted for stable log output.
    pub fn skip_counts_by_reason(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for outcome in &self.outcomes {
            if let ListingOutcome::Skipped(skip) = outcome {
                *counts.entry(skip.label()).or_insert(0) += 1;
            }
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Owns the per-process seen-set and drives listings through scoring.
pub struct MarketAnalyzer {
    scorer: DealScorer,
    store: DealStore,
    seen_ids: HashSet<String>,
}

impl MarketAnalyzer {
    pub fn new(scorer: DealScorer, store: DealStore) -> Self {
        Self {
            scorer,
            store,
            seen_ids: HashSet::new(),
        }
    }

    pub fn store(&self) -> &DealStore {
        &self.store
    }

    /// Number of distinct listing ids analysed so far.
    pub fn seen_count(&self) -> usize {
        self.seen_ids.len()
    }

    pub fn has_seen(&self, listing_id: &str) -> bool {
        self.seen_ids.contains(listing_id)
    }

    /// Analyse a batch of raw listings.
    pub async fn analyze(
        &mut self,
        api: &dyn MarketplaceApi,
        listings: &[RawListing],
    ) -> AnalysisReport {
        let mut report = AnalysisReport::default();
        for raw in listings {
            let outcome = self.analyze_one(api, raw).await;
            if let ListingOutcome::Skipped(skip) = &outcome {
                debug!(reason = %skip, "Listing skipped");
            }
            report.outcomes.push(outcome);
        }
        report
    }

    async fn analyze_one(&mut self, api: &dyn MarketplaceApi, raw: &RawListing) -> ListingOutcome {
        let listing = match parse_listing(raw) {
            Ok(l) => l,
            Err(e) => {
                warn!(error = %e, "Skipping listing");
                return ListingOutcome::Skipped(e.into());
            }
        };

        // Mark seen before any network work so a listing whose history
        // fetch fails is still only tried once.
        if !self.seen_ids.insert(listing.id.clone()) {
            return ListingOutcome::Skipped(Skip::AlreadySeen);
        }

        debug!(listing = %listing, "Analyzing listing");

        let config = self.scorer.config();
        let price = listing.price();
        if price > config.max_listing_price {
            return ListingOutcome::Skipped(Skip::OverBudget {
                price,
                max: config.max_listing_price,
            });
        }

        let points = api
            .fetch_price_history(&listing.item_name)
            .await
            .unwrap_or_else(|e| {
                error!(item = %listing.item_name, error = %e, "Failed fetching price history");
                Vec::new()
            });
        let stats = analyze_history(&points, config.history_days);
        if let Some(stats) = &stats {
            debug!(item = %listing.item_name, stats = %stats, "History analysed");
        }

        let candidate = match self.scorer.score(&listing, stats.as_ref()) {
            Ok(c) => c,
            Err(rejection) => return ListingOutcome::Skipped(rejection.into()),
        };

        info!(
            flip_type = %candidate.flip_type,
            item = %candidate.name,
            listed = format!("${:.2}", candidate.price),
            target = format!("${:.2}", candidate.target_price),
            profit = format!("${:.2}", candidate.profit),
            avg_7d = format!("${:.2}", candidate.avg_price_7d),
            volatility = format!("±${:.2}", candidate.volatility),
            sales_per_day = %candidate.avg_sales,
            "Flip found"
        );

        let item_id = candidate.item_id.clone();
        match self.store.save(candidate) {
            Ok(deal) => ListingOutcome::Deal(deal),
            Err(e) => {
                error!(item_id = %item_id, error = %e, "Failed to save deal");
                ListingOutcome::StoreFailed {
                    item_id,
                    error: e.to_string(),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
