//! Deal scoring.
//!
//! Combines a listing's asking price with its reference prices and
//! trailing history to decide whether it is an instant flip (sell into the
//! standing buy order), a future flip (hold and sell near the historical
//! average), or not worth buying.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::debug;

use crate::types::{FlipCandidate, FlipType, HistoryStats, Listing};

// ---------------------------------------------------------------------------
// Configuration (defaults — overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Thresholds and fee assumptions used by the scorer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Minimum projected profit, in currency units, to accept a deal.
    pub min_profit: Decimal,
    /// Listings priced above this are never considered.
    pub max_listing_price: Decimal,
    /// Reject items whose price stdev exceeds this.
    pub max_volatility: Decimal,
    /// Reject items selling fewer times per day than this.
    pub min_sales_per_day: Decimal,
    /// Marketplace sale fee as a fraction of the sale price.
    pub marketplace_fee: Decimal,
    /// Tax reserve held back from the sale price.
    pub tax_buffer: Decimal,
    /// Fraction of the top buy order realised on an instant sale.
    pub instant_sell_ratio: Decimal,
    /// Trailing window for history statistics.
    pub history_days: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_profit: dec!(0.50),
            max_listing_price: dec!(100.00),
            max_volatility: dec!(8),
            min_sales_per_day: dec!(0.5),
            marketplace_fee: dec!(0.05),
            tax_buffer: dec!(0.05),
            instant_sell_ratio: dec!(0.95),
            history_days: crate::analysis::history::DEFAULT_WINDOW_DAYS,
        }
    }
}

impl ScoringConfig {
    /// Proceeds from selling at `price` after the fee and tax reserve.
    pub fn net_sell(&self, price: Decimal) -> Decimal {
        price - price * self.marketplace_fee - price * self.tax_buffer
    }

    /// Profit from buying at `buy` and later selling at `sell`, rounded to 2 dp.
    pub fn future_profit(&self, buy: Decimal, sell: Decimal) -> Decimal {
        (self.net_sell(sell) - buy).round_dp(2)
    }

    /// Profit from buying at `buy` and selling straight into a buy order at
    /// `buy_order`, rounded to 2 dp.
    pub fn instant_profit(&self, buy: Decimal, buy_order: Decimal) -> Decimal {
        (buy_order * self.instant_sell_ratio - buy).round_dp(2)
    }
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Why the scorer declined a listing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("not enough price history")]
    InsufficientHistory,

    #[error("illiquid: {avg_sales} sales/day")]
    Illiquid { avg_sales: Decimal },

    #[error("too volatile: ±${volatility}")]
    TooVolatile { volatility: Decimal },

    #[error("no valid price anchor")]
    NoPriceAnchor,

    #[error("{flip_type} profit ${profit} below minimum")]
    BelowMinProfit { flip_type: FlipType, profit: Decimal },

    #[error("listed at or above target price")]
    NoSpread,
}

impl Rejection {
    /// Short stable label for aggregating counts in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Rejection::InsufficientHistory => "insufficient_history",
            Rejection::Illiquid { .. } => "illiquid",
            Rejection::TooVolatile { .. } => "too_volatile",
            Rejection::NoPriceAnchor => "no_price_anchor",
            Rejection::BelowMinProfit { .. } => "below_min_profit",
            Rejection::NoSpread => "no_spread",
        }
    }
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// Classifies listings into flip opportunities.
pub struct DealScorer {
    config: ScoringConfig,
}

impl DealScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Access the scoring configuration.
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a listing against its history. `None` stats means the history
    /// was too short to trust.
    pub fn score(
        &self,
        listing: &Listing,
        stats: Option<&HistoryStats>,
    ) -> Result<FlipCandidate, Rejection> {
        let stats = stats.ok_or(Rejection::InsufficientHistory)?;

        if stats.avg_sales_per_day < self.config.min_sales_per_day {
            return Err(Rejection::Illiquid {
                avg_sales: stats.avg_sales_per_day,
            });
        }

        if stats.volatility > self.config.max_volatility {
            return Err(Rejection::TooVolatile {
                volatility: stats.volatility,
            });
        }

        let price = listing.price();
        let predicted = listing.predicted_price();
        let buy_order = listing.highest_buy_order();

        let anchor = if stats.avg_price > Decimal::ZERO {
            stats.avg_price
        } else if predicted > Decimal::ZERO {
            predicted
        } else {
            return Err(Rejection::NoPriceAnchor);
        };

        let (flip_type, target_price, profit) =
            if buy_order > Decimal::ZERO && price < buy_order {
                let profit = self.config.instant_profit(price, buy_order);
                (FlipType::Instant, buy_order, profit)
            } else if price < anchor {
                let profit = self.config.future_profit(price, anchor);
                (FlipType::Future, anchor, profit)
            } else {
                debug!(listing_id = %listing.id, price = %price, anchor = %anchor, "No spread");
                return Err(Rejection::NoSpread);
            };

        if profit < self.config.min_profit {
            debug!(
                listing_id = %listing.id,
                flip_type = %flip_type,
                profit = %profit,
                min_profit = %self.config.min_profit,
                "Profit below minimum"
            );
            return Err(Rejection::BelowMinProfit { flip_type, profit });
        }

        Ok(FlipCandidate {
            item_id: listing.id.clone(),
            name: listing.item_name.clone(),
            price,
            target_price,
            flip_type,
            profit,
            avg_price_7d: stats.avg_price,
            volatility: stats.volatility,
            avg_sales: stats.avg_sales_per_day,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
