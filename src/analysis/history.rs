//! Trailing-window statistics over daily price points.

use rust_decimal::{Decimal, MathematicalOps};

use crate::types::{cents_to_decimal, HistoryStats, PricePoint};

/// Default trailing window, in days.
pub const DEFAULT_WINDOW_DAYS: usize = 7;

/// Summarise the last `days` points of an oldest→newest price series.
///
/// Returns `None` when the series is shorter than the window (or the window
/// is empty) or when the values are too large to summarise. Volatility is the sample standard deviation and is zero for a
/// single-point window. All outputs are rounded to 2 dp.
pub fn analyze_history(points: &[PricePoint], days: usize) -> Option<HistoryStats> {
    if days == 0 || points.len() < days {
        return None;
    }

    let recent = &points[points.len() - days..];
    let prices: Vec<Decimal> = recent
        .iter()
        .map(|p| cents_to_decimal(p.avg_price_cents))
        .collect();
    let n = Decimal::from(days);

    // Remote values are unbounded; any overflow makes the window unusable.
    let total = prices
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(*p))?;
    let mean = total / n;

    let volatility = if days > 1 {
        let sum_sq = prices.iter().try_fold(Decimal::ZERO, |acc, p| {
            let diff = p.checked_sub(mean)?;
            acc.checked_add(diff.checked_mul(diff)?)
        })?;
        let variance = sum_sq / Decimal::from(days - 1);
        variance.sqrt().unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    let total_sales = recent
        .iter()
        .try_fold(0u64, |acc, p| acc.checked_add(p.sale_count))?;
    let avg_sales = Decimal::from(total_sales) / n;

    Some(HistoryStats {
        avg_price: mean.round_dp(2),
        volatility: volatility.round_dp(2),
        avg_sales_per_day: avg_sales.round_dp(2),
        days_analyzed: days,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
