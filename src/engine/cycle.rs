//! One poll cycle: fetch the feed, analyse every listing, report counts.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use crate::engine::analyzer::MarketAnalyzer;
use crate::engine::feed::collect_listings;
use crate::market::MarketplaceApi;

/// Summary of a single fetch→score→store cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_number: u64,
    pub listings_fetched: usize,
    pub deals_found: usize,
    pub skipped: usize,
    pub store_failures: usize,
    pub skip_reasons: BTreeMap<&'static str, usize>,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cycle #{}: listings={} deals={} skipped={} store_failures={}",
            self.cycle_number,
            self.listings_fetched,
            self.deals_found,
            self.skipped,
            self.store_failures,
        )
    }
}

/// Run one cycle against the marketplace.
pub async fn run_cycle(
    api: &dyn MarketplaceApi,
    analyzer: &mut MarketAnalyzer,
    max_pages: u32,
    cycle_number: u64,
) -> CycleReport {
    info!(cycle = cycle_number, "Fetching market data...");
    let listings = collect_listings(api, max_pages).await;

    if listings.is_empty() {
        warn!(cycle = cycle_number, "No listings received from API");
        return CycleReport {
            cycle_number,
            listings_fetched: 0,
            deals_found: 0,
            skipped: 0,
            store_failures: 0,
            skip_reasons: BTreeMap::new(),
            timestamp: Utc::now(),
        };
    }

    info!(count = listings.len(), "Analyzing listings...");
    let analysis = analyzer.analyze(api, &listings).await;
    let deals_found = analysis.deal_count();

    if deals_found > 0 {
        info!(deals = deals_found, "Profit opportunities found!");
    } else {
        info!("No profitable deals found");
    }

    CycleReport {
        cycle_number,
        listings_fetched: listings.len(),
        deals_found,
        skipped: analysis.skipped_count(),
        store_failures: analysis.store_failures(),
        skip_reasons: analysis.skip_counts_by_reason(),
        timestamp: Utc::now(),
    }
}

/// Run cycles back to back with a full `interval` of sleep after each one,
/// until `shutdown` resolves. Shutdown is honoured mid-cycle as well as
/// mid-sleep. Returns the number of cycles that ran to completion.
pub async fn run_loop<S, F>(
    api: &dyn MarketplaceApi,
    analyzer: &mut MarketAnalyzer,
    max_pages: u32,
    interval: Duration,
    shutdown: S,
    mut on_report: F,
) -> u64
where
    S: Future<Output = ()>,
    F: FnMut(&CycleReport),
{
    tokio::pin!(shutdown);
    let mut completed: u64 = 0;

    loop {
        tokio::select! {
            report = run_cycle(api, analyzer, max_pages, completed + 1) => {
                completed += 1;
                on_report(&report);
            }
            _ = &mut shutdown => {
                info!(cycle = completed + 1, "Shutdown requested, abandoning cycle");
                return completed;
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = &mut shutdown => return completed,
        }
    }
}
