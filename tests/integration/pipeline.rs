//! End-to-end cycles against the mock marketplace and a temp-file store.

use chrono::DateTime;
use rust_decimal_macros::dec;
use std::path::PathBuf;

use flipscout::analysis::scorer::{DealScorer, ScoringConfig};
use flipscout::engine::analyzer::MarketAnalyzer;
use flipscout::engine::cycle::run_cycle;
use flipscout::storage::DealStore;
use flipscout::types::{DealStatus, FlipType};

use crate::mock_marketplace::MockMarketplace;

fn temp_path() -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("flipscout_it_deals_{}.json", uuid::Uuid::new_v4()));
    p
}

fn analyzer(path: &PathBuf) -> MarketAnalyzer {
    MarketAnalyzer::new(DealScorer::new(ScoringConfig::default()), DealStore::new(path))
}

/// Two pages covering every branch of the scorer.
fn market() -> MockMarketplace {
    MockMarketplace::new()
        .with_page(vec![
            // $10 listing, $20 buy order → instant, profit 9.00
            MockMarketplace::listing("instant", "Instant Item", 1000, 0, 2000),
            // $10 listing, $20 history avg → future, profit 8.00
            MockMarketplace::listing("future", "Future Item", 1000, 0, 0),
            // $10 listing, $10.50 avg → future profit -0.55, rejected
            MockMarketplace::listing("thin", "Thin Margin Item", 1000, 0, 0),
        ])
        .with_page(vec![
            // 0.4 sales/day → illiquid regardless of margin
            MockMarketplace::listing("illiquid", "Illiquid Item", 100, 0, 50_000),
            // 3 days of history only
            MockMarketplace::listing("short", "Short History Item", 1000, 0, 2000),
            // Malformed entry
            serde_json::json!({"id": "broken", "price": null, "item": 7}),
        ])
        .with_history("Instant Item", MockMarketplace::flat_history(7, 1500, 3))
        .with_history("Future Item", MockMarketplace::flat_history(10, 2000, 2))
        .with_history("Thin Margin Item", MockMarketplace::flat_history(7, 1050, 1))
        .with_history("Illiquid Item", {
            let mut h = MockMarketplace::flat_history(7, 100_000, 0);
            for p in h.iter_mut().take(3) {
                p.sale_count = 1;
            }
            h
        })
        .with_history("Short History Item", MockMarketplace::flat_history(3, 1500, 5))
}

#[tokio::test]
async fn test_full_cycle_classifies_and_stores() {
    let path = temp_path();
    let api = market();
    let mut analyzer = analyzer(&path);

    let report = run_cycle(&api, &mut analyzer, 100, 1).await;

    assert_eq!(report.listings_fetched, 6);
    assert_eq!(report.deals_found, 2);
    assert_eq!(report.skipped, 4);
    assert_eq!(report.store_failures, 0);
    assert_eq!(report.skip_reasons.get("below_min_profit"), Some(&1));
    assert_eq!(report.skip_reasons.get("illiquid"), Some(&1));
    assert_eq!(report.skip_reasons.get("insufficient_history"), Some(&1));
    assert_eq!(report.skip_reasons.get("malformed"), Some(&1));

    // Feed stopped at the first empty page.
    assert_eq!(api.page_requests(), vec![0, 1, 2]);

    let deals = DealStore::new(&path).load();
    assert_eq!(deals.len(), 2);

    let instant = deals.iter().find(|d| d.item_id == "instant").unwrap();
    assert_eq!(instant.flip_type, FlipType::Instant);
    assert_eq!(instant.profit, dec!(9));
    assert_eq!(instant.target_price, dec!(20));
    assert_eq!(instant.avg_price_7d, dec!(15));

    let future = deals.iter().find(|d| d.item_id == "future").unwrap();
    assert_eq!(future.flip_type, FlipType::Future);
    assert_eq!(future.profit, dec!(8));
    assert_eq!(future.volatility, dec!(0));

    for deal in &deals {
        assert_eq!(deal.status, DealStatus::Holding);
    }

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    for entry in raw.as_array().unwrap() {
        assert!(DateTime::parse_from_rfc3339(entry["buy_time"].as_str().unwrap()).is_ok());
    }

    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_second_cycle_does_not_rescore() {
    let path = temp_path();
    let api = market();
    let mut analyzer = analyzer(&path);

    let first = run_cycle(&api, &mut analyzer, 100, 1).await;
    let history_calls = api.history_requests().len();
    let second = run_cycle(&api, &mut analyzer, 100, 2).await;

    assert_eq!(first.deals_found, 2);
    assert_eq!(second.deals_found, 0);
    assert_eq!(second.skip_reasons.get("already_seen"), Some(&5));
    assert_eq!(api.history_requests().len(), history_calls);
    assert_eq!(DealStore::new(&path).load().len(), 2);

    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_listing_failure_mid_feed_keeps_earlier_pages() {
    let path = temp_path();
    let api = market().failing_from_page(1);
    let mut analyzer = analyzer(&path);

    let report = run_cycle(&api, &mut analyzer, 100, 1).await;

    assert_eq!(report.listings_fetched, 3);
    assert_eq!(report.deals_found, 2);
    assert_eq!(api.page_requests(), vec![0, 1]);

    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_empty_feed_reports_nothing() {
    let path = temp_path();
    let api = MockMarketplace::new();
    let mut analyzer = analyzer(&path);

    let report = run_cycle(&api, &mut analyzer, 100, 1).await;

    assert_eq!(report.listings_fetched, 0);
    assert_eq!(report.deals_found, 0);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_max_listing_price_filters_before_history() {
    let path = temp_path();
    let api = MockMarketplace::new()
        .with_page(vec![MockMarketplace::listing("big", "Big Item", 25_000, 0, 40_000)])
        .with_history("Big Item", MockMarketplace::flat_history(7, 30_000, 10));
    let config = ScoringConfig {
        max_listing_price: dec!(200),
        ..ScoringConfig::default()
    };
    let mut analyzer = MarketAnalyzer::new(DealScorer::new(config), DealStore::new(&path));

    let report = run_cycle(&api, &mut analyzer, 100, 1).await;

    assert_eq!(report.skip_reasons.get("over_budget"), Some(&1));
    assert!(api.history_requests().is_empty());
}

#[tokio::test]
async fn test_missing_history_is_not_fatal() {
    let path = temp_path();
    let api = MockMarketplace::new()
        .with_page(vec![MockMarketplace::listing("x", "Unknown Item", 1000, 2000, 2000)]);
    let mut analyzer = analyzer(&path);

    let report = run_cycle(&api, &mut analyzer, 100, 1).await;

    assert_eq!(report.deals_found, 0);
    assert_eq!(report.skip_reasons.get("insufficient_history"), Some(&1));
    assert_eq!(api.history_requests(), vec!["Unknown Item".to_string()]);
}
