//! Tests for the TTL response cache
//!
//! Each test uses an isolated `ResponseCache` instance so they can run in
//! parallel without interfering with each other.

use std::time::Duration;

use shopscout::ResponseCache;
use shopscout::models::{AggregateResult, Product};

fn aggregate_with(count: usize) -> AggregateResult {
    let products = (0..count)
        .map(|i| Product {
            id: format!("P{i}"),
            name: format!("Product {i}"),
            price: "999".to_string(),
            original_price: None,
            image_url: None,
            detail_url: None,
            retailer: "Flipkart".to_string(),
            rating: None,
        })
        .collect();
    AggregateResult {
        success: count > 0,
        products,
        scraped_retailers: vec!["flipkart".to_string()],
        failed_retailers: Vec::new(),
        execution_time_ms: 42,
        cached: false,
    }
}

#[tokio::test]
async fn get_returns_what_set_stored() {
    let cache = ResponseCache::new(Duration::from_secs(60), 8);
    cache.set("iphone 15", aggregate_with(3)).await;

    let hit = cache.get("iphone 15").await.expect("entry should be live");
    assert_eq!(hit.products.len(), 3);
    assert!(cache.get("different key").await.is_none());
}

#[tokio::test]
async fn empty_aggregates_are_never_cached() {
    let cache = ResponseCache::new(Duration::from_secs(60), 8);
    cache.set("no results", aggregate_with(0)).await;
    assert!(cache.get("no results").await.is_none());
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let cache = ResponseCache::new(Duration::from_millis(40), 8);
    cache.set("kettle", aggregate_with(2)).await;
    assert!(cache.get("kettle").await.is_some());

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(cache.get("kettle").await.is_none());
}

#[tokio::test]
async fn eviction_is_insertion_order_not_access_order() {
    let cache = ResponseCache::new(Duration::from_secs(60), 3);
    cache.set("a", aggregate_with(1)).await;
    cache.set("b", aggregate_with(1)).await;
    cache.set("c", aggregate_with(1)).await;

    // Touch "a" repeatedly; FIFO eviction must ignore recency.
    for _ in 0..5 {
        assert!(cache.get("a").await.is_some());
    }

    cache.set("d", aggregate_with(1)).await;

    assert!(cache.get("a").await.is_none(), "oldest entry evicts first");
    assert!(cache.get("b").await.is_some());
    assert!(cache.get("c").await.is_some());
    assert!(cache.get("d").await.is_some());
}

#[tokio::test]
async fn reinsert_refreshes_value_without_growing() {
    let cache = ResponseCache::new(Duration::from_secs(60), 3);
    cache.set("a", aggregate_with(1)).await;
    cache.set("a", aggregate_with(5)).await;

    assert_eq!(cache.len().await, 1);
    assert_eq!(cache.get("a").await.unwrap().products.len(), 5);
}
