//! Fan-out orchestrator semantics against a mock cascade executor.
//!
//! Covers cache idempotence, partial failure isolation, the early-exit
//! threshold on both paths, the dropped-retailer accounting decision, and
//! the empty-registry error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use shopscout::engine::{ExecMode, RetailerExecutor, SearchEngine, SearchError};
use shopscout::models::{Product, RetailerOutcome, SearchQuery, StrategyKind};
use shopscout::EngineConfig;

#[derive(Clone)]
enum Plan {
    /// Succeed with N products in both modes.
    Succeed(usize),
    /// Fail in both modes.
    Fail,
    /// Empty in Fast mode, succeed with N products in Thorough mode.
    BrowserOnly(usize),
    /// Succeed with N products after a delay.
    SlowSucceed(Duration, usize),
    /// Succeed with N copies of the same listing.
    Duplicates(usize),
}

fn products(retailer: &str, count: usize) -> Vec<Product> {
    (0..count)
        .map(|i| Product {
            id: format!("{retailer}-{i}"),
            name: format!("{retailer} item {i}"),
            price: "1099".to_string(),
            original_price: None,
            image_url: None,
            detail_url: None,
            retailer: retailer.to_string(),
            rating: None,
        })
        .collect()
}

type CallCounts = Arc<std::sync::Mutex<HashMap<(&'static str, ExecMode), usize>>>;

fn mock_executor(plans: HashMap<&'static str, Plan>, calls: CallCounts) -> RetailerExecutor {
    let plans = Arc::new(plans);
    Arc::new(move |key, _query: SearchQuery, mode| -> BoxFuture<'static, RetailerOutcome> {
        let plan = plans.get(key).cloned();
        let calls = Arc::clone(&calls);
        Box::pin(async move {
            *calls.lock().unwrap().entry((key, mode)).or_insert(0) += 1;
            match plan {
                Some(Plan::Succeed(count)) => RetailerOutcome::success(
                    key.to_string(),
                    StrategyKind::DirectApi,
                    products(key, count),
                ),
                Some(Plan::Fail) | None => RetailerOutcome::failure(
                    key.to_string(),
                    Some("all strategies exhausted".to_string()),
                ),
                Some(Plan::BrowserOnly(count)) => match mode {
                    ExecMode::Fast => {
                        RetailerOutcome::failure(key.to_string(), Some("walled".to_string()))
                    }
                    ExecMode::Thorough => RetailerOutcome::success(
                        key.to_string(),
                        StrategyKind::BrowserSniff,
                        products(key, count),
                    ),
                },
                Some(Plan::SlowSucceed(delay, count)) => {
                    tokio::time::sleep(delay).await;
                    RetailerOutcome::success(
                        key.to_string(),
                        StrategyKind::DirectApi,
                        products(key, count),
                    )
                }
                Some(Plan::Duplicates(count)) => {
                    let one = products(key, 1);
                    let copies = (0..count).flat_map(|_| one.clone()).collect();
                    RetailerOutcome::success(key.to_string(), StrategyKind::DirectApi, copies)
                }
            }
        })
    })
}

fn engine_with(
    config: EngineConfig,
    keys: Vec<&'static str>,
    plans: HashMap<&'static str, Plan>,
) -> (SearchEngine, CallCounts) {
    let calls: CallCounts = Arc::new(std::sync::Mutex::new(HashMap::new()));
    let engine = SearchEngine::with_executor(config, keys, mock_executor(plans, Arc::clone(&calls)));
    (engine, calls)
}

fn total_calls(calls: &CallCounts) -> usize {
    calls.lock().unwrap().values().sum()
}

#[tokio::test]
async fn partial_failure_is_isolated() {
    let plans = HashMap::from([
        ("r1", Plan::Succeed(2)),
        ("r2", Plan::Fail),
        ("r3", Plan::Succeed(2)),
        ("r4", Plan::Fail),
        ("r5", Plan::Succeed(2)),
    ]);
    let config = EngineConfig::builder()
        .early_exit_threshold(100)
        .build()
        .unwrap();
    let (engine, _) = engine_with(config, vec!["r1", "r2", "r3", "r4", "r5"], plans);

    let result = engine.search("laptop stand").await.expect("search returns aggregate");

    assert!(result.success);
    assert_eq!(result.products.len(), 6);
    let mut scraped = result.scraped_retailers.clone();
    scraped.sort();
    assert_eq!(scraped, vec!["r1", "r3", "r5"]);
    let mut failed = result.failed_retailers.clone();
    failed.sort();
    assert_eq!(failed, vec!["r2", "r4"]);
}

#[tokio::test]
async fn cached_second_call_does_no_work() {
    let plans = HashMap::from([("r1", Plan::Succeed(3))]);
    let (engine, calls) = engine_with(
        EngineConfig::builder().build().unwrap(),
        vec!["r1"],
        plans,
    );

    let first = engine.search("AirPods Pro").await.unwrap();
    assert!(!first.cached);
    let work_after_first = total_calls(&calls);
    assert!(work_after_first > 0);

    // Same query modulo case/whitespace must hit the cache.
    let second = engine.search("  airpods pro ").await.unwrap();
    assert!(second.cached);
    assert_eq!(second.products.len(), first.products.len());
    assert_eq!(total_calls(&calls), work_after_first, "no new cascade work");
}

#[tokio::test]
async fn failed_searches_are_not_cached() {
    let plans = HashMap::from([("r1", Plan::Fail)]);
    let (engine, calls) = engine_with(
        EngineConfig::builder().build().unwrap(),
        vec!["r1"],
        plans,
    );

    let first = engine.search("ghost product").await.unwrap();
    assert!(!first.success);
    let after_first = total_calls(&calls);

    let second = engine.search("ghost product").await.unwrap();
    assert!(!second.cached, "empty aggregates must not be served from cache");
    assert!(total_calls(&calls) > after_first);
}

#[tokio::test]
async fn early_exit_stops_dispatch_on_fast_path() {
    // Concurrency 1 makes completion order deterministic: r1 (6), then
    // r2 (10) crosses the threshold of 15, r3 must never run.
    let plans = HashMap::from([
        ("r1", Plan::Succeed(6)),
        ("r2", Plan::Succeed(10)),
        ("r3", Plan::Succeed(4)),
    ]);
    let config = EngineConfig::builder()
        .max_concurrent_retailers(1)
        .early_exit_threshold(15)
        .build()
        .unwrap();
    let (engine, calls) = engine_with(config, vec!["r1", "r2", "r3"], plans);

    let result = engine.search("power bank").await.unwrap();

    assert_eq!(result.products.len(), 16);
    assert_eq!(
        calls.lock().unwrap().get(&("r3", ExecMode::Fast)),
        None,
        "third retailer must not be dispatched after threshold"
    );
}

#[tokio::test]
async fn browser_batches_stop_at_threshold() {
    // Fast path yields nothing anywhere; batched path (batch size 1) runs
    // r1 (6), r2 (10) -> 16 >= 15, so r3 gets no Thorough call.
    let plans = HashMap::from([
        ("r1", Plan::BrowserOnly(6)),
        ("r2", Plan::BrowserOnly(10)),
        ("r3", Plan::BrowserOnly(4)),
    ]);
    let config = EngineConfig::builder()
        .max_concurrent_retailers(1)
        .early_exit_threshold(15)
        .build()
        .unwrap();
    let (engine, calls) = engine_with(config, vec!["r1", "r2", "r3"], plans);

    let result = engine.search("standing desk").await.unwrap();

    assert!(result.success);
    assert_eq!(result.products.len(), 16);
    let calls = calls.lock().unwrap();
    assert_eq!(calls.get(&("r1", ExecMode::Thorough)), Some(&1));
    assert_eq!(calls.get(&("r2", ExecMode::Thorough)), Some(&1));
    assert_eq!(calls.get(&("r3", ExecMode::Thorough)), None);
    // Every retailer was still attempted on the fast path.
    assert_eq!(calls.get(&("r3", ExecMode::Fast)), Some(&1));
}

#[tokio::test]
async fn abandoned_retailers_count_in_neither_list() {
    let plans = HashMap::from([
        ("quick", Plan::Succeed(20)),
        ("slow", Plan::SlowSucceed(Duration::from_secs(5), 3)),
    ]);
    let config = EngineConfig::builder()
        .max_concurrent_retailers(2)
        .early_exit_threshold(15)
        .build()
        .unwrap();
    let (engine, _) = engine_with(config, vec!["quick", "slow"], plans);

    let result = tokio::time::timeout(Duration::from_secs(2), engine.search("router"))
        .await
        .expect("early exit must not wait for the slow retailer")
        .unwrap();

    assert_eq!(result.scraped_retailers, vec!["quick"]);
    assert!(
        !result.failed_retailers.contains(&"slow".to_string()),
        "abandoned retailer is not a failure"
    );
    assert!(!result.scraped_retailers.contains(&"slow".to_string()));
}

#[tokio::test]
async fn duplicate_listings_are_collapsed() {
    let plans = HashMap::from([("r1", Plan::Duplicates(4)), ("r2", Plan::Succeed(2))]);
    let config = EngineConfig::builder()
        .early_exit_threshold(100)
        .build()
        .unwrap();
    let (engine, _) = engine_with(config, vec!["r1", "r2"], plans);

    let result = engine.search("hdmi cable").await.unwrap();

    // Four copies of the same listing collapse to one; r2's two survive.
    assert_eq!(result.products.len(), 3);
}

#[tokio::test]
async fn empty_registry_is_the_only_search_error() {
    let (engine, _) = engine_with(
        EngineConfig::builder().build().unwrap(),
        Vec::new(),
        HashMap::new(),
    );

    match engine.search("anything").await {
        Err(SearchError::NoRetailers) => {}
        other => panic!("expected NoRetailers, got {other:?}"),
    }
}

#[tokio::test]
async fn blank_query_is_rejected() {
    let (engine, _) = engine_with(
        EngineConfig::builder().build().unwrap(),
        vec!["r1"],
        HashMap::from([("r1", Plan::Succeed(1))]),
    );

    assert!(matches!(
        engine.search("   ").await,
        Err(SearchError::ConfigError(_))
    ));
}
