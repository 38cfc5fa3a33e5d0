//! Cascade and retry-wrapper behavior with mock strategies.
//!
//! The cascade's contracts: fixed priority order with short-circuit on the
//! first non-empty result, empty treated identically to error, errors
//! never propagating, and the retry wrapper re-running the full cascade
//! with a terminal-failure escape hatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use futures::future::BoxFuture;

use shopscout::engine::{run_cascade, run_cascade_with_retries};
use shopscout::models::{Product, SearchQuery, StrategyKind};
use shopscout::retailers::RetailerRegistry;
use shopscout::strategies::{AttemptContext, Strategy};
use shopscout::{ContextPool, EngineConfig, HostLimiter, PoolSettings, ProxyRotator};

#[derive(Clone)]
enum MockBehavior {
    Products(usize),
    Empty,
    Error(&'static str),
}

struct MockStrategy {
    kind: StrategyKind,
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
}

impl MockStrategy {
    fn boxed(kind: StrategyKind, behavior: MockBehavior, calls: &Arc<AtomicUsize>) -> Box<dyn Strategy> {
        Box::new(Self {
            kind,
            behavior,
            calls: Arc::clone(calls),
        })
    }
}

impl Strategy for MockStrategy {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    fn fetch<'a>(&'a self, _ctx: &'a AttemptContext<'a>) -> BoxFuture<'a, Result<Vec<Product>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior.clone();
        Box::pin(async move {
            match behavior {
                MockBehavior::Products(count) => Ok((0..count)
                    .map(|i| Product {
                        id: format!("M{i}"),
                        name: format!("Mock {i}"),
                        price: "499".to_string(),
                        original_price: None,
                        image_url: None,
                        detail_url: None,
                        retailer: "Mock".to_string(),
                        rating: None,
                    })
                    .collect()),
                MockBehavior::Empty => Ok(Vec::new()),
                MockBehavior::Error(message) => Err(anyhow!("{message}")),
            }
        })
    }
}

struct Fixture {
    config: EngineConfig,
    rotator: ProxyRotator,
    pool: Arc<ContextPool>,
    hosts: HostLimiter,
    query: SearchQuery,
}

impl Fixture {
    fn new() -> Self {
        let config = EngineConfig::builder()
            .retry_delay_ms(1)
            .build()
            .expect("valid test config");
        Self {
            pool: ContextPool::new(PoolSettings::from(&config), None),
            config,
            rotator: ProxyRotator::new(Vec::new()),
            hosts: HostLimiter::new(),
            query: SearchQuery::new("test query"),
        }
    }

    fn ctx<'a>(&'a self, registry: &'a RetailerRegistry) -> AttemptContext<'a> {
        AttemptContext {
            retailer: registry.get("flipkart").expect("flipkart in defaults"),
            query: &self.query,
            config: &self.config,
            rotator: &self.rotator,
            pool: &self.pool,
            hosts: &self.hosts,
            capture: None,
        }
    }
}

#[tokio::test]
async fn first_success_short_circuits_remaining_strategies() {
    let fixture = Fixture::new();
    let registry = RetailerRegistry::with_defaults();
    let ctx = fixture.ctx(&registry);

    let first = Arc::new(AtomicUsize::new(0));
    let rest = Arc::new(AtomicUsize::new(0));

    let strategies = vec![
        MockStrategy::boxed(StrategyKind::DirectApi, MockBehavior::Products(5), &first),
        MockStrategy::boxed(StrategyKind::GraphQl, MockBehavior::Products(9), &rest),
        MockStrategy::boxed(StrategyKind::Harvested, MockBehavior::Products(9), &rest),
        MockStrategy::boxed(StrategyKind::BrowserSniff, MockBehavior::Products(9), &rest),
    ];

    let outcome = run_cascade(&ctx, &strategies).await;

    assert!(outcome.succeeded);
    assert_eq!(outcome.products.len(), 5);
    assert_eq!(outcome.winning_strategy, Some(StrategyKind::DirectApi));
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(rest.load(Ordering::SeqCst), 0, "strategies 2-4 must never run");
}

#[tokio::test]
async fn empty_result_is_treated_like_an_error() {
    let fixture = Fixture::new();
    let registry = RetailerRegistry::with_defaults();
    let ctx = fixture.ctx(&registry);

    let empty_calls = Arc::new(AtomicUsize::new(0));
    let error_calls = Arc::new(AtomicUsize::new(0));
    let winner_calls = Arc::new(AtomicUsize::new(0));

    let strategies = vec![
        MockStrategy::boxed(StrategyKind::DirectApi, MockBehavior::Empty, &empty_calls),
        MockStrategy::boxed(StrategyKind::GraphQl, MockBehavior::Error("boom"), &error_calls),
        MockStrategy::boxed(StrategyKind::Harvested, MockBehavior::Products(2), &winner_calls),
    ];

    let outcome = run_cascade(&ctx, &strategies).await;

    assert!(outcome.succeeded);
    assert_eq!(outcome.winning_strategy, Some(StrategyKind::Harvested));
    assert_eq!(empty_calls.load(Ordering::SeqCst), 1);
    assert_eq!(error_calls.load(Ordering::SeqCst), 1);
    assert_eq!(winner_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn all_failures_keep_last_error() {
    let fixture = Fixture::new();
    let registry = RetailerRegistry::with_defaults();
    let ctx = fixture.ctx(&registry);

    let calls = Arc::new(AtomicUsize::new(0));
    let strategies = vec![
        MockStrategy::boxed(StrategyKind::DirectApi, MockBehavior::Error("first error"), &calls),
        MockStrategy::boxed(StrategyKind::Harvested, MockBehavior::Error("second error"), &calls),
    ];

    let outcome = run_cascade(&ctx, &strategies).await;

    assert!(!outcome.succeeded);
    assert!(outcome.products.is_empty());
    let error = outcome.error.expect("last error retained");
    assert!(error.contains("second error"));
}

#[tokio::test]
async fn retry_reruns_the_full_cascade() {
    let fixture = Fixture::new();
    let registry = RetailerRegistry::with_defaults();
    let ctx = fixture.ctx(&registry);

    let first_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));

    let strategies = vec![
        MockStrategy::boxed(StrategyKind::DirectApi, MockBehavior::Error("net down"), &first_calls),
        MockStrategy::boxed(StrategyKind::Harvested, MockBehavior::Empty, &second_calls),
    ];

    let outcome = run_cascade_with_retries(&ctx, &strategies).await;

    assert!(!outcome.succeeded);
    // 3 attempts total, each running both strategies from the top.
    assert_eq!(first_calls.load(Ordering::SeqCst), 3);
    assert_eq!(second_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn terminal_failure_is_not_retried() {
    let fixture = Fixture::new();
    let registry = RetailerRegistry::with_defaults();
    let ctx = fixture.ctx(&registry);

    let calls = Arc::new(AtomicUsize::new(0));
    let strategies = vec![MockStrategy::boxed(
        StrategyKind::DirectApi,
        MockBehavior::Error("retailer 'flipkart' not configured"),
        &calls,
    )];

    let outcome = run_cascade_with_retries(&ctx, &strategies).await;

    assert!(!outcome.succeeded);
    assert_eq!(calls.load(Ordering::SeqCst), 1, "terminal class must short-circuit retries");
}

#[tokio::test]
async fn success_on_second_attempt_stops_retrying() {
    let fixture = Fixture::new();
    let registry = RetailerRegistry::with_defaults();
    let ctx = fixture.ctx(&registry);

    // Fails once, then succeeds: models a proxy-dependent strategy.
    struct FlakyStrategy {
        calls: Arc<AtomicUsize>,
    }
    impl Strategy for FlakyStrategy {
        fn kind(&self) -> StrategyKind {
            StrategyKind::DirectApi
        }
        fn fetch<'a>(&'a self, _ctx: &'a AttemptContext<'a>) -> BoxFuture<'a, Result<Vec<Product>>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if n == 0 {
                    Err(anyhow!("connection reset"))
                } else {
                    Ok(vec![Product {
                        id: "F1".to_string(),
                        name: "Flaky win".to_string(),
                        price: "100".to_string(),
                        original_price: None,
                        image_url: None,
                        detail_url: None,
                        retailer: "Mock".to_string(),
                        rating: None,
                    }])
                }
            })
        }
    }

    let calls = Arc::new(AtomicUsize::new(0));
    let strategies: Vec<Box<dyn Strategy>> = vec![Box::new(FlakyStrategy {
        calls: Arc::clone(&calls),
    })];

    let outcome = run_cascade_with_retries(&ctx, &strategies).await;

    assert!(outcome.succeeded);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
