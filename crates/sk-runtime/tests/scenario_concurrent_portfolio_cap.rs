use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sk_context::Interval;
use sk_core::LifecycleConfig;
use sk_events::{EventBody, EventBus};
use sk_live::LiveConfig;
use sk_market::{Market, MarketConfig};
use sk_risk::max_concurrent_positions;
use sk_runtime::{Control, Registry};
use sk_testkit::{long_take_profit_draft, FixedDraftStrategy, FixtureExchangeAdapter, MemoryPersistenceAdapter, RecordingSubscriber};

/// Two strategies sharing `max_concurrent_positions(1)` run live,
/// concurrently, through the actual `Control`/`Registry` path — not a
/// hand-built `PortfolioView`. `s5a` opens first; while it sits `active`,
/// `s5b` must see that position on every tick it evaluates, not just the
/// one it happened to see at its own run's start.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrently_running_strategies_still_respect_the_shared_cap() {
    let now = Utc::now();
    let adapter = Arc::new(FixtureExchangeAdapter::flat(now, Interval::OneMinute, 42000.0));
    let market = Arc::new(Market::with_config("fixture", adapter, MarketConfig { vwap_candle_count: 1, ..Default::default() }));

    let registry = Registry::new(Arc::new(MemoryPersistenceAdapter::new()));
    registry.register_exchange("fixture", market).await.unwrap();
    registry.register_risk(Arc::new(max_concurrent_positions(1))).await.unwrap();

    let strategy_a = FixedDraftStrategy::new("s5a", Interval::OneMinute, long_take_profit_draft()).with_risk_name("max_concurrent_positions");
    let strategy_b = FixedDraftStrategy::new("s5b", Interval::OneMinute, long_take_profit_draft()).with_risk_name("max_concurrent_positions");
    registry.register_strategy(Arc::new(strategy_a)).await.unwrap();
    registry.register_strategy(Arc::new(strategy_b)).await.unwrap();

    let events = EventBus::new();
    let recorder = RecordingSubscriber::attach(&events);
    let live_config = LiveConfig { tick_ttl: Duration::from_millis(5) };
    let control = Arc::new(Control::new(registry, events, LifecycleConfig::default(), live_config));

    // s5a's position never hits TP/SL/time-expiry at a flat fixture price
    // within this test's lifetime, so it stays `active` throughout.
    control.background_live("BTC", "s5a", "fixture").await;
    tokio::time::sleep(Duration::from_millis(60)).await;

    // s5b starts only now, after s5a is already open and persisted — the
    // bug this guards against is a `PortfolioView` frozen at this moment
    // that never again reflects anything, not just a same-instant race.
    control.background_live("BTC", "s5b", "fixture").await;
    tokio::time::sleep(Duration::from_millis(60)).await;

    control.stop("BTC", "s5b").await;
    control.stop("BTC", "s5a").await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let rejected = recorder
        .snapshot()
        .into_iter()
        .find(|e| matches!(e.body, EventBody::RiskRejected { .. }) && e.strategy_name == "s5b")
        .expect("s5b's proposal was rejected by the shared cap while s5a stayed open");
    match rejected.body {
        EventBody::RiskRejected { risk_name, .. } => assert_eq!(risk_name, "max_concurrent_positions"),
        other => panic!("expected RiskRejected, got {other:?}"),
    }

    let b_store = control.registry().store_for("s5b", "BTC").await;
    assert!(b_store.read().await.unwrap().is_none(), "s5b must never have opened a position");
}
