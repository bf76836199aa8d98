use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sk_context::{Interval, Mode, TemporalContext};
use sk_core::{tick, LifecycleConfig, ThrottleState, TickInputs};
use sk_domain::PortfolioView;
use sk_events::{EventBody, EventBus};
use sk_market::{Market, MarketConfig};
use sk_risk::max_concurrent_positions;
use sk_store::SignalStore;
use sk_testkit::{long_take_profit_draft, FixedDraftStrategy, FixtureExchangeAdapter, MemoryPersistenceAdapter, RecordingSubscriber};

/// The allow path never publishes on `risk-rejected` — only an actual
/// rejection does (§8 property #8; the companion failure case is exercised
/// by `scenario_portfolio_cap`).
#[tokio::test]
async fn allow_path_publishes_no_risk_rejected_event() {
    let anchor = Utc.timestamp_opt(0, 0).unwrap();
    let adapter = Arc::new(FixtureExchangeAdapter::flat(anchor, Interval::OneMinute, 42000.0));
    let market = Market::with_config("fixture", adapter, MarketConfig { vwap_candle_count: 1, ..Default::default() });

    let risk = max_concurrent_positions(1);
    let config = LifecycleConfig::default();
    let events = EventBus::new();
    let recorder = RecordingSubscriber::attach(&events);
    let ctx = TemporalContext::new("BTC", anchor, Mode::Backtest);

    let strategy = FixedDraftStrategy::new("allow", Interval::OneMinute, long_take_profit_draft());
    let store = SignalStore::new(Arc::new(MemoryPersistenceAdapter::new()), "allow", "BTC");
    let mut throttle = ThrottleState::default();
    let portfolio = PortfolioView::new();

    let result = tick(
        &TickInputs {
            ctx: &ctx,
            strategy: &strategy,
            market: &market,
            store: &store,
            risks: &[&risk],
            portfolio: &portfolio,
            events: &events,
            config: &config,
        },
        &mut throttle,
    )
    .await
    .unwrap();
    assert!(matches!(result, sk_core::TickResult::Opened(_)));

    tokio::task::yield_now().await;
    assert!(
        !recorder.snapshot().into_iter().any(|e| matches!(e.body, EventBody::RiskRejected { .. })),
        "allow path must never publish a risk-rejected event"
    );
}
