use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sk_context::{Mode, TemporalContext};
use sk_core::{tick, LifecycleConfig, ThrottleState, TickInputs, TickResult};
use sk_domain::PortfolioView;
use sk_events::{EventBody, EventBus};
use sk_market::{Market, MarketConfig};
use sk_risk::max_concurrent_positions;
use sk_store::SignalStore;
use sk_testkit::{long_take_profit_draft, FixedDraftStrategy, FixtureExchangeAdapter, MemoryPersistenceAdapter, RecordingSubscriber};

/// Two strategies on the same symbol both return a valid signal in the same
/// tick window while a shared `max_concurrent_positions(1)` risk is
/// registered: exactly one opens, the other is rejected with the risk's note.
#[tokio::test]
async fn scenario_portfolio_cap() {
    let anchor = Utc.timestamp_opt(0, 0).unwrap();
    let adapter = Arc::new(FixtureExchangeAdapter::flat(anchor, sk_context::Interval::OneMinute, 42000.0));
    let market = Market::with_config("fixture", adapter, MarketConfig { vwap_candle_count: 1, ..Default::default() });

    let risk = max_concurrent_positions(1);
    let config = LifecycleConfig::default();
    let events = EventBus::new();
    let recorder = RecordingSubscriber::attach(&events);
    let ctx = TemporalContext::new("BTC", anchor, Mode::Backtest);

    let strategy_a = FixedDraftStrategy::new("s5a", sk_context::Interval::OneMinute, long_take_profit_draft());
    let store_a = SignalStore::new(Arc::new(MemoryPersistenceAdapter::new()), "s5a", "BTC");
    let mut throttle_a = ThrottleState::default();
    let empty_portfolio = PortfolioView::new();

    let result_a = tick(
        &TickInputs {
            ctx: &ctx,
            strategy: &strategy_a,
            market: &market,
            store: &store_a,
            risks: &[&risk],
            portfolio: &empty_portfolio,
            events: &events,
            config: &config,
        },
        &mut throttle_a,
    )
    .await
    .unwrap();

    let opened_a = match &result_a {
        TickResult::Opened(signal) => signal.clone(),
        other => panic!("expected strategy a to open, got {other:?}"),
    };

    let strategy_b = FixedDraftStrategy::new("s5b", sk_context::Interval::OneMinute, long_take_profit_draft());
    let store_b = SignalStore::new(Arc::new(MemoryPersistenceAdapter::new()), "s5b", "BTC");
    let mut throttle_b = ThrottleState::default();
    let portfolio_after_a = PortfolioView::from_signals([opened_a]);

    let result_b = tick(
        &TickInputs {
            ctx: &ctx,
            strategy: &strategy_b,
            market: &market,
            store: &store_b,
            risks: &[&risk],
            portfolio: &portfolio_after_a,
            events: &events,
            config: &config,
        },
        &mut throttle_b,
    )
    .await
    .unwrap();

    assert_eq!(result_b, TickResult::Idle);
    assert!(store_b.read().await.unwrap().is_none());

    tokio::task::yield_now().await;
    let rejected = recorder
        .snapshot()
        .into_iter()
        .find(|e| matches!(e.body, EventBody::RiskRejected { .. }))
        .expect("a risk-rejected event was published");
    match rejected.body {
        EventBody::RiskRejected { risk_name, note, .. } => {
            assert_eq!(risk_name, "max_concurrent_positions");
            assert_eq!(note, risk.note);
        }
        other => panic!("expected RiskRejected, got {other:?}"),
    }
}
