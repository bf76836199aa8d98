use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sk_backtest::{run, BacktestRun};
use sk_context::{Frame, Interval};
use sk_core::LifecycleConfig;
use sk_domain::{CloseReason, PortfolioView, TrackedSignal};
use sk_events::EventBus;
use sk_market::{Market, MarketConfig};
use sk_store::SignalStore;
use sk_testkit::{long_take_profit_draft, FixedDraftStrategy, FixtureExchangeAdapter, MemoryPersistenceAdapter};

#[tokio::test]
async fn scenario_long_take_profit() {
    let anchor = Utc.timestamp_opt(0, 0).unwrap();
    // VWAP at tick `t` reads the candle ending at `t`, i.e. the one with
    // timestamp `t - step` — plant the spike one index early so it is first
    // observed at tick 20, matching the scenario's literal tick numbering.
    let adapter = Arc::new(
        FixtureExchangeAdapter::flat(anchor, Interval::OneMinute, 42000.0).with_spike_at(19, 43000.0),
    );
    let market = Market::with_config("fixture", adapter, MarketConfig { vwap_candle_count: 1, ..Default::default() });

    let store = SignalStore::new(Arc::new(MemoryPersistenceAdapter::new()), "s1", "BTC");
    let strategy = FixedDraftStrategy::new("s1", Interval::OneMinute, long_take_profit_draft());
    let frame = Frame::new("s1-frame", Interval::OneMinute, anchor, anchor + Interval::OneMinute.step() * 25);
    let events = EventBus::new();
    let config = LifecycleConfig::default();
    let portfolio = PortfolioView::new();

    let run_args = BacktestRun {
        symbol: "BTC".to_string(),
        strategy: &strategy,
        market: &market,
        frame: &frame,
        store: &store,
        risks: &[],
        portfolio: &portfolio,
        events: &events,
        config: &config,
    };

    let report = run(&run_args).await.unwrap();
    assert_eq!(report.results.len(), 1);
    match &report.results[0] {
        TrackedSignal::Closed(closed) => {
            assert_eq!(closed.reason, CloseReason::TakeProfit);
            assert!((closed.price_close - 43000.0).abs() < 1e-6);
            assert!((closed.pnl.percent - 2.081).abs() < 0.01);
        }
        other => panic!("expected a closed signal, got {other:?}"),
    }
}
