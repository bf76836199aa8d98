use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sk_backtest::{run, BacktestRun};
use sk_context::{Frame, Interval};
use sk_core::LifecycleConfig;
use sk_domain::{CloseReason, PortfolioView, TrackedSignal};
use sk_events::EventBus;
use sk_market::{Market, MarketConfig};
use sk_store::SignalStore;
use sk_testkit::{time_expired_draft, FixedDraftStrategy, FixtureExchangeAdapter, MemoryPersistenceAdapter};

#[tokio::test]
async fn scenario_time_expired() {
    let anchor = Utc.timestamp_opt(0, 0).unwrap();
    // Flat at 42000 the whole run, never leaving [41500, 42500] — the
    // 5-minute estimated time is what closes this one, not a target.
    let adapter = Arc::new(FixtureExchangeAdapter::flat(anchor, Interval::OneMinute, 42000.0));
    let market = Market::with_config("fixture", adapter, MarketConfig { vwap_candle_count: 1, ..Default::default() });

    let store = SignalStore::new(Arc::new(MemoryPersistenceAdapter::new()), "s3", "BTC");
    let strategy = FixedDraftStrategy::new("s3", Interval::OneMinute, time_expired_draft());
    let frame = Frame::new("s3-frame", Interval::OneMinute, anchor, anchor + Interval::OneMinute.step() * 10);
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
            assert_eq!(closed.reason, CloseReason::TimeExpired);
            assert!((closed.price_close - 42000.0).abs() < 1e-6);
            assert_eq!((closed.closed_at - closed.opened_at).num_minutes(), 5);
            assert!((closed.pnl.percent - (-0.3)).abs() < 0.01);
        }
        other => panic!("expected a closed signal, got {other:?}"),
    }
}
