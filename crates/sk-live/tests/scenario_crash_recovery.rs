use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sk_context::Interval;
use sk_core::LifecycleConfig;
use sk_domain::{CloseReason, Opened, PortfolioView, Position, SignalCore, TrackedSignal};
use sk_events::EventBus;
use sk_live::{run, LiveConfig, LiveRun, StopHandle};
use sk_market::{Market, MarketConfig};
use sk_store::{FsPersistenceAdapter, SignalStore};
use sk_testkit::{FixtureExchangeAdapter, NoSignalStrategy};

/// Pre-seeds an `opened` signal through one process, then hands the same
/// persisted file to a fresh `SignalStore`/`Live.run` pair — the restart
/// must pick the position up where it left off without ever calling
/// `getSignal` again.
#[tokio::test]
async fn scenario_crash_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = Arc::new(FsPersistenceAdapter::new(dir.path()));

    let opened_at = Utc::now() - chrono::Duration::minutes(1);
    let core = SignalCore {
        id: "x".to_string(),
        strategy_name: "s6".to_string(),
        symbol: "BTC".to_string(),
        position: Position::Long,
        price_open: 42000.0,
        price_take_profit: 43000.0,
        price_stop_loss: 41000.0,
        minute_estimated_time: 60,
        note: None,
    };
    let opened = TrackedSignal::Opened(Opened {
        core,
        opened_at,
        price_open_actual: 42000.0,
    });

    // The pre-crash process: write the position and "die".
    {
        let store = SignalStore::new(adapter.clone(), "s6", "BTC");
        store.write_atomic(&opened).await.unwrap();
    }

    // The restarted process: a fresh store over the same file.
    let store = SignalStore::new(adapter, "s6", "BTC");
    let strategy = NoSignalStrategy::new("s6", Interval::OneMinute);
    let exchange_adapter = Arc::new(FixtureExchangeAdapter::flat(opened_at, Interval::OneMinute, 43000.0));
    let market = Market::with_config("fixture", exchange_adapter, MarketConfig { vwap_candle_count: 1, ..Default::default() });
    let events = EventBus::new();
    let config = LifecycleConfig::default();
    let portfolio = PortfolioView::new();
    let live_config = LiveConfig { tick_ttl: Duration::from_millis(1) };
    let stop = StopHandle::new();

    let run_args = LiveRun {
        symbol: "BTC".to_string(),
        strategy: &strategy,
        market: &market,
        store: &store,
        risks: &[],
        portfolio: &portfolio,
        events: &events,
        config: &config,
        live_config: &live_config,
    };

    let mut observed = None;
    let stop_for_callback = stop.clone();
    run(&run_args, &stop, |result| {
        // NoSignalStrategy never proposes a signal of its own — any terminal
        // result here can only have come from the restored `opened` signal
        // being promoted to `active` and evaluated directly, confirming
        // `getSignal` was never consulted.
        if result.is_terminal() {
            observed = Some(result.signal().unwrap().clone());
            stop_for_callback.stop();
        }
    })
    .await
    .unwrap();

    match observed.expect("expected a terminal result on the first restored tick") {
        TrackedSignal::Closed(closed) => {
            assert_eq!(closed.reason, CloseReason::TakeProfit);
            assert!((closed.price_close - 43000.0).abs() < 1e-6);
        }
        other => panic!("expected a closed signal, got {other:?}"),
    }
}
