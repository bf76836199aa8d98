use std::sync::Arc;

use chrono::Utc;
use sk_backtest::{self, BacktestReport, BacktestRun};
use sk_context::{Mode, TemporalContext};
use sk_core::{cancel as core_cancel, LifecycleConfig, TickInputs, TickResult};
use sk_domain::{KernelError, TrackedSignal};
use sk_events::EventBus;
use sk_live::{self, LiveConfig, LiveRun, StopHandle};
use tokio::sync::RwLock;

use crate::registry::Registry;

/// The Control Surface (C9, §4.9): the one entry point an embedder or the
/// CLI front-end calls. Owns nothing beyond the Registry and a table of live
/// `StopHandle`s per `(strategy, symbol)` run, so `stop()` can reach a loop
/// that's mid-flight in another task.
pub struct Control {
    registry: Registry,
    events: EventBus,
    config: LifecycleConfig,
    live_config: LiveConfig,
    stop_handles: RwLock<std::collections::HashMap<(String, String), StopHandle>>,
}

impl Control {
    pub fn new(registry: Registry, events: EventBus, config: LifecycleConfig, live_config: LiveConfig) -> Self {
        Self {
            registry,
            events,
            config,
            live_config,
            stop_handles: RwLock::new(std::collections::HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    async fn resolved(
        &self,
        strategy_name: &str,
        exchange_name: &str,
    ) -> Result<(Arc<dyn sk_strategy::Strategy>, Arc<sk_market::Market>, Vec<Arc<sk_risk::Risk>>), KernelError> {
        let strategy = self.registry.strategy(strategy_name).await?;
        let market = self.registry.exchange(exchange_name).await?;
        let spec = strategy.spec();
        let risks = self.registry.risks(&spec.risk_names()).await?;
        Ok((strategy, market, risks))
    }

    /// Drives a backtest to completion and returns the final report (§4.9).
    /// `strategy`/`exchange`/`frame` must already be registered or this
    /// fails with `NotRegistered` before a single tick runs.
    pub async fn run_backtest(
        &self,
        symbol: &str,
        strategy_name: &str,
        exchange_name: &str,
        frame_name: &str,
    ) -> Result<BacktestReport, KernelError> {
        let (strategy, market, risks) = self.resolved(strategy_name, exchange_name).await?;
        let frame = self.registry.frame(frame_name).await?;
        let store = self.registry.store_for(strategy_name, symbol).await;
        let spec = strategy.spec();
        let risk_names: Vec<String> = spec.risk_names().into_iter().map(String::from).collect();
        let portfolio_source = self.registry.portfolio_source(risk_names);
        let risk_refs: Vec<&sk_risk::Risk> = risks.iter().map(Arc::as_ref).collect();

        let run = BacktestRun {
            symbol: symbol.to_string(),
            strategy: strategy.as_ref(),
            market: market.as_ref(),
            frame: &frame,
            store: store.as_ref(),
            risks: &risk_refs,
            portfolio: &portfolio_source,
            events: &self.events,
            config: &self.config,
        };
        sk_backtest::run(&run).await
    }

    /// Fire-and-forget variant: spawns the backtest on a new task and
    /// returns immediately. Completion is only observable via `done-backtest`
    /// on the Event Bus (§4.9) since the spawned task's result is discarded.
    pub async fn background_backtest(
        self: &Arc<Self>,
        symbol: impl Into<String>,
        strategy_name: impl Into<String>,
        exchange_name: impl Into<String>,
        frame_name: impl Into<String>,
    ) {
        let control = self.clone();
        let symbol = symbol.into();
        let strategy_name = strategy_name.into();
        let exchange_name = exchange_name.into();
        let frame_name = frame_name.into();
        tokio::spawn(async move {
            if let Err(err) = control.run_backtest(&symbol, &strategy_name, &exchange_name, &frame_name).await {
                tracing::error!(%symbol, strategy = %strategy_name, %err, "background backtest failed");
            }
        });
    }

    /// Drives the live wall-clock loop until `stop()` is called for this
    /// `(strategy, symbol)` and the slot drains, invoking `on_result` for
    /// every non-idle tick.
    pub async fn run_live(
        &self,
        symbol: &str,
        strategy_name: &str,
        exchange_name: &str,
        on_result: impl FnMut(&TickResult),
    ) -> Result<(), KernelError> {
        let (strategy, market, risks) = self.resolved(strategy_name, exchange_name).await?;
        let store = self.registry.store_for(strategy_name, symbol).await;
        let spec = strategy.spec();
        let risk_names: Vec<String> = spec.risk_names().into_iter().map(String::from).collect();
        let portfolio_source = self.registry.portfolio_source(risk_names);
        let risk_refs: Vec<&sk_risk::Risk> = risks.iter().map(Arc::as_ref).collect();

        let stop = StopHandle::new();
        self.stop_handles
            .write()
            .await
            .insert((strategy_name.to_string(), symbol.to_string()), stop.clone());

        let run = LiveRun {
            symbol: symbol.to_string(),
            strategy: strategy.as_ref(),
            market: market.as_ref(),
            store: store.as_ref(),
            risks: &risk_refs,
            portfolio: &portfolio_source,
            events: &self.events,
            config: &self.config,
            live_config: &self.live_config,
        };
        let result = sk_live::run(&run, &stop, on_result).await;
        self.stop_handles.write().await.remove(&(strategy_name.to_string(), symbol.to_string()));
        result
    }

    /// Fire-and-forget variant of [`Control::run_live`]; non-idle ticks are
    /// only observable via the Event Bus.
    pub async fn background_live(
        self: &Arc<Self>,
        symbol: impl Into<String>,
        strategy_name: impl Into<String>,
        exchange_name: impl Into<String>,
    ) {
        let control = self.clone();
        let symbol = symbol.into();
        let strategy_name = strategy_name.into();
        let exchange_name = exchange_name.into();
        tokio::spawn(async move {
            if let Err(err) = control.run_live(&symbol, &strategy_name, &exchange_name, |_| {}).await {
                tracing::error!(%symbol, strategy = %strategy_name, %err, "background live run failed");
            }
        });
    }

    /// Cooperative stop: flips the flag a live run checks between ticks.
    /// A no-op if no live run is currently tracked for this slot (§4.7, §5).
    pub async fn stop(&self, symbol: &str, strategy_name: &str) {
        if let Some(handle) = self.stop_handles.read().await.get(&(strategy_name.to_string(), symbol.to_string())) {
            handle.stop();
        }
    }

    /// Cancels a `scheduled` (or, with `allow_cancel_active`, `active`)
    /// signal for `(strategy_name, symbol)` outright, without waiting for
    /// the next scheduled tick (§4.9).
    pub async fn cancel(
        &self,
        symbol: &str,
        strategy_name: &str,
        exchange_name: &str,
        cancellation_id: Option<String>,
    ) -> Result<Option<TrackedSignal>, KernelError> {
        let strategy = self.registry.strategy(strategy_name).await?;
        let market = self.registry.exchange(exchange_name).await?;
        let store = self.registry.store_for(strategy_name, symbol).await;
        let spec = strategy.spec();
        let risks = self.registry.risks(&spec.risk_names()).await?;
        let risk_names: Vec<String> = spec.risk_names().into_iter().map(String::from).collect();
        let portfolio_source = self.registry.portfolio_source(risk_names);
        let risk_refs: Vec<&sk_risk::Risk> = risks.iter().map(Arc::as_ref).collect();

        let ctx = TemporalContext::new(symbol.to_string(), Utc::now(), Mode::Live);
        let inputs = TickInputs {
            ctx: &ctx,
            strategy: strategy.as_ref(),
            market: market.as_ref(),
            store: store.as_ref(),
            risks: &risk_refs,
            portfolio: &portfolio_source,
            events: &self.events,
            config: &self.config,
        };
        core_cancel(&inputs, cancellation_id).await
    }
}
