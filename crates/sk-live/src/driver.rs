use chrono::Utc;
use sk_context::{Mode, TemporalContext};
use sk_core::{tick, LifecycleConfig, TickInputs, TickResult, ThrottleState};
use sk_domain::{KernelError, PortfolioSource};
use sk_events::{EventBody, EventBus, EventEnvelope};
use sk_market::Market;
use sk_risk::Risk;
use sk_store::SignalStore;
use sk_strategy::Strategy;

use crate::config::LiveConfig;
use crate::stop::StopHandle;

/// Everything one `Live.run` invocation needs (§4.7, §4.9).
pub struct LiveRun<'a> {
    pub symbol: String,
    pub strategy: &'a dyn Strategy,
    pub market: &'a Market,
    pub store: &'a SignalStore,
    pub risks: &'a [&'a Risk],
    pub portfolio: &'a dyn PortfolioSource,
    pub events: &'a EventBus,
    pub config: &'a LifecycleConfig,
    pub live_config: &'a LiveConfig,
}

/// Runs the wall-clock loop until `stop` is requested and the slot drains,
/// or a hard adapter failure forces an exit. `on_result` is invoked for every
/// non-idle tick, in order — the driver's substitute for an async sequence.
pub async fn run(run: &LiveRun<'_>, stop: &StopHandle, mut on_result: impl FnMut(&TickResult)) -> Result<(), KernelError> {
    run.store.load().await?;
    let spec = run.strategy.spec();
    let mut throttle = ThrottleState::default();

    loop {
        let when = Utc::now();
        let ctx = TemporalContext::new(run.symbol.clone(), when, Mode::Live);
        let inputs = TickInputs {
            ctx: &ctx,
            strategy: run.strategy,
            market: run.market,
            store: run.store,
            risks: run.risks,
            portfolio: run.portfolio,
            events: run.events,
            config: run.config,
        };

        let result = match tick(&inputs, &mut throttle).await {
            Ok(result) => result,
            Err(err) if err.is_recoverable_in_live() => {
                tracing::warn!(strategy = %spec.name, symbol = %run.symbol, %err, "live tick failed, skipping tick");
                run.events.publish(EventEnvelope::new(
                    run.symbol.clone(),
                    spec.name.clone(),
                    run.market.exchange_name.clone(),
                    when,
                    Mode::Live,
                    EventBody::Error { message: err.to_string() },
                ));
                tokio::time::sleep(run.live_config.tick_ttl).await;
                continue;
            }
            Err(err) => {
                tracing::error!(strategy = %spec.name, symbol = %run.symbol, %err, "live tick failed, exiting");
                run.events.publish(EventEnvelope::new(
                    run.symbol.clone(),
                    spec.name.clone(),
                    run.market.exchange_name.clone(),
                    when,
                    Mode::Live,
                    EventBody::Error { message: err.to_string() },
                ));
                run.events.publish(EventEnvelope::new(
                    run.symbol.clone(),
                    spec.name.clone(),
                    run.market.exchange_name.clone(),
                    when,
                    Mode::Live,
                    EventBody::DoneLive {
                        reason: format!("hard failure: {err}"),
                    },
                ));
                return Err(err);
            }
        };

        let slot_drained = matches!(result, TickResult::Idle | TickResult::Closed(_) | TickResult::Cancelled(_));
        if !matches!(result, TickResult::Idle) {
            on_result(&result);
        }

        if stop.is_stopped() && slot_drained {
            run.events.publish(EventEnvelope::new(
                run.symbol.clone(),
                spec.name.clone(),
                run.market.exchange_name.clone(),
                when,
                Mode::Live,
                EventBody::DoneLive {
                    reason: "graceful stop".to_string(),
                },
            ));
            return Ok(());
        }

        tokio::time::sleep(run.live_config.tick_ttl).await;
    }
}
