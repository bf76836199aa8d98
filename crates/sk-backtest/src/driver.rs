use chrono::{DateTime, Utc};
use sk_context::{Frame, Mode, TemporalContext};
use sk_core::{tick, LifecycleConfig, TickInputs, TickResult, ThrottleState};
use sk_domain::{KernelError, PortfolioSource, TrackedSignal};
use sk_events::{EventBody, EventBus, EventEnvelope};
use sk_market::Market;
use sk_risk::Risk;
use sk_store::SignalStore;
use sk_strategy::Strategy;

use crate::fast_path;

/// Everything one `Backtest.run` invocation needs (§4.6, §4.9). Borrowed for
/// the duration of the run — `sk-runtime`'s Registry resolves the names into
/// these concrete references before calling in.
pub struct BacktestRun<'a> {
    pub symbol: String,
    pub strategy: &'a dyn Strategy,
    pub market: &'a Market,
    pub frame: &'a Frame,
    pub store: &'a SignalStore,
    pub risks: &'a [&'a Risk],
    pub portfolio: &'a dyn PortfolioSource,
    pub events: &'a EventBus,
    pub config: &'a LifecycleConfig,
}

/// Terminal signals produced by one run, in the order they closed/cancelled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BacktestReport {
    pub results: Vec<TrackedSignal>,
    pub processed: usize,
    pub total: usize,
}

fn closed_at(signal: &TrackedSignal) -> Option<DateTime<Utc>> {
    match signal {
        TrackedSignal::Closed(c) => Some(c.closed_at),
        TrackedSignal::Cancelled(c) => Some(c.cancelled_at),
        _ => None,
    }
}

/// Runs the frame's tick-instant sequence to completion, timeframe-skipping
/// past resolved signals, and guarantees the slot is empty on return.
pub async fn run(run: &BacktestRun<'_>) -> Result<BacktestReport, KernelError> {
    let ticks = run.frame.tick_instants();
    let total = ticks.len();
    let spec = run.strategy.spec();

    let mut throttle = ThrottleState::default();
    let mut results = Vec::new();
    let mut closed_count = 0usize;
    let mut cancelled_count = 0usize;
    let mut processed = 0usize;
    let mut index = 0usize;

    let run_result: Result<(), KernelError> = async {
        while index < total {
            let when = ticks[index];
            let ctx = TemporalContext::new(run.symbol.clone(), when, Mode::Backtest);
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

            let mut result = tick(&inputs, &mut throttle).await?;
            processed = index + 1;

            // Fast path: right after an open, if nobody is watching partial/
            // breakeven events, try to resolve the rest of this signal's
            // lifetime in one gateway call instead of ticking through it.
            if let TickResult::Opened(TrackedSignal::Opened(opened)) = &result {
                if !run.events.has_subscribers() {
                    let horizon = run.frame.end_date;
                    if let Some(closed) = fast_path::try_resolve(run.market, opened, horizon, run.config).await? {
                        let signal = TrackedSignal::Closed(closed);
                        run.store.write_atomic(&signal).await?;
                        result = TickResult::Closed(signal);
                    }
                }
            }

            run.events.publish(
                EventEnvelope::new(
                    run.symbol.clone(),
                    spec.name.clone(),
                    run.market.exchange_name.clone(),
                    when,
                    Mode::Backtest,
                    EventBody::ProgressBacktest {
                        processed,
                        total,
                        percent: if total == 0 { 100.0 } else { processed as f64 / total as f64 * 100.0 },
                    },
                )
                .with_frame_name(run.frame.name.clone()),
            );

            if result.is_terminal() {
                let signal = result.signal().expect("terminal result always carries a signal").clone();
                match &signal {
                    TrackedSignal::Closed(_) => closed_count += 1,
                    TrackedSignal::Cancelled(_) => cancelled_count += 1,
                    _ => {}
                }
                let floor = closed_at(&signal).unwrap_or(when) + spec.interval.step();
                results.push(signal);
                index = ticks.partition_point(|t| *t < floor);
                continue;
            }

            index += 1;
        }
        Ok(())
    }
    .await;

    run.store.clear().await?;

    run.events.publish(
        EventEnvelope::new(
            run.symbol.clone(),
            spec.name.clone(),
            run.market.exchange_name.clone(),
            ticks.last().copied().unwrap_or(run.frame.start_date),
            Mode::Backtest,
            EventBody::DoneBacktest {
                closed: closed_count,
                cancelled: cancelled_count,
                error: run_result.as_ref().err().map(|e| e.to_string()),
            },
        )
        .with_frame_name(run.frame.name.clone()),
    );

    run_result?;
    Ok(BacktestReport { results, processed, total })
}
