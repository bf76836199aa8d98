use sk_context::{Mode, TemporalContext};
use sk_domain::{PartialLevel, TrackedSignal};
use sk_events::{EventBody, EventBus, EventEnvelope};
use sk_market::Market;
use sk_risk::RiskOutcome;
use sk_strategy::StrategySpec;

fn envelope(ctx: &TemporalContext, spec: &StrategySpec, market: &Market, body: EventBody) -> EventEnvelope {
    EventEnvelope::new(ctx.symbol.clone(), spec.name.clone(), market.exchange_name.clone(), ctx.when, ctx.mode, body)
}

/// Publishes the generic `signal` event plus the mode-specific
/// `signal-backtest`/`signal-live` twin (§6: "signal (all modes)").
pub fn publish_signal(events: &EventBus, ctx: &TemporalContext, spec: &StrategySpec, market: &Market, signal: &TrackedSignal) {
    events.publish(envelope(ctx, spec, market, EventBody::Signal { signal: signal.clone() }));
    let mode_body = match ctx.mode {
        Mode::Backtest => EventBody::SignalBacktest { signal: signal.clone() },
        Mode::Live => EventBody::SignalLive { signal: signal.clone() },
    };
    events.publish(envelope(ctx, spec, market, mode_body));
}

pub fn publish_risk_rejected(events: &EventBus, ctx: &TemporalContext, spec: &StrategySpec, market: &Market, outcome: &RiskOutcome) {
    if let RiskOutcome::Rejected { risk_name, note, message, failed_predicate_index } = outcome {
        events.publish(envelope(
            ctx,
            spec,
            market,
            EventBody::RiskRejected {
                risk_name: risk_name.clone(),
                note: note.clone(),
                message: message.clone(),
                failed_predicate_index: *failed_predicate_index,
            },
        ));
    }
}

pub fn publish_scheduled_ping(events: &EventBus, ctx: &TemporalContext, spec: &StrategySpec, market: &Market) {
    events.publish(envelope(ctx, spec, market, EventBody::ScheduledPing));
}

pub fn publish_partial(events: &EventBus, ctx: &TemporalContext, spec: &StrategySpec, market: &Market, level: PartialLevel, price: f64, is_profit: bool) {
    let body = if is_profit {
        EventBody::PartialProfit { level, price }
    } else {
        EventBody::PartialLoss { level, price }
    };
    events.publish(envelope(ctx, spec, market, body));
}

pub fn publish_breakeven(events: &EventBus, ctx: &TemporalContext, spec: &StrategySpec, market: &Market) {
    events.publish(envelope(ctx, spec, market, EventBody::Breakeven));
}
