use std::collections::BTreeSet;

use sk_context::TemporalContext;
use sk_domain::{
    Active, Cancelled, Closed, KernelError, Opened, PortfolioSource, Position, RiskContext, Scheduled, SignalCore,
    SignalDraft, TrackedSignal,
};
use sk_events::EventBus;
use sk_market::Market;
use sk_risk::{Risk, RiskOutcome};
use sk_store::SignalStore;
use sk_strategy::{Strategy, StrategySpec};

use crate::config::LifecycleConfig;
use crate::events as ev;
use crate::partials;
use crate::pnl::compute_pnl;
use crate::result::{ThrottleState, TickResult};

/// Per-tick inputs that don't change shape across the lifecycle's branches.
/// Bundled to keep the branch functions' signatures from sprawling — every
/// field is a borrow, nothing here owns state across ticks (that's
/// [`ThrottleState`] and the Signal Store's job).
pub struct TickInputs<'a> {
    pub ctx: &'a TemporalContext,
    pub strategy: &'a dyn Strategy,
    pub market: &'a Market,
    pub store: &'a SignalStore,
    pub risks: &'a [&'a Risk],
    pub portfolio: &'a dyn PortfolioSource,
    pub events: &'a EventBus,
    pub config: &'a LifecycleConfig,
}

/// One Lifecycle Engine tick (§4.5). Reads the slot, computes, writes back,
/// emits events — all before returning, so the caller can treat this as
/// atomic with respect to its own slot.
pub async fn tick(inputs: &TickInputs<'_>, throttle: &mut ThrottleState) -> Result<TickResult, KernelError> {
    let spec = inputs.strategy.spec();
    let mut current = inputs.store.read().await?;

    if matches!(current, Some(TrackedSignal::Closed(_)) | Some(TrackedSignal::Cancelled(_))) {
        inputs.store.clear().await?;
        current = None;
    }

    let result = match current {
        None => handle_no_signal(inputs, &spec, throttle).await?,
        Some(TrackedSignal::Scheduled(scheduled)) => handle_scheduled(inputs, &spec, throttle, scheduled).await?,
        Some(TrackedSignal::Opened(opened)) => handle_active(inputs, &spec, promote_opened(opened)).await?,
        Some(TrackedSignal::Active(active)) => handle_active(inputs, &spec, active).await?,
        Some(TrackedSignal::Closed(_)) | Some(TrackedSignal::Cancelled(_)) => unreachable!("cleared above"),
    };

    throttle.last_tick_at = Some(inputs.ctx.when);
    if result.is_terminal() {
        throttle.last_closed_at = Some(inputs.ctx.when);
    }
    inputs.strategy.on_tick(inputs.ctx).await;
    Ok(result)
}

fn promote_opened(opened: Opened) -> Active {
    Active {
        core: opened.core,
        opened_at: opened.opened_at,
        price_open_actual: opened.price_open_actual,
        partials_hit: BTreeSet::new(),
        breakeven_applied: false,
    }
}

fn throttled(spec: &StrategySpec, throttle: &ThrottleState, ctx: &TemporalContext) -> bool {
    let floor = match throttle.last_opened_at {
        Some(opened_at) => Some(opened_at + spec.interval.step()),
        None => throttle.last_tick_at.map(|t| t + spec.interval.step()),
    };
    matches!(floor, Some(floor) if ctx.when < floor)
}

async fn risk_context(inputs: &TickInputs<'_>, throttle: &ThrottleState, current_price: f64, pending: SignalDraft) -> RiskContext {
    let spec = inputs.strategy.spec();
    let base = RiskContext::new(
        inputs.ctx.symbol.clone(),
        spec.name,
        inputs.market.exchange_name.clone(),
        inputs.ctx.when,
        current_price,
        inputs.portfolio.view().await,
        pending,
    );
    match throttle.last_closed_at {
        Some(last_closed_at) => base.with_last_closed_at(last_closed_at),
        None => base,
    }
}

async fn handle_no_signal(
    inputs: &TickInputs<'_>,
    spec: &StrategySpec,
    throttle: &mut ThrottleState,
) -> Result<TickResult, KernelError> {
    if throttled(spec, throttle, inputs.ctx) {
        return Ok(TickResult::Idle);
    }

    let Some(draft) = inputs.strategy.get_signal(inputs.ctx, inputs.market).await? else {
        return Ok(TickResult::Idle);
    };

    let current_vwap = inputs.market.get_average_price(inputs.ctx).await?;
    let price_open = draft.price_open.unwrap_or(current_vwap);
    draft.validate(price_open)?;

    let risk_ctx = risk_context(inputs, throttle, current_vwap, draft.clone()).await;
    let outcome = sk_risk::evaluate(inputs.risks, &risk_ctx);
    if let RiskOutcome::Rejected { .. } = &outcome {
        ev::publish_risk_rejected(inputs.events, inputs.ctx, spec, inputs.market, &outcome);
        return Ok(TickResult::Idle);
    }

    let id = draft.id.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let core = SignalCore {
        id,
        strategy_name: spec.name.clone(),
        symbol: inputs.ctx.symbol.clone(),
        position: draft.position,
        price_open,
        price_take_profit: draft.price_take_profit,
        price_stop_loss: draft.price_stop_loss,
        minute_estimated_time: draft.minute_estimated_time,
        note: draft.note.clone(),
    };

    let within_tolerance = ((price_open - current_vwap).abs() / price_open) <= inputs.config.vwap_tolerance_fraction;

    if within_tolerance {
        let opened = TrackedSignal::Opened(Opened {
            core,
            opened_at: inputs.ctx.when,
            price_open_actual: price_open,
        });
        inputs.store.write_atomic(&opened).await?;
        throttle.last_opened_at = Some(inputs.ctx.when);
        inputs.strategy.on_open(&opened).await;
        ev::publish_signal(inputs.events, inputs.ctx, spec, inputs.market, &opened);
        Ok(TickResult::Opened(opened))
    } else {
        let scheduled = TrackedSignal::Scheduled(Scheduled {
            core,
            scheduled_at: inputs.ctx.when,
        });
        inputs.store.write_atomic(&scheduled).await?;
        ev::publish_signal(inputs.events, inputs.ctx, spec, inputs.market, &scheduled);
        Ok(TickResult::Scheduled(scheduled))
    }
}

async fn handle_scheduled(
    inputs: &TickInputs<'_>,
    spec: &StrategySpec,
    throttle: &mut ThrottleState,
    scheduled: Scheduled,
) -> Result<TickResult, KernelError> {
    let current_vwap = inputs.market.get_average_price(inputs.ctx).await?;
    let crossed = match scheduled.core.position {
        Position::Long => current_vwap <= scheduled.core.price_open,
        Position::Short => current_vwap >= scheduled.core.price_open,
    };

    if !crossed {
        let due = throttle
            .last_scheduled_ping_at
            .map_or(true, |last| inputs.ctx.when - last >= inputs.config.scheduled_ping_interval);
        if due {
            ev::publish_scheduled_ping(inputs.events, inputs.ctx, spec, inputs.market);
            throttle.last_scheduled_ping_at = Some(inputs.ctx.when);
        }
        return Ok(TickResult::Scheduled(TrackedSignal::Scheduled(scheduled)));
    }

    let pending = SignalDraft::new(
        scheduled.core.position,
        scheduled.core.price_take_profit,
        scheduled.core.price_stop_loss,
        scheduled.core.minute_estimated_time,
    )
    .with_price_open(scheduled.core.price_open)
    .with_id(scheduled.core.id.clone());

    let risk_ctx = risk_context(inputs, throttle, current_vwap, pending).await;
    let outcome = sk_risk::evaluate(inputs.risks, &risk_ctx);
    if let RiskOutcome::Rejected { .. } = &outcome {
        ev::publish_risk_rejected(inputs.events, inputs.ctx, spec, inputs.market, &outcome);
        return Ok(TickResult::Scheduled(TrackedSignal::Scheduled(scheduled)));
    }

    let price_open_actual = scheduled.core.price_open;
    let opened = TrackedSignal::Opened(Opened {
        core: scheduled.core,
        opened_at: inputs.ctx.when,
        price_open_actual,
    });
    inputs.store.write_atomic(&opened).await?;
    throttle.last_opened_at = Some(inputs.ctx.when);
    inputs.strategy.on_open(&opened).await;
    ev::publish_signal(inputs.events, inputs.ctx, spec, inputs.market, &opened);
    Ok(TickResult::Opened(opened))
}

async fn handle_active(inputs: &TickInputs<'_>, spec: &StrategySpec, mut active: Active) -> Result<TickResult, KernelError> {
    let current_price = inputs.market.get_average_price(inputs.ctx).await?;

    let elapsed_minutes = (inputs.ctx.when - active.opened_at).num_minutes();
    if elapsed_minutes >= active.core.minute_estimated_time as i64 {
        return close(inputs, spec, active, current_price, sk_domain::CloseReason::TimeExpired).await;
    }

    let progress = partials::progress(
        active.core.position,
        active.price_open_actual,
        active.core.price_take_profit,
        active.core.price_stop_loss,
        current_price,
    );

    if let Some(reason) = partials::terminal_reason(&progress) {
        return close(inputs, spec, active, current_price, reason).await;
    }

    for (level, is_profit) in partials::newly_hit_milestones(&progress, &active.partials_hit, inputs.config) {
        active.partials_hit.insert(level);
        ev::publish_partial(inputs.events, inputs.ctx, spec, inputs.market, level, current_price, is_profit);
    }

    if partials::breakeven_due(&progress, active.breakeven_applied, inputs.config) {
        active.breakeven_applied = true;
        ev::publish_breakeven(inputs.events, inputs.ctx, spec, inputs.market);
    }

    let signal = TrackedSignal::Active(active);
    inputs.store.write_atomic(&signal).await?;
    inputs.strategy.on_active(&signal).await;
    ev::publish_signal(inputs.events, inputs.ctx, spec, inputs.market, &signal);
    Ok(TickResult::Active(signal))
}

async fn close(
    inputs: &TickInputs<'_>,
    spec: &StrategySpec,
    active: Active,
    price_close: f64,
    reason: sk_domain::CloseReason,
) -> Result<TickResult, KernelError> {
    let pnl = compute_pnl(
        active.core.position,
        active.price_open_actual,
        price_close,
        inputs.config.fee_percent,
        inputs.config.slippage_percent,
    );
    let closed = TrackedSignal::Closed(Closed {
        core: active.core,
        opened_at: active.opened_at,
        price_open_actual: active.price_open_actual,
        partials_hit: active.partials_hit,
        breakeven_applied: active.breakeven_applied,
        closed_at: inputs.ctx.when,
        price_close,
        reason,
        pnl,
    });
    inputs.store.write_atomic(&closed).await?;
    inputs.strategy.on_close(&closed).await;
    ev::publish_signal(inputs.events, inputs.ctx, spec, inputs.market, &closed);
    Ok(TickResult::Closed(closed))
}

/// External `cancel(symbol, strategy)` (§4.5 step 8): only legal on
/// `scheduled` unless [`LifecycleConfig::allow_cancel_active`] opts in to
/// also accepting it on `active`. Any other state (no signal, already
/// terminal) is a no-op that returns `Ok(None)`.
pub async fn cancel(
    inputs: &TickInputs<'_>,
    cancellation_id: Option<String>,
) -> Result<Option<TrackedSignal>, KernelError> {
    let spec = inputs.strategy.spec();
    let current = inputs.store.read().await?;

    let core = match current {
        Some(TrackedSignal::Scheduled(s)) => s.core,
        Some(TrackedSignal::Active(a)) if inputs.config.allow_cancel_active => a.core,
        other => return Ok(other),
    };

    let cancelled = TrackedSignal::Cancelled(Cancelled {
        core,
        cancelled_at: inputs.ctx.when,
        cancellation_id,
    });
    inputs.store.write_atomic(&cancelled).await?;
    ev::publish_signal(inputs.events, inputs.ctx, &spec, inputs.market, &cancelled);
    Ok(Some(cancelled))
}
