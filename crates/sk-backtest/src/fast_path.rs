use chrono::{DateTime, Utc};
use sk_context::{Interval, Mode, TemporalContext};
use sk_core::partials::{progress, terminal_reason};
use sk_core::{compute_pnl, LifecycleConfig};
use sk_domain::{Closed, CloseReason, KernelError, Opened};
use sk_market::Market;

/// Scans the candles spanning an `opened` signal's remaining lifetime in one
/// gateway call and returns the terminal [`Closed`] outcome directly,
/// skipping per-tick iteration (§4.6 fast path).
///
/// Only exact when [`Market::vwap_candle_count`] is `1` — with a wider VWAP
/// window a single candle's typical price is not what the Lifecycle Engine
/// would have observed at that tick, so the caller must fall back to
/// per-tick iteration in that configuration. Returns `Ok(None)` when no
/// terminal condition is reached before `horizon` (time expiry lands exactly
/// on the boundary and is handled by the caller's next per-tick call).
pub async fn try_resolve(
    market: &Market,
    opened: &Opened,
    horizon: DateTime<Utc>,
    config: &LifecycleConfig,
) -> Result<Option<Closed>, KernelError> {
    if market.vwap_candle_count() != 1 {
        return Ok(None);
    }

    let expiry = opened.opened_at + chrono::Duration::minutes(opened.core.minute_estimated_time as i64);
    let scan_until = expiry.min(horizon);
    if scan_until <= opened.opened_at {
        return Ok(None);
    }

    let limit = ((scan_until - opened.opened_at).num_minutes().max(1)) as usize;
    let anchor = TemporalContext::new(opened.core.symbol.clone(), opened.opened_at, Mode::Backtest);
    let candles = market
        .get_next_candles(&anchor, Interval::OneMinute, limit, scan_until)
        .await?;

    for candle in &candles {
        let current_price = candle.typical_price();
        let prog = progress(
            opened.core.position,
            opened.price_open_actual,
            opened.core.price_take_profit,
            opened.core.price_stop_loss,
            current_price,
        );
        if let Some(reason) = terminal_reason(&prog) {
            return Ok(Some(close(opened, candle.timestamp, current_price, reason, config)));
        }
        if candle.timestamp >= expiry {
            return Ok(Some(close(
                opened,
                candle.timestamp,
                current_price,
                CloseReason::TimeExpired,
                config,
            )));
        }
    }

    Ok(None)
}

fn close(opened: &Opened, closed_at: DateTime<Utc>, price_close: f64, reason: CloseReason, config: &LifecycleConfig) -> Closed {
    let pnl = compute_pnl(
        opened.core.position,
        opened.price_open_actual,
        price_close,
        config.fee_percent,
        config.slippage_percent,
    );
    Closed {
        core: opened.core.clone(),
        opened_at: opened.opened_at,
        price_open_actual: opened.price_open_actual,
        partials_hit: std::collections::BTreeSet::new(),
        breakeven_applied: false,
        closed_at,
        price_close,
        reason,
        pnl,
    }
}
