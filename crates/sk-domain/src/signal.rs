use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::error::KernelError;

/// Long or short. Determines which side of `price_open` TP/SL must fall on
/// (invariant #2) and the sign of the PnL calculation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Long,
    Short,
}

/// Why a signal closed. `Manual` is reserved for an operator-initiated close
/// of an `active` signal (§9 open question, default-reject — see `sk-core`);
/// it exists in the taxonomy because the wire format must be able to express
/// it even though the default configuration never produces it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    TakeProfit,
    StopLoss,
    TimeExpired,
    Cancelled,
    Manual,
}

/// A percentage-of-distance milestone tracked on an active signal. `partials_hit`
/// is a set, so each level fires its advisory event at most once per signal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialLevel {
    TpLevel1,
    TpLevel2,
    TpLevel3,
    SlLevel1,
    SlLevel2,
}

/// Net/gross/percent PnL, computed once at close (§4.5) and never recomputed.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pnl {
    pub percent: f64,
    pub gross: f64,
    pub net: f64,
}

/// What a strategy's `get_signal` hands back: a proposal, not yet a tracked
/// signal. `id` is assigned by the Lifecycle Engine if absent; `price_open`
/// defaults to the current VWAP if absent (§4.5 step 3).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SignalDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_open: Option<f64>,
    pub price_take_profit: f64,
    pub price_stop_loss: f64,
    pub minute_estimated_time: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SignalDraft {
    pub fn new(
        position: Position,
        price_take_profit: f64,
        price_stop_loss: f64,
        minute_estimated_time: u32,
    ) -> Self {
        Self {
            id: None,
            position,
            price_open: None,
            price_take_profit,
            price_stop_loss,
            minute_estimated_time,
            note: None,
        }
    }

    pub fn with_price_open(mut self, price_open: f64) -> Self {
        self.price_open = Some(price_open);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Invariants #2 and #3. `price_open`, when present, must already be
    /// resolved by the caller — this only checks the relationship between
    /// TP/SL/position and the scalar bounds on price/duration.
    pub fn validate(&self, price_open: f64) -> Result<(), KernelError> {
        let bad = |reason: &str| {
            Err(KernelError::InvalidSignal {
                reason: reason.to_string(),
            })
        };

        if !(price_open.is_finite() && price_open > 0.0) {
            return bad("price_open must be a positive finite number");
        }
        if !(self.price_take_profit.is_finite() && self.price_take_profit > 0.0) {
            return bad("price_take_profit must be a positive finite number");
        }
        if !(self.price_stop_loss.is_finite() && self.price_stop_loss > 0.0) {
            return bad("price_stop_loss must be a positive finite number");
        }
        if self.minute_estimated_time == 0 || self.minute_estimated_time > 360 {
            return bad("minute_estimated_time must be in 1..=360");
        }

        match self.position {
            Position::Long => {
                if !(self.price_take_profit > price_open) {
                    return bad("long take-profit must be above price_open");
                }
                if !(self.price_stop_loss < price_open) {
                    return bad("long stop-loss must be below price_open");
                }
            }
            Position::Short => {
                if !(self.price_take_profit < price_open) {
                    return bad("short take-profit must be below price_open");
                }
                if !(self.price_stop_loss > price_open) {
                    return bad("short stop-loss must be above price_open");
                }
            }
        }

        Ok(())
    }
}

/// Fields shared by every lifecycle state (§3's "state" column is the enum
/// discriminant; everything else common to all states lives here so it
/// never has to be duplicated per-variant).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SignalCore {
    pub id: String,
    pub strategy_name: String,
    pub symbol: String,
    pub position: Position,
    pub price_open: f64,
    pub price_take_profit: f64,
    pub price_stop_loss: f64,
    pub minute_estimated_time: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scheduled {
    pub core: SignalCore,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Opened {
    pub core: SignalCore,
    pub opened_at: DateTime<Utc>,
    pub price_open_actual: f64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Active {
    pub core: SignalCore,
    pub opened_at: DateTime<Utc>,
    pub price_open_actual: f64,
    pub partials_hit: BTreeSet<PartialLevel>,
    pub breakeven_applied: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Closed {
    pub core: SignalCore,
    pub opened_at: DateTime<Utc>,
    pub price_open_actual: f64,
    pub partials_hit: BTreeSet<PartialLevel>,
    pub breakeven_applied: bool,
    pub closed_at: DateTime<Utc>,
    pub price_close: f64,
    pub reason: CloseReason,
    pub pnl: Pnl,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Cancelled {
    pub core: SignalCore,
    pub cancelled_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_id: Option<String>,
}

/// A signal tracked by the Signal Store, discriminated by lifecycle state.
/// Matching on `state` is exhaustive by construction: a `scheduled` signal
/// cannot carry `closed_at`, because the type simply has no such field.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrackedSignal {
    Scheduled(Scheduled),
    Opened(Opened),
    Active(Active),
    Closed(Closed),
    Cancelled(Cancelled),
}

impl TrackedSignal {
    pub fn core(&self) -> &SignalCore {
        match self {
            TrackedSignal::Scheduled(s) => &s.core,
            TrackedSignal::Opened(s) => &s.core,
            TrackedSignal::Active(s) => &s.core,
            TrackedSignal::Closed(s) => &s.core,
            TrackedSignal::Cancelled(s) => &s.core,
        }
    }

    pub fn id(&self) -> &str {
        &self.core().id
    }

    pub fn symbol(&self) -> &str {
        &self.core().symbol
    }

    pub fn strategy_name(&self) -> &str {
        &self.core().strategy_name
    }

    /// Invariant #1: only `closed`/`cancelled` free up the `(strategy, symbol)` slot.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrackedSignal::Closed(_) | TrackedSignal::Cancelled(_))
    }

    pub fn state_name(&self) -> &'static str {
        match self {
            TrackedSignal::Scheduled(_) => "scheduled",
            TrackedSignal::Opened(_) => "opened",
            TrackedSignal::Active(_) => "active",
            TrackedSignal::Closed(_) => "closed",
            TrackedSignal::Cancelled(_) => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn core() -> SignalCore {
        SignalCore {
            id: "s1".into(),
            strategy_name: "strat".into(),
            symbol: "BTC".into(),
            position: Position::Long,
            price_open: 42_000.0,
            price_take_profit: 43_000.0,
            price_stop_loss: 41_000.0,
            minute_estimated_time: 60,
            note: None,
        }
    }

    #[test]
    fn long_draft_requires_tp_above_and_sl_below_open() {
        let draft = SignalDraft::new(Position::Long, 43_000.0, 41_000.0, 60);
        assert!(draft.validate(42_000.0).is_ok());

        let bad_tp = SignalDraft::new(Position::Long, 41_500.0, 41_000.0, 60);
        assert!(bad_tp.validate(42_000.0).is_err());
    }

    #[test]
    fn short_draft_requires_tp_below_and_sl_above_open() {
        let draft = SignalDraft::new(Position::Short, 40_000.0, 44_000.0, 30);
        assert!(draft.validate(42_000.0).is_ok());

        let bad_sl = SignalDraft::new(Position::Short, 40_000.0, 41_000.0, 30);
        assert!(bad_sl.validate(42_000.0).is_err());
    }

    #[test]
    fn estimated_time_bound_enforced() {
        let draft = SignalDraft::new(Position::Long, 43_000.0, 41_000.0, 361);
        assert!(draft.validate(42_000.0).is_err());
    }

    #[test]
    fn terminal_states_are_closed_and_cancelled_only() {
        let scheduled = TrackedSignal::Scheduled(Scheduled {
            core: core(),
            scheduled_at: Utc.timestamp_opt(0, 0).unwrap(),
        });
        assert!(!scheduled.is_terminal());

        let cancelled = TrackedSignal::Cancelled(Cancelled {
            core: core(),
            cancelled_at: Utc.timestamp_opt(0, 0).unwrap(),
            cancellation_id: None,
        });
        assert!(cancelled.is_terminal());
    }

    #[test]
    fn round_trip_through_json_is_lossless() {
        let signal = TrackedSignal::Active(Active {
            core: core(),
            opened_at: Utc.timestamp_opt(0, 0).unwrap(),
            price_open_actual: 42_000.0,
            partials_hit: BTreeSet::from([PartialLevel::TpLevel1]),
            breakeven_applied: true,
        });
        let json = serde_json::to_string(&signal).unwrap();
        let back: TrackedSignal = serde_json::from_str(&json).unwrap();
        assert_eq!(signal, back);
    }
}
