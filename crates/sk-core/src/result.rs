use chrono::{DateTime, Utc};
use sk_domain::TrackedSignal;

/// What one call to [`crate::tick`] produced (§4.5). Exactly one per tick.
#[derive(Clone, Debug, PartialEq)]
pub enum TickResult {
    Idle,
    Scheduled(TrackedSignal),
    Opened(TrackedSignal),
    Active(TrackedSignal),
    Closed(TrackedSignal),
    Cancelled(TrackedSignal),
}

impl TickResult {
    pub fn signal(&self) -> Option<&TrackedSignal> {
        match self {
            TickResult::Idle => None,
            TickResult::Scheduled(s)
            | TickResult::Opened(s)
            | TickResult::Active(s)
            | TickResult::Closed(s)
            | TickResult::Cancelled(s) => Some(s),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TickResult::Closed(_) | TickResult::Cancelled(_))
    }
}

/// Carried between ticks by the driver (`sk-backtest`/`sk-live`) to implement
/// the interval throttle (§4.5 step 2) and the `scheduled-ping` rate limit
/// (§4.5 step 4). Lives outside the Signal Store because it is about *when
/// the engine last looked*, not about the signal itself.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThrottleState {
    pub last_opened_at: Option<DateTime<Utc>>,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub last_scheduled_ping_at: Option<DateTime<Utc>>,
    /// When the slot's signal last closed, if ever — fed into
    /// [`sk_domain::RiskContext::with_last_closed_at`] so `cooldown_after_close`
    /// has something to read.
    pub last_closed_at: Option<DateTime<Utc>>,
}
