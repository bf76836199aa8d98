//! sk-context
//!
//! The Temporal Context (C1) — the single legal source of "now" for every
//! data access in the kernel. A `TemporalContext` is bound once at the top
//! of a tick and threaded explicitly through every Exchange Gateway call;
//! there is no ambient/thread-local notion of time, only a value that is
//! copied down the call tree. This makes look-ahead bias unrepresentable:
//! a function either has a `&TemporalContext` in scope, in which case it
//! can only see data at or before `when`, or it has none, in which case it
//! cannot call the gateway at all (the compiler enforces what the source
//! system enforced at runtime as `MissingContext`).

mod frame;
mod interval;

pub use frame::Frame;
pub use interval::Interval;

use chrono::{DateTime, Utc};

/// Which driver produced this tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Backtest,
    Live,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Backtest => "backtest",
            Mode::Live => "live",
        }
    }
}

/// `(symbol, when, mode)` — immutable per tick, `Copy`-cheap to pass by value.
///
/// Child tasks spawned within a tick must be handed a clone of the same
/// context rather than constructing their own; `TemporalContext` carries no
/// wall-clock access of its own, so there is no way to "peek" past `when`
/// from within one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemporalContext {
    pub symbol: String,
    pub when: DateTime<Utc>,
    pub mode: Mode,
}

impl TemporalContext {
    pub fn new(symbol: impl Into<String>, when: DateTime<Utc>, mode: Mode) -> Self {
        Self {
            symbol: symbol.into(),
            when,
            mode,
        }
    }

    /// `when` rounded down to the start of the containing `interval` bucket.
    pub fn aligned_when(&self, interval: Interval) -> DateTime<Utc> {
        interval.align_down(self.when)
    }

    /// A derived context for the same tick but a different symbol (used by
    /// the portfolio view, which reads other strategies' slots without
    /// advancing `when`).
    pub fn with_symbol(&self, symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            when: self.when,
            mode: self.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_symbol_preserves_when_and_mode() {
        let now = Utc::now();
        let ctx = TemporalContext::new("BTC", now, Mode::Live);
        let other = ctx.with_symbol("ETH");
        assert_eq!(other.when, now);
        assert_eq!(other.mode, Mode::Live);
        assert_eq!(other.symbol, "ETH");
    }
}
