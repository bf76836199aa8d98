use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::signal::{SignalDraft, TrackedSignal};

/// `(strategy, symbol, signal id)` — the unique key for an entry in a
/// [`PortfolioView`].
pub type PortfolioKey = (String, String, String);

/// A read-only snapshot of the non-terminal signals across every
/// `(strategy, symbol)` slot that shares a risk set with the caller.
///
/// Built fresh each tick by scanning the Signal Store (§9: "avoid a central
/// positions manager that would require cross-run locking") — never mutated
/// in place, never shared behind a lock. Concurrent writes to *other* slots
/// during the scan are acceptable; this is advisory, not a lock.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PortfolioView {
    entries: BTreeMap<PortfolioKey, TrackedSignal>,
}

impl PortfolioView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_signals(signals: impl IntoIterator<Item = TrackedSignal>) -> Self {
        let mut entries = BTreeMap::new();
        for signal in signals {
            let key = (
                signal.strategy_name().to_string(),
                signal.symbol().to_string(),
                signal.id().to_string(),
            );
            entries.insert(key, signal);
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedSignal> {
        self.entries.values()
    }

    /// Active-position count for a given symbol — what `RiskContext.activePositionCount`
    /// reports when the caller's risk set is scoped per-symbol.
    pub fn count_for_symbol(&self, symbol: &str) -> usize {
        self.entries
            .values()
            .filter(|s| s.symbol() == symbol)
            .count()
    }

    pub fn for_symbol(&self, symbol: &str) -> impl Iterator<Item = &TrackedSignal> {
        self.entries.values().filter(move |s| s.symbol() == symbol)
    }
}

/// Supplies a [`PortfolioView`] on demand. A bare `PortfolioView` answers
/// with itself, unchanged, which is what a test or a one-off `cancel()` call
/// wants; a driver mid-run wants the view rebuilt from the live Signal
/// Stores on every tick (§3, §5: "rebuilt on each tick by scanning all
/// stores that share a risk set" / "snapshotted per tick, copy-on-read") —
/// `sk-runtime`'s `Registry` implements this trait to do exactly that.
#[async_trait::async_trait]
pub trait PortfolioSource: Send + Sync {
    async fn view(&self) -> PortfolioView;
}

#[async_trait::async_trait]
impl PortfolioSource for PortfolioView {
    async fn view(&self) -> PortfolioView {
        self.clone()
    }
}

/// Everything a risk validation predicate needs to decide allow/reject.
#[derive(Clone, Debug)]
pub struct RiskContext {
    pub symbol: String,
    pub strategy_name: String,
    pub exchange_name: String,
    pub timestamp: DateTime<Utc>,
    pub current_price: f64,
    pub active_positions: PortfolioView,
    pub active_position_count: usize,
    pub pending_signal: SignalDraft,
    /// When the slot's most recently closed signal for this `(strategy,
    /// symbol)` finished, if any — `cooldown_after_close` is the only
    /// built-in validation that reads this.
    pub last_closed_at: Option<DateTime<Utc>>,
}

impl RiskContext {
    pub fn new(
        symbol: impl Into<String>,
        strategy_name: impl Into<String>,
        exchange_name: impl Into<String>,
        timestamp: DateTime<Utc>,
        current_price: f64,
        active_positions: PortfolioView,
        pending_signal: SignalDraft,
    ) -> Self {
        let symbol = symbol.into();
        let active_position_count = active_positions.count_for_symbol(&symbol);
        Self {
            symbol,
            strategy_name: strategy_name.into(),
            exchange_name: exchange_name.into(),
            timestamp,
            current_price,
            active_positions,
            active_position_count,
            pending_signal,
            last_closed_at: None,
        }
    }

    pub fn with_last_closed_at(mut self, last_closed_at: DateTime<Utc>) -> Self {
        self.last_closed_at = Some(last_closed_at);
        self
    }
}
