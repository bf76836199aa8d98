use sk_context::TemporalContext;
use sk_domain::{KernelError, SignalDraft, TrackedSignal};
use sk_market::Market;

use crate::spec::StrategySpec;

/// The user-supplied contract the Lifecycle Engine drives each tick (§6).
/// `get_signal` is the only required hook; the rest are advisory
/// notifications a strategy can ignore.
#[async_trait::async_trait]
pub trait Strategy: Send + Sync {
    fn spec(&self) -> StrategySpec;

    /// Called only when the slot holds no signal and the interval throttle
    /// has elapsed (§4.5 step 3). Returning `Ok(None)` is an ordinary idle
    /// tick, not an error.
    async fn get_signal(
        &self,
        ctx: &TemporalContext,
        market: &Market,
    ) -> Result<Option<SignalDraft>, KernelError>;

    async fn on_open(&self, _signal: &TrackedSignal) {}
    async fn on_close(&self, _signal: &TrackedSignal) {}
    async fn on_tick(&self, _ctx: &TemporalContext) {}
    async fn on_active(&self, _signal: &TrackedSignal) {}
    async fn on_timeframe(&self, _ctx: &TemporalContext) {}
}
