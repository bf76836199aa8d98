use std::sync::Mutex;

use sk_context::{Interval, TemporalContext};
use sk_domain::{KernelError, SignalDraft};
use sk_market::Market;
use sk_strategy::{Strategy, StrategySpec};

/// Emits `draft` exactly once, on the first `get_signal` call, then goes
/// quiet — models a strategy that reacts to a single setup rather than
/// re-proposing a new one every idle tick (S1-S3, S5).
pub struct FixedDraftStrategy {
    spec: StrategySpec,
    draft: Mutex<Option<SignalDraft>>,
}

impl FixedDraftStrategy {
    pub fn new(name: impl Into<String>, interval: Interval, draft: SignalDraft) -> Self {
        Self {
            spec: StrategySpec::new(name, interval),
            draft: Mutex::new(Some(draft)),
        }
    }

    pub fn with_risk_name(mut self, risk_name: impl Into<String>) -> Self {
        self.spec = self.spec.with_risk_name(risk_name);
        self
    }
}

#[async_trait::async_trait]
impl Strategy for FixedDraftStrategy {
    fn spec(&self) -> StrategySpec {
        self.spec.clone()
    }

    async fn get_signal(&self, _ctx: &TemporalContext, _market: &Market) -> Result<Option<SignalDraft>, KernelError> {
        Ok(self.draft.lock().unwrap().take())
    }
}

/// Proposes `draft` on every `get_signal` call — used to probe the interval
/// throttle, where a strategy that keeps trying is the whole point.
pub struct RepeatingDraftStrategy {
    spec: StrategySpec,
    draft: SignalDraft,
}

impl RepeatingDraftStrategy {
    pub fn new(name: impl Into<String>, interval: Interval, draft: SignalDraft) -> Self {
        Self {
            spec: StrategySpec::new(name, interval),
            draft,
        }
    }
}

#[async_trait::async_trait]
impl Strategy for RepeatingDraftStrategy {
    fn spec(&self) -> StrategySpec {
        self.spec.clone()
    }

    async fn get_signal(&self, _ctx: &TemporalContext, _market: &Market) -> Result<Option<SignalDraft>, KernelError> {
        Ok(Some(self.draft.clone()))
    }
}

/// Never proposes a signal — used where a scenario needs a slot that stays
/// idle (the risk-rejected competitor in S5, or a baseline for property tests).
pub struct NoSignalStrategy {
    spec: StrategySpec,
}

impl NoSignalStrategy {
    pub fn new(name: impl Into<String>, interval: Interval) -> Self {
        Self { spec: StrategySpec::new(name, interval) }
    }

    pub fn with_risk_name(mut self, risk_name: impl Into<String>) -> Self {
        self.spec = self.spec.with_risk_name(risk_name);
        self
    }
}

#[async_trait::async_trait]
impl Strategy for NoSignalStrategy {
    fn spec(&self) -> StrategySpec {
        self.spec.clone()
    }

    async fn get_signal(&self, _ctx: &TemporalContext, _market: &Market) -> Result<Option<SignalDraft>, KernelError> {
        Ok(None)
    }
}
