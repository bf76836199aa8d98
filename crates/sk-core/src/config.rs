use chrono::Duration;

/// Process-wide tuning for the Lifecycle Engine (§6 "Configuration surface").
/// Changes apply at the next tick — nothing here is cached per-run.
#[derive(Clone, Debug, PartialEq)]
pub struct LifecycleConfig {
    /// Per-side trading fee, as a percent (default `0.1` == 0.1%).
    pub fee_percent: f64,
    /// One-shot slippage applied at close, as a percent.
    pub slippage_percent: f64,
    /// How close `priceOpen` must be to the current VWAP, as a fraction of
    /// price, to transition `scheduled` straight to `opened` on the same
    /// tick it was proposed (§4.5 step 3).
    pub vwap_tolerance_fraction: f64,
    pub tp_level1_percent: f64,
    pub tp_level2_percent: f64,
    pub tp_level3_percent: f64,
    pub sl_level1_percent: f64,
    pub sl_level2_percent: f64,
    /// Progress toward TP, as a percent of distance, that fires the one-shot
    /// breakeven event. Defaults to `tp_level1_percent`.
    pub breakeven_trigger_percent: f64,
    /// Minimum gap between consecutive `scheduled-ping` heartbeats for the
    /// same slot (§4.5 step 4: "at most one per minute").
    pub scheduled_ping_interval: Duration,
    /// Whether `cancel()` is permitted to act on an `active` signal. Default
    /// `false`: cancel on `active` is a no-op (§4.5 step 8, §9).
    pub allow_cancel_active: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            fee_percent: 0.1,
            slippage_percent: 0.1,
            vwap_tolerance_fraction: 0.0001,
            tp_level1_percent: 30.0,
            tp_level2_percent: 60.0,
            tp_level3_percent: 90.0,
            sl_level1_percent: 40.0,
            sl_level2_percent: 80.0,
            breakeven_trigger_percent: 30.0,
            scheduled_ping_interval: Duration::minutes(1),
            allow_cancel_active: false,
        }
    }
}
