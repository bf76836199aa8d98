use serde::{Deserialize, Serialize};
use sk_core::LifecycleConfig;
use sk_live::LiveConfig;
use sk_market::MarketConfig;

/// The full configuration surface (§6): everything an embedder or the CLI
/// can tune process-wide. Field names are `snake_case` TOML keys; defaults
/// match the values named in the spec's configuration surface table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub slippage_percent: f64,
    pub fee_percent: f64,
    pub tick_ttl_ms: u64,
    pub vwap_candle_count: usize,
    pub max_signal_minutes: u32,
    pub vwap_tolerance_fraction: f64,
    pub tp_level1_percent: f64,
    pub tp_level2_percent: f64,
    pub tp_level3_percent: f64,
    pub sl_level1_percent: f64,
    pub sl_level2_percent: f64,
    pub breakeven_trigger_percent: f64,
    pub scheduled_ping_interval_secs: i64,
    pub allow_cancel_active: bool,
    pub adapter_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let lifecycle = LifecycleConfig::default();
        let market = MarketConfig::default();
        let live = LiveConfig::default();
        Self {
            slippage_percent: lifecycle.slippage_percent,
            fee_percent: lifecycle.fee_percent,
            tick_ttl_ms: live.tick_ttl.as_millis() as u64,
            vwap_candle_count: market.vwap_candle_count,
            max_signal_minutes: 360,
            vwap_tolerance_fraction: lifecycle.vwap_tolerance_fraction,
            tp_level1_percent: lifecycle.tp_level1_percent,
            tp_level2_percent: lifecycle.tp_level2_percent,
            tp_level3_percent: lifecycle.tp_level3_percent,
            sl_level1_percent: lifecycle.sl_level1_percent,
            sl_level2_percent: lifecycle.sl_level2_percent,
            breakeven_trigger_percent: lifecycle.breakeven_trigger_percent,
            scheduled_ping_interval_secs: lifecycle.scheduled_ping_interval.num_seconds(),
            allow_cancel_active: lifecycle.allow_cancel_active,
            adapter_timeout_secs: market.adapter_timeout.as_secs(),
        }
    }
}

impl Settings {
    pub fn lifecycle_config(&self) -> LifecycleConfig {
        LifecycleConfig {
            fee_percent: self.fee_percent,
            slippage_percent: self.slippage_percent,
            vwap_tolerance_fraction: self.vwap_tolerance_fraction,
            tp_level1_percent: self.tp_level1_percent,
            tp_level2_percent: self.tp_level2_percent,
            tp_level3_percent: self.tp_level3_percent,
            sl_level1_percent: self.sl_level1_percent,
            sl_level2_percent: self.sl_level2_percent,
            breakeven_trigger_percent: self.breakeven_trigger_percent,
            scheduled_ping_interval: chrono::Duration::seconds(self.scheduled_ping_interval_secs),
            allow_cancel_active: self.allow_cancel_active,
        }
    }

    pub fn market_config(&self) -> MarketConfig {
        MarketConfig {
            vwap_candle_count: self.vwap_candle_count,
            adapter_timeout: std::time::Duration::from_secs(self.adapter_timeout_secs),
        }
    }

    pub fn live_config(&self) -> LiveConfig {
        LiveConfig {
            tick_ttl: std::time::Duration::from_millis(self.tick_ttl_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_json() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, back);
    }
}
