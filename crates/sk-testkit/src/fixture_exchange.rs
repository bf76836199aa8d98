use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use sk_context::Interval;
use sk_domain::Candle;
use sk_market::{ExchangeAdapter, GatewayError, OrderBook};

/// A deterministic candle feed keyed by tick index (the number of interval
/// steps elapsed since `anchor`): flat at `base_price` except where a test
/// has planted a specific price at a specific index — the "flat-then-spike"
/// series S1-S3 are built from.
pub struct FixtureExchangeAdapter {
    anchor: DateTime<Utc>,
    interval: Interval,
    base_price: f64,
    overrides: HashMap<i64, f64>,
    calls: Mutex<Vec<(DateTime<Utc>, usize)>>,
}

impl FixtureExchangeAdapter {
    pub fn flat(anchor: DateTime<Utc>, interval: Interval, base_price: f64) -> Self {
        Self {
            anchor,
            interval,
            base_price,
            overrides: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_spike_at(mut self, tick_index: i64, price: f64) -> Self {
        self.overrides.insert(tick_index, price);
        self
    }

    fn tick_index(&self, ts: DateTime<Utc>) -> i64 {
        (ts - self.anchor).num_milliseconds() / self.interval.step_ms()
    }

    fn price_at(&self, ts: DateTime<Utc>) -> f64 {
        self.overrides.get(&self.tick_index(ts)).copied().unwrap_or(self.base_price)
    }

    /// Every `(since, limit)` pair this adapter was asked to serve, in call
    /// order — used by look-ahead and no-lookahead assertions (S4, property #1).
    pub fn recorded_calls(&self) -> Vec<(DateTime<Utc>, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ExchangeAdapter for FixtureExchangeAdapter {
    async fn get_candles(
        &self,
        _symbol: &str,
        interval: Interval,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Candle>, GatewayError> {
        self.calls.lock().unwrap().push((since, limit));

        let mut candles = Vec::with_capacity(limit);
        for i in 0..limit {
            let ts = since + interval.step() * i as i32;
            let price = self.price_at(ts);
            let candle = Candle::new(interval, ts, price, price, price, price, 100.0)
                .map_err(|e| GatewayError::AdapterFailure(e.to_string()))?;
            candles.push(candle);
        }
        Ok(candles)
    }

    async fn get_order_book(&self, _symbol: &str, _depth: usize) -> Option<OrderBook> {
        None
    }
}
