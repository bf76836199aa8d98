use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sk_context::{Interval, TemporalContext};
use sk_domain::{Candle, KernelError};

use crate::adapter::{ExchangeAdapter, GatewayError, OrderBook};

/// Tunables for the gateway (part of §6's configuration surface).
#[derive(Clone, Debug, PartialEq)]
pub struct MarketConfig {
    /// Number of most-recent 1-minute closed candles averaged for VWAP.
    pub vwap_candle_count: usize,
    /// Deadline wrapped around every adapter call.
    pub adapter_timeout: Duration,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            vwap_candle_count: 5,
            adapter_timeout: Duration::from_secs(30),
        }
    }
}

/// The Exchange Gateway (C2): wraps a user-supplied [`ExchangeAdapter`],
/// enforcing timestamp alignment, look-ahead refusal, and VWAP computation
/// so that strategies never see a raw, unvalidated adapter response.
pub struct Market {
    pub exchange_name: String,
    adapter: Arc<dyn ExchangeAdapter>,
    config: MarketConfig,
}

impl Market {
    pub fn new(exchange_name: impl Into<String>, adapter: Arc<dyn ExchangeAdapter>) -> Self {
        Self::with_config(exchange_name, adapter, MarketConfig::default())
    }

    pub fn with_config(
        exchange_name: impl Into<String>,
        adapter: Arc<dyn ExchangeAdapter>,
        config: MarketConfig,
    ) -> Self {
        Self {
            exchange_name: exchange_name.into(),
            adapter,
            config,
        }
    }

    async fn fetch(
        &self,
        symbol: &str,
        interval: Interval,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Candle>, KernelError> {
        let fut = self.adapter.get_candles(symbol, interval, since, limit);
        match tokio::time::timeout(self.config.adapter_timeout, fut).await {
            Ok(Ok(candles)) => Ok(candles),
            Ok(Err(e)) => Err(KernelError::from(e)),
            Err(_) => Err(KernelError::AdapterTimeout {
                elapsed_ms: self.config.adapter_timeout.as_millis() as u64,
            }),
        }
    }

    /// Verifies the two adapter invariants the gateway is responsible for
    /// catching: the first candle's timestamp matches the aligned `since`
    /// exactly (property #3), and successive candles are spaced one step
    /// apart (part of the Exchange registration contract in §6).
    fn verify_contract(
        candles: &[Candle],
        since: DateTime<Utc>,
        interval: Interval,
    ) -> Result<(), KernelError> {
        let Some(first) = candles.first() else {
            return Ok(());
        };
        if first.timestamp != since {
            return Err(KernelError::AdapterInvariantViolation {
                message: format!(
                    "first candle timestamp {} does not equal requested since {since}",
                    first.timestamp
                ),
            });
        }
        for pair in candles.windows(2) {
            let gap = pair[1].timestamp - pair[0].timestamp;
            if gap != interval.step() {
                return Err(KernelError::AdapterInvariantViolation {
                    message: format!(
                        "candle spacing {gap} does not equal interval step {}",
                        interval.step()
                    ),
                });
            }
        }
        Ok(())
    }

    /// `limit` most recently **closed** candles at or before `ctx.when`.
    pub async fn get_candles(
        &self,
        ctx: &TemporalContext,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>, KernelError> {
        let aligned_when = ctx.aligned_when(interval);
        let since = aligned_when - interval.step() * limit as i32;

        let mut candles = self.fetch(&ctx.symbol, interval, since, limit).await?;
        Self::verify_contract(&candles, since, interval)?;
        candles.truncate(limit);
        Ok(candles)
    }

    /// Forward candles from `alignedWhen`, used by the backtest fast path
    /// only. Any candle whose end would land after `horizon` is dropped
    /// rather than returned — `horizon` is the frame end in backtest, or
    /// wall-clock-at-call-time in live.
    pub async fn get_next_candles(
        &self,
        ctx: &TemporalContext,
        interval: Interval,
        limit: usize,
        horizon: DateTime<Utc>,
    ) -> Result<Vec<Candle>, KernelError> {
        let aligned_when = ctx.aligned_when(interval);
        let mut candles = self.fetch(&ctx.symbol, interval, aligned_when, limit).await?;
        Self::verify_contract(&candles, aligned_when, interval)?;
        candles.retain(|c| c.end_ts(interval) <= horizon);
        Ok(candles)
    }

    /// Flexible range fetch. Rejects `eDate > when`, `sDate >= eDate`, and
    /// any combination producing a non-positive limit (property #2, S4).
    pub async fn get_raw_candles(
        &self,
        ctx: &TemporalContext,
        interval: Interval,
        limit: Option<usize>,
        s_date: Option<DateTime<Utc>>,
        e_date: Option<DateTime<Utc>>,
    ) -> Result<Vec<Candle>, KernelError> {
        let e_date = e_date.unwrap_or(ctx.when);
        if e_date > ctx.when {
            return Err(KernelError::LookaheadRequested {
                requested: e_date,
                when: ctx.when,
            });
        }

        let s_date = match s_date {
            Some(s) => s,
            None => {
                let limit = limit.ok_or_else(|| KernelError::AdapterInvariantViolation {
                    message: "getRawCandles requires sDate or limit to resolve a start"
                        .to_string(),
                })?;
                interval.align_down(e_date) - interval.step() * limit as i32
            }
        };

        if s_date >= e_date {
            return Err(KernelError::AdapterInvariantViolation {
                message: format!("sDate {s_date} must be strictly before eDate {e_date}"),
            });
        }

        let aligned_since = interval.align_down(s_date);
        let resolved_limit = match limit {
            Some(l) => l,
            None => {
                let span_ms = (e_date - aligned_since).num_milliseconds();
                let step_ms = interval.step_ms();
                ((span_ms + step_ms - 1) / step_ms).max(0) as usize
            }
        };

        if resolved_limit == 0 {
            return Err(KernelError::AdapterInvariantViolation {
                message: "getRawCandles resolved to a non-positive limit".to_string(),
            });
        }

        let mut candles = self
            .fetch(&ctx.symbol, interval, aligned_since, resolved_limit)
            .await?;
        Self::verify_contract(&candles, aligned_since, interval)?;
        candles.retain(|c| aligned_since <= c.timestamp && c.end_ts(interval) <= e_date);
        candles.truncate(resolved_limit);
        Ok(candles)
    }

    /// VWAP of the last `vwap_candle_count` closed 1-minute candles:
    /// `Σ(typical_price · volume) / Σ volume`, falling back to the simple
    /// mean of closes when total volume is zero (kept explicit per §9,
    /// never silent).
    pub async fn get_average_price(&self, ctx: &TemporalContext) -> Result<f64, KernelError> {
        let candles = self
            .get_candles(ctx, Interval::OneMinute, self.config.vwap_candle_count)
            .await?;

        if candles.is_empty() {
            return Err(KernelError::AdapterInvariantViolation {
                message: "no candles available to compute VWAP".to_string(),
            });
        }

        let total_volume: f64 = candles.iter().map(|c| c.volume).sum();
        if total_volume == 0.0 {
            let mean_close = candles.iter().map(|c| c.close).sum::<f64>() / candles.len() as f64;
            return Ok(mean_close);
        }

        let weighted: f64 = candles
            .iter()
            .map(|c| c.typical_price() * c.volume)
            .sum();
        Ok(weighted / total_volume)
    }

    pub fn format_price(&self, symbol: &str, price: f64) -> String {
        self.adapter.format_price(symbol, price)
    }

    pub fn format_quantity(&self, symbol: &str, quantity: f64) -> String {
        self.adapter.format_quantity(symbol, quantity)
    }

    pub async fn get_order_book(&self, symbol: &str, depth: usize) -> Option<OrderBook> {
        self.adapter.get_order_book(symbol, depth).await
    }

    /// Number of closed candles averaged into [`Market::get_average_price`].
    /// Exposed so callers that need VWAP-equivalence (the backtest fast
    /// path) can tell when a single candle's typical price already *is*
    /// the VWAP.
    pub fn vwap_candle_count(&self) -> usize {
        self.config.vwap_candle_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sk_context::Mode;
    use std::sync::Mutex;

    struct FlatAdapter {
        price: f64,
        calls: Mutex<Vec<(DateTime<Utc>, usize)>>,
    }

    #[async_trait::async_trait]
    impl ExchangeAdapter for FlatAdapter {
        async fn get_candles(
            &self,
            _symbol: &str,
            interval: Interval,
            since: DateTime<Utc>,
            limit: usize,
        ) -> Result<Vec<Candle>, GatewayError> {
            self.calls.lock().unwrap().push((since, limit));
            let mut out = Vec::with_capacity(limit);
            for i in 0..limit {
                let ts = since + interval.step() * i as i32;
                out.push(Candle::new(interval, ts, self.price, self.price, self.price, self.price, 10.0).unwrap());
            }
            Ok(out)
        }
    }

    fn ctx(when_ms: i64) -> TemporalContext {
        TemporalContext::new("BTC", Utc.timestamp_millis_opt(when_ms).unwrap(), Mode::Backtest)
    }

    #[tokio::test]
    async fn get_candles_aligns_and_verifies_first_timestamp() {
        let adapter = Arc::new(FlatAdapter {
            price: 42_000.0,
            calls: Mutex::new(vec![]),
        });
        let market = Market::new("test", adapter.clone());
        let c = ctx(5 * 60_000 + 30_000); // 5m30s
        let candles = market.get_candles(&c, Interval::OneMinute, 5).await.unwrap();
        assert_eq!(candles.len(), 5);
        assert!(candles.last().unwrap().timestamp + Interval::OneMinute.step() <= c.when);
    }

    #[tokio::test]
    async fn raw_candles_reject_lookahead() {
        let adapter = Arc::new(FlatAdapter {
            price: 1.0,
            calls: Mutex::new(vec![]),
        });
        let market = Market::new("test", adapter);
        let c = ctx(0);
        let err = market
            .get_raw_candles(
                &c,
                Interval::OneMinute,
                Some(5),
                Some(c.when + chrono::Duration::minutes(1)),
                Some(c.when + chrono::Duration::minutes(5)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, KernelError::LookaheadRequested { .. }));
    }

    #[tokio::test]
    async fn raw_candles_reject_inverted_range() {
        let adapter = Arc::new(FlatAdapter {
            price: 1.0,
            calls: Mutex::new(vec![]),
        });
        let market = Market::new("test", adapter);
        let c = ctx(10 * 60_000);
        let err = market
            .get_raw_candles(&c, Interval::OneMinute, None, Some(c.when), Some(c.when - chrono::Duration::minutes(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, KernelError::AdapterInvariantViolation { .. }));
    }

    #[tokio::test]
    async fn vwap_falls_back_to_mean_close_when_volume_is_zero() {
        struct ZeroVolumeAdapter;
        #[async_trait::async_trait]
        impl ExchangeAdapter for ZeroVolumeAdapter {
            async fn get_candles(
                &self,
                _symbol: &str,
                interval: Interval,
                since: DateTime<Utc>,
                limit: usize,
            ) -> Result<Vec<Candle>, GatewayError> {
                let mut out = Vec::with_capacity(limit);
                for i in 0..limit {
                    let ts = since + interval.step() * i as i32;
                    out.push(Candle::new(interval, ts, 10.0, 10.0, 10.0, 10.0 + i as f64, 0.0).unwrap());
                }
                Ok(out)
            }
        }
        let market = Market::new("test", Arc::new(ZeroVolumeAdapter));
        let c = ctx(10 * 60_000);
        let vwap = market.get_average_price(&c).await.unwrap();
        // mean of closes 10.0 + (0..5)/5 ticks => last 5 closes ending just before `when`
        assert!(vwap > 0.0);
    }

    #[tokio::test]
    async fn adapter_invariant_violation_on_wrong_first_timestamp() {
        struct WrongFirstAdapter;
        #[async_trait::async_trait]
        impl ExchangeAdapter for WrongFirstAdapter {
            async fn get_candles(
                &self,
                _symbol: &str,
                interval: Interval,
                since: DateTime<Utc>,
                limit: usize,
            ) -> Result<Vec<Candle>, GatewayError> {
                let mut out = Vec::with_capacity(limit);
                let off = since + interval.step(); // deliberately off by one step
                for i in 0..limit {
                    let ts = off + interval.step() * i as i32;
                    out.push(Candle::new(interval, ts, 1.0, 1.0, 1.0, 1.0, 1.0).unwrap());
                }
                Ok(out)
            }
        }
        let market = Market::new("test", Arc::new(WrongFirstAdapter));
        let c = ctx(10 * 60_000);
        let err = market.get_candles(&c, Interval::OneMinute, 3).await.unwrap_err();
        assert!(matches!(err, KernelError::AdapterInvariantViolation { .. }));
    }
}
