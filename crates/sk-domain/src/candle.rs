use chrono::{DateTime, Utc};
use sk_context::Interval;

/// A single OHLCV bar. Immutable once constructed.
///
/// Invariant: `timestamp` (the start of the bar) is a multiple of the
/// interval's step — enforced by [`Candle::new`], which is the only
/// constructor.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Returned when a caller tries to construct a `Candle` whose timestamp does
/// not land on an interval boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnalignedTimestamp;

impl core::fmt::Display for UnalignedTimestamp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "candle timestamp is not a multiple of the interval step")
    }
}

impl std::error::Error for UnalignedTimestamp {}

impl Candle {
    pub fn new(
        interval: Interval,
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, UnalignedTimestamp> {
        if !interval.is_aligned(timestamp) {
            return Err(UnalignedTimestamp);
        }
        Ok(Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    /// `(high + low + close) / 3` — the typical price used by VWAP.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// End-of-bar timestamp, given the interval step.
    pub fn end_ts(&self, interval: Interval) -> DateTime<Utc> {
        self.timestamp + interval.step()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rejects_unaligned_timestamp() {
        let ts = Utc.timestamp_millis_opt(61_000).unwrap();
        let err = Candle::new(Interval::FiveMinutes, ts, 1.0, 1.0, 1.0, 1.0, 1.0);
        assert!(err.is_err());
    }

    #[test]
    fn typical_price_averages_hlc() {
        let ts = Utc.timestamp_millis_opt(0).unwrap();
        let c = Candle::new(Interval::OneMinute, ts, 10.0, 12.0, 9.0, 11.0, 100.0).unwrap();
        assert!((c.typical_price() - (12.0 + 9.0 + 11.0) / 3.0).abs() < 1e-9);
    }
}
