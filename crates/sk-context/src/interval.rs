use chrono::{DateTime, TimeZone, Utc};

/// The closed set of supported candle intervals (§3).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "3m")]
    ThreeMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
}

impl Interval {
    /// Bar step, in milliseconds.
    pub const fn step_ms(&self) -> i64 {
        match self {
            Interval::OneMinute => 60_000,
            Interval::ThreeMinutes => 3 * 60_000,
            Interval::FiveMinutes => 5 * 60_000,
            Interval::FifteenMinutes => 15 * 60_000,
            Interval::ThirtyMinutes => 30 * 60_000,
            Interval::OneHour => 60 * 60_000,
            Interval::FourHours => 4 * 60 * 60_000,
            Interval::OneDay => 24 * 60 * 60_000,
        }
    }

    pub fn step(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.step_ms())
    }

    /// Round `when` down to the start of the bucket it falls in. A candle's
    /// `timestamp` invariant (a multiple of the interval step) means this is
    /// exact integer-millisecond floor division, never a lossy rounding.
    pub fn align_down(&self, when: DateTime<Utc>) -> DateTime<Utc> {
        let step = self.step_ms();
        let ts = when.timestamp_millis();
        let floored = ts.div_euclid(step) * step;
        Utc.timestamp_millis_opt(floored).unwrap()
    }

    /// `true` if `ts` is itself a valid candle boundary for this interval.
    pub fn is_aligned(&self, ts: DateTime<Utc>) -> bool {
        ts.timestamp_millis().rem_euclid(self.step_ms()) == 0
    }
}
