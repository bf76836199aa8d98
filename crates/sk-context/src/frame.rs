use chrono::{DateTime, Utc};

use crate::Interval;

/// A registered backtest window: `(frameName, interval, startDate, endDate)`
/// (§6). The Backtest Driver expands this into the finite tick-instant
/// sequence `startDate, startDate+step, …, < endDate`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub name: String,
    pub interval: Interval,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Frame {
    pub fn new(name: impl Into<String>, interval: Interval, start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            interval,
            start_date,
            end_date,
        }
    }

    /// The finite sequence of tick instants this frame covers: `start_date`,
    /// `start_date + step`, … up to but excluding `end_date`.
    pub fn tick_instants(&self) -> Vec<DateTime<Utc>> {
        let step = self.interval.step();
        let mut out = Vec::new();
        let mut when = self.start_date;
        while when < self.end_date {
            out.push(when);
            when += step;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn tick_instants_excludes_end_date() {
        let frame = Frame::new(
            "f",
            Interval::OneMinute,
            Utc.timestamp_millis_opt(0).unwrap(),
            Utc.timestamp_millis_opt(3 * 60_000).unwrap(),
        );
        let ticks = frame.tick_instants();
        assert_eq!(ticks.len(), 3);
        assert_eq!(ticks[0].timestamp_millis(), 0);
        assert_eq!(ticks[2].timestamp_millis(), 2 * 60_000);
    }

    #[test]
    fn empty_window_yields_no_ticks() {
        let frame = Frame::new("f", Interval::OneMinute, Utc.timestamp_millis_opt(0).unwrap(), Utc.timestamp_millis_opt(0).unwrap());
        assert!(frame.tick_instants().is_empty());
    }
}
