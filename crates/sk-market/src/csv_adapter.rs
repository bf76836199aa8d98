use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use sk_context::Interval;
use sk_domain::Candle;

use crate::adapter::{ExchangeAdapter, GatewayError};

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    timestamp_ms: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// A reference `ExchangeAdapter` reading OHLCV rows from `<dir>/<symbol>_<interval>.csv`,
/// for offline backtests. Grounded in the teacher's CSV ingest/normalizer
/// pipeline but trimmed to the read path only — there is no DB ingest step
/// and no provider-bar reconciliation here, since those are reporting/ingest
/// concerns the core doesn't own (§1).
///
/// All files are loaded and sorted by timestamp once, at construction; a
/// live deployment supplies its own network-backed adapter instead.
pub struct CsvExchangeAdapter {
    series: HashMap<(String, Interval), Vec<Candle>>,
}

impl CsvExchangeAdapter {
    pub fn load_dir(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let mut series = HashMap::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let (symbol, interval) = parse_filename(&path)?;
            let candles = load_csv(&path, interval)?;
            series.insert((symbol, interval), candles);
        }
        Ok(Self { series })
    }

    pub fn from_candles(symbol: impl Into<String>, interval: Interval, mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.timestamp);
        let mut series = HashMap::new();
        series.insert((symbol.into(), interval), candles);
        Self { series }
    }
}

fn parse_filename(path: &Path) -> anyhow::Result<(String, Interval)> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("unreadable csv filename: {}", path.display()))?;
    let (symbol, interval_str) = stem
        .rsplit_once('_')
        .ok_or_else(|| anyhow::anyhow!("expected <symbol>_<interval>.csv, got {stem}"))?;
    let interval = parse_interval(interval_str)
        .ok_or_else(|| anyhow::anyhow!("unknown interval token: {interval_str}"))?;
    Ok((symbol.to_string(), interval))
}

fn parse_interval(s: &str) -> Option<Interval> {
    Some(match s {
        "1m" => Interval::OneMinute,
        "3m" => Interval::ThreeMinutes,
        "5m" => Interval::FiveMinutes,
        "15m" => Interval::FifteenMinutes,
        "30m" => Interval::ThirtyMinutes,
        "1h" => Interval::OneHour,
        "4h" => Interval::FourHours,
        "1d" => Interval::OneDay,
        _ => return None,
    })
}

fn load_csv(path: &PathBuf, interval: Interval) -> anyhow::Result<Vec<Candle>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        let row = row?;
        let ts = Utc
            .timestamp_millis_opt(row.timestamp_ms)
            .single()
            .ok_or_else(|| anyhow::anyhow!("invalid timestamp_ms in {}", path.display()))?;
        out.push(Candle::new(interval, ts, row.open, row.high, row.low, row.close, row.volume)?);
    }
    out.sort_by_key(|c| c.timestamp);
    Ok(out)
}

#[async_trait::async_trait]
impl ExchangeAdapter for CsvExchangeAdapter {
    async fn get_candles(
        &self,
        symbol: &str,
        interval: Interval,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Candle>, GatewayError> {
        let series = self.series.get(&(symbol.to_string(), interval)).ok_or_else(|| {
            GatewayError::AdapterFailure(format!("no csv series loaded for {symbol} {interval:?}"))
        })?;

        let start = series
            .iter()
            .position(|c| c.timestamp >= since)
            .ok_or_else(|| {
                GatewayError::AdapterFailure(format!(
                    "csv series for {symbol} has no data at or after {since}"
                ))
            })?;

        let slice = &series[start..];
        if slice.len() < limit {
            return Err(GatewayError::AdapterFailure(format!(
                "csv series for {symbol} has only {} candles from {since}, need {limit}",
                slice.len()
            )));
        }
        Ok(slice[..limit].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(interval: Interval, ms: i64, close: f64) -> Candle {
        let ts = Utc.timestamp_millis_opt(ms).unwrap();
        Candle::new(interval, ts, close, close, close, close, 1.0).unwrap()
    }

    #[tokio::test]
    async fn serves_slice_starting_at_or_after_since() {
        let interval = Interval::OneMinute;
        let candles = (0..10).map(|i| candle(interval, i * interval.step_ms(), i as f64)).collect();
        let adapter = CsvExchangeAdapter::from_candles("BTC", interval, candles);
        let since = Utc.timestamp_millis_opt(3 * interval.step_ms()).unwrap();
        let out = adapter.get_candles("BTC", interval, since, 4).await.unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].timestamp, since);
    }
}
