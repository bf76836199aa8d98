use chrono::{DateTime, Utc};
use sk_context::Interval;
use sk_domain::{Candle, KernelError};

/// Small, crate-local error type for the adapter boundary. Converts into
/// [`KernelError`] once it crosses into the gateway proper — the pattern
/// every crate in this workspace follows at its seam with `sk-core`.
#[derive(Clone, Debug, PartialEq)]
pub enum GatewayError {
    /// The adapter's response violates the contract it is required to
    /// satisfy (wrong first timestamp, wrong spacing, wrong count, or a
    /// malformed caller request such as `sDate >= eDate`).
    InvariantViolation(String),
    /// A raw fetch was attempted for data at or after `when`.
    Lookahead {
        requested: DateTime<Utc>,
        when: DateTime<Utc>,
    },
    /// The underlying adapter call itself returned an error (network,
    /// parse, whatever the concrete adapter wraps).
    AdapterFailure(String),
}

impl core::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            GatewayError::InvariantViolation(m) => write!(f, "adapter invariant violation: {m}"),
            GatewayError::Lookahead { requested, when } => {
                write!(f, "look-ahead requested: {requested} > {when}")
            }
            GatewayError::AdapterFailure(m) => write!(f, "adapter failure: {m}"),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for KernelError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::InvariantViolation(message) => {
                KernelError::AdapterInvariantViolation { message }
            }
            GatewayError::Lookahead { requested, when } => {
                KernelError::LookaheadRequested { requested, when }
            }
            GatewayError::AdapterFailure(message) => {
                KernelError::AdapterInvariantViolation { message }
            }
        }
    }
}

/// The capability bundle a caller registers under an `exchangeName` (§6).
/// Implementations are user-supplied in production; `sk-market` ships only
/// reference adapters (`CsvExchangeAdapter`) and `sk-testkit` ships the
/// deterministic fixture used by the scenario tests.
///
/// Contract the implementation MUST satisfy: `get_candles` returns exactly
/// `limit` candles whose first timestamp equals the requested `since`
/// (already interval-aligned by the gateway) and whose spacing equals the
/// interval's step. Violating this is a programmer error in the adapter,
/// not a recoverable condition — the gateway turns it into a fatal
/// `AdapterInvariantViolation`.
#[async_trait::async_trait]
pub trait ExchangeAdapter: Send + Sync {
    async fn get_candles(
        &self,
        symbol: &str,
        interval: Interval,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Candle>, GatewayError>;

    fn format_price(&self, symbol: &str, price: f64) -> String {
        let _ = symbol;
        format!("{price:.2}")
    }

    fn format_quantity(&self, symbol: &str, quantity: f64) -> String {
        let _ = symbol;
        format!("{quantity:.6}")
    }

    /// Optional; a depth-`n` order book snapshot. Order routing itself is a
    /// non-goal of the kernel, so nothing in `sk-core` calls this — it
    /// exists only so a strategy can inspect liquidity if it chooses to.
    async fn get_order_book(&self, symbol: &str, depth: usize) -> Option<OrderBook> {
        let _ = (symbol, depth);
        None
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderBookLevel {
    pub price: f64,
    pub quantity: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderBook {
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
}
