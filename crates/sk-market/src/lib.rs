//! sk-market
//!
//! The Exchange Gateway (C2). Wraps a user-supplied [`ExchangeAdapter`],
//! aligning and validating timestamps so that every candle a strategy sees
//! satisfies the no-look-ahead invariant, and computes VWAP. Persistence,
//! risk, and the lifecycle state machine live in sibling crates; this crate
//! knows nothing about any of them.

mod adapter;
mod csv_adapter;
mod gateway;

pub use adapter::{ExchangeAdapter, GatewayError, OrderBook, OrderBookLevel};
pub use csv_adapter::CsvExchangeAdapter;
pub use gateway::{Market, MarketConfig};
