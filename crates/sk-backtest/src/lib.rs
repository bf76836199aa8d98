//! sk-backtest
//!
//! The Backtest Driver (C6): expands a registered [`Frame`][sk_context::Frame]
//! into its tick-instant sequence and drives the Lifecycle Engine across it,
//! timeframe-skipping past resolved signals the way the teacher's
//! `mqk-backtest` engine walks its bar sequence in one pass per run.

mod driver;
mod fast_path;

pub use driver::{run, BacktestReport, BacktestRun};
