//! sk-core
//!
//! The Lifecycle Engine (C5): the per-`(strategy, symbol)` state machine
//! that turns a strategy's signal proposals into tracked signals, drives
//! them through `scheduled -> opened -> active -> closed`, and is the only
//! writer of the Signal Store for its slot. Everything here is a pure
//! function of one tick's inputs plus the [`ThrottleState`] the driver
//! (`sk-backtest`/`sk-live`) threads between calls — no ambient clock, no
//! background tasks.

mod config;
mod engine;
mod events;
pub mod partials;
mod pnl;
mod result;

pub use config::LifecycleConfig;
pub use engine::{cancel, tick, TickInputs};
pub use pnl::compute_pnl;
pub use result::{ThrottleState, TickResult};
