//! sk-runtime
//!
//! The Control Surface and Registry (C9, §6.1): the process-wide home for
//! every registered strategy/exchange/frame/risk and the single entry point
//! (`Control`) that drives `Backtest.run`/`background`, `Live.run`/
//! `background`, `stop`, and `cancel` against them, validating names before
//! a single tick runs the way the teacher's `mqk-daemon` validates a run
//! request against `AppState` before spawning it.

mod control;
mod registry;

pub use control::Control;
pub use registry::Registry;
