//! sk-domain
//!
//! The shared data model (§3): candles, the signal lifecycle state machine,
//! the portfolio view, and the kernel-wide error type. Every other crate in
//! the workspace depends on this one for its vocabulary; it depends on
//! nothing but `sk-context` (for `Interval`/`TemporalContext`) and has no
//! engine logic of its own.

mod candle;
mod error;
mod portfolio;
mod signal;

pub use candle::{Candle, UnalignedTimestamp};
pub use error::{KernelError, RegistryKind};
pub use portfolio::{PortfolioKey, PortfolioSource, PortfolioView, RiskContext};
pub use signal::{
    Active, Cancelled, CloseReason, Closed, Opened, PartialLevel, Pnl, Position, Scheduled,
    SignalCore, SignalDraft, TrackedSignal,
};
