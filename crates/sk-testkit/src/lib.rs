//! sk-testkit
//!
//! Deterministic fixtures for the scenarios in §8: a candle feed an
//! observer can plant spikes into, an in-memory persistence adapter, an
//! event recorder, and canned `SignalDraft`s for S1–S6 — grounded in the
//! teacher's `mqk-testkit` fake-broker-and-recovery-harness approach, traded
//! down from broker/order fakes to exchange/persistence fakes since this
//! kernel has no execution layer of its own.

mod drafts;
mod fixture_exchange;
mod memory_adapter;
mod recording_bus;
mod strategy;

pub use drafts::{long_take_profit_draft, short_stop_loss_draft, time_expired_draft};
pub use fixture_exchange::FixtureExchangeAdapter;
pub use memory_adapter::MemoryPersistenceAdapter;
pub use recording_bus::RecordingSubscriber;
pub use strategy::{FixedDraftStrategy, NoSignalStrategy, RepeatingDraftStrategy};
