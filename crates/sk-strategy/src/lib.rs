//! sk-strategy
//!
//! The user-facing contract (§6): a [`Strategy`] produces [`SignalDraft`][sk_domain::SignalDraft]s
//! under the ambient [`TemporalContext`][sk_context::TemporalContext] and observes lifecycle
//! transitions through optional callbacks. Owns no state of the lifecycle itself — that is
//! `sk-core`'s job.

mod spec;
mod strategy;

pub use spec::StrategySpec;
pub use strategy::Strategy;
