//! sk-risk
//!
//! The Risk Validator (C4): an ordered list of named predicate sets run
//! against a [`RiskContext`][sk_domain::RiskContext] in declaration order,
//! stopping at the first failure. Contains no state of its own — every
//! `Risk` is a pure function of the context it's handed, grounded in the
//! teacher's `mqk-risk` evaluator's "first failing guard wins" shape, traded
//! down from a single sticky state machine to a stateless ordered list since
//! this kernel's risk sets are per-tick, not per-session.

mod evaluate;
mod rule;

pub use evaluate::{evaluate, RiskOutcome};
pub use rule::{cooldown_after_close, max_concurrent_positions, Predicate, Risk};
