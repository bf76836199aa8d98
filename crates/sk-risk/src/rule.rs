use std::sync::Arc;

use sk_domain::RiskContext;

/// A single validation predicate: pass returns `Ok(())`, fail carries the
/// rejection message (§4.4).
pub type Predicate = Arc<dyn Fn(&RiskContext) -> Result<(), String> + Send + Sync>;

type RejectedCallback = Arc<dyn Fn(&RiskContext, &str) + Send + Sync>;
type AllowedCallback = Arc<dyn Fn(&RiskContext) + Send + Sync>;

/// A named, ordered list of validations (§6's Risk registration). `note` is
/// carried through to a `Rejected` outcome verbatim — strategies use it to
/// attach operator-facing context ("max 3 concurrent BTC longs") without it
/// affecting the predicate logic itself. `on_rejected`/`on_allowed` are the
/// user callbacks the evaluator invokes directly — they never touch the main
/// event bus, only `risk-rejected` does that (§4.4).
#[derive(Clone)]
pub struct Risk {
    pub name: String,
    pub note: Option<String>,
    predicates: Vec<Predicate>,
    on_rejected: Option<RejectedCallback>,
    on_allowed: Option<AllowedCallback>,
}

impl Risk {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            note: None,
            predicates: Vec::new(),
            on_rejected: None,
            on_allowed: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_predicate(
        mut self,
        predicate: impl Fn(&RiskContext) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.predicates.push(Arc::new(predicate));
        self
    }

    pub fn with_on_rejected(mut self, callback: impl Fn(&RiskContext, &str) + Send + Sync + 'static) -> Self {
        self.on_rejected = Some(Arc::new(callback));
        self
    }

    pub fn with_on_allowed(mut self, callback: impl Fn(&RiskContext) + Send + Sync + 'static) -> Self {
        self.on_allowed = Some(Arc::new(callback));
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub(crate) fn fire_rejected(&self, ctx: &RiskContext, message: &str) {
        if let Some(callback) = &self.on_rejected {
            callback(ctx, message);
        }
    }

    pub(crate) fn fire_allowed(&self, ctx: &RiskContext) {
        if let Some(callback) = &self.on_allowed {
            callback(ctx);
        }
    }
}

/// The bundled `max_concurrent_positions` validation (§4.4.1): rejects a
/// pending signal once the symbol already holds `n` non-terminal positions.
/// An ordinary `Risk`, not special-cased anywhere in the evaluator.
pub fn max_concurrent_positions(n: usize) -> Risk {
    Risk::new("max_concurrent_positions")
        .with_note(format!("at most {n} concurrent position(s) per symbol"))
        .with_predicate(move |ctx| {
            if ctx.active_position_count >= n {
                Err(format!(
                    "{} already has {} active position(s), limit is {n}",
                    ctx.symbol, ctx.active_position_count
                ))
            } else {
                Ok(())
            }
        })
}

/// The bundled `cooldown_after_close` validation (§4.4.1): rejects a new
/// signal until `minutes` have elapsed since the slot's last close. A slot
/// that has never closed (no `last_closed_at`) always passes.
pub fn cooldown_after_close(minutes: i64) -> Risk {
    Risk::new("cooldown_after_close")
        .with_note(format!("wait {minutes} minute(s) after a close before re-entering"))
        .with_predicate(move |ctx| {
            let Some(last_closed_at) = ctx.last_closed_at else {
                return Ok(());
            };
            let elapsed = ctx.timestamp - last_closed_at;
            if elapsed < chrono::Duration::minutes(minutes) {
                Err(format!(
                    "{} closed {}m ago, cooldown is {minutes}m",
                    ctx.symbol,
                    elapsed.num_minutes()
                ))
            } else {
                Ok(())
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sk_domain::{PortfolioView, Position, SignalDraft};

    fn ctx() -> RiskContext {
        RiskContext::new(
            "BTC",
            "strat",
            "csv",
            Utc.timestamp_opt(0, 0).unwrap(),
            100.0,
            PortfolioView::new(),
            SignalDraft::new(Position::Long, 110.0, 90.0, 60),
        )
    }

    #[test]
    fn max_concurrent_positions_passes_under_limit() {
        let risk = max_concurrent_positions(2);
        assert!(risk.predicates()[0](&ctx()).is_ok());
    }

    #[test]
    fn cooldown_passes_when_never_closed() {
        let risk = cooldown_after_close(30);
        assert!(risk.predicates()[0](&ctx()).is_ok());
    }

    #[test]
    fn cooldown_rejects_inside_window() {
        let risk = cooldown_after_close(30);
        let c = ctx().with_last_closed_at(Utc.timestamp_opt(0, 0).unwrap());
        let c = RiskContext { timestamp: Utc.timestamp_opt(600, 0).unwrap(), ..c };
        assert!(risk.predicates()[0](&c).is_err());
    }

    #[test]
    fn cooldown_allows_after_window() {
        let risk = cooldown_after_close(5);
        let c = ctx().with_last_closed_at(Utc.timestamp_opt(0, 0).unwrap());
        let c = RiskContext { timestamp: Utc.timestamp_opt(600, 0).unwrap(), ..c };
        assert!(risk.predicates()[0](&c).is_ok());
    }
}
