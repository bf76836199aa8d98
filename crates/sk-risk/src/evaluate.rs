use sk_domain::RiskContext;

use crate::rule::Risk;

/// Result of running a risk set against a pending signal (§4.4).
#[derive(Clone, Debug, PartialEq)]
pub enum RiskOutcome {
    Allowed,
    Rejected {
        risk_name: String,
        note: Option<String>,
        message: String,
        failed_predicate_index: usize,
    },
}

impl RiskOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RiskOutcome::Allowed)
    }
}

/// Runs every validation across every risk in `risks`, in order, across all
/// risks in the strategy's set; the first failure stops execution. `risks`
/// must already be the merged, ordered list (`riskName` first, then each
/// entry of `riskList` in declaration order) — merging registered risk names
/// into this slice is the caller's job (`sk-runtime`'s Registry resolves
/// names; this crate only evaluates).
pub fn evaluate(risks: &[&Risk], ctx: &RiskContext) -> RiskOutcome {
    for risk in risks {
        for (index, predicate) in risk.predicates().iter().enumerate() {
            if let Err(message) = predicate(ctx) {
                tracing::debug!(risk = %risk.name, index, %message, "risk validation rejected signal");
                risk.fire_rejected(ctx, &message);
                return RiskOutcome::Rejected {
                    risk_name: risk.name.clone(),
                    note: risk.note.clone(),
                    message,
                    failed_predicate_index: index,
                };
            }
        }
    }
    for risk in risks {
        risk.fire_allowed(ctx);
    }
    RiskOutcome::Allowed
}
