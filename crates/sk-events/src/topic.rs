/// The fixed topic taxonomy (§4.8). Every [`EventEnvelope`][crate::EventEnvelope]
/// belongs to exactly one topic, derived from its body.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    Signal,
    SignalBacktest,
    SignalLive,
    RiskRejected,
    PartialProfit,
    PartialLoss,
    Breakeven,
    ScheduledPing,
    ActivePing,
    ProgressBacktest,
    DoneBacktest,
    DoneLive,
    Error,
    Exit,
}
