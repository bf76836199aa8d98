use chrono::{DateTime, Utc};
use sk_context::Mode;
use sk_domain::{PartialLevel, TrackedSignal};

use crate::topic::Topic;

/// Topic-specific payload (§4.5, §4.8). Every variant maps to exactly one
/// [`Topic`] via [`EventBody::topic`].
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "topic", rename_all = "kebab-case")]
pub enum EventBody {
    Signal { signal: TrackedSignal },
    SignalBacktest { signal: TrackedSignal },
    SignalLive { signal: TrackedSignal },
    RiskRejected {
        risk_name: String,
        note: Option<String>,
        message: String,
        failed_predicate_index: usize,
    },
    PartialProfit { level: PartialLevel, price: f64 },
    PartialLoss { level: PartialLevel, price: f64 },
    Breakeven,
    ScheduledPing,
    ActivePing,
    ProgressBacktest { processed: usize, total: usize, percent: f64 },
    DoneBacktest { closed: usize, cancelled: usize, error: Option<String> },
    DoneLive { reason: String },
    Error { message: String },
    Exit,
}

impl EventBody {
    pub fn topic(&self) -> Topic {
        match self {
            EventBody::Signal { .. } => Topic::Signal,
            EventBody::SignalBacktest { .. } => Topic::SignalBacktest,
            EventBody::SignalLive { .. } => Topic::SignalLive,
            EventBody::RiskRejected { .. } => Topic::RiskRejected,
            EventBody::PartialProfit { .. } => Topic::PartialProfit,
            EventBody::PartialLoss { .. } => Topic::PartialLoss,
            EventBody::Breakeven => Topic::Breakeven,
            EventBody::ScheduledPing => Topic::ScheduledPing,
            EventBody::ActivePing => Topic::ActivePing,
            EventBody::ProgressBacktest { .. } => Topic::ProgressBacktest,
            EventBody::DoneBacktest { .. } => Topic::DoneBacktest,
            EventBody::DoneLive { .. } => Topic::DoneLive,
            EventBody::Error { .. } => Topic::Error,
            EventBody::Exit => Topic::Exit,
        }
    }
}

/// The envelope every event carries on the wire (§6): common addressing
/// fields plus the topic-specific body.
#[derive(Clone, Debug, serde::Serialize)]
pub struct EventEnvelope {
    pub symbol: String,
    pub strategy_name: String,
    pub exchange_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub mode: Mode,
    pub body: EventBody,
}

impl EventEnvelope {
    pub fn new(
        symbol: impl Into<String>,
        strategy_name: impl Into<String>,
        exchange_name: impl Into<String>,
        timestamp: DateTime<Utc>,
        mode: Mode,
        body: EventBody,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            strategy_name: strategy_name.into(),
            exchange_name: exchange_name.into(),
            frame_name: None,
            timestamp,
            mode,
            body,
        }
    }

    pub fn with_frame_name(mut self, frame_name: impl Into<String>) -> Self {
        self.frame_name = Some(frame_name.into());
        self
    }

    pub fn topic(&self) -> Topic {
        self.body.topic()
    }

    /// Builds the isolated `error` envelope a subscriber failure is funnelled
    /// into (§4.8), addressed identically to the event that triggered it.
    pub fn error_for(&self, message: impl Into<String>) -> Self {
        Self {
            body: EventBody::Error { message: message.into() },
            ..self.clone()
        }
    }
}
