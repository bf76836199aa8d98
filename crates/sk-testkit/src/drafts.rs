use sk_domain::{Position, SignalDraft};

/// `{long, priceOpen:42000, priceTakeProfit:43000, priceStopLoss:41000,
/// minuteEstimatedTime:60}` — S1.
pub fn long_take_profit_draft() -> SignalDraft {
    SignalDraft::new(Position::Long, 43000.0, 41000.0, 60).with_price_open(42000.0)
}

/// `{short, priceOpen:42000, priceTakeProfit:40000, priceStopLoss:44000,
/// minuteEstimatedTime:30}` — S2.
pub fn short_stop_loss_draft() -> SignalDraft {
    SignalDraft::new(Position::Short, 40000.0, 44000.0, 30).with_price_open(42000.0)
}

/// Never leaves `[41500, 42500]`; `minuteEstimatedTime:5` — S3.
pub fn time_expired_draft() -> SignalDraft {
    SignalDraft::new(Position::Long, 50000.0, 30000.0, 5).with_price_open(42000.0)
}
