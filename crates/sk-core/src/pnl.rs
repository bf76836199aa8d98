use sk_domain::{Pnl, Position};

/// PnL on close (§4.5): `gross` is the raw price move in the position's
/// favor, `net` subtracts fees (charged per side, hence `2 *`) and a single
/// slippage hit, `percent` is `net` scaled for display.
pub fn compute_pnl(position: Position, price_open_actual: f64, price_close: f64, fee_percent: f64, slippage_percent: f64) -> Pnl {
    let raw_move = (price_close - price_open_actual) / price_open_actual;
    let gross = match position {
        Position::Long => raw_move,
        Position::Short => -raw_move,
    };
    let fee = fee_percent / 100.0;
    let slippage = slippage_percent / 100.0;
    let net = gross - 2.0 * fee - slippage;
    Pnl {
        percent: net * 100.0,
        gross,
        net,
    }
}
