use sk_domain::{CloseReason, PartialLevel, Position};

use crate::config::LifecycleConfig;

/// Progress toward the TP and SL targets, each as a percent of the distance
/// from `price_open_actual` (0 = at open, 100 = target reached, negative or
/// >100 both legal — VWAP can overshoot or sit on the wrong side).
pub struct Progress {
    pub to_take_profit: f64,
    pub to_stop_loss: f64,
}

pub fn progress(position: Position, price_open_actual: f64, take_profit: f64, stop_loss: f64, current_price: f64) -> Progress {
    match position {
        Position::Long => {
            let tp_distance = take_profit - price_open_actual;
            let sl_distance = price_open_actual - stop_loss;
            Progress {
                to_take_profit: (current_price - price_open_actual) / tp_distance * 100.0,
                to_stop_loss: (price_open_actual - current_price) / sl_distance * 100.0,
            }
        }
        Position::Short => {
            let tp_distance = price_open_actual - take_profit;
            let sl_distance = stop_loss - price_open_actual;
            Progress {
                to_take_profit: (price_open_actual - current_price) / tp_distance * 100.0,
                to_stop_loss: (current_price - price_open_actual) / sl_distance * 100.0,
            }
        }
    }
}

/// Whether TP or SL has been reached this tick. Stop-loss wins ties (§4.5:
/// "use stop_loss (pessimistic)").
pub fn terminal_reason(progress: &Progress) -> Option<CloseReason> {
    let sl_hit = progress.to_stop_loss >= 100.0;
    let tp_hit = progress.to_take_profit >= 100.0;
    if sl_hit {
        Some(CloseReason::StopLoss)
    } else if tp_hit {
        Some(CloseReason::TakeProfit)
    } else {
        None
    }
}

/// Returns the milestones newly crossed this tick (not yet in `already_hit`),
/// in ascending threshold order, paired with whether they're profit- or
/// loss-side (§4.5 step 6). Milestones never close the position.
pub fn newly_hit_milestones(
    progress: &Progress,
    already_hit: &std::collections::BTreeSet<PartialLevel>,
    config: &LifecycleConfig,
) -> Vec<(PartialLevel, bool)> {
    let candidates = [
        (PartialLevel::TpLevel1, config.tp_level1_percent, progress.to_take_profit, true),
        (PartialLevel::TpLevel2, config.tp_level2_percent, progress.to_take_profit, true),
        (PartialLevel::TpLevel3, config.tp_level3_percent, progress.to_take_profit, true),
        (PartialLevel::SlLevel1, config.sl_level1_percent, progress.to_stop_loss, false),
        (PartialLevel::SlLevel2, config.sl_level2_percent, progress.to_stop_loss, false),
    ];

    candidates
        .into_iter()
        .filter(|(level, threshold, observed, _)| !already_hit.contains(level) && *observed >= *threshold)
        .map(|(level, _, _, is_profit)| (level, is_profit))
        .collect()
}

/// Whether the one-shot breakeven event should fire this tick (§4.5 step 7).
pub fn breakeven_due(progress: &Progress, already_applied: bool, config: &LifecycleConfig) -> bool {
    !already_applied && progress.to_take_profit >= config.breakeven_trigger_percent
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn long_progress_is_zero_at_open() {
        let p = progress(Position::Long, 100.0, 110.0, 90.0, 100.0);
        assert!((p.to_take_profit).abs() < 1e-9);
        assert!((p.to_stop_loss).abs() < 1e-9);
    }

    #[test]
    fn long_stop_loss_wins_tie() {
        let p = progress(Position::Long, 100.0, 110.0, 90.0, 90.0);
        assert_eq!(terminal_reason(&p), Some(CloseReason::StopLoss));
    }

    #[test]
    fn long_take_profit_reached() {
        let p = progress(Position::Long, 100.0, 110.0, 90.0, 110.0);
        assert_eq!(terminal_reason(&p), Some(CloseReason::TakeProfit));
    }

    #[test]
    fn milestones_fire_once_each() {
        let config = LifecycleConfig::default();
        let p = progress(Position::Long, 100.0, 110.0, 90.0, 103.5);
        let hit = newly_hit_milestones(&p, &BTreeSet::new(), &config);
        assert_eq!(hit, vec![(PartialLevel::TpLevel1, true)]);

        let mut already = BTreeSet::new();
        already.insert(PartialLevel::TpLevel1);
        let hit_again = newly_hit_milestones(&p, &already, &config);
        assert!(hit_again.is_empty());
    }

    #[test]
    fn breakeven_fires_at_default_threshold() {
        let config = LifecycleConfig::default();
        let p = progress(Position::Long, 100.0, 110.0, 90.0, 103.0);
        assert!(breakeven_due(&p, false, &config));
        assert!(!breakeven_due(&p, true, &config));
    }
}
