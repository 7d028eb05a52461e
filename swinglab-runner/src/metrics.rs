//! Performance metrics: pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: settled trades and/or a capital curve in,
//! scalar out. The capital curve is the starting capital followed by the
//! running capital after each booked trade.

use serde::{Deserialize, Serialize};
use swinglab_core::domain::SettledTrade;
use swinglab_core::engine::SimulationReport;

/// Aggregate performance metrics for a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub trade_count: usize,
    pub avg_risk_reward: f64,
    pub avg_fee: f64,
    pub avg_bars_held: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub avg_losing_streak: f64,
}

impl PerformanceMetrics {
    pub fn compute(report: &SimulationReport) -> Self {
        let curve = capital_curve(report.starting_capital, &report.trades);
        let years = (report.end - report.start).num_days() as f64 / 365.25;
        let trades = &report.trades;
        Self {
            total_return: total_return(&curve),
            cagr: cagr(&curve, years),
            max_drawdown: max_drawdown(&curve),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            trade_count: trades.len(),
            avg_risk_reward: average_risk_reward(trades),
            avg_fee: average_fee(trades),
            avg_bars_held: mean_f64(
                &trades.iter().map(|s| s.trade.bars_held as f64).collect::<Vec<_>>(),
            ),
            max_consecutive_wins: max_consecutive_wins(trades),
            max_consecutive_losses: max_consecutive_losses(trades),
            avg_losing_streak: avg_losing_streak(trades),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Starting capital followed by the capital after each booking.
pub fn capital_curve(starting_capital: f64, trades: &[SettledTrade]) -> Vec<f64> {
    std::iter::once(starting_capital)
        .chain(trades.iter().map(|s| s.capital_after))
        .collect()
}

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(curve: &[f64]) -> f64 {
    let (Some(&initial), Some(&final_cap)) = (curve.first(), curve.last()) else {
        return 0.0;
    };
    if curve.len() < 2 || initial <= 0.0 {
        return 0.0;
    }
    (final_cap - initial) / initial
}

/// Compound annual growth rate over `years` of calendar time.
pub fn cagr(curve: &[f64], years: f64) -> f64 {
    let (Some(&initial), Some(&final_cap)) = (curve.first(), curve.last()) else {
        return 0.0;
    };
    if curve.len() < 2 || initial <= 0.0 || final_cap <= 0.0 || years <= 0.0 {
        return 0.0;
    }
    (final_cap / initial).powf(1.0 / years) - 1.0
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
pub fn max_drawdown(curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &cap in curve {
        peak = peak.max(cap);
        if peak > 0.0 {
            max_dd = max_dd.min(cap / peak - 1.0);
        }
    }
    max_dd
}

pub fn win_rate(trades: &[SettledTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|s| s.trade.is_winner).count();
    winners as f64 / trades.len() as f64
}

/// Gross profits / gross losses, capped at 100.0 when there are no losses.
pub fn profit_factor(trades: &[SettledTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let (profit, loss) = trades.iter().fold((0.0, 0.0), |(p, l), s| {
        let pnl = s.trade.net_pnl;
        if pnl > 0.0 {
            (p + pnl, l)
        } else {
            (p, l - pnl)
        }
    });
    if loss < 1e-10 {
        return if profit > 0.0 { 100.0 } else { 0.0 };
    }
    (profit / loss).min(100.0)
}

/// Mean risk/reward over trades that report one; 0.0 if none do.
pub fn average_risk_reward(trades: &[SettledTrade]) -> f64 {
    let values: Vec<f64> = trades.iter().filter_map(|s| s.trade.risk_reward).collect();
    mean_f64(&values)
}

pub fn average_fee(trades: &[SettledTrade]) -> f64 {
    let fees: Vec<f64> = trades.iter().map(|s| s.trade.fee).collect();
    mean_f64(&fees)
}

pub fn max_consecutive_wins(trades: &[SettledTrade]) -> usize {
    max_consecutive(trades, true)
}

pub fn max_consecutive_losses(trades: &[SettledTrade]) -> usize {
    max_consecutive(trades, false)
}

/// Average length of losing streaks.
pub fn avg_losing_streak(trades: &[SettledTrade]) -> f64 {
    let mut streaks: Vec<f64> = Vec::new();
    let mut current = 0usize;
    for s in trades {
        if !s.trade.is_winner {
            current += 1;
        } else if current > 0 {
            streaks.push(current as f64);
            current = 0;
        }
    }
    if current > 0 {
        streaks.push(current as f64);
    }
    mean_f64(&streaks)
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn max_consecutive(trades: &[SettledTrade], winners: bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;
    for s in trades {
        if s.trade.is_winner == winners {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use swinglab_core::domain::{Direction, ExitReason, ResolvedTrade};

    fn settled(net_pnl: f64, capital_after: f64) -> SettledTrade {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        SettledTrade {
            trade: ResolvedTrade {
                symbol: "AAA".into(),
                direction: Direction::Long,
                entry_date: date,
                entry_price: 100.0,
                exit_date: date,
                exit_price: 100.0 + net_pnl / 10.0,
                shares: 10.0,
                initial_stop: 95.0,
                take_profit: None,
                fee: 1.0,
                entry_spread: 0.0,
                exit_spread: 0.0,
                gross_pnl: net_pnl + 1.0,
                net_pnl,
                risk_reward: (net_pnl > 0.0).then_some(2.0),
                exit_reason: ExitReason::TimeExit,
                is_winner: net_pnl > 0.0,
                bars_held: 4,
            },
            capital_after,
        }
    }

    /// +100, -50, -50, +200 from 1000.
    fn sample() -> Vec<SettledTrade> {
        vec![
            settled(100.0, 1_100.0),
            settled(-50.0, 1_050.0),
            settled(-50.0, 1_000.0),
            settled(200.0, 1_200.0),
        ]
    }

    #[test]
    fn curve_starts_with_starting_capital() {
        let curve = capital_curve(1_000.0, &sample());
        assert_eq!(curve, vec![1_000.0, 1_100.0, 1_050.0, 1_000.0, 1_200.0]);
    }

    #[test]
    fn total_return_and_cagr() {
        let curve = capital_curve(1_000.0, &sample());
        assert!((total_return(&curve) - 0.2).abs() < 1e-12);
        assert!((cagr(&curve, 1.0) - 0.2).abs() < 1e-12);
        assert!((cagr(&curve, 2.0) - (1.2_f64.sqrt() - 1.0)).abs() < 1e-12);
        assert_eq!(cagr(&[1_000.0], 1.0), 0.0);
        assert_eq!(total_return(&[]), 0.0);
    }

    #[test]
    fn max_drawdown_known() {
        let curve = capital_curve(1_000.0, &sample());
        assert!((max_drawdown(&curve) - (1_000.0 / 1_100.0 - 1.0)).abs() < 1e-12);
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn trade_statistics() {
        let trades = sample();
        assert_eq!(win_rate(&trades), 0.5);
        assert!((profit_factor(&trades) - 3.0).abs() < 1e-12);
        assert_eq!(average_risk_reward(&trades), 2.0);
        assert_eq!(average_fee(&trades), 1.0);
        assert_eq!(max_consecutive_wins(&trades), 1);
        assert_eq!(max_consecutive_losses(&trades), 2);
        assert_eq!(avg_losing_streak(&trades), 2.0);
    }

    #[test]
    fn profit_factor_edges() {
        assert_eq!(profit_factor(&[]), 0.0);
        assert_eq!(profit_factor(&[settled(10.0, 1_010.0)]), 100.0);
        assert_eq!(profit_factor(&[settled(-10.0, 990.0)]), 0.0);
    }

    #[test]
    fn empty_trades_are_zero() {
        assert_eq!(win_rate(&[]), 0.0);
        assert_eq!(average_risk_reward(&[]), 0.0);
        assert_eq!(avg_losing_streak(&[]), 0.0);
        assert_eq!(max_consecutive_wins(&[]), 0);
    }

    #[test]
    fn sample_std_dev() {
        assert_eq!(std_dev(&[1.0]), 0.0);
        assert!((std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.138_089_935).abs() < 1e-6);
    }
}
