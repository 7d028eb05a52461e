//! Walk-forward driver: the outer simulation loop.
//!
//! Each tick settles due trades, checks slot capacity and the regime gate,
//! then scans the eligible instruments in random order for at most
//! `max_trades_per_day` new trades. Every admitted trade is fully resolved
//! at entry and booked later by the ledger. The clock then advances by the
//! configured date step.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::config::{ConfigError, SimulationConfig};
use super::ledger::{LedgerError, PositionLedger};
use super::resolver::{EntryFill, ResolveError, TradeResolver};
use crate::data::BarSeries;
use crate::domain::{Instrument, SettledTrade, TradeIntent};
use crate::indicators::spread;
use crate::strategy::{CapitalContext, RegimeGate, Strategy};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid simulation config: {0}")]
    Config(#[from] ConfigError),
    #[error("ledger invariant violated: {0}")]
    Ledger(#[from] LedgerError),
}

/// Outcome of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub strategy: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub starting_capital: f64,
    pub final_capital: f64,
    pub highest_capital: f64,
    /// Non-positive fraction, e.g. -0.25 for a 25% peak-to-trough decline.
    pub max_drawdown: f64,
    pub trade_count: usize,
    pub win_count: usize,
    /// Trades settled while trading was paused by the risk policy.
    pub discarded_trades: usize,
    /// Booked trades, ascending by exit date.
    pub trades: Vec<SettledTrade>,
}

impl SimulationReport {
    pub fn win_rate(&self) -> f64 {
        if self.trade_count == 0 {
            return 0.0;
        }
        self.win_count as f64 / self.trade_count as f64
    }

    pub fn total_return(&self) -> f64 {
        self.final_capital / self.starting_capital - 1.0
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// True if at least one instrument has a bar dated exactly `date`.
fn is_trading_day(instruments: &[&Instrument], date: NaiveDate) -> bool {
    instruments
        .iter()
        .any(|i| i.bar_on_or_near(date).is_some_and(|b| b.date == date))
}

pub fn run_simulation(
    strategy: &dyn Strategy,
    gate: &dyn RegimeGate,
    instruments: &[Instrument],
    config: &SimulationConfig,
    rng: &mut StdRng,
) -> Result<SimulationReport, SimulationError> {
    config.validate()?;

    let resolver = TradeResolver::new(config.resolver.clone());
    let mut ledger = PositionLedger::new(
        config.starting_capital,
        config.max_pyramid_slots,
        config.risk.clone(),
    );
    let candidates: Vec<&Instrument> = instruments.iter().filter(|i| strategy.is_eligible(i)).collect();

    let mut date = config.start;
    while date < config.end {
        if config.skip_weekends && is_weekend(date) {
            date += Duration::days(1);
            continue;
        }
        if config.skip_closed_days && !is_trading_day(&candidates, date) {
            date += Duration::days(1);
            continue;
        }

        ledger.try_settle(date);

        if ledger.capital() < config.min_capital {
            warn!(
                %date,
                capital = ledger.capital(),
                min_capital = config.min_capital,
                "capital below floor, stopping"
            );
            break;
        }

        if ledger.free_slots() == 0 {
            date += Duration::days(1);
            continue;
        }

        if gate.allows(date) {
            scan(strategy, &resolver, &candidates, &mut ledger, config, date, rng)?;
        }

        date += config.date_step.draw(rng);
    }

    ledger.settle_all();

    let final_capital = ledger.capital();
    let highest_capital = ledger.highest_capital();
    let max_drawdown = ledger.max_drawdown();
    let discarded_trades = ledger.discarded();
    let mut trades = ledger.into_settled();
    trades.sort_by_key(|s| s.trade.exit_date);
    let win_count = trades.iter().filter(|s| s.trade.is_winner).count();

    info!(
        strategy = strategy.name(),
        trades = trades.len(),
        final_capital,
        max_drawdown,
        "simulation finished"
    );

    Ok(SimulationReport {
        strategy: strategy.name().to_string(),
        start: config.start,
        end: config.end,
        starting_capital: config.starting_capital,
        final_capital,
        highest_capital,
        max_drawdown,
        trade_count: trades.len(),
        win_count,
        discarded_trades,
        trades,
    })
}

/// One scanning pass over the shuffled candidates at `date`.
fn scan(
    strategy: &dyn Strategy,
    resolver: &TradeResolver,
    candidates: &[&Instrument],
    ledger: &mut PositionLedger,
    config: &SimulationConfig,
    date: NaiveDate,
    rng: &mut StdRng,
) -> Result<(), SimulationError> {
    let mut order = candidates.to_vec();
    order.shuffle(rng);

    let mut admitted = 0;
    for instrument in order {
        if admitted >= config.max_trades_per_day || ledger.free_slots() == 0 {
            break;
        }
        if ledger.holds(&instrument.symbol) {
            continue;
        }

        let ctx = CapitalContext {
            capital: ledger.capital(),
            sizing_capital: ledger.risk().sizing_capital(),
            risk_capital: ledger.risk().risk_capital(),
            free_slots: ledger.free_slots(),
        };
        let Some(intent) = strategy.evaluate_entry(instrument, date, &ctx, rng) else {
            continue;
        };
        let Some(fill) = size_entry(instrument, &intent, &ctx, config, rng) else {
            debug!(symbol = %intent.symbol, %date, "candidate has no usable stop distance");
            continue;
        };

        match resolver.resolve(instrument, &intent, &fill, rng) {
            Ok(trade) => {
                ledger.admit(trade)?;
                admitted += 1;
            }
            Err(ResolveError::InsufficientForwardData { symbol, as_of }) => {
                warn!(%symbol, %as_of, "no forward bars, candidate discarded");
            }
        }
    }
    Ok(())
}

/// Spread-adjusted entry price and share count for `intent`, or `None` when
/// the stop is at or through the entry.
fn size_entry(
    instrument: &Instrument,
    intent: &TradeIntent,
    ctx: &CapitalContext,
    config: &SimulationConfig,
    rng: &mut StdRng,
) -> Option<EntryFill> {
    let history = instrument.last_n_bars(intent.as_of, config.resolver.spread_window);
    let offset = spread(
        history,
        config.resolver.adverse_spread_probability,
        intent.direction,
        rng,
    );
    let price = intent.reference_price + offset;
    let distance = intent.direction.sign() * (price - intent.stop_loss);
    if !(distance > 0.0) || !(price > 0.0) {
        return None;
    }

    let mut shares = ctx.risk_capital / distance;
    let notional_cap = config.notional_cap_multiple * ctx.sizing_capital;
    if price * shares > notional_cap {
        shares = notional_cap / price;
    }
    if !(shares > 0.0) || !shares.is_finite() {
        return None;
    }

    Some(EntryFill { date: intent.as_of, price, shares, spread: offset })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssetClass, Bar, Direction};
    use crate::engine::config::DateStep;
    use crate::strategy::AlwaysOpen;
    use rand::SeedableRng;

    /// Goes long on every bar with a fixed 10% stop and 10% target.
    struct EveryBar;

    impl Strategy for EveryBar {
        fn name(&self) -> &str {
            "every_bar"
        }

        fn lookback(&self) -> usize {
            1
        }

        fn evaluate_entry(
            &self,
            instrument: &Instrument,
            as_of: NaiveDate,
            _ctx: &CapitalContext,
            _rng: &mut StdRng,
        ) -> Option<TradeIntent> {
            let bar = instrument.bar_on_or_near(as_of)?;
            Some(TradeIntent::new(
                instrument.symbol.clone(),
                Direction::Long,
                as_of,
                bar.close,
                bar.close * 0.9,
                Some(bar.close * 1.1),
            ))
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Daily bars rising 1% per day with zero volume (no spread).
    fn rising(symbol: &str, days: i64) -> Instrument {
        let start = d(2024, 1, 1);
        let bars = (0..days)
            .map(|i| {
                let c = 100.0 * 1.01f64.powi(i as i32);
                Bar::new(start + Duration::days(i), c, c * 1.001, c * 0.999, c, 0.0)
            })
            .collect();
        Instrument::new(symbol, AssetClass::Equity, bars).unwrap()
    }

    fn config() -> SimulationConfig {
        let mut config = SimulationConfig::new(d(2024, 1, 1), d(2024, 3, 1), 10_000.0);
        config.date_step = DateStep::Fixed { days: 1 };
        config.resolver.trailing = None;
        config
    }

    #[test]
    fn weekends_are_skipped() {
        assert!(is_weekend(d(2024, 1, 6)));
        assert!(is_weekend(d(2024, 1, 7)));
        assert!(!is_weekend(d(2024, 1, 8)));
    }

    /// `rising` with the given calendar days removed.
    fn rising_without(symbol: &str, days: i64, closed: &[NaiveDate]) -> Instrument {
        let bars = rising(symbol, days)
            .bars()
            .iter()
            .filter(|b| !closed.contains(&b.date))
            .copied()
            .collect();
        Instrument::new(symbol, AssetClass::Equity, bars).unwrap()
    }

    #[test]
    fn holidays_are_skipped() {
        // Tuesday with no bars anywhere; two symbols so the second entry
        // would land on it.
        let holiday = d(2024, 1, 2);
        let instruments = vec![
            rising_without("AAA", 120, &[holiday]),
            rising_without("BBB", 120, &[holiday]),
        ];
        let refs: Vec<&Instrument> = instruments.iter().collect();
        assert!(!is_trading_day(&refs, holiday));
        assert!(is_trading_day(&refs, d(2024, 1, 3)));

        let mut rng = StdRng::seed_from_u64(1);
        let report = run_simulation(&EveryBar, &AlwaysOpen, &instruments, &config(), &mut rng).unwrap();
        assert!(report.trade_count > 0);
        assert!(report.trades.iter().all(|s| s.trade.entry_date != holiday));

        let mut config = config();
        config.skip_closed_days = false;
        let mut rng = StdRng::seed_from_u64(1);
        let report = run_simulation(&EveryBar, &AlwaysOpen, &instruments, &config, &mut rng).unwrap();
        assert!(report.trades.iter().any(|s| s.trade.entry_date == holiday));
    }

    #[test]
    fn entry_spread_is_recorded() {
        let mut bars: Vec<Bar> = rising("AAA", 120).bars().to_vec();
        for bar in &mut bars {
            bar.volume = 1_000_000.0;
        }
        let instruments = vec![Instrument::new("AAA", AssetClass::Equity, bars).unwrap()];
        let mut rng = StdRng::seed_from_u64(4);
        let report = run_simulation(&EveryBar, &AlwaysOpen, &instruments, &config(), &mut rng).unwrap();
        assert!(report.trade_count > 0);
        for settled in &report.trades {
            let t = &settled.trade;
            let reference = instruments[0].bar_on_or_near(t.entry_date).unwrap().close;
            assert!((t.entry_price - (reference + t.entry_spread)).abs() < 1e-9);
        }
        assert!(report.trades.iter().any(|s| s.trade.entry_spread != 0.0));
    }

    #[test]
    fn rising_market_books_winning_trades() {
        let instruments = vec![rising("AAA", 120), rising("BBB", 120)];
        let mut rng = StdRng::seed_from_u64(1);
        let report = run_simulation(&EveryBar, &AlwaysOpen, &instruments, &config(), &mut rng).unwrap();
        assert!(report.trade_count > 0);
        assert_eq!(report.win_count, report.trade_count);
        assert!(report.final_capital > report.starting_capital);
        assert_eq!(report.max_drawdown, 0.0);
        assert!(report
            .trades
            .windows(2)
            .all(|w| w[0].trade.exit_date <= w[1].trade.exit_date));
    }

    #[test]
    fn closed_gate_produces_no_trades() {
        let instruments = vec![rising("AAA", 120)];
        let gate = |_: NaiveDate| false;
        let mut rng = StdRng::seed_from_u64(1);
        let report = run_simulation(&EveryBar, &gate, &instruments, &config(), &mut rng).unwrap();
        assert_eq!(report.trade_count, 0);
        assert_eq!(report.final_capital, 10_000.0);
    }

    #[test]
    fn one_position_per_symbol() {
        let instruments = vec![rising("AAA", 120)];
        let mut rng = StdRng::seed_from_u64(1);
        let report = run_simulation(&EveryBar, &AlwaysOpen, &instruments, &config(), &mut rng).unwrap();
        for pair in report.trades.windows(2) {
            assert!(pair[1].trade.entry_date >= pair[0].trade.exit_date);
        }
    }

    #[test]
    fn notional_is_capped() {
        let instruments = vec![rising("AAA", 120)];
        let mut config = config();
        // 12% of 10_000 risked over a 10% stop would be 12_000 notional.
        config.notional_cap_multiple = 0.5;
        config.risk.rebaseline_every = Some(1_000);
        let mut rng = StdRng::seed_from_u64(1);
        let report = run_simulation(&EveryBar, &AlwaysOpen, &instruments, &config, &mut rng).unwrap();
        for settled in &report.trades {
            assert!(settled.trade.notional() <= 5_000.0 + 1e-6);
        }
    }

    #[test]
    fn same_seed_same_report() {
        let instruments = vec![rising("AAA", 120), rising("BBB", 120), rising("CCC", 120)];
        let mut config = config();
        config.date_step = DateStep::Uniform { min_days: 1, max_days: 4 };
        let a = run_simulation(
            &EveryBar,
            &AlwaysOpen,
            &instruments,
            &config,
            &mut StdRng::seed_from_u64(9),
        )
        .unwrap();
        let b = run_simulation(
            &EveryBar,
            &AlwaysOpen,
            &instruments,
            &config,
            &mut StdRng::seed_from_u64(9),
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = config();
        config.max_pyramid_slots = 0;
        let err = run_simulation(&EveryBar, &AlwaysOpen, &[], &config, &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, SimulationError::Config(ConfigError::NoSlots)));
    }
}
