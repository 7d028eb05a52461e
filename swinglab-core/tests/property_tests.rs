//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Slot bound: the ledger never holds more than `max_slots` trades
//! 2. Conservation: booked capital == start + sum of booked net P&L
//! 3. Drawdown replay: the ledger's drawdown matches a replay of its bookings
//! 4. Risk bounds: streak scaling keeps the fraction within [min_risk, max_risk]
//! 5. Trailing ratchet: the resolver never exits a long below its initial stop
//! 6. Indicator ranges: RSI in [0, 100], SMA within the window's extremes

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use swinglab_core::domain::{
    AssetClass, Bar, Direction, ExitReason, Instrument, ResolvedTrade, TradeIntent,
};
use swinglab_core::engine::{
    EntryFill, PositionLedger, ResolverConfig, RiskConfig, RiskController, RiskPolicy,
    TradeResolver,
};
use swinglab_core::indicators::{rsi, sma};

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
}

fn trade(symbol: String, entry: i64, hold: i64, net_pnl: f64) -> ResolvedTrade {
    ResolvedTrade {
        symbol,
        direction: Direction::Long,
        entry_date: day(entry),
        entry_price: 10.0,
        exit_date: day(entry + hold),
        exit_price: 10.0,
        shares: 1.0,
        initial_stop: 9.0,
        take_profit: None,
        fee: 0.0,
        entry_spread: 0.0,
        exit_spread: 0.0,
        gross_pnl: net_pnl,
        net_pnl,
        risk_reward: None,
        exit_reason: ExitReason::TimeExit,
        is_winner: net_pnl > 0.0,
        bars_held: hold as usize,
    }
}

// ── Strategies (proptest) ────────────────────────────────────────────

/// (holding period in days, net P&L) per candidate trade.
fn arb_trades() -> impl Strategy<Value = Vec<(i64, f64)>> {
    prop::collection::vec((1i64..30, -200.0..200.0_f64), 1..80)
}

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..500.0_f64, 15..60)
}

// ── 1-3. Ledger invariants ───────────────────────────────────────────

proptest! {
    /// Walk a clock forward one day at a time, admitting one candidate per
    /// day while slots are free. Check every invariant at every step.
    #[test]
    fn ledger_invariants_hold(
        slots in 1usize..6,
        candidates in arb_trades(),
    ) {
        let start = 100_000.0;
        let mut ledger = PositionLedger::new(start, slots, RiskConfig::default());
        let mut booked_net = 0.0;
        let mut pending = candidates.into_iter().enumerate();

        for today in 0..400i64 {
            booked_net += ledger.try_settle(day(today));
            prop_assert!(ledger.in_flight().count() <= slots);

            if ledger.free_slots() > 0 {
                if let Some((i, (hold, pnl))) = pending.next() {
                    ledger.admit(trade(format!("S{i}"), today, hold, pnl)).unwrap();
                }
            }
            prop_assert!(ledger.in_flight().count() <= slots);
            prop_assert!(ledger.in_flight().all(|t| t.exit_date > day(today)));
        }
        booked_net += ledger.settle_all();

        prop_assert!((ledger.capital() - (start + booked_net)).abs() < 1e-6);

        let mut capital = start;
        let mut highest = start;
        let mut max_dd = 0.0_f64;
        for settled in ledger.settled() {
            capital += settled.trade.net_pnl;
            prop_assert!((settled.capital_after - capital).abs() < 1e-6);
            highest = highest.max(capital);
            max_dd = max_dd.min(capital / highest - 1.0);
        }
        prop_assert!((ledger.highest_capital() - highest).abs() < 1e-6);
        prop_assert!((ledger.max_drawdown() - max_dd).abs() < 1e-9);
        prop_assert!(ledger.max_drawdown() <= 0.0);
    }

    /// Settlement order is by exit date regardless of admission order.
    #[test]
    fn settlement_is_exit_date_ordered(candidates in arb_trades()) {
        let mut ledger = PositionLedger::new(10_000.0, candidates.len(), RiskConfig::default());
        for (i, (hold, pnl)) in candidates.iter().enumerate() {
            ledger.admit(trade(format!("S{i}"), 0, *hold, *pnl)).unwrap();
        }
        ledger.settle_all();
        let exits: Vec<NaiveDate> = ledger.settled().iter().map(|s| s.trade.exit_date).collect();
        prop_assert!(exits.windows(2).all(|w| w[0] <= w[1]));
    }
}

// ── 4. Risk bounds ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn streak_scaling_stays_in_bounds(
        outcomes in prop::collection::vec(any::<bool>(), 1..200),
        step in 0.001..0.1_f64,
    ) {
        let (min_risk, max_risk) = (0.02, 0.25);
        let mut risk = RiskController::new(
            RiskConfig {
                base_fraction: 0.12,
                policy: RiskPolicy::StreakScaling {
                    min_win_streak: 3,
                    min_loss_streak: 2,
                    step,
                    min_risk,
                    max_risk,
                },
                rebaseline_every: None,
            },
            1_000.0,
        );
        for win in outcomes {
            risk.on_settle(win);
            prop_assert!(risk.fraction() >= min_risk - 1e-12);
            prop_assert!(risk.fraction() <= max_risk + 1e-12);
            prop_assert!(risk.win_streak() == 0 || risk.loss_streak() == 0);
        }
    }
}

// ── 5. Trailing ratchet ──────────────────────────────────────────────

proptest! {
    /// Without gaps through the stop, a long never exits below its initial
    /// stop: the trail only ever tightens it.
    #[test]
    fn long_exit_never_below_initial_stop(
        moves in prop::collection::vec(-0.02..0.03_f64, 5..120),
    ) {
        let mut close = 100.0;
        let mut bars = vec![Bar::new(day(0), close, close, close, close, 0.0)];
        for (i, m) in moves.iter().enumerate() {
            let open = close;
            close *= 1.0 + m;
            bars.push(Bar::new(
                day(i as i64 + 1),
                open,
                open.max(close),
                open.min(close),
                close,
                0.0,
            ));
        }
        let instrument = Instrument::new("PROP", AssetClass::Equity, bars).unwrap();
        let intent = TradeIntent::new("PROP", Direction::Long, day(0), 100.0, 80.0, None);
        let fill = EntryFill { date: day(0), price: 100.0, shares: 10.0, spread: 0.0 };
        let mut rng = StdRng::seed_from_u64(0);
        let trade = TradeResolver::new(ResolverConfig::default())
            .resolve(&instrument, &intent, &fill, &mut rng)
            .unwrap();
        if !trade.exit_reason.is_gap() {
            prop_assert!(trade.exit_price >= 80.0 - 1e-9);
        }
        prop_assert!(trade.exit_date > trade.entry_date);
    }
}

// ── 6. Indicator ranges ──────────────────────────────────────────────

fn bars_from(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::new(day(i as i64), c, c, c, c, 1_000.0))
        .collect()
}

proptest! {
    #[test]
    fn rsi_is_bounded(closes in arb_closes()) {
        let value = rsi(&bars_from(&closes), 14).unwrap();
        prop_assert!((0.0..=100.0).contains(&value));
    }

    #[test]
    fn sma_lies_within_window(closes in arb_closes(), period in 1usize..15) {
        let value = sma(&closes, period).unwrap();
        let window = &closes[closes.len() - period..];
        let lo = window.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = window.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(value >= lo - 1e-9 && value <= hi + 1e-9);
    }
}
