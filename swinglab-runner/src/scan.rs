//! Single-day entry scan: the trades a strategy would open on one date.
//!
//! Uses the same eligibility, regime and history rules as the simulation
//! driver, but evaluates every eligible instrument instead of a capped,
//! shuffled subset. Capital figures come from the run config's starting
//! state.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use tracing::{debug, info};

use swinglab_core::data::BarSeries;
use swinglab_core::domain::{Instrument, TradeIntent};
use swinglab_core::engine::{CapitalContext, RiskController, SimulationConfig};
use swinglab_core::{RegimeGate, Strategy};

/// RNG stream label for scans, separate from Monte Carlo trials.
pub const SCAN_LABEL: &str = "scan";

/// Capital context at the start of a run described by `config`.
pub fn starting_context(config: &SimulationConfig) -> CapitalContext {
    let risk = RiskController::new(config.risk.clone(), config.starting_capital);
    CapitalContext {
        capital: config.starting_capital,
        sizing_capital: risk.sizing_capital(),
        risk_capital: risk.risk_capital(),
        free_slots: config.max_pyramid_slots,
    }
}

/// Every entry `strategy` signals on `date`, in universe order.
///
/// Instruments without a bar dated exactly `date`, or with fewer than
/// `lookback()` bars up to it, are skipped. A closed regime gate yields
/// no trades.
pub fn find_trades(
    strategy: &dyn Strategy,
    gate: &dyn RegimeGate,
    instruments: &[Instrument],
    config: &SimulationConfig,
    date: NaiveDate,
    rng: &mut StdRng,
) -> Vec<TradeIntent> {
    if !gate.allows(date) {
        info!(%date, "regime gate closed, no entries");
        return Vec::new();
    }

    let ctx = starting_context(config);
    let lookback = strategy.lookback().max(1);
    let mut intents = Vec::new();
    for instrument in instruments.iter().filter(|i| strategy.is_eligible(i)) {
        let history = instrument.last_n_bars(date, lookback);
        if history.last().map(|b| b.date) != Some(date) {
            debug!(symbol = %instrument.symbol, %date, "no bar on scan date");
            continue;
        }
        if history.len() < lookback {
            debug!(symbol = %instrument.symbol, bars = history.len(), lookback, "not enough history");
            continue;
        }
        if let Some(intent) = strategy.evaluate_entry(instrument, date, &ctx, rng) {
            intents.push(intent);
        }
    }

    info!(strategy = strategy.name(), %date, found = intents.len(), "entry scan complete");
    intents
}
