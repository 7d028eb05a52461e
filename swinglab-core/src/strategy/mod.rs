//! Strategy capability: the signal provider the driver is generic over.
//!
//! A strategy sees one instrument's history up to the as-of date and answers
//! "open a trade here?" with a [`TradeIntent`]. It never sees the ledger,
//! only a read-only [`CapitalContext`] snapshot. Strategies are shared
//! immutably across Monte Carlo trials, so they must be `Send + Sync`; any
//! randomness they need comes from the trial RNG passed in.

pub mod choppiness_trend;
pub mod gate;
pub mod zscore_reversion;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Instrument, TradeIntent};
use crate::engine::resolver::{should_exit, TrailingConfig};

pub use choppiness_trend::{ChoppinessTrend, ChoppinessTrendParams};
pub use gate::{AlwaysOpen, RegimeGate, SmaTrendGate};
pub use zscore_reversion::{ZScoreReversion, ZScoreReversionParams};

/// Capital snapshot handed to a strategy at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapitalContext {
    /// Running capital after all settlements so far.
    pub capital: f64,
    /// Capital base used for sizing (refreshed on re-baselining).
    pub sizing_capital: f64,
    /// `risk_fraction * sizing_capital`.
    pub risk_capital: f64,
    pub free_slots: usize,
}

/// An open position as seen by an exit check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub intent: TradeIntent,
    pub entry_price: f64,
}

pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Bars of history requested per evaluation.
    fn lookback(&self) -> usize;

    /// Static filter applied before any evaluation. Index and forex
    /// instruments are excluded by default.
    fn is_eligible(&self, instrument: &Instrument) -> bool {
        !instrument.is_index() && !instrument.is_forex()
    }

    /// Entry signal at `as_of`. Must only read bars dated `<= as_of`.
    fn evaluate_entry(
        &self,
        instrument: &Instrument,
        as_of: NaiveDate,
        ctx: &CapitalContext,
        rng: &mut StdRng,
    ) -> Option<TradeIntent>;

    /// Advisory exit check over bars since entry. Defaults to the stop and
    /// ATR trailing-stop state machine the resolver uses.
    fn evaluate_exit(&self, position: &OpenPosition, bars: &[Bar]) -> bool {
        should_exit(
            &position.intent,
            position.entry_price,
            bars,
            Some(&TrailingConfig::default()),
        )
    }
}
