//! Trade values: the intent a strategy emits, the resolved outcome, and the
//! settled ledger entry.
//!
//! Each stage is a separate immutable value. A trade moves
//! `TradeIntent -> ResolvedTrade -> SettledTrade` by ownership transfer, so
//! it can never be resolved or settled twice.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1.0 for long, -1.0 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    /// True if `price` is at or through `stop` against this direction.
    pub fn stop_touched(self, low: f64, high: f64, stop: f64) -> bool {
        match self {
            Direction::Long => low <= stop,
            Direction::Short => high >= stop,
        }
    }

    /// True if the favorable extreme reached `target`.
    pub fn target_touched(self, low: f64, high: f64, target: f64) -> bool {
        match self {
            Direction::Long => high >= target,
            Direction::Short => low <= target,
        }
    }

    /// The tighter of two stops (higher for long, lower for short).
    pub fn tighter_stop(self, current: f64, candidate: f64) -> f64 {
        match self {
            Direction::Long => current.max(candidate),
            Direction::Short => current.min(candidate),
        }
    }
}

/// A strategy's request to open a position, computed at the as-of date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub symbol: String,
    pub direction: Direction,
    pub as_of: NaiveDate,
    /// Price the signal was computed against (the as-of close).
    pub reference_price: f64,
    pub stop_loss: f64,
    /// `None` means no fixed target.
    pub take_profit: Option<f64>,
}

impl TradeIntent {
    pub fn new(
        symbol: impl Into<String>,
        direction: Direction,
        as_of: NaiveDate,
        reference_price: f64,
        stop_loss: f64,
        take_profit: Option<f64>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            direction,
            as_of,
            reference_price,
            stop_loss,
            // A zero target historically meant "no target".
            take_profit: take_profit.filter(|t| *t != 0.0),
        }
    }

    /// Distance between the reference price and the stop.
    pub fn stop_distance(&self) -> f64 {
        (self.reference_price - self.stop_loss).abs()
    }
}

/// Why the resolver closed a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Bar opened through the stop.
    GapStop,
    /// Bar opened through a trailed stop after the first target was reached.
    GapTrailingStop,
    /// Bar opened beyond the target.
    GapTarget,
    StopLoss,
    /// Stop breached after it was trailed; a managed exit, not an outright loss.
    TrailingStop,
    Target,
    /// Lookahead window exhausted.
    TimeExit,
}

impl ExitReason {
    pub fn is_gap(self) -> bool {
        matches!(self, Self::GapStop | Self::GapTrailingStop | Self::GapTarget)
    }

    pub fn is_managed(self) -> bool {
        matches!(self, Self::TrailingStop | Self::GapTrailingStop)
    }
}

/// Fully-determined outcome of a triggered trade.
///
/// Computed eagerly at entry time by scanning the forward price path; booked
/// into capital later, when the simulation clock reaches `exit_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTrade {
    pub symbol: String,
    pub direction: Direction,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub shares: f64,
    pub initial_stop: f64,
    pub take_profit: Option<f64>,
    pub fee: f64,
    /// Signed spread offset applied to the entry (`entry_price - reference`).
    #[serde(default)]
    pub entry_spread: f64,
    /// Signed spread offset subtracted from the exit level.
    #[serde(default)]
    pub exit_spread: f64,
    /// Price P&L before fees.
    pub gross_pnl: f64,
    /// `gross_pnl - fee`; the amount booked at settlement.
    pub net_pnl: f64,
    pub risk_reward: Option<f64>,
    pub exit_reason: ExitReason,
    pub is_winner: bool,
    /// Number of forward bars scanned until exit (1 = exited on the next bar).
    pub bars_held: usize,
}

impl ResolvedTrade {
    /// Entry notional.
    pub fn notional(&self) -> f64 {
        self.entry_price * self.shares
    }

    /// Net return as a fraction of entry notional.
    pub fn return_pct(&self) -> f64 {
        let notional = self.notional();
        if notional == 0.0 {
            return 0.0;
        }
        self.net_pnl / notional
    }
}

/// A resolved trade booked into the ledger, with the capital impact attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettledTrade {
    pub trade: ResolvedTrade,
    /// Running capital immediately after this trade was booked.
    pub capital_after: f64,
}
