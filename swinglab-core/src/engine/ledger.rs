//! Position ledger: pyramiding slots and deferred settlement.
//!
//! A resolved trade occupies a slot from `admit` until the simulation clock
//! reaches its exit date. Only then is its net P&L booked into running
//! capital, in exit-date order (ties in admission order), with the
//! high-water mark and drawdown updated after every booking.
//!
//! Invariant: `in_flight.len() <= max_slots` at all times.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use super::risk::{RiskConfig, RiskController, Settlement};
use crate::domain::{ResolvedTrade, SettledTrade};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("all {max_slots} pyramiding slots are occupied")]
    CapacityExceeded { max_slots: usize },
}

#[derive(Debug, Clone)]
pub struct PositionLedger {
    max_slots: usize,
    /// (admission sequence, trade)
    in_flight: Vec<(u64, ResolvedTrade)>,
    next_seq: u64,
    settled: Vec<SettledTrade>,
    capital: f64,
    highest_capital: f64,
    /// Deepest peak-to-trough decline as a non-positive fraction.
    max_drawdown: f64,
    discarded: usize,
    risk: RiskController,
}

impl PositionLedger {
    pub fn new(starting_capital: f64, max_slots: usize, risk: RiskConfig) -> Self {
        Self {
            max_slots,
            in_flight: Vec::with_capacity(max_slots),
            next_seq: 0,
            settled: Vec::new(),
            capital: starting_capital,
            highest_capital: starting_capital,
            max_drawdown: 0.0,
            discarded: 0,
            risk: RiskController::new(risk, starting_capital),
        }
    }

    pub fn free_slots(&self) -> usize {
        self.max_slots.saturating_sub(self.in_flight.len())
    }

    pub fn in_flight(&self) -> impl Iterator<Item = &ResolvedTrade> {
        self.in_flight.iter().map(|(_, t)| t)
    }

    /// True if `symbol` already occupies a slot.
    pub fn holds(&self, symbol: &str) -> bool {
        self.in_flight.iter().any(|(_, t)| t.symbol == symbol)
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn highest_capital(&self) -> f64 {
        self.highest_capital
    }

    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    pub fn settled(&self) -> &[SettledTrade] {
        &self.settled
    }

    /// Trades settled while the risk controller was paused.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn risk(&self) -> &RiskController {
        &self.risk
    }

    pub fn admit(&mut self, trade: ResolvedTrade) -> Result<(), LedgerError> {
        if self.free_slots() == 0 {
            return Err(LedgerError::CapacityExceeded { max_slots: self.max_slots });
        }
        debug!(
            symbol = %trade.symbol,
            entry = %trade.entry_date,
            exit = %trade.exit_date,
            net_pnl = trade.net_pnl,
            "admitted trade"
        );
        self.in_flight.push((self.next_seq, trade));
        self.next_seq += 1;
        Ok(())
    }

    /// Settle every trade with `exit_date <= current_date`. Returns the
    /// capital delta booked.
    pub fn try_settle(&mut self, current_date: NaiveDate) -> f64 {
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.in_flight)
            .into_iter()
            .partition(|(_, t)| t.exit_date <= current_date);
        self.in_flight = pending;
        self.book_all(due)
    }

    /// Settle everything still in flight, regardless of exit date.
    pub fn settle_all(&mut self) -> f64 {
        let due = std::mem::take(&mut self.in_flight);
        self.book_all(due)
    }

    /// Settled trades, consuming the ledger.
    pub fn into_settled(self) -> Vec<SettledTrade> {
        self.settled
    }

    fn book_all(&mut self, mut due: Vec<(u64, ResolvedTrade)>) -> f64 {
        due.sort_by_key(|(seq, t)| (t.exit_date, *seq));
        due.into_iter().map(|(_, trade)| self.book(trade)).sum()
    }

    fn book(&mut self, trade: ResolvedTrade) -> f64 {
        match self.risk.on_settle(trade.is_winner) {
            Settlement::Discard => {
                debug!(symbol = %trade.symbol, exit = %trade.exit_date, "discarded trade while paused");
                self.discarded += 1;
                0.0
            }
            Settlement::Book => {
                let delta = trade.net_pnl;
                self.capital += delta;
                self.highest_capital = self.highest_capital.max(self.capital);
                let drawdown = self.capital / self.highest_capital - 1.0;
                self.max_drawdown = self.max_drawdown.min(drawdown);
                self.risk.on_booked(self.capital);
                debug!(
                    symbol = %trade.symbol,
                    exit = %trade.exit_date,
                    net_pnl = delta,
                    capital = self.capital,
                    "settled trade"
                );
                self.settled.push(SettledTrade { trade, capital_after: self.capital });
                delta
            }
        }
    }
}
