//! Trade resolver: scans a trade's forward price path once, at entry time,
//! and fixes its exit date, exit price and P&L.
//!
//! Per forward bar, in priority order:
//!
//! 1. Gap check on the open (stop first, then target).
//! 2. Intrabar stop touch, then target touch. Worst case wins when both are
//!    inside the same bar.
//! 3. Trailing-stop update on the close (ratchet: the stop only tightens).
//!
//! If the lookahead runs out the trade is closed at the last bar's close.
//! Every exit price is adjusted by a spread drawn from the trial RNG, so the
//! result is deterministic for a given RNG state.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::config::ConfigError;
use crate::data::BarSeries;
use crate::domain::{Bar, Direction, ExitReason, Instrument, ResolvedTrade, TradeIntent};
use crate::indicators::{atr, fee, spread};

/// ATR trailing stop, armed once price pulls back while still in profit.
///
/// The distance is `atr_multiple` times the Wilder ATR over the last
/// `atr_period + 1` bars (the extra bar supplies the first previous close),
/// and the stop ratchets: a looser candidate never replaces a tighter stop.
/// It is not a plain mean of recent true ranges, so results differ from a
/// trailer that averages the last five ranges and lets the stop loosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailingConfig {
    pub atr_period: usize,
    pub atr_multiple: f64,
}

impl Default for TrailingConfig {
    fn default() -> Self {
        Self { atr_period: 5, atr_multiple: 2.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Maximum forward bars scanned before a time exit.
    pub lookahead: usize,
    pub trailing: Option<TrailingConfig>,
    /// Bars (up to and including the current one) the spread is estimated on.
    pub spread_window: usize,
    /// Probability that a spread draw is adverse. `None` = always adverse.
    pub adverse_spread_probability: Option<f64>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            lookahead: 300,
            trailing: Some(TrailingConfig::default()),
            spread_window: 10,
            adverse_spread_probability: Some(0.55),
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookahead == 0 {
            return Err(ConfigError::Resolver("lookahead must be >= 1".into()));
        }
        if self.spread_window == 0 {
            return Err(ConfigError::Resolver("spread_window must be >= 1".into()));
        }
        if let Some(trailing) = &self.trailing {
            if trailing.atr_period == 0 {
                return Err(ConfigError::Resolver("trailing atr_period must be >= 1".into()));
            }
            if !(trailing.atr_multiple > 0.0) {
                return Err(ConfigError::Resolver(format!(
                    "trailing atr_multiple must be > 0, got {}",
                    trailing.atr_multiple
                )));
            }
        }
        if let Some(p) = self.adverse_spread_probability {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Resolver(format!(
                    "adverse_spread_probability must be in [0, 1], got {p}"
                )));
            }
        }
        Ok(())
    }
}

/// How the position was opened: date, spread-adjusted price and size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryFill {
    pub date: NaiveDate,
    pub price: f64,
    pub shares: f64,
    /// Offset already included in `price`.
    #[serde(default)]
    pub spread: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("no bars after {as_of} for {symbol}")]
    InsufficientForwardData { symbol: String, as_of: NaiveDate },
}

/// Stop/target/trailing state carried across forward bars.
#[derive(Debug, Clone, Copy)]
struct ExitState {
    direction: Direction,
    stop: f64,
    target: Option<f64>,
    reference: f64,
    trailed: bool,
}

impl ExitState {
    fn new(intent: &TradeIntent, entry_price: f64) -> Self {
        Self {
            direction: intent.direction,
            stop: intent.stop_loss,
            target: intent.take_profit,
            reference: entry_price,
            trailed: false,
        }
    }

    /// Exit level and reason if `bar` closes the position.
    fn check(&self, bar: &Bar) -> Option<(f64, ExitReason)> {
        let dir = self.direction;
        let target_hit = |low: f64, high: f64| {
            self.target.filter(|&t| dir.target_touched(low, high, t))
        };

        if dir.stop_touched(bar.open, bar.open, self.stop) {
            let reason = if self.trailed {
                ExitReason::GapTrailingStop
            } else {
                ExitReason::GapStop
            };
            return Some((bar.open, reason));
        }
        if target_hit(bar.open, bar.open).is_some() {
            return Some((bar.open, ExitReason::GapTarget));
        }
        if dir.stop_touched(bar.low, bar.high, self.stop) {
            let reason = if self.trailed {
                ExitReason::TrailingStop
            } else {
                ExitReason::StopLoss
            };
            return Some((self.stop, reason));
        }
        target_hit(bar.low, bar.high).map(|t| (t, ExitReason::Target))
    }

    /// Trail the stop on a pullback close that is still beyond the reference.
    /// `history` ends at the current bar.
    fn trail(&mut self, history: &[Bar], trailing: &TrailingConfig) {
        let [.., prev, bar] = history else {
            return;
        };
        let pulled_back = match self.direction {
            Direction::Long => bar.close < prev.close && bar.close > self.reference,
            Direction::Short => bar.close > prev.close && bar.close < self.reference,
        };
        if !pulled_back {
            return;
        }
        let window = &history[history.len().saturating_sub(trailing.atr_period + 1)..];
        let Ok(atr) = atr(window, trailing.atr_period) else {
            return;
        };
        let candidate = bar.close - self.direction.sign() * trailing.atr_multiple * atr;
        self.reference = bar.close;
        self.stop = self.direction.tighter_stop(self.stop, candidate);
        self.trailed = true;
    }
}

/// Resolves trades against one policy.
#[derive(Debug, Clone, Default)]
pub struct TradeResolver {
    config: ResolverConfig,
}

impl TradeResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn resolve(
        &self,
        instrument: &Instrument,
        intent: &TradeIntent,
        fill: &EntryFill,
        rng: &mut StdRng,
    ) -> Result<ResolvedTrade, ResolveError> {
        let forward = instrument.next_n_bars(intent.as_of, self.config.lookahead);
        if forward.is_empty() {
            return Err(ResolveError::InsufficientForwardData {
                symbol: intent.symbol.clone(),
                as_of: intent.as_of,
            });
        }

        let all = instrument.bars();
        let first = instrument.bars_through(intent.as_of);
        let mut state = ExitState::new(intent, fill.price);
        let mut last_spread = 0.0;

        for (offset, bar) in forward.iter().enumerate() {
            let idx = first + offset;
            let window = &all[(idx + 1).saturating_sub(self.config.spread_window)..=idx];
            last_spread = spread(
                window,
                self.config.adverse_spread_probability,
                intent.direction,
                rng,
            );

            if let Some((level, reason)) = state.check(bar) {
                return Ok(self.build(intent, fill, bar.date, level, last_spread, reason, offset + 1));
            }

            if let Some(trailing) = &self.config.trailing {
                state.trail(&all[..=idx], trailing);
            }
        }

        let last = &forward[forward.len() - 1];
        Ok(self.build(
            intent,
            fill,
            last.date,
            last.close,
            last_spread,
            ExitReason::TimeExit,
            forward.len(),
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        intent: &TradeIntent,
        fill: &EntryFill,
        exit_date: NaiveDate,
        level: f64,
        spread: f64,
        reason: ExitReason,
        bars_held: usize,
    ) -> ResolvedTrade {
        let sign = intent.direction.sign();
        let exit_price = level - spread;
        let gross_pnl = sign * (exit_price - fill.price) * fill.shares;
        let fee = fee(fill.shares, fill.shares * fill.price);
        let net_pnl = gross_pnl - fee;

        ResolvedTrade {
            symbol: intent.symbol.clone(),
            direction: intent.direction,
            entry_date: fill.date,
            entry_price: fill.price,
            exit_date,
            exit_price,
            shares: fill.shares,
            initial_stop: intent.stop_loss,
            take_profit: intent.take_profit,
            fee,
            entry_spread: fill.spread,
            exit_spread: spread,
            gross_pnl,
            net_pnl,
            risk_reward: risk_reward(sign, fill.price, intent.stop_loss, level, reason),
            exit_reason: reason,
            is_winner: net_pnl > 0.0,
            bars_held,
        }
    }
}

/// Reward over initial risk for target exits and for trailed exits that
/// closed beyond the entry.
fn risk_reward(sign: f64, entry: f64, initial_stop: f64, level: f64, reason: ExitReason) -> Option<f64> {
    let qualifies = match reason {
        ExitReason::Target | ExitReason::GapTarget => true,
        ExitReason::TrailingStop | ExitReason::GapTrailingStop => sign * (level - entry) > 0.0,
        _ => false,
    };
    let risk = (entry - initial_stop).abs();
    if !qualifies || risk == 0.0 {
        return None;
    }
    Some((level - entry).abs() / risk)
}

/// Closing-basis replay of the stop and trailing-stop state machine over
/// `bars` (ascending, starting after entry). True if the position should be
/// closed as of the last bar.
pub fn should_exit(
    intent: &TradeIntent,
    entry_price: f64,
    bars: &[Bar],
    trailing: Option<&TrailingConfig>,
) -> bool {
    let mut state = ExitState::new(intent, entry_price);
    for (i, bar) in bars.iter().enumerate() {
        let close = bar.close;
        if state.direction.stop_touched(close, close, state.stop) {
            return true;
        }
        if state
            .target
            .is_some_and(|t| state.direction.target_touched(close, close, t))
        {
            return true;
        }
        if let Some(trailing) = trailing {
            state.trail(&bars[..=i], trailing);
        }
    }
    false
}
