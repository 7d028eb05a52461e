//! Choppiness trend-follower.
//!
//! Enters in the direction of a strong, non-choppy move: price on the right
//! side of EMA(50), RSI stretched in the same direction, Choppiness Index
//! below the threshold, a candle body agreeing with the move and a daily ATR
//! small relative to price. The stop is a fixed fraction away from the close
//! and the target mirrors the stop distance times `reward_multiple`.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{CapitalContext, OpenPosition, Strategy};
use crate::data::BarSeries;
use crate::domain::{Bar, Direction, Instrument, TradeIntent};
use crate::engine::resolver::{should_exit, TrailingConfig};
use crate::indicators::{atr, choppiness_index, closes, ema, rsi};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoppinessTrendParams {
    pub lookback: usize,
    pub min_bars: usize,
    pub min_volume: f64,
    pub ema_period: usize,
    pub rsi_period: usize,
    pub chop_period: usize,
    pub atr_period: usize,
    pub long_rsi_above: f64,
    pub short_rsi_below: f64,
    pub chop_below: f64,
    /// Choppiness above which an open position is abandoned.
    pub chop_exit: f64,
    pub max_atr_fraction: f64,
    pub long_stop_fraction: f64,
    pub short_stop_fraction: f64,
    pub reward_multiple: f64,
    pub allow_short: bool,
}

impl Default for ChoppinessTrendParams {
    fn default() -> Self {
        Self {
            lookback: 720,
            min_bars: 200,
            min_volume: 500_000.0,
            ema_period: 50,
            rsi_period: 14,
            chop_period: 14,
            atr_period: 14,
            long_rsi_above: 65.0,
            short_rsi_below: 35.0,
            chop_below: 30.0,
            chop_exit: 62.0,
            max_atr_fraction: 0.05,
            long_stop_fraction: 0.9,
            short_stop_fraction: 1.12,
            reward_multiple: 1.0,
            allow_short: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChoppinessTrend {
    params: ChoppinessTrendParams,
}

impl ChoppinessTrend {
    pub fn new(params: ChoppinessTrendParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ChoppinessTrendParams {
        &self.params
    }

    fn direction(&self, window: &[Bar]) -> Option<Direction> {
        let p = &self.params;
        let last = window.last()?;
        let rsi = rsi(window, p.rsi_period).ok()?;
        let chop = choppiness_index(window, p.chop_period).ok()?;
        let ema = ema(&closes(window), p.ema_period).ok()?;
        let atr = atr(window, p.atr_period).ok()?;

        if chop >= p.chop_below || atr >= p.max_atr_fraction * last.close {
            return None;
        }
        if last.close > ema && rsi > p.long_rsi_above && last.close > last.open {
            return Some(Direction::Long);
        }
        if p.allow_short && last.close < ema && rsi < p.short_rsi_below && last.close < last.open
        {
            return Some(Direction::Short);
        }
        None
    }
}

impl Strategy for ChoppinessTrend {
    fn name(&self) -> &str {
        "choppiness_trend"
    }

    fn lookback(&self) -> usize {
        self.params.lookback
    }

    fn evaluate_entry(
        &self,
        instrument: &Instrument,
        as_of: NaiveDate,
        _ctx: &CapitalContext,
        _rng: &mut StdRng,
    ) -> Option<TradeIntent> {
        let p = &self.params;
        let window = instrument.last_n_bars(as_of, p.lookback);
        if window.len() < p.min_bars {
            return None;
        }
        let last = window.last()?;
        if last.volume < p.min_volume {
            return None;
        }

        let direction = self.direction(window)?;
        let close = last.close;
        let stop = match direction {
            Direction::Long => p.long_stop_fraction * close,
            Direction::Short => p.short_stop_fraction * close,
        };
        let target = close + direction.sign() * (close - stop).abs() * p.reward_multiple;

        Some(TradeIntent::new(
            instrument.symbol.clone(),
            direction,
            as_of,
            close,
            stop,
            Some(target),
        ))
    }

    fn evaluate_exit(&self, position: &OpenPosition, bars: &[Bar]) -> bool {
        let choppy = choppiness_index(bars, self.params.chop_period)
            .map(|chop| chop > self.params.chop_exit)
            .unwrap_or(false);
        choppy
            || should_exit(
                &position.intent,
                position.entry_price,
                bars,
                Some(&TrailingConfig::default()),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AssetClass;
    use rand::SeedableRng;

    fn instrument(closes: &[f64], volume: f64) -> Instrument {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 0 { close } else { closes[i - 1] };
                Bar::new(
                    start + chrono::Duration::days(i as i64),
                    open,
                    open.max(close) + 0.1,
                    open.min(close) - 0.1,
                    close,
                    volume,
                )
            })
            .collect();
        Instrument::new("TEST", AssetClass::Equity, bars).unwrap()
    }

    fn evaluate(inst: &Instrument) -> Option<TradeIntent> {
        let as_of = inst.bars().last().unwrap().date;
        let ctx = CapitalContext {
            capital: 10_000.0,
            sizing_capital: 10_000.0,
            risk_capital: 1_200.0,
            free_slots: 5,
        };
        let mut rng = StdRng::seed_from_u64(0);
        ChoppinessTrend::default().evaluate_entry(inst, as_of, &ctx, &mut rng)
    }

    #[test]
    fn steady_uptrend_goes_long() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + 0.5 * i as f64).collect();
        let intent = evaluate(&instrument(&closes, 1e6)).unwrap();
        let close = *closes.last().unwrap();
        assert_eq!(intent.direction, Direction::Long);
        assert_eq!(intent.reference_price, close);
        assert!((intent.stop_loss - 0.9 * close).abs() < 1e-9);
        assert!((intent.take_profit.unwrap() - 1.1 * close).abs() < 1e-9);
    }

    #[test]
    fn steady_downtrend_goes_short() {
        let closes: Vec<f64> = (0..250).map(|i| 300.0 - 0.5 * i as f64).collect();
        let intent = evaluate(&instrument(&closes, 1e6)).unwrap();
        let close = *closes.last().unwrap();
        assert_eq!(intent.direction, Direction::Short);
        assert!((intent.stop_loss - 1.12 * close).abs() < 1e-9);
        assert!((intent.take_profit.unwrap() - 0.88 * close).abs() < 1e-9);
    }

    #[test]
    fn short_history_is_ignored() {
        let closes: Vec<f64> = (0..150).map(|i| 100.0 + 0.5 * i as f64).collect();
        assert!(evaluate(&instrument(&closes, 1e6)).is_none());
    }

    #[test]
    fn illiquid_is_ignored() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + 0.5 * i as f64).collect();
        assert!(evaluate(&instrument(&closes, 1_000.0)).is_none());
    }

    #[test]
    fn choppy_market_is_ignored() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + if i % 2 == 0 { 2.0 } else { -2.0 }).collect();
        assert!(evaluate(&instrument(&closes, 1e6)).is_none());
    }

    #[test]
    fn exit_on_choppiness() {
        let strategy = ChoppinessTrend::default();
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let inst = instrument(&closes, 1e6);
        let intent = TradeIntent::new(
            "TEST",
            Direction::Long,
            inst.bars()[0].date,
            100.0,
            50.0,
            Some(200.0),
        );
        let position = OpenPosition { intent, entry_price: 100.0 };
        assert!(strategy.evaluate_exit(&position, inst.bars()));
    }
}
