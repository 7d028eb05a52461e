//! Z-score mean reversion.
//!
//! Fades a sudden extreme: the close sits more than `z_threshold` standard
//! deviations from its SMA while, `dip_length` bars earlier, it was on the
//! other side of the mean. The stop goes behind the recent swing extreme,
//! widened to at least `min_stop_atr` ATRs.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{CapitalContext, Strategy};
use crate::data::BarSeries;
use crate::domain::{Bar, Direction, Instrument, TradeIntent};
use crate::indicators::{atr, closes, sma, swing_high, swing_low, z_score};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZScoreReversionParams {
    pub lookback: usize,
    pub min_bars: usize,
    pub min_volume: f64,
    pub sma_period: usize,
    pub z_threshold: f64,
    pub dip_length: usize,
    pub swing_length: usize,
    pub atr_period: usize,
    pub min_stop_atr: f64,
    pub reward_multiple: f64,
}

impl Default for ZScoreReversionParams {
    fn default() -> Self {
        Self {
            lookback: 720,
            min_bars: 200,
            min_volume: 500_000.0,
            sma_period: 50,
            z_threshold: 3.0,
            dip_length: 10,
            swing_length: 5,
            atr_period: 14,
            min_stop_atr: 2.0,
            reward_multiple: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ZScoreReversion {
    params: ZScoreReversionParams,
}

impl ZScoreReversion {
    pub fn new(params: ZScoreReversionParams) -> Self {
        Self { params }
    }

    fn z(&self, window: &[Bar]) -> Option<f64> {
        let mean = sma(&closes(window), self.params.sma_period).ok()?;
        z_score(window, self.params.sma_period, mean).ok()
    }
}

impl Strategy for ZScoreReversion {
    fn name(&self) -> &str {
        "zscore_reversion"
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
        if window.len() < p.min_bars || window.len() <= p.dip_length {
            return None;
        }
        let last = window.last()?;
        if last.volume < p.min_volume {
            return None;
        }

        let z = self.z(window)?;
        let previous_z = self.z(&window[..window.len() - p.dip_length])?;
        let atr = atr(window, p.atr_period).ok()?;
        let close = last.close;

        let (direction, stop) = if z < -p.z_threshold && previous_z > 0.0 {
            let swing = swing_low(window, p.swing_length).ok()?;
            let stop = if (close - swing).abs() < p.min_stop_atr * atr {
                close - p.min_stop_atr * atr
            } else {
                swing
            };
            (Direction::Long, stop)
        } else if z > p.z_threshold && previous_z < 0.0 {
            let swing = swing_high(window, p.swing_length).ok()?;
            let stop = if (close - swing).abs() < p.min_stop_atr * atr {
                close + p.min_stop_atr * atr
            } else {
                swing
            };
            (Direction::Short, stop)
        } else {
            return None;
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
}
