//! Parabolic SAR: Wilder's acceleration factor system.
//!
//! Sequential: tracks trend direction, extreme point (EP) and acceleration
//! factor (AF) from the first bar of the window and returns the SAR for the
//! last bar. Needs at least 2 bars.

use serde::{Deserialize, Serialize};

use super::{require, IndicatorResult};
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParabolicSarParams {
    pub af_start: f64,
    pub af_step: f64,
    pub af_max: f64,
}

impl Default for ParabolicSarParams {
    fn default() -> Self {
        Self { af_start: 0.02, af_step: 0.02, af_max: 0.20 }
    }
}

/// SAR with default parameters (0.02, 0.02, 0.20).
pub fn parabolic_sar(bars: &[Bar]) -> IndicatorResult {
    parabolic_sar_with(bars, ParabolicSarParams::default())
}

pub fn parabolic_sar_with(bars: &[Bar], params: ParabolicSarParams) -> IndicatorResult {
    require(2, bars.len())?;

    // Initial direction from the first two closes.
    let mut is_long = bars[1].close >= bars[0].close;
    let mut af = params.af_start;
    let (mut sar, mut ep) = if is_long {
        (bars[0].low, bars[1].high)
    } else {
        (bars[0].high, bars[1].low)
    };

    for i in 2..bars.len() {
        let bar = &bars[i];
        let mut next = sar + af * (ep - sar);

        if is_long {
            // Never above the two previous lows.
            next = next.min(bars[i - 1].low).min(bars[i - 2].low);
            if bar.low < next {
                is_long = false;
                next = ep;
                ep = bar.low;
                af = params.af_start;
            } else if bar.high > ep {
                ep = bar.high;
                af = (af + params.af_step).min(params.af_max);
            }
        } else {
            // Never below the two previous highs.
            next = next.max(bars[i - 1].high).max(bars[i - 2].high);
            if bar.high > next {
                is_long = true;
                next = ep;
                ep = bar.high;
                af = params.af_start;
            } else if bar.low < ep {
                ep = bar.low;
                af = (af + params.af_step).min(params.af_max);
            }
        }

        sar = next;
    }

    Ok(sar)
}
