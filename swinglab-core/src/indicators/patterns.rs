//! Single- and two-candle patterns.

use serde::{Deserialize, Serialize};

use super::atr::simple_atr;
use crate::domain::Bar;

const ENGULFING_ATR_PERIOD: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandleBias {
    Bullish,
    Bearish,
    Neutral,
}

/// Direction of the last candle's body.
pub fn candle_bias(bar: &Bar) -> CandleBias {
    if bar.close > bar.open {
        CandleBias::Bullish
    } else if bar.close < bar.open {
        CandleBias::Bearish
    } else {
        CandleBias::Neutral
    }
}

fn wicks(bar: &Bar) -> (f64, f64) {
    let lower = bar.open.min(bar.close) - bar.low;
    let upper = bar.high - bar.open.max(bar.close);
    (lower, upper)
}

/// Long lower wick: body at least `min_body_fraction * atr`, body larger
/// than the upper wick, lower wick at least 3x the body and 3x the upper wick.
pub fn is_hammer(bar: &Bar, atr: f64, min_body_fraction: f64) -> bool {
    let body = bar.body();
    if body < atr * min_body_fraction {
        return false;
    }
    let (lower, upper) = wicks(bar);
    body > upper && lower >= 3.0 * body && lower >= 3.0 * upper
}

/// Mirror of [`is_hammer`] on the upper wick.
pub fn is_hanging_man(bar: &Bar, atr: f64, min_body_fraction: f64) -> bool {
    let body = bar.body();
    if body < atr * min_body_fraction {
        return false;
    }
    let (lower, upper) = wicks(bar);
    body > lower && upper >= 3.0 * body && upper >= 3.0 * lower
}

/// Last two bars: a bearish candle engulfed by a bullish one whose body
/// exceeds the window's average true range.
pub fn is_bullish_engulfing(bars: &[Bar]) -> bool {
    let [.., first, second] = bars else {
        return false;
    };
    if second.body() <= simple_atr(bars, ENGULFING_ATR_PERIOD) {
        return false;
    }
    first.close <= first.open
        && second.close >= second.open
        && first.close >= second.open
        && first.open <= second.close
}

/// Mirror of [`is_bullish_engulfing`].
pub fn is_bearish_engulfing(bars: &[Bar]) -> bool {
    let [.., first, second] = bars else {
        return false;
    };
    if second.body() <= simple_atr(bars, ENGULFING_ATR_PERIOD) {
        return false;
    }
    first.close >= first.open
        && second.close <= second.open
        && first.open >= second.close
        && first.close <= second.open
}
