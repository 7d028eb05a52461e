//! Window extremes: swing highs/lows, period highs/lows and average range.

use super::{require, IndicatorResult};
use crate::domain::Bar;

/// Highest high of the whole window.
pub fn highest_high(bars: &[Bar]) -> IndicatorResult {
    require(1, bars.len())?;
    Ok(bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max))
}

/// Lowest low of the whole window.
pub fn lowest_low(bars: &[Bar]) -> IndicatorResult {
    require(1, bars.len())?;
    Ok(bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min))
}

/// Highest high of the last `n` bars. Uses what is available when shorter.
pub fn swing_high(bars: &[Bar], n: usize) -> IndicatorResult {
    highest_high(&bars[bars.len().saturating_sub(n)..])
}

/// Lowest low of the last `n` bars. Uses what is available when shorter.
pub fn swing_low(bars: &[Bar], n: usize) -> IndicatorResult {
    lowest_low(&bars[bars.len().saturating_sub(n)..])
}

/// Mean high-low range of the window.
pub fn average_range(bars: &[Bar]) -> IndicatorResult {
    require(1, bars.len())?;
    Ok(bars.iter().map(Bar::range).sum::<f64>() / bars.len() as f64)
}
