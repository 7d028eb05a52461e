//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! [`atr`] uses Wilder smoothing (alpha = 1/period) seeded with the mean of
//! the first `period` true ranges, so it needs `period + 1` bars.
//! [`simple_atr`] is the plain mean of the true ranges in a short window and
//! is what the spread model scales by.

use super::{require, IndicatorError, IndicatorResult};
use crate::domain::Bar;

/// True Range series.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(bars.len());
    if let Some(first) = bars.first() {
        tr.push(first.range());
    }
    tr.extend(bars.windows(2).map(|w| pair_true_range(&w[0], &w[1])));
    tr
}

fn pair_true_range(prev: &Bar, bar: &Bar) -> f64 {
    let pc = prev.close;
    (bar.high - bar.low)
        .max((bar.high - pc).abs())
        .max((bar.low - pc).abs())
}

/// Wilder smoothing of `values`, returning the smoothed value at the last
/// element. Seed: mean of the first `period` values.
pub fn wilder_smooth(values: &[f64], period: usize) -> IndicatorResult {
    let period = period.max(1);
    require(period, values.len())?;

    let seed = values[..period].iter().sum::<f64>() / period as f64;
    let alpha = 1.0 / period as f64;
    Ok(values[period..]
        .iter()
        .fold(seed, |prev, &v| alpha * v + (1.0 - alpha) * prev))
}

/// Wilder ATR over the whole window.
pub fn atr(bars: &[Bar], period: usize) -> IndicatorResult {
    let period = period.max(1);
    if bars.len() < period + 1 {
        return Err(IndicatorError::InsufficientData {
            needed: period + 1,
            available: bars.len(),
        });
    }
    // TR[0] has no previous close, so the seed starts from TR[1].
    let tr: Vec<f64> = bars.windows(2).map(|w| pair_true_range(&w[0], &w[1])).collect();
    wilder_smooth(&tr, period)
}

/// Mean of the true ranges between consecutive bars in the last `period`
/// bars. Returns 0.0 with fewer than two bars.
pub fn simple_atr(bars: &[Bar], period: usize) -> f64 {
    let window = &bars[bars.len().saturating_sub(period)..];
    if window.len() < 2 {
        return 0.0;
    }
    let sum: f64 = window.windows(2).map(|w| pair_true_range(&w[0], &w[1])).sum();
    sum / (window.len() - 1) as f64
}
