//! Exponential Moving Average (EMA).
//!
//! Alpha = 2 / (period + 1). Seeded with the SMA of the first `period`
//! values, then updated over every remaining value in the window. The value
//! returned is the EMA at the last element.

use super::{require, IndicatorResult};

pub fn ema(prices: &[f64], period: usize) -> IndicatorResult {
    let period = period.max(1);
    require(period, prices.len())?;

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = prices[..period].iter().sum::<f64>() / period as f64;

    Ok(prices[period..]
        .iter()
        .fold(seed, |prev, &price| alpha * price + (1.0 - alpha) * prev))
}

/// EMA evaluated at every index from `period - 1` onwards.
pub(crate) fn ema_series(prices: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);
    if prices.len() < period {
        return Vec::new();
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = prices[..period].iter().sum::<f64>() / period as f64;
    let mut out = Vec::with_capacity(prices.len() - period + 1);
    out.push(seed);
    let mut prev = seed;
    for &price in &prices[period..] {
        prev = alpha * price + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}
