//! Relative Strength Index (RSI): Wilder's method.
//!
//! Average gain and average loss are Wilder-smoothed over the close-to-close
//! changes of the window. RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//!
//! Degenerate windows: all-flat returns 50, no losses returns 100.

use super::{atr::wilder_smooth, IndicatorError, IndicatorResult};
use crate::domain::Bar;

pub fn rsi(bars: &[Bar], period: usize) -> IndicatorResult {
    let period = period.max(1);
    if bars.len() < period + 1 {
        return Err(IndicatorError::InsufficientData {
            needed: period + 1,
            available: bars.len(),
        });
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = bars
        .windows(2)
        .map(|w| {
            let change = w[1].close - w[0].close;
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let avg_gain = wilder_smooth(&gains, period)?;
    let avg_loss = wilder_smooth(&losses, period)?;

    if avg_loss == 0.0 {
        return Ok(if avg_gain == 0.0 { 50.0 } else { 100.0 });
    }
    let rs = avg_gain / avg_loss;
    Ok(100.0 - 100.0 / (1.0 + rs))
}
