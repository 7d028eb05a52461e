//! Z-score of the last close against a trailing window, plus the mean and
//! population standard deviation helpers it is built from.

use super::{require, IndicatorError, IndicatorResult};
use crate::domain::Bar;

pub fn mean(values: &[f64]) -> IndicatorResult {
    require(1, values.len())?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> IndicatorResult {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Ok(var.sqrt())
}

/// (last close - `mean`) / std of the last `period` closes.
///
/// `mean` is supplied by the caller, usually the SMA of the same window.
/// A window with zero deviation has no defined z-score and is reported as
/// insufficient data.
pub fn z_score(bars: &[Bar], period: usize, mean: f64) -> IndicatorResult {
    let period = period.max(2);
    require(period, bars.len())?;

    let closes: Vec<f64> = bars[bars.len() - period..].iter().map(|b| b.close).collect();
    let sd = std_dev(&closes)?;
    if sd == 0.0 {
        return Err(IndicatorError::InsufficientData { needed: period, available: 0 });
    }
    let last = closes[closes.len() - 1];
    Ok((last - mean) / sd)
}
