//! Technical indicator library.
//!
//! Every indicator is a pure function over a finite, ascending window of bars
//! (or prices) and returns the value for the *last* element of the window.
//! Indicators never look past the slice they are given, so passing
//! `last_n_bars(as_of, n)` is enough to guarantee no look-ahead.
//!
//! Insufficient history is reported as [`IndicatorError::InsufficientData`].
//! Callers treat it as "not eligible", never as a failure.
//!
//! The only non-deterministic function is [`costs::spread`], which draws from
//! an explicitly supplied RNG.

pub mod atr;
pub mod choppiness;
pub mod costs;
pub mod ema;
pub mod extremes;
pub mod macd;
pub mod parabolic_sar;
pub mod patterns;
pub mod resample;
pub mod rsi;
pub mod sma;
pub mod zscore;

use thiserror::Error;

use crate::domain::Bar;

pub use atr::{atr, simple_atr, true_range, wilder_smooth};
pub use choppiness::choppiness_index;
pub use costs::{average_volume, fee, spread};
pub use ema::ema;
pub use extremes::{average_range, highest_high, lowest_low, swing_high, swing_low};
pub use macd::{macd, Macd};
pub use parabolic_sar::{parabolic_sar, parabolic_sar_with, ParabolicSarParams};
pub use patterns::{
    candle_bias, is_bearish_engulfing, is_bullish_engulfing, is_hammer, is_hanging_man,
    CandleBias,
};
pub use resample::resample;
pub use rsi::rsi;
pub use sma::sma;
pub use zscore::{mean, std_dev, z_score};

/// Errors from indicator computation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum IndicatorError {
    #[error("insufficient data: need {needed} values, have {available}")]
    InsufficientData { needed: usize, available: usize },
}

pub type IndicatorResult = Result<f64, IndicatorError>;

/// Fail with `InsufficientData` unless `available >= needed`.
pub(crate) fn require(needed: usize, available: usize) -> Result<(), IndicatorError> {
    if available < needed {
        return Err(IndicatorError::InsufficientData { needed, available });
    }
    Ok(())
}

/// Close prices of a bar window.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar::new(
                base_date + chrono::Duration::days(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Create bars from explicit (open, high, low, close) tuples for testing.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Bar::new(base_date + chrono::Duration::days(i as i64), open, high, low, close, 1000.0)
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
