//! MACD: EMA(12) - EMA(26), a 9-period EMA signal line over the MACD series,
//! and the histogram (line - signal).

use serde::{Deserialize, Serialize};

use super::ema::ema_series;
use super::{require, IndicatorError};

const FAST: usize = 12;
const SLOW: usize = 26;
const SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub line: f64,
    /// `None` until the MACD series itself covers the signal period.
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
}

pub fn macd(prices: &[f64]) -> Result<Macd, IndicatorError> {
    require(SLOW, prices.len())?;

    let fast = ema_series(prices, FAST);
    let slow = ema_series(prices, SLOW);
    // fast[j] is the EMA at index j + FAST - 1, slow[k] at k + SLOW - 1.
    let offset = SLOW - FAST;
    let series: Vec<f64> = slow
        .iter()
        .enumerate()
        .map(|(k, s)| fast[k + offset] - s)
        .collect();

    let line = series[series.len() - 1];
    let signal = ema_series(&series, SIGNAL).last().copied();
    Ok(Macd {
        line,
        signal,
        histogram: signal.map(|s| line - s),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, ema, DEFAULT_EPSILON};

    #[test]
    fn macd_line_matches_ema_difference() {
        let prices: Vec<f64> = (0..40).map(|i| 50.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let m = macd(&prices).unwrap();
        let expected = ema(&prices, 12).unwrap() - ema(&prices, 26).unwrap();
        assert_approx(m.line, expected, 1e-9);
        assert!(m.signal.is_some());
        assert_approx(m.histogram.unwrap(), m.line - m.signal.unwrap(), DEFAULT_EPSILON);
    }

    #[test]
    fn macd_constant_prices_is_zero() {
        let m = macd(&[20.0; 50]).unwrap();
        assert_approx(m.line, 0.0, DEFAULT_EPSILON);
        assert_approx(m.signal.unwrap(), 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn macd_signal_needs_34_values() {
        let prices: Vec<f64> = (0..33).map(|i| i as f64).collect();
        assert!(macd(&prices).unwrap().signal.is_none());
        let prices: Vec<f64> = (0..34).map(|i| i as f64).collect();
        assert!(macd(&prices).unwrap().signal.is_some());
    }

    #[test]
    fn macd_needs_26_values() {
        assert!(macd(&[1.0; 25]).is_err());
    }
}
