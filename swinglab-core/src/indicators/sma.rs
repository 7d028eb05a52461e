//! Simple Moving Average (SMA).
//!
//! Arithmetic mean of the last `period` values.

use super::{require, IndicatorResult};

pub fn sma(prices: &[f64], period: usize) -> IndicatorResult {
    require(period.max(1), prices.len())?;
    let window = &prices[prices.len() - period.max(1)..];
    Ok(window.iter().sum::<f64>() / window.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, IndicatorError, DEFAULT_EPSILON};

    #[test]
    fn sma_of_one_to_five() {
        assert_eq!(sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 5).unwrap(), 3.0);
    }

    #[test]
    fn sma_uses_trailing_window() {
        let prices = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0];
        // mean(12,13,14,15,16) = 14.0
        assert_approx(sma(&prices, 5).unwrap(), 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_last_value() {
        assert_eq!(sma(&[100.0, 200.0, 300.0], 1).unwrap(), 300.0);
    }

    #[test]
    fn sma_too_few_values() {
        assert_eq!(
            sma(&[10.0, 11.0], 5),
            Err(IndicatorError::InsufficientData { needed: 5, available: 2 })
        );
    }
}
