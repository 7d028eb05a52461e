//! Choppiness Index.
//!
//! CHOP = 100 * log10( sum(TR_1, n) / (max(high, n) - min(low, n)) ) / log10(n)
//!
//! Values near 100 mean sideways chop, values near 0 a strong trend. The
//! first bar of the window uses its high-low range because it has no
//! previous close inside the window; pass one extra leading bar to get true
//! ranges throughout.

use super::{IndicatorError, IndicatorResult};
use crate::domain::Bar;

pub fn choppiness_index(bars: &[Bar], period: usize) -> IndicatorResult {
    if period < 2 || bars.len() < period {
        return Err(IndicatorError::InsufficientData {
            needed: period.max(2),
            available: bars.len(),
        });
    }

    let start = bars.len() - period;
    let window = &bars[start..];

    let tr_sum: f64 = window
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let prev_close = if start + i > 0 {
                Some(bars[start + i - 1].close)
            } else {
                None
            };
            match prev_close {
                Some(pc) => (bar.high - bar.low)
                    .max((bar.high - pc).abs())
                    .max((bar.low - pc).abs()),
                None => bar.range(),
            }
        })
        .sum();

    let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let span = highest - lowest;

    // A perfectly flat window has no defined choppiness.
    if span <= 0.0 || tr_sum <= 0.0 {
        return Err(IndicatorError::InsufficientData {
            needed: period,
            available: 0,
        });
    }

    Ok(100.0 * (tr_sum / span).log10() / (period as f64).log10())
}
