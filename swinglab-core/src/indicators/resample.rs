//! Aggregate daily bars into multi-day candles.

use crate::domain::Bar;

/// Group consecutive bars into candles of `period` bars (the last group may
/// be shorter). Each candle keeps the first bar's date and open, the last
/// bar's close, the extreme high/low and the summed volume.
pub fn resample(bars: &[Bar], period: usize) -> Vec<Bar> {
    bars.chunks(period.max(1))
        .map(|chunk| {
            let first = &chunk[0];
            let last = &chunk[chunk.len() - 1];
            Bar {
                date: first.date,
                open: first.open,
                high: chunk.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max),
                low: chunk.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
                close: last.close,
                volume: chunk.iter().map(|b| b.volume).sum(),
            }
        })
        .collect()
}
