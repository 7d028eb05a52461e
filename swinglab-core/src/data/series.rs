//! Windowed, read-only access to an instrument's bar history.
//!
//! Every accessor returns a borrowed, ascending slice and never pads: when
//! history is short the slice is simply shorter than requested.

use chrono::NaiveDate;

use crate::domain::{Bar, Instrument};

/// Read access to an ordered bar series.
pub trait BarSeries {
    /// All bars, ascending by date.
    fn series(&self) -> &[Bar];

    /// Up to `n` bars with `date <= as_of`, ending at the as-of bar.
    fn last_n_bars(&self, as_of: NaiveDate, n: usize) -> &[Bar] {
        let bars = self.series();
        let end = bars.partition_point(|b| b.date <= as_of);
        &bars[end.saturating_sub(n)..end]
    }

    /// Up to `n` bars with `date > as_of`, starting right after it.
    fn next_n_bars(&self, as_of: NaiveDate, n: usize) -> &[Bar] {
        let bars = self.series();
        let start = bars.partition_point(|b| b.date <= as_of);
        let end = start.saturating_add(n).min(bars.len());
        &bars[start..end]
    }

    /// The bar on `date`, else the latest bar before it.
    fn bar_on_or_near(&self, date: NaiveDate) -> Option<&Bar> {
        let bars = self.series();
        let end = bars.partition_point(|b| b.date <= date);
        end.checked_sub(1).map(|i| &bars[i])
    }

    /// Number of bars with `date <= as_of`.
    fn bars_through(&self, as_of: NaiveDate) -> usize {
        self.series().partition_point(|b| b.date <= as_of)
    }
}

impl BarSeries for Instrument {
    fn series(&self) -> &[Bar] {
        self.bars()
    }
}

impl BarSeries for [Bar] {
    fn series(&self) -> &[Bar] {
        self
    }
}

impl BarSeries for Vec<Bar> {
    fn series(&self) -> &[Bar] {
        self
    }
}
