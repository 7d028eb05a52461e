//! Regime gates: a whole-market yes/no checked once per simulated day before
//! any instrument is scanned.

use chrono::NaiveDate;

use crate::data::BarSeries;
use crate::domain::Instrument;
use crate::indicators::{closes, sma};

pub trait RegimeGate: Send + Sync {
    fn allows(&self, as_of: NaiveDate) -> bool;
}

impl<F> RegimeGate for F
where
    F: Fn(NaiveDate) -> bool + Send + Sync,
{
    fn allows(&self, as_of: NaiveDate) -> bool {
        self(as_of)
    }
}

/// Never blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOpen;

impl RegimeGate for AlwaysOpen {
    fn allows(&self, _as_of: NaiveDate) -> bool {
        true
    }
}

/// Open while the index closes above its simple moving average.
///
/// Closed when the index lacks `period` bars of history as of the date.
#[derive(Debug, Clone)]
pub struct SmaTrendGate {
    index: Instrument,
    period: usize,
}

impl SmaTrendGate {
    pub fn new(index: Instrument, period: usize) -> Self {
        Self { index, period: period.max(1) }
    }

    pub fn index_symbol(&self) -> &str {
        &self.index.symbol
    }
}

impl RegimeGate for SmaTrendGate {
    fn allows(&self, as_of: NaiveDate) -> bool {
        let window = self.index.last_n_bars(as_of, self.period);
        let Some(last) = window.last() else {
            return false;
        };
        match sma(&closes(window), self.period) {
            Ok(average) => last.close > average,
            Err(_) => false,
        }
    }
}
