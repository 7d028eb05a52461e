use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Bar;

/// Broad asset class of an instrument.
///
/// Strategies use it for eligibility (e.g. skipping forex pairs or the
/// market index itself when scanning for entries).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    #[default]
    Equity,
    Crypto,
    Forex,
    Index,
}

/// A tradeable instrument together with its full bar history.
///
/// Bars are kept in strictly ascending date order; the constructor rejects
/// anything else so every windowed lookup can binary-search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    pub symbol: String,
    pub asset_class: AssetClass,
    bars: Vec<Bar>,
}

impl Instrument {
    /// Create new instrument, validating bar order.
    pub fn new(
        symbol: impl Into<String>,
        asset_class: AssetClass,
        bars: Vec<Bar>,
    ) -> Result<Self, InstrumentError> {
        let symbol = symbol.into();
        if let Some(pos) = bars.windows(2).position(|w| w[1].date <= w[0].date) {
            return Err(InstrumentError::UnorderedBars {
                symbol,
                index: pos + 1,
            });
        }
        Ok(Self { symbol, asset_class, bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn is_crypto(&self) -> bool {
        self.asset_class == AssetClass::Crypto
    }

    pub fn is_forex(&self) -> bool {
        self.asset_class == AssetClass::Forex
    }

    pub fn is_index(&self) -> bool {
        self.asset_class == AssetClass::Index
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum InstrumentError {
    #[error("bars for '{symbol}' are not strictly ascending by date at index {index}")]
    UnorderedBars { symbol: String, index: usize },
}
