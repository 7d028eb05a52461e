//! Bar loading for the runner.
//!
//! One CSV file per symbol, `<SYMBOL>.csv`, with the header
//! `date,open,high,low,close,volume`. Rows are sorted by date; rows with
//! non-finite or inconsistent prices are dropped with a warning. Duplicate
//! dates are rejected.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use swinglab_core::domain::{AssetClass, Bar, Instrument, InstrumentError};

use crate::config::DataConfig;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    InvalidBars(#[from] InstrumentError),
    #[error("no bar files found in {0}")]
    NoData(PathBuf),
}

#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

impl From<CsvBar> for Bar {
    fn from(row: CsvBar) -> Self {
        Bar::new(row.date, row.open, row.high, row.low, row.close, row.volume)
    }
}

/// Parse bars from any CSV reader.
pub fn read_bars<R: std::io::Read>(reader: R, path: &Path) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    for row in rdr.deserialize::<CsvBar>() {
        let row = row.map_err(|source| LoadError::Csv { path: path.to_path_buf(), source })?;
        let bar = Bar::from(row);
        if bar.is_sane() {
            bars.push(bar);
        } else {
            warn!(path = %path.display(), date = %bar.date, "dropping malformed bar");
        }
    }
    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

pub fn load_instrument(
    path: &Path,
    symbol: &str,
    asset_class: AssetClass,
) -> Result<Instrument, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bars = read_bars(file, path)?;
    debug!(symbol, bars = bars.len(), "loaded instrument");
    Ok(Instrument::new(symbol, asset_class, bars)?)
}

impl DataConfig {
    pub fn asset_class(&self, symbol: &str) -> AssetClass {
        let listed = |list: &[String]| list.iter().any(|s| s == symbol);
        if listed(&self.indices) {
            AssetClass::Index
        } else if listed(&self.crypto) {
            AssetClass::Crypto
        } else if listed(&self.forex) {
            AssetClass::Forex
        } else {
            AssetClass::Equity
        }
    }
}

/// Load every `*.csv` in the configured directory, ordered by symbol.
pub fn load_universe(config: &DataConfig) -> Result<Vec<Instrument>, LoadError> {
    let io_err = |source: std::io::Error| LoadError::Io { path: config.dir.clone(), source };
    let mut files: Vec<(String, PathBuf)> = std::fs::read_dir(&config.dir)
        .map_err(io_err)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
        .filter_map(|path| {
            let symbol = path.file_stem()?.to_str()?.to_string();
            Some((symbol, path))
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(LoadError::NoData(config.dir.clone()));
    }

    files
        .iter()
        .map(|(symbol, path)| load_instrument(path, symbol, config.asset_class(symbol)))
        .collect()
}
