//! Domain types for SwingLab

pub mod bar;
pub mod instrument;
pub mod trade;

pub use bar::Bar;
pub use instrument::{AssetClass, Instrument, InstrumentError};
pub use trade::{Direction, ExitReason, ResolvedTrade, SettledTrade, TradeIntent};

/// Symbol type alias
pub type Symbol = String;
