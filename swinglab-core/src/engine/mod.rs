//! Simulation engine: trade resolution, deferred settlement, adaptive risk
//! sizing and the walk-forward driver.
//!
//! Data flows one way: a strategy's `TradeIntent` is sized by the driver,
//! fully resolved against the forward bar path by the `TradeResolver`, held
//! in a `PositionLedger` slot, and booked as a `SettledTrade` once the
//! simulation clock reaches its exit date.

pub mod config;
pub mod driver;
pub mod ledger;
pub mod resolver;
pub mod risk;

pub use crate::strategy::CapitalContext;
pub use config::{ConfigError, DateStep, SimulationConfig};
pub use driver::{run_simulation, SimulationError, SimulationReport};
pub use ledger::{LedgerError, PositionLedger};
pub use resolver::{should_exit, EntryFill, ResolveError, ResolverConfig, TradeResolver, TrailingConfig};
pub use risk::{RiskConfig, RiskController, RiskPolicy, Settlement};
