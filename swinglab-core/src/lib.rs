//! SwingLab core: the swing-trading simulation engine.
//!
//! - Domain types (bars, instruments, trade intents, resolved and settled trades)
//! - Windowed bar-series access
//! - Indicator library with spread and fee estimators
//! - `Strategy` and `RegimeGate` capabilities plus two reference strategies
//! - Trade resolver, position ledger, risk controller and walk-forward driver
//! - BLAKE3-derived RNG hierarchy for reproducible trials

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod rng;
pub mod strategy;

pub use engine::{run_simulation, SimulationConfig, SimulationError, SimulationReport};
pub use strategy::{RegimeGate, Strategy};
