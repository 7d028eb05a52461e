//! SwingLab Runner: orchestration around the simulation engine.
//!
//! This crate builds on `swinglab-core` to provide:
//! - TOML run configuration and a strategy/gate factory
//! - CSV bar loading
//! - Monte Carlo runner with rayon parallelism and cooperative cancellation
//! - Performance metrics and distribution summaries
//! - JSON and CSV export
//! - Single-day entry scan

pub mod config;
pub mod data_loader;
pub mod export;
pub mod factory;
pub mod metrics;
pub mod monte_carlo;
pub mod scan;

pub use config::{DataConfig, GateConfig, RunConfig, RunnerConfigError, StrategyConfig};
pub use data_loader::{load_instrument, load_universe, LoadError};
pub use export::{DistributionArtifact, SimulationArtifact, SCHEMA_VERSION};
pub use factory::{create_gate, create_strategy};
pub use metrics::PerformanceMetrics;
pub use monte_carlo::{
    run_monte_carlo, DistributionReport, DistributionSummary, McConfig, McError, TrialOutcome,
};
pub use scan::find_trades;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<McConfig>();
        assert_sync::<McConfig>();
    }

    #[test]
    fn report_types_are_send_sync() {
        assert_send::<DistributionReport>();
        assert_sync::<DistributionReport>();
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
        assert_send::<SimulationArtifact>();
        assert_sync::<SimulationArtifact>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<McError>();
        assert_sync::<McError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
    }
}
