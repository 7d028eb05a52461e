//! Export: JSON and CSV artifacts for simulation and Monte Carlo runs.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: settled-trade tape and per-trial outcomes for external tools
//!
//! Every JSON artifact carries a `schema_version`. Newer versions are
//! rejected on load.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use swinglab_core::domain::SettledTrade;
use swinglab_core::engine::SimulationReport;

use crate::metrics::PerformanceMetrics;
use crate::monte_carlo::{DistributionReport, TrialOutcome};

pub const SCHEMA_VERSION: u32 = 1;

/// A single simulation with its derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationArtifact {
    pub schema_version: u32,
    /// Fingerprint of the run configuration, when the run came from a file.
    #[serde(default)]
    pub config_fingerprint: Option<String>,
    pub metrics: PerformanceMetrics,
    pub report: SimulationReport,
}

impl SimulationArtifact {
    pub fn new(report: SimulationReport, config_fingerprint: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            config_fingerprint,
            metrics: PerformanceMetrics::compute(&report),
            report,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionArtifact {
    pub schema_version: u32,
    #[serde(default)]
    pub config_fingerprint: Option<String>,
    pub distribution: DistributionReport,
}

impl DistributionArtifact {
    pub fn new(distribution: DistributionReport, config_fingerprint: Option<String>) -> Self {
        Self { schema_version: SCHEMA_VERSION, config_fingerprint, distribution }
    }
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize artifact to JSON")
}

pub fn import_simulation_json(json: &str) -> Result<SimulationArtifact> {
    let artifact: SimulationArtifact =
        serde_json::from_str(json).context("failed to deserialize simulation artifact")?;
    check_schema(artifact.schema_version)?;
    Ok(artifact)
}

pub fn import_distribution_json(json: &str) -> Result<DistributionArtifact> {
    let artifact: DistributionArtifact =
        serde_json::from_str(json).context("failed to deserialize distribution artifact")?;
    check_schema(artifact.schema_version)?;
    Ok(artifact)
}

fn check_schema(version: u32) -> Result<()> {
    if version > SCHEMA_VERSION {
        bail!("unsupported schema version {version} (max supported: {SCHEMA_VERSION})");
    }
    Ok(())
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Settled-trade tape, one row per booked trade in exit-date order.
pub fn export_trades_csv(trades: &[SettledTrade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "direction",
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "shares",
        "initial_stop",
        "take_profit",
        "fee",
        "entry_spread",
        "exit_spread",
        "gross_pnl",
        "net_pnl",
        "risk_reward",
        "exit_reason",
        "bars_held",
        "capital_after",
    ])?;

    for s in trades {
        let t = &s.trade;
        wtr.write_record([
            t.symbol.clone(),
            format!("{:?}", t.direction),
            t.entry_date.to_string(),
            format!("{:.6}", t.entry_price),
            t.exit_date.to_string(),
            format!("{:.6}", t.exit_price),
            format!("{:.6}", t.shares),
            format!("{:.6}", t.initial_stop),
            t.take_profit.map(|p| format!("{p:.6}")).unwrap_or_default(),
            format!("{:.2}", t.fee),
            format!("{:.6}", t.entry_spread),
            format!("{:.6}", t.exit_spread),
            format!("{:.2}", t.gross_pnl),
            format!("{:.2}", t.net_pnl),
            t.risk_reward.map(|r| format!("{r:.4}")).unwrap_or_default(),
            format!("{:?}", t.exit_reason),
            t.bars_held.to_string(),
            format!("{:.2}", s.capital_after),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Per-trial outcomes of a Monte Carlo run.
pub fn export_outcomes_csv(outcomes: &[TrialOutcome]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for outcome in outcomes {
        wtr.serialize(outcome)?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundles ───────────────────────────────────────────────

/// Write `report.json` and `trades.csv` under `dir`, creating it if needed.
pub fn save_simulation(artifact: &SimulationArtifact, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output dir: {}", dir.display()))?;
    std::fs::write(dir.join("report.json"), export_json(artifact)?)?;
    std::fs::write(dir.join("trades.csv"), export_trades_csv(&artifact.report.trades)?)?;
    Ok(())
}

/// Write `distribution.json` and `outcomes.csv` under `dir`.
pub fn save_distribution(artifact: &DistributionArtifact, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output dir: {}", dir.display()))?;
    std::fs::write(dir.join("distribution.json"), export_json(artifact)?)?;
    std::fs::write(
        dir.join("outcomes.csv"),
        export_outcomes_csv(&artifact.distribution.outcomes)?,
    )?;
    Ok(())
}

pub fn load_simulation(dir: &Path) -> Result<SimulationArtifact> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_simulation_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use swinglab_core::domain::{Direction, ExitReason, ResolvedTrade};

    fn report() -> SimulationReport {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let trade = ResolvedTrade {
            symbol: "AAA".into(),
            direction: Direction::Short,
            entry_date: d(2),
            entry_price: 50.0,
            exit_date: d(9),
            exit_price: 45.0,
            shares: 20.0,
            initial_stop: 55.0,
            take_profit: Some(45.0),
            fee: 1.0,
            entry_spread: 0.0,
            exit_spread: 0.0,
            gross_pnl: 100.0,
            net_pnl: 99.0,
            risk_reward: Some(1.0),
            exit_reason: ExitReason::Target,
            is_winner: true,
            bars_held: 5,
        };
        SimulationReport {
            strategy: "test".into(),
            start: d(1),
            end: d(31),
            starting_capital: 1_000.0,
            final_capital: 1_099.0,
            highest_capital: 1_099.0,
            max_drawdown: 0.0,
            trade_count: 1,
            win_count: 1,
            discarded_trades: 0,
            trades: vec![SettledTrade { trade, capital_after: 1_099.0 }],
        }
    }

    #[test]
    fn json_round_trip() {
        let artifact = SimulationArtifact::new(report(), Some("abc".into()));
        let json = export_json(&artifact).unwrap();
        let back = import_simulation_json(&json).unwrap();
        assert_eq!(back.report, artifact.report);
        assert_eq!(back.config_fingerprint.as_deref(), Some("abc"));
        assert_eq!(back.metrics.trade_count, 1);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut artifact = SimulationArtifact::new(report(), None);
        artifact.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&artifact).unwrap();
        let err = import_simulation_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn trades_csv_has_header_and_rows() {
        let csv = export_trades_csv(&report().trades).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("symbol,direction,entry_date"));
        assert!(lines[1].starts_with("AAA,Short,2024-01-02"));
        assert!(lines[1].contains("Target"));
        assert!(lines[0].contains("fee,entry_spread,exit_spread,gross_pnl"));
    }
}
