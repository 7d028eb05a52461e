//! Monte Carlo runner: repeats a simulation under independent randomization
//! and summarizes the distribution of outcomes.
//!
//! Trial `i` draws every random choice (universe shuffle, date steps, spread
//! draws) from `RngHierarchy::new(master_seed).rng_for(TRIAL_LABEL, i)`, so a
//! trial's result depends only on its index, never on thread scheduling.
//! Cancellation is cooperative and checked before each trial starts.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use swinglab_core::domain::Instrument;
use swinglab_core::engine::{run_simulation, SimulationConfig, SimulationError, SimulationReport};
use swinglab_core::rng::RngHierarchy;
use swinglab_core::strategy::{RegimeGate, Strategy};

use crate::metrics::{average_fee, average_risk_reward, mean_f64, std_dev};

/// Sub-seed label for simulation trials.
pub const TRIAL_LABEL: &str = "trial";

// ─── Configuration ───────────────────────────────────────────────────

fn default_trials() -> usize {
    20
}

fn default_master_seed() -> u64 {
    42
}

fn default_min_trades() -> usize {
    1
}

fn default_keep_reports() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McConfig {
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// 0 = rayon global pool, 1 = sequential, n = dedicated pool of n threads.
    #[serde(default)]
    pub threads: usize,
    /// Trials with fewer booked trades are excluded from aggregation.
    #[serde(default = "default_min_trades")]
    pub min_trades: usize,
    /// Exclude trials whose final capital exactly repeats an earlier one.
    #[serde(default)]
    pub dedupe_final_capital: bool,
    /// Number of included trial reports retained in full.
    #[serde(default = "default_keep_reports")]
    pub keep_reports: usize,
}

impl Default for McConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            master_seed: default_master_seed(),
            threads: 0,
            min_trades: default_min_trades(),
            dedupe_final_capital: false,
            keep_reports: default_keep_reports(),
        }
    }
}

#[derive(Debug, Error)]
pub enum McError {
    #[error("no trials left to aggregate ({excluded} excluded, {cancelled} cancelled)")]
    NoTrials { excluded: usize, cancelled: usize },
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

// ─── Result types ────────────────────────────────────────────────────

/// Headline numbers of one included trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub trial: u64,
    pub final_capital: f64,
    pub max_drawdown: f64,
    pub highest_capital: f64,
    pub trade_count: usize,
    pub win_rate: f64,
    pub avg_risk_reward: f64,
    pub avg_fee: f64,
}

impl TrialOutcome {
    fn from_report(trial: u64, report: &SimulationReport) -> Self {
        Self {
            trial,
            final_capital: report.final_capital,
            max_drawdown: report.max_drawdown,
            highest_capital: report.highest_capital,
            trade_count: report.trade_count,
            win_rate: report.win_rate(),
            avg_risk_reward: average_risk_reward(&report.trades),
            avg_fee: average_fee(&report.trades),
        }
    }
}

/// Summary statistics of one metric across trials.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub p5: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub p95: f64,
    pub max: f64,
}

impl DistributionSummary {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Self {
            mean: mean_f64(&sorted),
            std_dev: std_dev(&sorted),
            min: sorted[0],
            p5: percentile_sorted(&sorted, 5.0),
            p25: percentile_sorted(&sorted, 25.0),
            median: percentile_sorted(&sorted, 50.0),
            p75: percentile_sorted(&sorted, 75.0),
            p95: percentile_sorted(&sorted, 95.0),
            max: sorted[sorted.len() - 1],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionReport {
    pub strategy: String,
    pub master_seed: u64,
    pub trials: usize,
    pub included_trials: usize,
    pub excluded_trials: usize,
    pub cancelled_trials: usize,
    pub final_capital: DistributionSummary,
    pub max_drawdown: DistributionSummary,
    pub highest_capital: DistributionSummary,
    pub trade_count: DistributionSummary,
    pub win_rate: DistributionSummary,
    pub avg_risk_reward: DistributionSummary,
    pub avg_fee: DistributionSummary,
    /// Included trials, ascending by trial index.
    pub outcomes: Vec<TrialOutcome>,
    /// Full reports of the first `keep_reports` included trials.
    pub reports: Vec<SimulationReport>,
}

// ─── Runner ──────────────────────────────────────────────────────────

pub fn run_monte_carlo(
    strategy: &dyn Strategy,
    gate: &dyn RegimeGate,
    instruments: &[Instrument],
    sim_config: &SimulationConfig,
    mc_config: &McConfig,
    cancel: Option<&AtomicBool>,
) -> Result<DistributionReport, McError> {
    sim_config.validate().map_err(SimulationError::from)?;

    let seeds = RngHierarchy::new(mc_config.master_seed);
    let run_trial = |trial: usize| -> Option<Result<SimulationReport, SimulationError>> {
        if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
            return None;
        }
        let mut rng = seeds.rng_for(TRIAL_LABEL, trial as u64);
        Some(run_simulation(strategy, gate, instruments, sim_config, &mut rng))
    };

    let results: Vec<Option<Result<SimulationReport, SimulationError>>> = match mc_config.threads {
        1 => (0..mc_config.trials).map(run_trial).collect(),
        0 => (0..mc_config.trials).into_par_iter().map(run_trial).collect(),
        n => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
            pool.install(|| (0..mc_config.trials).into_par_iter().map(run_trial).collect())
        }
    };

    let mut outcomes = Vec::new();
    let mut reports = Vec::new();
    let mut seen_capital = HashSet::new();
    let mut excluded = 0;
    let mut cancelled = 0;

    for (trial, result) in results.into_iter().enumerate() {
        let Some(result) = result else {
            cancelled += 1;
            continue;
        };
        let report = result?;
        if report.trade_count < mc_config.min_trades {
            excluded += 1;
            continue;
        }
        if mc_config.dedupe_final_capital && !seen_capital.insert(report.final_capital.to_bits()) {
            excluded += 1;
            continue;
        }
        outcomes.push(TrialOutcome::from_report(trial as u64, &report));
        if reports.len() < mc_config.keep_reports {
            reports.push(report);
        }
    }

    if outcomes.is_empty() {
        return Err(McError::NoTrials { excluded, cancelled });
    }

    let summarize = |metric: fn(&TrialOutcome) -> f64| {
        let values: Vec<f64> = outcomes.iter().map(metric).collect();
        DistributionSummary::from_values(&values)
    };

    let report = DistributionReport {
        strategy: strategy.name().to_string(),
        master_seed: mc_config.master_seed,
        trials: mc_config.trials,
        included_trials: outcomes.len(),
        excluded_trials: excluded,
        cancelled_trials: cancelled,
        final_capital: summarize(|o| o.final_capital),
        max_drawdown: summarize(|o| o.max_drawdown),
        highest_capital: summarize(|o| o.highest_capital),
        trade_count: summarize(|o| o.trade_count as f64),
        win_rate: summarize(|o| o.win_rate),
        avg_risk_reward: summarize(|o| o.avg_risk_reward),
        avg_fee: summarize(|o| o.avg_fee),
        outcomes,
        reports,
    };

    info!(
        strategy = %report.strategy,
        included = report.included_trials,
        excluded = report.excluded_trials,
        cancelled = report.cancelled_trials,
        median_final_capital = report.final_capital.median,
        "monte carlo finished"
    );

    Ok(report)
}

/// Linear-interpolated percentile of an ascending slice; `p` in [0, 100].
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}
