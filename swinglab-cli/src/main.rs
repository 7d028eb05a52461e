//! SwingLab CLI: simulation, Monte Carlo, entry-scan and exit-check commands.
//!
//! Commands:
//! - `simulate`: one walk-forward simulation from a TOML run config
//! - `monte-carlo`: repeat the simulation with independent seeds and summarize
//! - `find-trades`: list the entries the configured strategy signals on one date
//! - `should-exit`: replay the stop/trailing state machine for an open position
//!
//! Logging goes to stderr through `tracing`; set `RUST_LOG` to change the level.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use swinglab_core::data::BarSeries;
use swinglab_core::domain::{AssetClass, Direction, TradeIntent};
use swinglab_core::engine::{should_exit, SimulationReport, TrailingConfig};
use swinglab_core::rng::RngHierarchy;
use swinglab_core::run_simulation;
use swinglab_runner::export::{save_distribution, save_simulation};
use swinglab_runner::monte_carlo::TRIAL_LABEL;
use swinglab_runner::scan::SCAN_LABEL;
use swinglab_runner::{
    create_gate, create_strategy, find_trades, load_instrument, load_universe, run_monte_carlo,
    DistributionArtifact, DistributionReport, DistributionSummary, RunConfig, SimulationArtifact,
};

#[derive(Parser)]
#[command(name = "swinglab", about = "SwingLab CLI: walk-forward swing-trading simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single simulation from a TOML config file.
    Simulate {
        /// Path to the run config.
        #[arg(long)]
        config: PathBuf,

        /// Seed override. Defaults to the config's master seed, so the run
        /// matches Monte Carlo trial 0.
        #[arg(long)]
        seed: Option<u64>,

        /// Directory for report.json and trades.csv.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run a Monte Carlo study from a TOML config file.
    MonteCarlo {
        /// Path to the run config.
        #[arg(long)]
        config: PathBuf,

        /// Override the configured trial count.
        #[arg(long)]
        trials: Option<usize>,

        /// Override the configured worker threads (0 = all cores).
        #[arg(long)]
        threads: Option<usize>,

        /// Directory for distribution.json and outcomes.csv.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the trades the configured strategy would enter on one date.
    FindTrades {
        /// Path to the run config.
        #[arg(long)]
        config: PathBuf,

        /// Scan date (YYYY-MM-DD).
        #[arg(long)]
        date: NaiveDate,

        /// Seed override for strategies that draw random numbers.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Check whether an open position should be closed, given its bar file.
    ShouldExit {
        /// CSV bar file for the instrument.
        #[arg(long)]
        bars: PathBuf,

        #[arg(long, value_enum, default_value_t = Side::Long)]
        side: Side,

        /// Entry date (YYYY-MM-DD); only later bars are replayed.
        #[arg(long)]
        entry_date: NaiveDate,

        #[arg(long)]
        entry_price: f64,

        #[arg(long)]
        stop: f64,

        #[arg(long)]
        target: Option<f64>,

        /// Disable the ATR trailing stop.
        #[arg(long, default_value_t = false)]
        no_trailing: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    Long,
    Short,
}

impl From<Side> for Direction {
    fn from(side: Side) -> Self {
        match side {
            Side::Long => Direction::Long,
            Side::Short => Direction::Short,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate { config, seed, out } => run_simulate(&config, seed, out.as_deref()),
        Commands::MonteCarlo { config, trials, threads, out } => {
            run_monte_carlo_cmd(&config, trials, threads, out.as_deref())
        }
        Commands::FindTrades { config, date, seed } => run_find_trades(&config, date, seed),
        Commands::ShouldExit { bars, side, entry_date, entry_price, stop, target, no_trailing } => {
            run_should_exit(&bars, side.into(), entry_date, entry_price, stop, target, no_trailing)
        }
    }
}

fn load_config(path: &Path) -> Result<RunConfig> {
    let config = RunConfig::load(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    debug!(path = %path.display(), fingerprint = %config.fingerprint()?, "loaded run config");
    Ok(config)
}

fn run_simulate(config_path: &Path, seed: Option<u64>, out: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let universe = load_universe(&config.data)
        .with_context(|| format!("failed to load bars from {}", config.data.dir.display()))?;
    let strategy = create_strategy(&config.strategy);
    let gate = create_gate(&config.gate, &universe)?;

    let seed = seed.unwrap_or(config.monte_carlo.master_seed);
    let mut rng = RngHierarchy::new(seed).rng_for(TRIAL_LABEL, 0);
    let report =
        run_simulation(strategy.as_ref(), gate.as_ref(), &universe, &config.simulation, &mut rng)?;

    let artifact = SimulationArtifact::new(report, Some(config.fingerprint()?));
    print_simulation(&artifact, seed);

    if let Some(dir) = out {
        save_simulation(&artifact, dir)?;
        println!("Artifacts saved to: {}", dir.display());
    }
    Ok(())
}

fn run_monte_carlo_cmd(
    config_path: &Path,
    trials: Option<usize>,
    threads: Option<usize>,
    out: Option<&Path>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(trials) = trials {
        config.monte_carlo.trials = trials;
    }
    if let Some(threads) = threads {
        config.monte_carlo.threads = threads;
    }

    let universe = load_universe(&config.data)
        .with_context(|| format!("failed to load bars from {}", config.data.dir.display()))?;
    let strategy = create_strategy(&config.strategy);
    let gate = create_gate(&config.gate, &universe)?;

    let dist = run_monte_carlo(
        strategy.as_ref(),
        gate.as_ref(),
        &universe,
        &config.simulation,
        &config.monte_carlo,
        None,
    )?;
    print_distribution(&dist);

    if let Some(dir) = out {
        let artifact = DistributionArtifact::new(dist, Some(config.fingerprint()?));
        save_distribution(&artifact, dir)?;
        println!("Artifacts saved to: {}", dir.display());
    }
    Ok(())
}

fn run_find_trades(config_path: &Path, date: NaiveDate, seed: Option<u64>) -> Result<()> {
    let config = load_config(config_path)?;
    let universe = load_universe(&config.data)
        .with_context(|| format!("failed to load bars from {}", config.data.dir.display()))?;
    let strategy = create_strategy(&config.strategy);
    let gate = create_gate(&config.gate, &universe)?;

    let seed = seed.unwrap_or(config.monte_carlo.master_seed);
    let mut rng = RngHierarchy::new(seed).rng_for(SCAN_LABEL, 0);
    let intents =
        find_trades(strategy.as_ref(), gate.as_ref(), &universe, &config.simulation, date, &mut rng);
    print_intents(strategy.name(), date, &intents);
    Ok(())
}

fn run_should_exit(
    bars_path: &Path,
    direction: Direction,
    entry_date: NaiveDate,
    entry_price: f64,
    stop: f64,
    target: Option<f64>,
    no_trailing: bool,
) -> Result<()> {
    let symbol = bars_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let instrument = load_instrument(bars_path, &symbol, AssetClass::Equity)
        .with_context(|| format!("failed to load bars from {}", bars_path.display()))?;

    let intent = TradeIntent::new(symbol, direction, entry_date, entry_price, stop, target);
    let since_entry = instrument.next_n_bars(entry_date, usize::MAX);
    let trailing = (!no_trailing).then(TrailingConfig::default);
    let exit = should_exit(&intent, entry_price, since_entry, trailing.as_ref());

    println!(
        "{} {:?} from {} @ {:.4} ({} bars since entry): {}",
        intent.symbol,
        direction,
        entry_date,
        entry_price,
        since_entry.len(),
        if exit { "EXIT" } else { "HOLD" }
    );
    Ok(())
}

// ─── Output ──────────────────────────────────────────────────────────

fn print_simulation(artifact: &SimulationArtifact, seed: u64) {
    let report: &SimulationReport = &artifact.report;
    let m = &artifact.metrics;
    println!();
    println!("=== Simulation ===");
    println!("Strategy:        {}", report.strategy);
    println!("Period:          {} to {}", report.start, report.end);
    println!("Seed:            {seed}");
    println!("Trades:          {} ({} discarded)", report.trade_count, report.discarded_trades);
    println!();
    println!("--- Capital ---");
    println!("Starting:        {:.2}", report.starting_capital);
    println!("Final:           {:.2}", report.final_capital);
    println!("Highest:         {:.2}", report.highest_capital);
    println!("Total Return:    {:.2}%", m.total_return * 100.0);
    println!("CAGR:            {:.2}%", m.cagr * 100.0);
    println!("Max Drawdown:    {:.2}%", report.max_drawdown * 100.0);
    println!();
    println!("--- Trades ---");
    println!("Win Rate:        {:.1}%", m.win_rate * 100.0);
    println!("Profit Factor:   {:.2}", m.profit_factor);
    println!("Avg R/R:         {:.2}", m.avg_risk_reward);
    println!("Avg Fee:         {:.2}", m.avg_fee);
    println!("Avg Bars Held:   {:.1}", m.avg_bars_held);
    println!("Max Consec Win:  {}", m.max_consecutive_wins);
    println!("Max Consec Loss: {}", m.max_consecutive_losses);
    println!();
}

fn print_intents(strategy: &str, date: NaiveDate, intents: &[TradeIntent]) {
    println!();
    println!("=== {strategy} entries on {date} ===");
    if intents.is_empty() {
        println!("No trades.");
        println!();
        return;
    }
    println!("{:<10} {:<6} {:>12} {:>12} {:>12}", "Symbol", "Side", "Entry", "Stop", "Target");
    println!("{}", "-".repeat(56));
    for t in intents {
        let target = t.take_profit.map_or_else(|| "-".to_string(), |p| format!("{p:.4}"));
        println!(
            "{:<10} {:<6} {:>12.4} {:>12.4} {:>12}",
            t.symbol,
            format!("{:?}", t.direction),
            t.reference_price,
            t.stop_loss,
            target
        );
    }
    println!();
}

fn print_distribution(dist: &DistributionReport) {
    println!();
    println!("=== Monte Carlo ===");
    println!("Strategy:        {}", dist.strategy);
    println!("Master Seed:     {}", dist.master_seed);
    println!(
        "Trials:          {} included, {} excluded, {} cancelled",
        dist.included_trials, dist.excluded_trials, dist.cancelled_trials
    );
    println!();
    println!(
        "{:<16} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "Metric", "Mean", "P5", "Median", "P95", "Std Dev"
    );
    println!("{}", "-".repeat(82));
    print_row("Final Capital", &dist.final_capital);
    print_row("Highest Capital", &dist.highest_capital);
    print_row("Max Drawdown", &dist.max_drawdown);
    print_row("Trades", &dist.trade_count);
    print_row("Win Rate", &dist.win_rate);
    print_row("Avg R/R", &dist.avg_risk_reward);
    print_row("Avg Fee", &dist.avg_fee);
    println!();
}

fn print_row(label: &str, s: &DistributionSummary) {
    println!(
        "{:<16} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4}",
        label, s.mean, s.p5, s.median, s.p95, s.std_dev
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_should_exit_arguments() {
        let cli = Cli::try_parse_from([
            "swinglab",
            "should-exit",
            "--bars",
            "data/AAA.csv",
            "--side",
            "short",
            "--entry-date",
            "2024-03-01",
            "--entry-price",
            "50",
            "--stop",
            "55",
        ])
        .unwrap();
        match cli.command {
            Commands::ShouldExit { side, target, no_trailing, entry_date, .. } => {
                assert!(matches!(side, Side::Short));
                assert_eq!(target, None);
                assert!(!no_trailing);
                assert_eq!(entry_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
            }
            _ => panic!("expected should-exit"),
        }
    }

    #[test]
    fn parses_find_trades_arguments() {
        let cli = Cli::try_parse_from([
            "swinglab",
            "find-trades",
            "--config",
            "run.toml",
            "--date",
            "2024-06-03",
        ])
        .unwrap();
        match cli.command {
            Commands::FindTrades { config, date, seed } => {
                assert_eq!(config, PathBuf::from("run.toml"));
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
                assert_eq!(seed, None);
            }
            _ => panic!("expected find-trades"),
        }
    }

    #[test]
    fn find_trades_rejects_malformed_date() {
        let parsed = Cli::try_parse_from([
            "swinglab",
            "find-trades",
            "--config",
            "run.toml",
            "--date",
            "06/03/2024",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn monte_carlo_overrides_are_optional() {
        let cli =
            Cli::try_parse_from(["swinglab", "monte-carlo", "--config", "run.toml", "--trials", "5"])
                .unwrap();
        match cli.command {
            Commands::MonteCarlo { trials, threads, out, .. } => {
                assert_eq!(trials, Some(5));
                assert_eq!(threads, None);
                assert!(out.is_none());
            }
            _ => panic!("expected monte-carlo"),
        }
    }
}
