//! Simulation configuration and its validation.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::resolver::ResolverConfig;
use super::risk::{RiskConfig, RiskPolicy};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("max_pyramid_slots must be >= 1")]
    NoSlots,
    #[error("max_trades_per_day must be >= 1")]
    NoTradesPerDay,
    #[error("starting capital must be positive, got {0}")]
    NonPositiveCapital(f64),
    #[error("min_capital must be non-negative, got {0}")]
    NegativeMinCapital(f64),
    #[error("end date {end} must be after start date {start}")]
    EmptyWindow { start: NaiveDate, end: NaiveDate },
    #[error("risk fraction must be in (0, 1], got {0}")]
    RiskFraction(f64),
    #[error("notional cap multiple must be positive, got {0}")]
    NotionalCap(f64),
    #[error("invalid date step: {0}")]
    DateStep(String),
    #[error("invalid risk policy: {0}")]
    RiskPolicy(String),
    #[error("invalid resolver settings: {0}")]
    Resolver(String),
}

/// How far the simulation clock advances after a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateStep {
    Fixed { days: u32 },
    /// Uniform in `[min_days, max_days]`, inclusive.
    Uniform { min_days: u32, max_days: u32 },
}

impl Default for DateStep {
    fn default() -> Self {
        Self::Uniform { min_days: 1, max_days: 4 }
    }
}

impl DateStep {
    pub fn draw(&self, rng: &mut StdRng) -> Duration {
        let days = match *self {
            DateStep::Fixed { days } => days,
            DateStep::Uniform { min_days, max_days } => rng.gen_range(min_days..=max_days),
        };
        Duration::days(i64::from(days))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            DateStep::Fixed { days: 0 } => Err(ConfigError::DateStep("fixed step of 0 days".into())),
            DateStep::Uniform { min_days, max_days } if min_days == 0 || min_days > max_days => {
                Err(ConfigError::DateStep(format!(
                    "uniform range [{min_days}, {max_days}] must satisfy 1 <= min <= max"
                )))
            }
            _ => Ok(()),
        }
    }
}

fn default_slots() -> usize {
    5
}

fn default_trades_per_day() -> usize {
    1
}

fn default_min_capital() -> f64 {
    20.0
}

fn default_true() -> bool {
    true
}

fn default_notional_cap() -> f64 {
    3.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub starting_capital: f64,
    #[serde(default = "default_slots")]
    pub max_pyramid_slots: usize,
    #[serde(default = "default_trades_per_day")]
    pub max_trades_per_day: usize,
    /// Hard stop: the run ends once running capital drops below this.
    #[serde(default = "default_min_capital")]
    pub min_capital: f64,
    #[serde(default)]
    pub date_step: DateStep,
    #[serde(default = "default_true")]
    pub skip_weekends: bool,
    /// Skip weekdays on which no eligible instrument has a bar (holidays).
    #[serde(default = "default_true")]
    pub skip_closed_days: bool,
    /// Entry notional is capped at this multiple of sizing capital.
    #[serde(default = "default_notional_cap")]
    pub notional_cap_multiple: f64,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl SimulationConfig {
    /// Config with default policies for the given window and capital.
    pub fn new(start: NaiveDate, end: NaiveDate, starting_capital: f64) -> Self {
        Self {
            start,
            end,
            starting_capital,
            max_pyramid_slots: default_slots(),
            max_trades_per_day: default_trades_per_day(),
            min_capital: default_min_capital(),
            date_step: DateStep::default(),
            skip_weekends: true,
            skip_closed_days: true,
            notional_cap_multiple: default_notional_cap(),
            risk: RiskConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pyramid_slots == 0 {
            return Err(ConfigError::NoSlots);
        }
        if self.max_trades_per_day == 0 {
            return Err(ConfigError::NoTradesPerDay);
        }
        if !(self.starting_capital > 0.0) || !self.starting_capital.is_finite() {
            return Err(ConfigError::NonPositiveCapital(self.starting_capital));
        }
        if !(self.min_capital >= 0.0) {
            return Err(ConfigError::NegativeMinCapital(self.min_capital));
        }
        if self.end <= self.start {
            return Err(ConfigError::EmptyWindow { start: self.start, end: self.end });
        }
        if !(self.notional_cap_multiple > 0.0) {
            return Err(ConfigError::NotionalCap(self.notional_cap_multiple));
        }
        check_fraction(self.risk.base_fraction)?;
        check_policy(&self.risk.policy)?;
        self.date_step.validate()?;
        self.resolver.validate()
    }
}

fn check_fraction(f: f64) -> Result<(), ConfigError> {
    if f > 0.0 && f <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::RiskFraction(f))
    }
}

fn check_policy(policy: &RiskPolicy) -> Result<(), ConfigError> {
    match *policy {
        RiskPolicy::Fixed => Ok(()),
        RiskPolicy::StreakScaling {
            min_win_streak,
            min_loss_streak,
            step,
            min_risk,
            max_risk,
        } => {
            if min_win_streak == 0 || min_loss_streak == 0 {
                return Err(ConfigError::RiskPolicy("streak lengths must be >= 1".into()));
            }
            if !(step > 0.0) {
                return Err(ConfigError::RiskPolicy(format!("step must be positive, got {step}")));
            }
            if min_risk > max_risk {
                return Err(ConfigError::RiskPolicy(format!(
                    "min_risk {min_risk} exceeds max_risk {max_risk}"
                )));
            }
            check_fraction(min_risk)?;
            check_fraction(max_risk)
        }
        RiskPolicy::PauseOnLosses { max_loss_streak, min_win_streak } => {
            if max_loss_streak == 0 || min_win_streak == 0 {
                return Err(ConfigError::RiskPolicy("streak lengths must be >= 1".into()));
            }
            Ok(())
        }
    }
}
