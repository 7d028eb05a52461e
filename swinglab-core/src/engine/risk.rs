//! Adaptive risk sizing driven by the win/loss streak of settled trades.
//!
//! The controller only changes state on settlement. Between settlements the
//! risk capital is a pure function of `fraction * sizing_capital`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskPolicy {
    /// Constant fraction.
    #[default]
    Fixed,
    /// Raise the fraction after a win streak, lower it after a loss streak,
    /// fall back to the base fraction otherwise.
    StreakScaling {
        min_win_streak: u32,
        min_loss_streak: u32,
        step: f64,
        min_risk: f64,
        max_risk: f64,
    },
    /// Stop booking trades after a loss streak until a win streak clears it.
    PauseOnLosses { max_loss_streak: u32, min_win_streak: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Fraction of sizing capital risked per trade, in (0, 1].
    pub base_fraction: f64,
    #[serde(default)]
    pub policy: RiskPolicy,
    /// Refresh the sizing capital every N booked trades; `None` refreshes on
    /// every booking.
    #[serde(default)]
    pub rebaseline_every: Option<usize>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            base_fraction: 0.12,
            policy: RiskPolicy::Fixed,
            rebaseline_every: Some(20),
        }
    }
}

/// Whether a settled trade is booked or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Book,
    Discard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskController {
    config: RiskConfig,
    fraction: f64,
    win_streak: u32,
    loss_streak: u32,
    paused: bool,
    sizing_capital: f64,
    booked: usize,
}

impl RiskController {
    pub fn new(config: RiskConfig, starting_capital: f64) -> Self {
        Self {
            fraction: config.base_fraction,
            config,
            win_streak: 0,
            loss_streak: 0,
            paused: false,
            sizing_capital: starting_capital,
            booked: 0,
        }
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn sizing_capital(&self) -> f64 {
        self.sizing_capital
    }

    pub fn risk_capital(&self) -> f64 {
        self.fraction * self.sizing_capital
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn win_streak(&self) -> u32 {
        self.win_streak
    }

    pub fn loss_streak(&self) -> u32 {
        self.loss_streak
    }

    /// Register a settled trade. Streaks always count; the returned decision
    /// reflects the pause state *before* this trade's outcome is applied.
    pub fn on_settle(&mut self, is_winner: bool) -> Settlement {
        if is_winner {
            self.win_streak += 1;
            self.loss_streak = 0;
        } else {
            self.loss_streak += 1;
            self.win_streak = 0;
        }

        let decision = if self.paused {
            Settlement::Discard
        } else {
            Settlement::Book
        };

        match self.config.policy {
            RiskPolicy::Fixed => {}
            RiskPolicy::StreakScaling {
                min_win_streak,
                min_loss_streak,
                step,
                min_risk,
                max_risk,
            } => {
                if self.win_streak >= min_win_streak {
                    self.fraction = (self.fraction + step).min(max_risk);
                } else if self.loss_streak >= min_loss_streak {
                    self.fraction = (self.fraction - step).max(min_risk);
                } else {
                    self.fraction = self.config.base_fraction;
                }
            }
            RiskPolicy::PauseOnLosses {
                max_loss_streak,
                min_win_streak,
            } => {
                if self.loss_streak >= max_loss_streak {
                    self.paused = true;
                }
                if self.win_streak >= min_win_streak {
                    self.paused = false;
                }
            }
        }

        decision
    }

    /// Called after a trade was booked into `capital`.
    pub fn on_booked(&mut self, capital: f64) {
        self.booked += 1;
        let refresh = match self.config.rebaseline_every {
            None => true,
            Some(n) => n > 0 && self.booked % n == 0,
        };
        if refresh {
            self.sizing_capital = capital;
        }
    }
}
