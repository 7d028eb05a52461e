//! Factory: converts run configuration into runtime trait objects.

use swinglab_core::domain::Instrument;
use swinglab_core::strategy::{
    AlwaysOpen, ChoppinessTrend, RegimeGate, SmaTrendGate, Strategy, ZScoreReversion,
};

use crate::config::{GateConfig, RunnerConfigError, StrategyConfig};

// ─── Strategy factory ────────────────────────────────────────────────

pub fn create_strategy(config: &StrategyConfig) -> Box<dyn Strategy> {
    match config {
        StrategyConfig::ChoppinessTrend(params) => Box::new(ChoppinessTrend::new(params.clone())),
        StrategyConfig::ZscoreReversion(params) => Box::new(ZScoreReversion::new(params.clone())),
    }
}

// ─── Gate factory ────────────────────────────────────────────────────

/// Build the regime gate. An SMA trend gate needs its index among
/// `instruments`.
pub fn create_gate(
    config: &GateConfig,
    instruments: &[Instrument],
) -> Result<Box<dyn RegimeGate>, RunnerConfigError> {
    match config {
        GateConfig::AlwaysOpen => Ok(Box::new(AlwaysOpen)),
        GateConfig::SmaTrend { index, period } => {
            let instrument = instruments
                .iter()
                .find(|i| &i.symbol == index)
                .ok_or_else(|| RunnerConfigError::MissingIndex(index.clone()))?;
            Ok(Box::new(SmaTrendGate::new(instrument.clone(), *period)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use swinglab_core::domain::{AssetClass, Bar};
    use swinglab_core::strategy::{ChoppinessTrendParams, ZScoreReversionParams};

    fn index(symbol: &str) -> Instrument {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars = vec![Bar::new(date, 1.0, 1.0, 1.0, 1.0, 0.0)];
        Instrument::new(symbol, AssetClass::Index, bars).unwrap()
    }

    #[test]
    fn builds_each_strategy() {
        let chop = create_strategy(&StrategyConfig::ChoppinessTrend(ChoppinessTrendParams::default()));
        assert_eq!(chop.name(), "choppiness_trend");
        let z = create_strategy(&StrategyConfig::ZscoreReversion(ZScoreReversionParams::default()));
        assert_eq!(z.name(), "zscore_reversion");
        assert_eq!(z.lookback(), 720);
    }

    #[test]
    fn sma_gate_requires_its_index() {
        let config = GateConfig::SmaTrend { index: "SPY".into(), period: 200 };
        let err = create_gate(&config, &[index("QQQ")]).err().unwrap();
        assert!(matches!(err, RunnerConfigError::MissingIndex(s) if s == "SPY"));
        assert!(create_gate(&config, &[index("QQQ"), index("SPY")]).is_ok());
    }

    #[test]
    fn always_open_gate() {
        let gate = create_gate(&GateConfig::AlwaysOpen, &[]).unwrap();
        assert!(gate.allows(NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()));
    }
}
