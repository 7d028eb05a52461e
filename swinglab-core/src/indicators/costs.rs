//! Execution cost estimators: a stochastic bid/ask spread and a broker fee.
//!
//! The spread scales with volatility and inversely with liquidity:
//! magnitude ~ U[0, 100 / sqrt(avg_volume) * ATR14). It is returned as a
//! signed *entry offset* in price space. Entries fill at `price + offset` and
//! exits at `price - offset`, so a positive offset always hurts a long.

use rand::rngs::StdRng;
use rand::Rng;

use super::atr::simple_atr;
use crate::domain::{Bar, Direction};

const SPREAD_ATR_PERIOD: usize = 14;
const SPREAD_VOLUME_SCALE: f64 = 100.0;

/// Mean volume of the window; 0.0 when empty.
pub fn average_volume(bars: &[Bar]) -> f64 {
    if bars.is_empty() {
        return 0.0;
    }
    bars.iter().map(|b| b.volume).sum::<f64>() / bars.len() as f64
}

/// Upper bound of the spread magnitude for a window.
pub fn max_spread(bars: &[Bar]) -> f64 {
    let avg_volume = average_volume(bars);
    if avg_volume <= 0.0 {
        return 0.0;
    }
    SPREAD_VOLUME_SCALE / avg_volume.sqrt() * simple_atr(bars, SPREAD_ATR_PERIOD)
}

/// Draw a spread for `direction` over `bars`.
///
/// Without a bias the draw is always adverse. With `Some(p)` it is adverse
/// with probability `p` (clamped to [0, 1]) and favorable otherwise.
/// Zero average volume returns 0.0 without touching the RNG.
pub fn spread(
    bars: &[Bar],
    bias_probability: Option<f64>,
    direction: Direction,
    rng: &mut StdRng,
) -> f64 {
    let upper = max_spread(bars);
    if upper <= 0.0 || !upper.is_finite() {
        return 0.0;
    }

    let magnitude = rng.gen::<f64>() * upper;
    let adverse = match bias_probability {
        Some(p) => rng.gen::<f64>() < p.clamp(0.0, 1.0),
        None => true,
    };

    if adverse {
        direction.sign() * magnitude
    } else {
        -direction.sign() * magnitude
    }
}

/// Broker fee: 0.005 per share with a 1.0 minimum, capped at 1% of notional.
pub fn fee(share_count: f64, notional: f64) -> f64 {
    (0.01 * notional).min((share_count * 0.005).max(1.0))
}
