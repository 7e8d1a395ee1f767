use scan_core::{Bar, TechnicalIndicators};

use crate::indicators::{
    annualized_volatility, average_volume, price_change, rsi, stochastic,
};

pub const RSI_PERIOD: usize = 14;
pub const STOCHASTIC_K_PERIOD: usize = 14;
pub const STOCHASTIC_SMOOTH: usize = 3;
pub const STOCHASTIC_D_PERIOD: usize = 3;
pub const VOLATILITY_PERIOD: usize = 20;
pub const PRICE_CHANGE_DAYS: usize = 5;
pub const AVG_VOLUME_PERIOD: usize = 20;

/// Minimum history for the snapshot as a whole; below this the full
/// indicator set is reported as unavailable rather than partially filled.
pub const MIN_HISTORY_BARS: usize = RSI_PERIOD + STOCHASTIC_SMOOTH;

/// Compute the full indicator snapshot from daily bars.
///
/// The six indicators are independent: once past the history gate, each one
/// that lacks data is `None` without blocking the others. Percentages round
/// to 2 decimals, average volume to the nearest integer.
pub fn compute_indicators(bars: &[Bar]) -> Option<TechnicalIndicators> {
    if bars.len() < MIN_HISTORY_BARS {
        return None;
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

    let (stoch_k, stoch_d) = stochastic(
        &highs,
        &lows,
        &closes,
        STOCHASTIC_K_PERIOD,
        STOCHASTIC_SMOOTH,
        STOCHASTIC_D_PERIOD,
    );

    Some(TechnicalIndicators {
        rsi_14: rsi(&closes, RSI_PERIOD).map(round2),
        stochastic_k: stoch_k.map(round2),
        stochastic_d: stoch_d.map(round2),
        volatility_20d: annualized_volatility(&closes, VOLATILITY_PERIOD).map(round2),
        price_change_5d: price_change(&closes, PRICE_CHANGE_DAYS).map(round2),
        avg_volume_20d: average_volume(&volumes, AVG_VOLUME_PERIOD).map(|v| v.round()),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
