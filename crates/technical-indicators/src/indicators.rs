//! Final-value indicator math over chronologically ordered series.
//!
//! Missing data is carried as NaN exactly where a rolling computation has no
//! defined value (warm-up prefix, zero-range stochastic window) and converted
//! to `None` only at the final-value read.

/// Trading days used to annualize daily volatility
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Relative Strength Index via Wilder's smoothing.
///
/// The gain/loss averages are exponential moving averages with alpha = 1/period
/// seeded from the first day-over-day change (adjust=False semantics). Returns
/// `None` with fewer than `period + 1` closes or when the result is not finite;
/// a loss-free series legitimately yields 100.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let alpha = 1.0 / period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for (i, pair) in closes.windows(2).enumerate() {
        let change = pair[1] - pair[0];
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, -change)
        };

        if i == 0 {
            avg_gain = gain;
            avg_loss = loss;
        } else {
            avg_gain += alpha * (gain - avg_gain);
            avg_loss += alpha * (loss - avg_loss);
        }
    }

    let rs = avg_gain / avg_loss;
    let value = 100.0 - 100.0 / (1.0 + rs);
    value.is_finite().then_some(value)
}

/// Stochastic oscillator, smoothed %K and %D.
///
/// Raw %K = (close - low_n) / (high_n - low_n) * 100 over a rolling
/// `k_period` window; a zero-range window is treated as missing, not zero.
/// Smoothed %K is an SMA(`smooth`) of raw %K and %D an SMA(`d_period`) of
/// smoothed %K, each missing while its window still contains a missing
/// sample. The two final values resolve to `None` independently.
pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_period: usize,
    smooth: usize,
    d_period: usize,
) -> (Option<f64>, Option<f64>) {
    let n = closes.len();
    if k_period == 0
        || smooth == 0
        || d_period == 0
        || highs.len() != n
        || lows.len() != n
        || n < k_period + smooth
    {
        return (None, None);
    }

    let mut raw_k = vec![f64::NAN; n];
    for i in k_period - 1..n {
        let window_low = lows[i + 1 - k_period..=i]
            .iter()
            .fold(f64::INFINITY, |a, &b| a.min(b));
        let window_high = highs[i + 1 - k_period..=i]
            .iter()
            .fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let range = window_high - window_low;
        if range > 0.0 {
            raw_k[i] = (closes[i] - window_low) / range * 100.0;
        }
    }

    let k_smoothed = rolling_mean(&raw_k, smooth);
    let d = rolling_mean(&k_smoothed, d_period);

    (finite_last(&k_smoothed), finite_last(&d))
}

/// Annualized volatility: sample standard deviation of the most recent
/// `period` daily simple returns, scaled by sqrt(252) and expressed as a
/// percent. Needs `period + 1` closes.
pub fn annualized_volatility(closes: &[f64], period: usize) -> Option<f64> {
    if period < 2 || closes.len() < period + 1 {
        return None;
    }

    let returns: Vec<f64> = closes
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect();
    let recent = &returns[returns.len() - period..];

    let mean = recent.iter().sum::<f64>() / period as f64;
    let variance =
        recent.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (period as f64 - 1.0);
    let daily_std = variance.sqrt();

    if !daily_std.is_finite() {
        return None;
    }
    Some(daily_std * TRADING_DAYS_PER_YEAR.sqrt() * 100.0)
}

/// Percent change between the last close and the close `days` trading days
/// prior. Needs `days + 1` closes and a non-zero reference price.
pub fn price_change(closes: &[f64], days: usize) -> Option<f64> {
    if days == 0 || closes.len() < days + 1 {
        return None;
    }

    let current = closes[closes.len() - 1];
    let past = closes[closes.len() - 1 - days];
    if past == 0.0 {
        return None;
    }
    Some((current - past) / past * 100.0)
}

/// Simple mean of the most recent `period` volume observations.
pub fn average_volume(volumes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || volumes.len() < period {
        return None;
    }

    let recent = &volumes[volumes.len() - period..];
    let avg = recent.iter().sum::<f64>() / period as f64;
    avg.is_finite().then_some(avg)
}

/// SMA over a fixed window; positions without a full window stay NaN, and a
/// NaN sample anywhere in the window keeps that position NaN.
fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    for i in window - 1..values.len() {
        let sum: f64 = values[i + 1 - window..=i].iter().sum();
        result[i] = sum / window as f64;
    }
    result
}

fn finite_last(values: &[f64]) -> Option<f64> {
    values.last().copied().filter(|v| v.is_finite())
}
