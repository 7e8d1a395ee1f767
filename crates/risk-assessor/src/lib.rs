use scan_core::{DividendStock, RiskAssessment, RiskLevel};


/// Tier thresholds for the risk classification.
///
/// These are business tuning constants; deployments adjust them here rather
/// than in the decision logic.
#[derive(Debug, Clone)]
pub struct RiskThresholds {
    /// RSI above this is HIGH. Set above the classic 70: dividend names run
    /// hot just before the ex-date, and 70 filters too aggressively.
    pub rsi_high: f64,
    pub rsi_medium: f64,
    /// HIGH requires %K and %D to confirm together, so the %K bar sits above
    /// the classic 80.
    pub stochastic_k_high: f64,
    pub stochastic_d_high: f64,
    pub stochastic_k_medium: f64,
    /// Annualized volatility (percent). 50% is roughly triple the S&P 500
    /// average; the ex-date drop on such names tends to overshoot the payout.
    pub volatility_high: f64,
    pub volatility_medium: f64,
    /// 5-day return (percent). A 15% run-up in a week invites mean reversion
    /// on top of the ex-date drop.
    pub price_change_high: f64,
    pub price_change_medium: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            rsi_high: 75.0,
            rsi_medium: 65.0,
            stochastic_k_high: 85.0,
            stochastic_d_high: 80.0,
            stochastic_k_medium: 75.0,
            volatility_high: 50.0,
            volatility_medium: 35.0,
            price_change_high: 15.0,
            price_change_medium: 8.0,
        }
    }
}

/// Maps a stock's technical indicators to a three-tier risk classification.
#[derive(Debug, Clone, Default)]
pub struct RiskAssessor {
    thresholds: RiskThresholds,
}

impl RiskAssessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    /// Classify the ex-dividend-window risk for one stock.
    ///
    /// Any single HIGH condition makes the result HIGH/SKIP and only the HIGH
    /// reasons are kept; otherwise any MEDIUM condition makes it MEDIUM/HOLD;
    /// otherwise LOW/BUY. Indicators that are missing skip their check, and a
    /// stock with no indicator data at all defaults to LOW/BUY.
    pub fn assess(&self, stock: &DividendStock) -> RiskAssessment {
        let t = &self.thresholds;

        let Some(indicators) = &stock.indicators else {
            return RiskAssessment::for_level(
                RiskLevel::Low,
                vec!["no indicator data, defaulting to LOW".to_string()],
            );
        };

        let mut high_reasons: Vec<String> = Vec::new();
        let mut medium_reasons: Vec<String> = Vec::new();

        if let Some(rsi) = indicators.rsi_14 {
            if rsi > t.rsi_high {
                high_reasons.push(format!(
                    "RSI {rsi:.0} above {:.0}: severely overbought",
                    t.rsi_high
                ));
            } else if rsi > t.rsi_medium {
                medium_reasons.push(format!(
                    "RSI {rsi:.0} approaching overbought ({:.0} to {:.0})",
                    t.rsi_medium, t.rsi_high
                ));
            }
        }

        if let (Some(k), Some(d)) = (indicators.stochastic_k, indicators.stochastic_d) {
            if k > t.stochastic_k_high && d > t.stochastic_d_high {
                high_reasons.push(format!(
                    "Stochastic %K={k:.0}, %D={d:.0}: overbought zone"
                ));
            } else if k > t.stochastic_k_medium {
                medium_reasons.push(format!(
                    "Stochastic %K={k:.0} above {:.0}: caution",
                    t.stochastic_k_medium
                ));
            }
        }

        if let Some(volatility) = indicators.volatility_20d {
            if volatility > t.volatility_high {
                high_reasons.push(format!(
                    "volatility {volatility:.1}% above {:.0}%: extreme swings",
                    t.volatility_high
                ));
            } else if volatility > t.volatility_medium {
                medium_reasons.push(format!(
                    "volatility {volatility:.1}% elevated ({:.0} to {:.0}%)",
                    t.volatility_medium, t.volatility_high
                ));
            }
        }

        if let Some(change) = indicators.price_change_5d {
            if change > t.price_change_high {
                high_reasons.push(format!(
                    "+{change:.1}% in 5 days: pullback risk after the spike"
                ));
            } else if change > t.price_change_medium {
                medium_reasons.push(format!("+{change:.1}% in 5 days: overheating"));
            }
        }

        if !high_reasons.is_empty() {
            return RiskAssessment::for_level(RiskLevel::High, high_reasons);
        }
        if !medium_reasons.is_empty() {
            return RiskAssessment::for_level(RiskLevel::Medium, medium_reasons);
        }
        RiskAssessment::for_level(
            RiskLevel::Low,
            vec!["all indicators within normal range".to_string()],
        )
    }
}
