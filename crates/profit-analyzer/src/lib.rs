use scan_core::{DividendProfitAnalysis, DividendStock};

/// Payments per year assumed when only the annual dividend amount is known.
/// Most US dividend payers distribute quarterly.
const QUARTERLY_PAYMENTS_PER_YEAR: f64 = 4.0;

/// Tuning constants for the post-tax profitability estimate.
#[derive(Debug, Clone)]
pub struct ProfitConfig {
    /// Effective withholding rate on dividend income (percent).
    /// 15.4 = 14% income tax + 1.4% local surtax for KR residents holding US stock.
    pub tax_rate_pct: f64,
    /// Ceiling on the volatility correction: even at extreme volatility the
    /// estimated drop never exceeds 1.5x the per-payment amount.
    pub volatility_factor_cap: f64,
    /// Net profit within this band (percent) counts as break-even, covering
    /// commissions and slippage. Venues with different cost structures tune it.
    pub breakeven_band_pct: f64,
}

impl Default for ProfitConfig {
    fn default() -> Self {
        Self {
            tax_rate_pct: 15.4,
            volatility_factor_cap: 0.5,
            breakeven_band_pct: 0.3,
        }
    }
}

/// Estimates whether the dividend beats the expected ex-date price drop
/// after withholding tax.
#[derive(Debug, Clone, Default)]
pub struct ProfitAnalyzer {
    config: ProfitConfig,
}

impl ProfitAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ProfitConfig) -> Self {
        Self { config }
    }

    /// Analyze post-tax profitability for one stock.
    ///
    /// net yield = gross x (1 - tax/100); the estimated ex-date drop starts
    /// from the per-payment dividend over the current price and widens with
    /// 20-day volatility (capped). The profitability decision and the
    /// break-even band evaluate unrounded values; stored fields round to 2
    /// decimals.
    pub fn analyze(&self, stock: &DividendStock) -> DividendProfitAnalysis {
        let gross_yield = stock.dividend_yield;
        let net_yield = gross_yield * (1.0 - self.config.tax_rate_pct / 100.0);

        let estimated_drop = self.estimate_ex_date_drop(stock);
        let net_profit = net_yield - estimated_drop;
        let is_profitable = net_profit > 0.0;
        let verdict = self.build_verdict(net_profit, net_yield, estimated_drop);

        DividendProfitAnalysis {
            gross_dividend_yield: round2(gross_yield),
            tax_rate: self.config.tax_rate_pct,
            net_dividend_yield: round2(net_yield),
            estimated_ex_date_drop: round2(estimated_drop),
            net_profit_yield: round2(net_profit),
            is_profitable,
            verdict,
        }
    }

    /// Estimated ex-date price drop as a percent of the current price.
    ///
    /// Uses the last actual single-payment dividend when available; the
    /// annual amount divided by four would overstate the drop roughly 4x for
    /// quarterly payers. Without a usable price or payment amount the drop
    /// degrades to a quarter of the gross yield.
    fn estimate_ex_date_drop(&self, stock: &DividendStock) -> f64 {
        let mut per_payment = stock.last_dividend_value;
        if per_payment <= 0.0 {
            per_payment = stock.dividend_amount / QUARTERLY_PAYMENTS_PER_YEAR;
        }

        if stock.current_price <= 0.0 || per_payment <= 0.0 {
            return stock.dividend_yield / QUARTERLY_PAYMENTS_PER_YEAR;
        }

        let base_drop = per_payment / stock.current_price * 100.0;

        let volatility_factor = stock
            .indicators
            .as_ref()
            .and_then(|ind| ind.volatility_20d)
            .map(|vol| (vol / 100.0).min(self.config.volatility_factor_cap))
            .unwrap_or(0.0);

        base_drop * (1.0 + volatility_factor)
    }

    fn build_verdict(&self, net_profit: f64, net_yield: f64, estimated_drop: f64) -> String {
        if net_profit.abs() <= self.config.breakeven_band_pct {
            return format!(
                "Near break-even (net dividend {net_yield:.2}% vs estimated drop {estimated_drop:.2}%)"
            );
        }
        if net_profit > 0.0 {
            return format!(
                "Expected +{net_profit:.2}% after tax (dividend {net_yield:.2}% minus drop {estimated_drop:.2}%)"
            );
        }
        format!(
            "Expected {net_profit:.2}% loss after tax (drop {estimated_drop:.2}% exceeds net dividend {net_yield:.2}%)"
        )
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use scan_core::TechnicalIndicators;

    fn stock(
        yield_pct: f64,
        price: f64,
        last_dividend: f64,
        annual: f64,
        volatility: Option<f64>,
    ) -> DividendStock {
        DividendStock {
            ticker: "KO".to_string(),
            company_name: "Coca-Cola".to_string(),
            ex_dividend_date: NaiveDate::from_ymd_opt(2026, 3, 13).unwrap(),
            dividend_yield: yield_pct,
            dividend_amount: annual,
            last_dividend_value: last_dividend,
            market_cap: 260_000_000_000,
            current_price: price,
            reference_url: "https://finance.yahoo.com/quote/KO".to_string(),
            indicators: volatility.map(|v| TechnicalIndicators {
                volatility_20d: Some(v),
                ..Default::default()
            }),
            risk: None,
            profit_analysis: None,
        }
    }

    #[test]
    fn net_yield_applies_withholding_rate() {
        let analysis = ProfitAnalyzer::new().analyze(&stock(4.0, 100.0, 1.0, 4.0, None));
        let expected = (4.0 * (1.0 - 15.4 / 100.0) * 100.0_f64).round() / 100.0;
        assert!((analysis.net_dividend_yield - expected).abs() < 0.01);
        assert!((analysis.net_dividend_yield - 3.38).abs() < 0.01);
    }

    #[test]
    fn prefers_last_payment_over_annual_quarter() {
        // last payment 2.85 vs annual/4 = 1.0: the drop must come from 2.85
        let analysis = ProfitAnalyzer::new().analyze(&stock(4.0, 100.0, 2.85, 4.0, None));
        assert!((analysis.estimated_ex_date_drop - 2.85).abs() < 0.01);
    }

    #[test]
    fn falls_back_to_quarterly_approximation() {
        let analysis = ProfitAnalyzer::new().analyze(&stock(4.0, 100.0, 0.0, 4.0, None));
        assert!((analysis.estimated_ex_date_drop - 1.0).abs() < 0.01);
    }

    #[test]
    fn degrades_to_quarter_yield_without_price() {
        let analysis = ProfitAnalyzer::new().analyze(&stock(4.0, 0.0, 2.85, 4.0, None));
        assert!((analysis.estimated_ex_date_drop - 1.0).abs() < 0.01);
    }

    #[test]
    fn degrades_to_quarter_yield_without_payment_amount() {
        let analysis = ProfitAnalyzer::new().analyze(&stock(4.0, 100.0, 0.0, 0.0, None));
        assert!((analysis.estimated_ex_date_drop - 1.0).abs() < 0.01);
    }

    #[test]
    fn volatility_widens_the_drop() {
        let calm = ProfitAnalyzer::new().analyze(&stock(4.0, 100.0, 1.0, 4.0, None));
        let rough = ProfitAnalyzer::new().analyze(&stock(4.0, 100.0, 1.0, 4.0, Some(30.0)));
        assert!((calm.estimated_ex_date_drop - 1.0).abs() < 0.01);
        assert!((rough.estimated_ex_date_drop - 1.3).abs() < 0.01);
    }

    #[test]
    fn volatility_factor_is_capped() {
        // Any volatility at or above 50% caps the multiplier at exactly 1.5x
        for vol in [50.0, 80.0, 200.0] {
            let analysis = ProfitAnalyzer::new().analyze(&stock(4.0, 100.0, 1.0, 4.0, Some(vol)));
            assert!((analysis.estimated_ex_date_drop - 1.5).abs() < 0.01);
        }
    }

    #[test]
    fn break_even_scenario() {
        // gross 4.0%, price 100, last payment 2.85, volatility 20%:
        // net 3.38, drop 3.42, net profit -0.04 within the band
        let analysis = ProfitAnalyzer::new().analyze(&stock(4.0, 100.0, 2.85, 4.0, Some(20.0)));
        assert!((analysis.net_dividend_yield - 3.38).abs() < 0.01);
        assert!((analysis.estimated_ex_date_drop - 3.42).abs() < 0.01);
        assert!((analysis.net_profit_yield + 0.04).abs() < 0.01);
        assert!(!analysis.is_profitable);
        assert!(analysis.verdict.contains("break-even"));
        assert!(analysis.verdict.contains("3.38"));
        assert!(analysis.verdict.contains("3.42"));
    }

    #[test]
    fn profitable_verdict_names_both_components() {
        let analysis = ProfitAnalyzer::new().analyze(&stock(6.0, 100.0, 1.0, 4.0, None));
        assert!(analysis.is_profitable);
        assert!(analysis.net_profit_yield > 0.3);
        assert!(analysis.verdict.starts_with("Expected +"));
        assert!(analysis.verdict.contains("5.08"));
        assert!(analysis.verdict.contains("1.00"));
    }

    #[test]
    fn loss_verdict_names_both_components() {
        let analysis = ProfitAnalyzer::new().analyze(&stock(4.0, 100.0, 4.5, 4.0, None));
        assert!(!analysis.is_profitable);
        assert!(analysis.net_profit_yield < -0.3);
        assert!(analysis.verdict.contains("loss"));
        assert!(analysis.verdict.contains("4.50"));
        assert!(analysis.verdict.contains("3.38"));
    }

    #[test]
    fn identity_net_profit_equals_net_minus_drop() {
        let analysis = ProfitAnalyzer::new().analyze(&stock(5.5, 87.0, 1.2, 4.9, Some(27.0)));
        let diff = analysis.net_dividend_yield - analysis.estimated_ex_date_drop;
        assert!((analysis.net_profit_yield - diff).abs() <= 0.01);
    }
}
