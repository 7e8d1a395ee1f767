use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// OHLCV bar data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Raw per-ticker dividend record as returned by the market-data provider.
///
/// Required fields are `Option` so a malformed record can be rejected at
/// parse time instead of failing the whole batch deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DividendRecord {
    pub ticker: Option<String>,
    pub company_name: Option<String>,
    /// ISO date string (e.g. "2026-02-20")
    pub ex_dividend_date: Option<String>,
    /// Percent, already scaled (3.5 = 3.5%)
    #[serde(default)]
    pub dividend_yield: f64,
    /// Annual dividend per share (USD)
    #[serde(default)]
    pub dividend_amount: f64,
    #[serde(default)]
    pub market_cap: i64,
    #[serde(default)]
    pub current_price: f64,
    /// Last actual single-payment dividend (USD per share)
    #[serde(default)]
    pub last_dividend_value: f64,
    pub reference_url: Option<String>,
}

/// Technical indicator snapshot for one ticker.
///
/// Each field is independently optional: partial history can produce
/// some indicators and not others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicators {
    /// 14-period RSI (0-100)
    #[serde(default)]
    pub rsi_14: Option<f64>,
    /// Stochastic %K (14,3)
    #[serde(default)]
    pub stochastic_k: Option<f64>,
    /// Stochastic %D (14,3,3)
    #[serde(default)]
    pub stochastic_d: Option<f64>,
    /// 20-day volatility, annualized percent
    #[serde(default)]
    pub volatility_20d: Option<f64>,
    /// 5-trading-day price change (percent)
    #[serde(default)]
    pub price_change_5d: Option<f64>,
    /// 20-day average volume
    #[serde(default)]
    pub avg_volume_20d: Option<f64>,
}

/// Risk tier for the ex-dividend window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    /// Fixed risk-to-recommendation mapping
    pub fn recommendation(&self) -> Recommendation {
        match self {
            RiskLevel::Low => Recommendation::Buy,
            RiskLevel::Medium => Recommendation::Hold,
            RiskLevel::High => Recommendation::Skip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Hold,
    Skip,
}

impl Recommendation {
    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::Buy => "BUY",
            Recommendation::Hold => "HOLD",
            Recommendation::Skip => "SKIP",
        }
    }
}

/// Risk assessment result for one stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    /// Human-readable justifications, never empty
    pub reasons: Vec<String>,
    pub recommendation: Recommendation,
}

impl RiskAssessment {
    /// Build an assessment with the recommendation derived from the level.
    pub fn for_level(risk_level: RiskLevel, reasons: Vec<String>) -> Self {
        Self {
            risk_level,
            reasons,
            recommendation: risk_level.recommendation(),
        }
    }
}

/// Post-tax profitability analysis for one ex-dividend opportunity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendProfitAnalysis {
    /// Pre-tax dividend yield (percent)
    pub gross_dividend_yield: f64,
    /// Effective withholding rate (percent)
    pub tax_rate: f64,
    /// gross x (1 - tax_rate/100)
    pub net_dividend_yield: f64,
    /// Estimated ex-date price drop (percent)
    pub estimated_ex_date_drop: f64,
    /// net_dividend_yield - estimated_ex_date_drop
    pub net_profit_yield: f64,
    pub is_profitable: bool,
    /// One-line verdict naming both components
    pub verdict: String,
}

/// One ticker's dividend opportunity snapshot.
///
/// Enrichments attach in a fixed order (indicators, then risk, then profit)
/// via the consuming `with_*` builders; the value is never mutated in place
/// across pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendStock {
    pub ticker: String,
    pub company_name: String,
    pub ex_dividend_date: NaiveDate,
    /// Percent (3.5 = 3.5%), unrestricted sign at the model level
    pub dividend_yield: f64,
    /// Annual dividend per share (USD)
    pub dividend_amount: f64,
    /// Last actual single-payment dividend (USD per share)
    #[serde(default)]
    pub last_dividend_value: f64,
    pub market_cap: i64,
    #[serde(default)]
    pub current_price: f64,
    pub reference_url: String,
    #[serde(default)]
    pub indicators: Option<TechnicalIndicators>,
    #[serde(default)]
    pub risk: Option<RiskAssessment>,
    #[serde(default)]
    pub profit_analysis: Option<DividendProfitAnalysis>,
}

impl DividendStock {
    pub fn with_indicators(mut self, indicators: Option<TechnicalIndicators>) -> Self {
        self.indicators = indicators;
        self
    }

    pub fn with_risk(mut self, risk: RiskAssessment) -> Self {
        self.risk = Some(risk);
        self
    }

    pub fn with_profit(mut self, analysis: DividendProfitAnalysis) -> Self {
        self.profit_analysis = Some(analysis);
        self
    }
}

impl TryFrom<DividendRecord> for DividendStock {
    type Error = ScanError;

    fn try_from(record: DividendRecord) -> Result<Self, Self::Error> {
        let ticker = record
            .ticker
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ScanError::InvalidData("record missing ticker".to_string()))?;
        let company_name = record
            .company_name
            .ok_or_else(|| ScanError::InvalidData(format!("{ticker}: missing company name")))?;
        let raw_date = record
            .ex_dividend_date
            .ok_or_else(|| ScanError::InvalidData(format!("{ticker}: missing ex-dividend date")))?;
        let ex_dividend_date = raw_date.parse::<NaiveDate>().map_err(|e| {
            ScanError::InvalidData(format!("{ticker}: bad ex-dividend date {raw_date:?}: {e}"))
        })?;
        let reference_url = record
            .reference_url
            .ok_or_else(|| ScanError::InvalidData(format!("{ticker}: missing reference URL")))?;

        Ok(Self {
            ticker,
            company_name,
            ex_dividend_date,
            dividend_yield: record.dividend_yield,
            dividend_amount: record.dividend_amount,
            last_dividend_value: record.last_dividend_value,
            market_cap: record.market_cap,
            current_price: record.current_price,
            reference_url,
            indicators: None,
            risk: None,
            profit_analysis: None,
        })
    }
}

/// Filter thresholds applied by a scan, recorded on the result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanFilters {
    pub min_yield_pct: f64,
    pub min_market_cap_usd: i64,
    pub max_stocks: usize,
}

impl Default for ScanFilters {
    fn default() -> Self {
        Self {
            min_yield_pct: 3.0,
            min_market_cap_usd: 1_000_000_000,
            max_stocks: 10,
        }
    }
}

/// Result of one dividend scan: the surviving stocks (sorted, capped) plus
/// scan metadata. Immutable after construction; each scan builds a fresh one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendScanResult {
    pub stocks: Vec<DividendStock>,
    pub scanned_at: DateTime<Utc>,
    /// Effective window length in calendar days
    pub scan_range_days: i64,
    pub scan_start_date: NaiveDate,
    pub scan_end_date: NaiveDate,
    pub filters_applied: ScanFilters,
    /// Stocks dropped for HIGH risk after the base filter
    pub high_risk_excluded: usize,
}
