use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use profit_analyzer::ProfitAnalyzer;
use risk_assessor::RiskAssessor;
use scan_core::{
    DividendProfitAnalysis, DividendScanResult, DividendStock, MarketDataProvider,
    RiskAssessment, RiskLevel, ScanFilters, TechnicalIndicators,
};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

pub mod range;


pub use range::{calculate_scan_range, WEEKDAY_SCAN_DAYS};

/// Bound on concurrent per-ticker indicator fetches.
const MAX_CONCURRENT_FETCHES: usize = 8;

/// Pipeline coordinator for one dividend scan.
///
/// Stateless across scans: every call resolves a window, pulls raw records
/// from the provider, and walks them through parse, base filter, indicator
/// and risk enrichment, HIGH-risk exclusion, profit enrichment, sort and
/// truncation. The entry point never errors; batch-level failures and
/// cancellation produce an empty, well-formed result.
pub struct DividendScanner<P> {
    provider: Arc<P>,
    filters: ScanFilters,
    risk_assessor: RiskAssessor,
    profit_analyzer: ProfitAnalyzer,
    scan_days_override: Option<i64>,
    cancel: Option<watch::Receiver<bool>>,
}

impl<P: MarketDataProvider + 'static> DividendScanner<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            filters: ScanFilters::default(),
            risk_assessor: RiskAssessor::new(),
            profit_analyzer: ProfitAnalyzer::new(),
            scan_days_override: None,
            cancel: None,
        }
    }

    /// Replace the weekday-derived window with a fixed day count.
    pub fn with_scan_days(mut self, days: i64) -> Self {
        self.scan_days_override = Some(days);
        self
    }

    pub fn with_filters(mut self, filters: ScanFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Attach a cancellation signal, checked at per-ticker fetch boundaries.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Scan upcoming ex-dividend opportunities anchored at today's date.
    pub async fn scan_dividends(&self) -> DividendScanResult {
        self.scan_dividends_from(Utc::now().date_naive()).await
    }

    /// Scan with an explicit anchor date (the window still resolves per the
    /// weekday table unless an override is set).
    pub async fn scan_dividends_from(&self, today: NaiveDate) -> DividendScanResult {
        let (start_date, end_date) = match self.scan_days_override {
            Some(days) => (today, today + chrono::Duration::days(days)),
            None => calculate_scan_range(today),
        };
        let scan_range_days = (end_date - start_date).num_days();

        tracing::info!(
            "scanning ex-dividend dates {start_date} to {end_date} ({scan_range_days} days)"
        );

        let raw = match self
            .provider
            .get_upcoming_dividends(start_date, end_date)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("dividend scan failed: {e}");
                return self.empty_result(start_date, end_date, scan_range_days, 0);
            }
        };

        let parsed: Vec<DividendStock> = raw
            .into_iter()
            .filter_map(|record| match DividendStock::try_from(record) {
                Ok(stock) => Some(stock),
                Err(e) => {
                    tracing::warn!("dropping unparseable record: {e}");
                    None
                }
            })
            .collect();

        tracing::info!(
            "{} records parsed, filtering at yield >= {}% and market cap >= ${}",
            parsed.len(),
            self.filters.min_yield_pct,
            self.filters.min_market_cap_usd,
        );

        let filtered: Vec<DividendStock> = parsed
            .into_iter()
            .filter(|s| {
                s.dividend_yield >= self.filters.min_yield_pct
                    && s.market_cap >= self.filters.min_market_cap_usd
            })
            .collect();

        let enriched = self.enrich_with_indicators(filtered).await;
        if self.is_cancelled() {
            tracing::warn!("scan cancelled, returning empty result");
            return self.empty_result(start_date, end_date, scan_range_days, 0);
        }

        let before_risk = enriched.len();
        let survivors: Vec<DividendStock> = enriched
            .into_iter()
            .filter(|s| {
                s.risk
                    .as_ref()
                    .map(|r| r.risk_level != RiskLevel::High)
                    .unwrap_or(true)
            })
            .collect();
        let high_risk_excluded = before_risk - survivors.len();
        if high_risk_excluded > 0 {
            tracing::info!("excluded {high_risk_excluded} HIGH risk stocks");
        }

        let mut stocks: Vec<DividendStock> = survivors
            .into_iter()
            .map(|s| {
                let analysis = self.profit_analyzer.analyze(&s);
                s.with_profit(analysis)
            })
            .collect();

        sort_by_profitability(&mut stocks);
        stocks.truncate(self.filters.max_stocks);

        tracing::info!("scan complete: {} stocks", stocks.len());

        DividendScanResult {
            stocks,
            scanned_at: Utc::now(),
            scan_range_days,
            scan_start_date: start_date,
            scan_end_date: end_date,
            filters_applied: self.filters.clone(),
            high_risk_excluded,
        }
    }

    /// Risk classification for a single stock, exposed for composability.
    pub fn assess_risk(&self, stock: &DividendStock) -> RiskAssessment {
        self.risk_assessor.assess(stock)
    }

    /// Post-tax profitability for a single stock, exposed for composability.
    pub fn analyze_profit(&self, stock: &DividendStock) -> DividendProfitAnalysis {
        self.profit_analyzer.analyze(stock)
    }

    /// Fetch indicators for every stock with bounded concurrency, then attach
    /// the risk assessment. A failed fetch only costs that stock its
    /// indicators; risk is assessed either way.
    async fn enrich_with_indicators(&self, stocks: Vec<DividendStock>) -> Vec<DividendStock> {
        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_FETCHES));
        let mut tasks: JoinSet<(usize, Option<TechnicalIndicators>)> = JoinSet::new();

        for (index, stock) in stocks.iter().enumerate() {
            if self.is_cancelled() {
                break;
            }

            // Never closed, so acquire cannot fail
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .expect("semaphore closed");
            let provider = Arc::clone(&self.provider);
            let ticker = stock.ticker.clone();

            tasks.spawn(async move {
                let _permit = permit;
                match provider.get_technical_indicators(&ticker).await {
                    Ok(indicators) => (index, indicators),
                    Err(e) => {
                        tracing::warn!("indicator fetch failed for {ticker}, skipping: {e}");
                        (index, None)
                    }
                }
            });
        }

        let mut slots: Vec<Option<TechnicalIndicators>> = vec![None; stocks.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, indicators)) => slots[index] = indicators,
                Err(e) => tracing::error!("indicator task error: {e}"),
            }
        }

        stocks
            .into_iter()
            .zip(slots)
            .map(|(stock, indicators)| {
                let stock = stock.with_indicators(indicators);
                let risk = self.risk_assessor.assess(&stock);
                stock.with_risk(risk)
            })
            .collect()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    fn empty_result(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        scan_range_days: i64,
        high_risk_excluded: usize,
    ) -> DividendScanResult {
        DividendScanResult {
            stocks: Vec::new(),
            scanned_at: Utc::now(),
            scan_range_days,
            scan_start_date: start_date,
            scan_end_date: end_date,
            filters_applied: self.filters.clone(),
            high_risk_excluded,
        }
    }
}

/// Stable sort: profitable stocks first, then net profit yield descending;
/// stocks without a profit analysis rank as unprofitable by raw yield.
fn sort_by_profitability(stocks: &mut [DividendStock]) {
    stocks.sort_by(|a, b| {
        let (group_a, value_a) = sort_key(a);
        let (group_b, value_b) = sort_key(b);
        group_a.cmp(&group_b).then_with(|| {
            value_b
                .partial_cmp(&value_a)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    });
}

fn sort_key(stock: &DividendStock) -> (u8, f64) {
    match &stock.profit_analysis {
        Some(analysis) => (u8::from(!analysis.is_profitable), analysis.net_profit_yield),
        None => (1, stock.dividend_yield),
    }
}
