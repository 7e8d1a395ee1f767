use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use scan_core::{Bar, DividendRecord, MarketDataProvider, ScanError, TechnicalIndicators};
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance";
const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

const QUOTE_PAGE_URL_TEMPLATE: &str = "https://finance.yahoo.com/quote/";

/// Daily bars fetched per ticker for indicator computation (~3 months, the
/// slowest indicator needs 21 trading days).
const HISTORY_DAYS: i64 = 90;

/// Curated large-cap dividend universe: aristocrats plus high-yield
/// large caps, grouped by sector. Scanning a fixed list keeps the pass
/// bounded and skips the non-payers entirely.
pub const DIVIDEND_TICKERS: &[&str] = &[
    // Healthcare
    "JNJ", "PFE", "ABBV", "MRK", "BMY", "AMGN", "GILD",
    // Consumer staples
    "KO", "PEP", "PG", "CL", "MO", "PM", "KMB",
    // Telecom / utilities
    "T", "VZ", "SO", "DUK", "NEE", "D", "AEP", "XEL",
    // Energy
    "XOM", "CVX", "COP", "EOG", "SLB", "PSX",
    // Financials
    "JPM", "BAC", "WFC", "C", "USB", "PNC", "TFC",
    // Industrials
    "MMM", "CAT", "HON", "RTX", "LMT", "GD",
    // Dividend-paying tech
    "IBM", "CSCO", "TXN", "AVGO", "INTC", "QCOM",
    // REITs / dividend ETFs
    "O", "SCHD", "VYM",
    // Other high yield
    "DOW", "LYB", "KHC", "F",
];

/// Sliding-window rate limiter: at most `max_requests` per `window`.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Sleep until the oldest request leaves the window
            let oldest = *ts.front().expect("non-empty at capacity");
            let wait = self.window - now.duration_since(oldest) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!("rate limiter: waiting {:.1}s for a slot", wait.as_secs_f64());
            tokio::time::sleep(wait).await;
        }
    }
}

/// Yahoo Finance market-data provider: per-ticker dividend facts from the
/// quote endpoint and daily bar history from the chart endpoint.
#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl YahooFinanceClient {
    pub fn new() -> Self {
        // Unauthenticated endpoints throttle hard; default well under the
        // informal limit, override with YAHOO_RATE_LIMIT for paid proxies.
        let rate_limit: usize = std::env::var("YAHOO_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        }
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, url: &str) -> Result<serde_json::Value, ScanError> {
        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| ScanError::ApiError(e.to_string()))?;

            if response.status().as_u16() == 429 {
                let wait_secs = 15u64;
                tracing::warn!(
                    "Yahoo 429 rate limited, waiting {wait_secs}s before retry {}/3",
                    attempt + 1
                );
                tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                continue;
            }

            if !response.status().is_success() {
                return Err(ScanError::ApiError(format!(
                    "HTTP {}: {}",
                    response.status(),
                    response.text().await.unwrap_or_default()
                )));
            }

            return response
                .json()
                .await
                .map_err(|e| ScanError::ApiError(e.to_string()));
        }

        Err(ScanError::ApiError(
            "rate limited by Yahoo after 3 retries".to_string(),
        ))
    }

    /// Fetch one ticker's dividend facts, returning `None` when the ex-date
    /// is missing or outside the window, or when the fetch fails. Failures
    /// never propagate: a bad ticker is simply absent from the batch.
    async fn fetch_ticker_dividend_info(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Option<DividendRecord> {
        let url = format!("{BASE_URL}/quote?symbols={ticker}");
        match self.send_request(&url).await {
            Ok(json) => quote_to_record(ticker, &json, start_date, end_date),
            Err(e) => {
                tracing::warn!("dividend fetch failed for {ticker}: {e}");
                None
            }
        }
    }

    /// Fetch ~3 months of daily bars for a ticker.
    pub async fn get_daily_bars(&self, ticker: &str) -> Result<Vec<Bar>, ScanError> {
        let period2 = Utc::now().timestamp();
        let period1 = (Utc::now() - chrono::Duration::days(HISTORY_DAYS)).timestamp();
        let url = format!("{CHART_URL}/{ticker}?period1={period1}&period2={period2}&interval=1d");

        let json = self.send_request(&url).await?;
        parse_chart_bars(&json)
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn get_upcoming_dividends(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DividendRecord>, ScanError> {
        tracing::info!(
            "scanning {} tickers for ex-dividend dates {start_date} to {end_date}",
            DIVIDEND_TICKERS.len()
        );

        let futures: Vec<_> = DIVIDEND_TICKERS
            .iter()
            .map(|&ticker| self.fetch_ticker_dividend_info(ticker, start_date, end_date))
            .collect();

        let results: Vec<DividendRecord> = futures::future::join_all(futures)
            .await
            .into_iter()
            .flatten()
            .collect();

        tracing::info!("collected {} dividend records", results.len());
        Ok(results)
    }

    async fn get_technical_indicators(
        &self,
        ticker: &str,
    ) -> Result<Option<TechnicalIndicators>, ScanError> {
        let bars = self.get_daily_bars(ticker).await?;
        if bars.len() < technical_indicators::MIN_HISTORY_BARS {
            tracing::warn!("{ticker}: only {} bars of history", bars.len());
            return Ok(None);
        }
        Ok(technical_indicators::compute_indicators(&bars))
    }
}

/// Map a quote response to a dividend record when the ex-date falls inside
/// the scan window.
fn quote_to_record(
    ticker: &str,
    json: &serde_json::Value,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Option<DividendRecord> {
    let quote = json
        .get("quoteResponse")
        .and_then(|v| v.get("result"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())?;

    // Epoch seconds; absent for non-payers
    let ex_div_ts = quote.get("exDividendDate").and_then(|v| v.as_i64())?;
    let ex_div_date = DateTime::from_timestamp(ex_div_ts, 0)?.date_naive();

    if ex_div_date < start_date || ex_div_date > end_date {
        return None;
    }

    let get_f64 = |key: &str| quote.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0);

    Some(DividendRecord {
        ticker: Some(ticker.to_string()),
        company_name: Some(
            quote
                .get("shortName")
                .and_then(|v| v.as_str())
                .unwrap_or(ticker)
                .to_string(),
        ),
        ex_dividend_date: Some(ex_div_date.to_string()),
        // Already a percent (3.5 = 3.5%)
        dividend_yield: get_f64("dividendYield"),
        // Annual total; the last single payment is carried separately
        dividend_amount: get_f64("dividendRate"),
        market_cap: quote.get("marketCap").and_then(|v| v.as_i64()).unwrap_or(0),
        current_price: quote
            .get("currentPrice")
            .and_then(|v| v.as_f64())
            .unwrap_or_else(|| get_f64("regularMarketPrice")),
        last_dividend_value: get_f64("lastDividendValue"),
        reference_url: Some(format!("{QUOTE_PAGE_URL_TEMPLATE}{ticker}")),
    })
}

/// Parse chart-endpoint JSON into bars, skipping rows with null fields.
fn parse_chart_bars(json: &serde_json::Value) -> Result<Vec<Bar>, ScanError> {
    let chart = json
        .get("chart")
        .and_then(|v| v.get("result"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| ScanError::ApiError("no chart data in response".to_string()))?;

    let timestamps = chart
        .get("timestamp")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ScanError::ApiError("no timestamps in chart data".to_string()))?;

    let quote = chart
        .get("indicators")
        .and_then(|v| v.get("quote"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| ScanError::ApiError("no quote arrays in chart data".to_string()))?;

    let series = |key: &str| -> Result<&Vec<serde_json::Value>, ScanError> {
        quote
            .get(key)
            .and_then(|v| v.as_array())
            .ok_or_else(|| ScanError::ApiError(format!("no {key} series in chart data")))
    };

    let opens = series("open")?;
    let highs = series("high")?;
    let lows = series("low")?;
    let closes = series("close")?;
    let volumes = series("volume")?;

    let mut bars = Vec::with_capacity(timestamps.len());
    for i in 0..timestamps.len() {
        if let (Some(ts), Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            timestamps.get(i).and_then(|v| v.as_i64()),
            opens.get(i).and_then(|v| v.as_f64()),
            highs.get(i).and_then(|v| v.as_f64()),
            lows.get(i).and_then(|v| v.as_f64()),
            closes.get(i).and_then(|v| v.as_f64()),
            volumes.get(i).and_then(|v| v.as_f64()),
        ) {
            let timestamp = DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| ScanError::ApiError(format!("invalid timestamp {ts}")))?;
            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }
    }

    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quote_json(ex_div_epoch: i64) -> serde_json::Value {
        json!({
            "quoteResponse": {
                "result": [{
                    "shortName": "Johnson & Johnson",
                    "exDividendDate": ex_div_epoch,
                    "dividendYield": 3.4,
                    "dividendRate": 5.2,
                    "marketCap": 586_400_000_000_i64,
                    "regularMarketPrice": 152.0,
                    "lastDividendValue": 1.30
                }]
            }
        })
    }

    fn window() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2026, 2, 16).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 20).unwrap(),
        )
    }

    #[test]
    fn quote_inside_window_becomes_record() {
        // 2026-02-18 00:00 UTC
        let (start, end) = window();
        let record = quote_to_record("JNJ", &quote_json(1_771_372_800), start, end).unwrap();

        assert_eq!(record.ticker.as_deref(), Some("JNJ"));
        assert_eq!(record.company_name.as_deref(), Some("Johnson & Johnson"));
        assert_eq!(record.ex_dividend_date.as_deref(), Some("2026-02-18"));
        assert!((record.dividend_yield - 3.4).abs() < 1e-9);
        assert_eq!(record.market_cap, 586_400_000_000);
        assert!((record.last_dividend_value - 1.30).abs() < 1e-9);
        assert_eq!(
            record.reference_url.as_deref(),
            Some("https://finance.yahoo.com/quote/JNJ")
        );
    }

    #[test]
    fn quote_outside_window_is_skipped() {
        let (start, end) = window();
        // 2026-03-18, a month past the window
        assert!(quote_to_record("JNJ", &quote_json(1_773_792_000), start, end).is_none());
    }

    #[test]
    fn quote_without_ex_date_is_skipped() {
        let (start, end) = window();
        let json = json!({
            "quoteResponse": { "result": [{ "shortName": "No Dividend Corp" }] }
        });
        assert!(quote_to_record("NODIV", &json, start, end).is_none());
    }

    #[test]
    fn quote_defaults_missing_numbers_to_zero() {
        let (start, end) = window();
        let json = json!({
            "quoteResponse": {
                "result": [{ "exDividendDate": 1_771_372_800_i64 }]
            }
        });
        let record = quote_to_record("BARE", &json, start, end).unwrap();
        assert_eq!(record.dividend_yield, 0.0);
        assert_eq!(record.market_cap, 0);
        assert_eq!(record.current_price, 0.0);
        // Company name falls back to the ticker symbol
        assert_eq!(record.company_name.as_deref(), Some("BARE"));
    }

    #[test]
    fn chart_bars_skip_null_rows() {
        let json = json!({
            "chart": {
                "result": [{
                    "timestamp": [1_771_200_000, 1_771_286_400, 1_771_372_800],
                    "indicators": {
                        "quote": [{
                            "open":   [100.0, null, 102.0],
                            "high":   [101.0, 102.0, 103.0],
                            "low":    [99.0, 100.0, 101.0],
                            "close":  [100.5, 101.5, 102.5],
                            "volume": [1_000_000.0, 1_100_000.0, 1_200_000.0]
                        }]
                    }
                }]
            }
        });

        let bars = parse_chart_bars(&json).unwrap();
        assert_eq!(bars.len(), 2);
        assert!((bars[0].close - 100.5).abs() < 1e-9);
        assert!((bars[1].close - 102.5).abs() < 1e-9);
    }

    #[test]
    fn chart_without_result_is_an_error() {
        let json = json!({ "chart": { "result": [] } });
        assert!(parse_chart_bars(&json).is_err());
    }

    #[test]
    fn ticker_universe_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for ticker in DIVIDEND_TICKERS {
            assert!(seen.insert(ticker), "duplicate ticker {ticker}");
        }
        assert!(DIVIDEND_TICKERS.len() > 40);
    }
}
