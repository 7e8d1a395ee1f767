use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{DividendRecord, ScanError, TechnicalIndicators};

/// Source of raw dividend facts and per-ticker technical indicators.
///
/// `get_upcoming_dividends` isolates per-ticker failures internally (failed
/// tickers are simply absent from the list) and returns `Err` only when the
/// whole batch is unavailable. `get_technical_indicators` returns `Ok(None)`
/// for short or missing history and `Err` for transport failures, so callers
/// can isolate the latter per ticker.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn get_upcoming_dividends(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DividendRecord>, ScanError>;

    async fn get_technical_indicators(
        &self,
        ticker: &str,
    ) -> Result<Option<TechnicalIndicators>, ScanError>;
}
