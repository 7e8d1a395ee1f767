use std::time::Instant;

use chrono::{DateTime, Utc};
use dividend_scanner::DividendScanner;
use scan_core::MarketDataProvider;
use slack_notifier::{format_for_slack, ButtonElement, DigestBlock, MessageDelivery, TextObject};
use tokio::sync::RwLock;

/// Outcome of one digest run. Failures are wrapped here instead of raised.
#[derive(Debug, Clone)]
pub struct DigestResult {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub duration_sec: f64,
    pub stock_count: usize,
}

/// Last-run status view; all `None` until a digest has run.
#[derive(Debug, Clone, Default)]
pub struct DigestStatus {
    pub last_run_at: Option<DateTime<Utc>>,
    pub success: Option<bool>,
    pub stock_count: Option<usize>,
    pub summary: String,
}

/// Assembles the daily digest and sends it through the delivery channel.
///
/// The only state that outlives a run is the in-memory last result, kept for
/// status queries.
pub struct DigestService<P, D> {
    scanner: DividendScanner<P>,
    delivery: D,
    last_result: RwLock<Option<DigestResult>>,
}

impl<P, D> DigestService<P, D>
where
    P: MarketDataProvider + 'static,
    D: MessageDelivery,
{
    pub fn new(scanner: DividendScanner<P>, delivery: D) -> Self {
        Self {
            scanner,
            delivery,
            last_result: RwLock::new(None),
        }
    }

    /// Build and send the digest. Never propagates errors: a failed delivery
    /// becomes a `success: false` result, and the last-run status is updated
    /// either way.
    pub async fn run_digest(&self) -> DigestResult {
        let started = Instant::now();

        let (blocks, stock_count) = self.build_digest_blocks().await;
        let outcome = self.delivery.send_blocks(&blocks).await;
        let duration_sec = (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;

        let result = match outcome {
            Ok(()) => DigestResult {
                success: true,
                message: "digest delivered".to_string(),
                timestamp: Utc::now(),
                duration_sec,
                stock_count,
            },
            Err(e) => {
                tracing::error!("digest delivery failed: {e}");
                DigestResult {
                    success: false,
                    message: format!("delivery failed: {e}"),
                    timestamp: Utc::now(),
                    duration_sec,
                    stock_count: 0,
                }
            }
        };

        *self.last_result.write().await = Some(result.clone());
        result
    }

    /// Status of the most recent digest run.
    pub async fn last_status(&self) -> DigestStatus {
        let guard = self.last_result.read().await;
        let Some(last) = guard.as_ref() else {
            return DigestStatus {
                summary: "no digest has run yet".to_string(),
                ..Default::default()
            };
        };

        let marker = if last.success {
            ":white_check_mark:"
        } else {
            ":x:"
        };
        let state = if last.success { "succeeded" } else { "failed" };
        let summary = format!(
            "{marker} last run {}\n  {state} | {} stocks | {}s",
            last.timestamp.format("%Y-%m-%d %H:%M:%S"),
            last.stock_count,
            last.duration_sec,
        );

        DigestStatus {
            last_run_at: Some(last.timestamp),
            success: Some(last.success),
            stock_count: Some(last.stock_count),
            summary,
        }
    }

    /// Header, divider, dividend section, divider, re-run button.
    async fn build_digest_blocks(&self) -> (Vec<DigestBlock>, usize) {
        let today = Utc::now().format("%Y-%m-%d");

        let scan_result = self.scanner.scan_dividends().await;
        let stock_count = scan_result.stocks.len();
        let dividend_blocks = format_for_slack(&scan_result);

        let mut blocks = vec![
            DigestBlock::header(TextObject::plain(format!("Daily Digest - {today}"))),
            DigestBlock::divider(),
        ];
        blocks.extend(dividend_blocks);
        blocks.push(DigestBlock::divider());
        blocks.push(DigestBlock::actions(vec![ButtonElement::new(
            "Run again",
            "rerun_digest",
        )]));

        (blocks, stock_count)
    }
}
