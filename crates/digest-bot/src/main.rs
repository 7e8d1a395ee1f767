mod config;
mod digest;

use std::sync::Arc;

use config::BotConfig;
use digest::DigestService;
use dividend_scanner::DividendScanner;
use slack_notifier::SlackWebhookClient;
use tracing_subscriber::EnvFilter;
use yahoo_client::YahooFinanceClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BotConfig::from_env()?;

    let provider = Arc::new(YahooFinanceClient::new());
    let mut scanner = DividendScanner::new(provider);
    if let Some(days) = config.scan_days {
        tracing::info!("scan window override: {days} days");
        scanner = scanner.with_scan_days(days);
    }

    let delivery = SlackWebhookClient::new(config.webhook_url.clone());
    let service = DigestService::new(scanner, delivery);

    let result = service.run_digest().await;
    let status = service.last_status().await;
    tracing::info!("{}", status.summary);

    if !result.success {
        anyhow::bail!(result.message);
    }
    Ok(())
}
