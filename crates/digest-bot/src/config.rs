use anyhow::Context;

/// Environment-driven configuration for the digest bot.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Slack Incoming Webhook URL (https://hooks.slack.com/...)
    pub webhook_url: String,
    /// Fixed scan window override in days; None uses the weekday table
    pub scan_days: Option<i64>,
}

impl BotConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let webhook_url =
            std::env::var("SLACK_WEBHOOK_URL").context("SLACK_WEBHOOK_URL is not set")?;
        let scan_days = std::env::var("SCAN_DAYS").ok().and_then(|v| v.parse().ok());

        Ok(Self {
            webhook_url,
            scan_days,
        })
    }
}
