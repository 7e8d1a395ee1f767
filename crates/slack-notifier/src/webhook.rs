use async_trait::async_trait;
use scan_core::ScanError;

use crate::blocks::DigestBlock;

/// Transmits formatted message blocks to a delivery channel.
#[async_trait]
pub trait MessageDelivery: Send + Sync {
    async fn send_blocks(&self, blocks: &[DigestBlock]) -> Result<(), ScanError>;
}

/// Slack Incoming Webhook sender.
#[derive(Clone)]
pub struct SlackWebhookClient {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackWebhookClient {
    pub fn new(webhook_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }
}

#[async_trait]
impl MessageDelivery for SlackWebhookClient {
    /// POST the blocks to the webhook URL.
    ///
    /// An empty block list is a caller bug and fails immediately with
    /// `InvalidData`; the transport layer converts it to a user-visible
    /// message. Non-200 responses map to `DeliveryError`.
    async fn send_blocks(&self, blocks: &[DigestBlock]) -> Result<(), ScanError> {
        if blocks.is_empty() {
            return Err(ScanError::InvalidData("no blocks to send".to_string()));
        }

        tracing::info!("sending {} blocks to Slack webhook", blocks.len());

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&serde_json::json!({ "blocks": blocks }))
            .send()
            .await
            .map_err(|e| ScanError::DeliveryError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScanError::DeliveryError(format!(
                "Slack webhook HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        tracing::info!("Slack webhook delivery succeeded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_block_list_is_rejected_before_any_io() {
        let client = SlackWebhookClient::new("https://hooks.slack.com/services/TEST".to_string());
        let result = client.send_blocks(&[]).await;
        assert!(matches!(result, Err(ScanError::InvalidData(_))));
    }
}
