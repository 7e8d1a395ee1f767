pub mod blocks;
pub mod format;
pub mod webhook;

pub use blocks::{ButtonElement, DigestBlock, TextObject};
pub use format::format_for_slack;
pub use webhook::{MessageDelivery, SlackWebhookClient};
