//! Slack Block Kit message structures.
//!
//! Optional fields skip serialization entirely so the wire shape matches
//! what the Slack API expects (no null members).

use serde::{Deserialize, Serialize};

/// Block Kit text object, mrkdwn or plain_text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub text_type: String,
    pub text: String,
}

impl TextObject {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            text_type: "mrkdwn".to_string(),
            text: text.into(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text_type: "plain_text".to_string(),
            text: text.into(),
        }
    }
}

/// Interactive button for an actions block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonElement {
    #[serde(rename = "type")]
    pub element_type: String,
    pub text: TextObject,
    pub action_id: String,
    /// "primary" or "danger"; Slack default styling when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl ButtonElement {
    pub fn new(label: impl Into<String>, action_id: impl Into<String>) -> Self {
        Self {
            element_type: "button".to_string(),
            text: TextObject::plain(label),
            action_id: action_id.into(),
            style: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// One block of a Block Kit message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<ButtonElement>>,
}

impl DigestBlock {
    pub fn section(text: TextObject) -> Self {
        Self {
            block_type: "section".to_string(),
            text: Some(text),
            block_id: None,
            elements: None,
        }
    }

    pub fn header(text: TextObject) -> Self {
        Self {
            block_type: "header".to_string(),
            text: Some(text),
            block_id: None,
            elements: None,
        }
    }

    pub fn divider() -> Self {
        Self {
            block_type: "divider".to_string(),
            text: None,
            block_id: None,
            elements: None,
        }
    }

    pub fn actions(elements: Vec<ButtonElement>) -> Self {
        Self {
            block_type: "actions".to_string(),
            text: None,
            block_id: None,
            elements: Some(elements),
        }
    }
}
