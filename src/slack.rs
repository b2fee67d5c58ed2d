use crate::error::{Result, StickerError};
use crate::types::ChatSink;
use serde::Serialize;
use tracing::{debug, error};

/// Incoming-webhook message body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlackPayload {
    pub username: String,
    pub icon_emoji: String,
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub fallback: String,
    pub color: String,
    pub image_url: String,
}

/// Posts form-encoded payloads to a Slack incoming webhook.
pub struct SlackWebhook {
    client: reqwest::Client,
    url: String,
}

impl SlackWebhook {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl ChatSink for SlackWebhook {
    async fn post(&self, payload: &SlackPayload) -> Result<()> {
        let json = serde_json::to_string(payload)?;
        debug!(channel = %payload.channel, "Posting to Slack");

        let response = match self
            .client
            .post(&self.url)
            .form(&[("payload", json.as_str())])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Err(delivery_error(e.to_string(), "")),
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(delivery_error(format!("Got code {}", status.as_u16()), &body));
        }
        Ok(())
    }
}

/// `<reason>\n\n<response body>`, with an empty body for transport errors.
fn delivery_error(reason: String, body: &str) -> StickerError {
    let err = StickerError::Delivery {
        message: format!("{reason}\n\n{body}"),
    };
    error!("{}", err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_fields_are_omitted() {
        let payload = SlackPayload {
            username: "ana".into(),
            icon_emoji: ":thief:".into(),
            channel: "C123".into(),
            text: None,
            attachments: Vec::new(),
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"username": "ana", "icon_emoji": ":thief:", "channel": "C123"})
        );
    }

    #[test]
    fn attachments_serialize_with_image_url() {
        let payload = SlackPayload {
            username: "ana".into(),
            icon_emoji: ":thief:".into(),
            channel: "C123".into(),
            text: Some("hi".into()),
            attachments: vec![Attachment {
                fallback: "Explorer".into(),
                color: "#ffa633".into(),
                image_url: "https://img/94/e.png".into(),
            }],
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["text"], "hi");
        assert_eq!(value["attachments"][0]["image_url"], "https://img/94/e.png");
    }
}
